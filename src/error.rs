//! Error types for the filmaffinity-export library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExportError`] is **fatal**: the export cannot proceed at all
//!   (empty profile id, unusable listing URL, fonts missing, PDF could not be
//!   written). Returned as `Err(ExportError)` from the top-level `export*`
//!   functions.
//!
//! * [`AssetError`] is **non-fatal**: a single poster or flag image could not
//!   be fetched or decoded. The record is still rendered, just without that
//!   image.
//!
//! Pagination running out of pages and markup fields that are missing are not
//! errors at all and have no variant here.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the filmaffinity-export library.
///
/// Image failures use [`AssetError`] and never propagate here.
#[derive(Debug, Error)]
pub enum ExportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The profile identifier was empty after trimming, or cannot be part of
    /// a file name.
    #[error("Invalid FilmAffinity user ID '{input}': {reason}")]
    InvalidProfileId { input: String, reason: String },

    /// The listing URL could not be built from the base URL and profile id.
    #[error("Invalid listing URL '{url}': {reason}")]
    InvalidListingUrl { url: String, reason: String },

    // ── HTTP errors ───────────────────────────────────────────────────────
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Document errors ───────────────────────────────────────────────────
    /// The font family to embed could not be loaded.
    #[error(
        "Failed to load font family '{family}' from '{dir}': {detail}\n\
Install the Liberation fonts or point --font-dir at a directory containing\n\
{family}-Regular.ttf (or {family}.ttf), optionally with {family}-Bold.ttf,\n\
{family}-Italic.ttf and {family}-BoldItalic.ttf."
    )]
    FontLoad {
        dir: PathBuf,
        family: String,
        detail: String,
    },

    /// The layout engine failed while rendering the PDF.
    #[error("PDF rendering failed: {0}")]
    RenderFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image asset.
///
/// `Clone` so that a memoised failure can be handed out again when the same
/// URL is requested a second time during one export.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum AssetError {
    /// The request never produced a response (DNS, connect, TLS, ...).
    #[error("request to '{url}' failed: {detail}")]
    Transport { url: String, detail: String },

    /// The server answered with a non-success status.
    #[error("'{url}' returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read.
    #[error("reading body of '{url}' failed: {detail}")]
    Body { url: String, detail: String },

    /// The body is not an image the decoder understands.
    #[error("'{url}' is not a decodable image: {detail}")]
    Decode { url: String, detail: String },
}

impl AssetError {
    /// The URL the failed asset was requested from.
    pub fn url(&self) -> &str {
        match self {
            AssetError::Transport { url, .. }
            | AssetError::Status { url, .. }
            | AssetError::Body { url, .. }
            | AssetError::Decode { url, .. } => url,
        }
    }
}
