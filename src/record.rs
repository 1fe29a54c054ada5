//! Output types: the extracted [`Record`] and the run [`ExportSummary`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Title used when a listing entry has no title node.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// One rated movie as it appears in the ratings listing.
///
/// Every optional field is plain text that is empty when the markup did not
/// carry it, so callers never deal with `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Movie title, or [`UNKNOWN_TITLE`].
    pub title: String,
    pub year: String,
    /// Average rating from the community, e.g. `"7,9"`.
    pub rating: String,
    /// The profile owner's own rating, e.g. `"8"`.
    pub own_rating: String,
    pub director: String,
    pub cast: String,
    /// Lowest-resolution poster candidate.
    pub poster_url: String,
    /// Country flag image, prefixed with the site root.
    pub flag_url: String,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            year: String::new(),
            rating: String::new(),
            own_rating: String::new(),
            director: String::new(),
            cast: String::new(),
            poster_url: String::new(),
            flag_url: String::new(),
        }
    }
}

/// Statistics for a finished export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    /// Records rendered into the document.
    pub records: usize,
    /// Listing pages that contained at least one record.
    pub listing_pages: usize,
    /// Poster/flag images that could not be embedded.
    pub asset_failures: usize,
    /// Where the PDF was written.
    pub output_path: PathBuf,
}
