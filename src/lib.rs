//! # filmaffinity-export
//!
//! Export a FilmAffinity user's rating history to a paginated PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! profile id
//!  │
//!  ├─ 1. Paginate  GET userratings.php?user_id=…&p=1, 2, … until the listing runs dry
//!  ├─ 2. Extract   title, year, ratings, director, cast, poster, flag per entry
//!  ├─ 3. Assets    fetch and normalise poster + flag images (failures are per image)
//!  ├─ 4. Layout    one fixed block per movie: poster | title+flag, ratings, metadata
//!  └─ 5. Document  A4 PDF, every block followed by a separator, written once
//! ```
//!
//! Everything runs sequentially: one listing page at a time, then one record
//! at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use filmaffinity_export::{export, ExportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExportConfig::default();
//!     let summary = export("123456", &config).await?;
//!     println!("{} movies → {}", summary.records, summary.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fa-export` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod progress;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExportConfig, ExportConfigBuilder};
pub use error::{AssetError, ExportError};
pub use export::{
    compose_document, default_output_path, export, export_sync, export_to_file, fetch_ratings,
    output_filename, render_records,
};
pub use pipeline::document::{Document, DocumentElement};
pub use pipeline::layout::RecordBlock;
pub use progress::{AssetKind, ExportProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{ExportSummary, Record, UNKNOWN_TITLE};
