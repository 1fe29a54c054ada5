//! Progress-callback trait for export events.
//!
//! Inject an [`Arc<dyn ExportProgressCallback>`] via
//! [`crate::config::ExportConfigBuilder::progress_callback`] to receive
//! events as the pipeline fetches listing pages and lays out records.
//!
//! # Example
//!
//! ```rust
//! use filmaffinity_export::{ExportConfig, ExportProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl ExportProgressCallback for PageCounter {
//!     fn on_listing_page(&self, page: u32, records_on_page: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page}: {records_on_page} movies");
//!     }
//! }
//!
//! let counter = Arc::new(PageCounter { pages: AtomicUsize::new(0) });
//!
//! let config = ExportConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExportProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Which image of a record an asset event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Poster,
    Flag,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Poster => "poster",
            AssetKind::Flag => "flag",
        }
    }
}

/// Called by the export pipeline at each stage boundary.
///
/// The pipeline is sequential, so calls never overlap, but implementations
/// must still be `Send + Sync` so a config can be shared freely. All methods
/// have default no-op implementations.
pub trait ExportProgressCallback: Send + Sync {
    /// Called before the first listing page is requested.
    fn on_fetch_start(&self, profile_id: &str) {
        let _ = profile_id;
    }

    /// Called for every listing page that contained records.
    fn on_listing_page(&self, page: u32, records_on_page: usize) {
        let _ = (page, records_on_page);
    }

    /// Called once pagination has stopped.
    fn on_fetch_complete(&self, total_records: usize) {
        let _ = total_records;
    }

    /// Called before the first record is laid out.
    fn on_export_start(&self, total_records: usize, output_path: &Path) {
        let _ = (total_records, output_path);
    }

    /// Called after each record block has been composed (1-indexed).
    fn on_record_composed(&self, index: usize, total_records: usize, title: &str) {
        let _ = (index, total_records, title);
    }

    /// Called when a poster or flag could not be fetched.
    fn on_asset_error(&self, title: &str, kind: AssetKind, error: &str) {
        let _ = (title, kind, error);
    }

    /// Called once the PDF has been written.
    fn on_export_complete(&self, total_records: usize, output_path: &Path) {
        let _ = (total_records, output_path);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExportConfig`].
pub type ProgressCallback = Arc<dyn ExportProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        pages: AtomicUsize,
        composed: AtomicUsize,
        asset_errors: Mutex<Vec<(String, AssetKind)>>,
    }

    impl ExportProgressCallback for TrackingCallback {
        fn on_listing_page(&self, _page: u32, _records_on_page: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_record_composed(&self, _index: usize, _total: usize, _title: &str) {
            self.composed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_asset_error(&self, title: &str, kind: AssetKind, _error: &str) {
            self.asset_errors
                .lock()
                .unwrap()
                .push((title.to_string(), kind));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_fetch_start("123");
        cb.on_listing_page(1, 20);
        cb.on_fetch_complete(20);
        cb.on_export_start(20, Path::new("out.pdf"));
        cb.on_record_composed(1, 20, "Heat");
        cb.on_asset_error("Heat", AssetKind::Poster, "404");
        cb.on_export_complete(20, Path::new("out.pdf"));
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_listing_page(1, 20);
        tracker.on_listing_page(2, 3);
        tracker.on_record_composed(1, 2, "Heat");
        tracker.on_record_composed(2, 2, "Ran");
        tracker.on_asset_error("Ran", AssetKind::Flag, "HTTP 404");

        assert_eq!(tracker.pages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.composed.load(Ordering::SeqCst), 2);
        assert_eq!(
            *tracker.asset_errors.lock().unwrap(),
            vec![("Ran".to_string(), AssetKind::Flag)]
        );
    }

    #[test]
    fn asset_kind_names() {
        assert_eq!(AssetKind::Poster.as_str(), "poster");
        assert_eq!(AssetKind::Flag.as_str(), "flag");
    }
}
