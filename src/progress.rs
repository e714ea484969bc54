//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the driver classifies each page.
//!
//! Pages are classified on the blocking thread pool, so the trait is
//! `Send + Sync` and callbacks for different pages may arrive from different
//! threads and out of page order.
//!
//! # Example
//!
//! ```rust
//! use docflow::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct RowCounter {
//!     rows: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for RowCounter {
//!     fn on_page_complete(&self, _page_no: usize, _total_pages: usize, row_count: usize) {
//!         self.rows.fetch_add(row_count, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(RowCounter { rows: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extraction driver as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once, after page splitting and before any page is classified.
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is classified.
    ///
    /// # Arguments
    /// * `page_no`     — 1-indexed page number (0 in whole-document mode)
    /// * `total_pages` — number of page segments in the document
    fn on_page_start(&self, page_no: usize, total_pages: usize) {
        let _ = (page_no, total_pages);
    }

    /// Called when a page has been classified.
    ///
    /// # Arguments
    /// * `row_count` — rows the page produced (may be 0 for a blank page)
    fn on_page_complete(&self, page_no: usize, total_pages: usize, row_count: usize) {
        let _ = (page_no, total_pages, row_count);
    }

    /// Called when a page is skipped because its text could not be produced.
    fn on_page_error(&self, page_no: usize, total_pages: usize, error: &str) {
        let _ = (page_no, total_pages, error);
    }

    /// Called once after every page has been attempted.
    fn on_extraction_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
