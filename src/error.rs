//! Error types for the docflow library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocflowError`] — **Fatal**: the extraction cannot proceed at all
//!   (input missing, input is a PDF rather than Markdown, bad outline file,
//!   invalid configuration). Returned as `Err(DocflowError)` from the
//!   top-level `extract*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page segment could not be turned
//!   into text (bad bytes, producer failure) but every other page is fine.
//!   The page is classified as empty and reported in
//!   [`crate::output::ExtractionStats::skipped_pages`].
//!
//! The classifier and normalizer themselves never fail: malformed lines end up
//! as `text` rows and empty fragments are silently dropped.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docflow library.
#[derive(Debug, Error)]
pub enum DocflowError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a usable file path nor an HTTP(S) URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The input is a raw PDF; it must be converted to Markdown first.
    #[error("'{path}' is a PDF, not Markdown.\nConvert it to Markdown first, ideally with '<!-- page N -->' separators, then use --split comment.")]
    UnconvertedPdf { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// Some pages were skipped.
    ///
    /// Returned by [`crate::output::ExtractionOutput::into_result`] when
    /// the caller wants to treat any skipped page as an error.
    #[error("{}/{total} pages skipped during extraction: {skipped:?}", .skipped.len())]
    PagesSkipped { skipped: Vec<usize>, total: usize },

    // ── Outline errors ────────────────────────────────────────────────────
    /// The outline file could not be read or parsed.
    #[error("Invalid outline '{path}': {detail}")]
    InvalidOutline { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Row serialisation failed while exporting.
    #[error("Failed to serialise rows as {format}: {detail}")]
    ExportFailed { format: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// The page is replaced by an empty line sequence and the pass continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page segment is not valid UTF-8.
    #[error("Page {page}: text is not valid UTF-8 (first bad byte at offset {offset})")]
    InvalidUtf8 { page: usize, offset: usize },

    /// An external text producer reported a failure for this page.
    #[error("Page {page}: conversion failed: {detail}")]
    ProducerFailed { page: usize, detail: String },

    /// The classification task for this page did not complete.
    #[error("Page {page}: classification task aborted: {detail}")]
    TaskFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to (0 in whole-document mode).
    pub fn page(&self) -> usize {
        match self {
            PageError::InvalidUtf8 { page, .. }
            | PageError::ProducerFailed { page, .. }
            | PageError::TaskFailed { page, .. } => *page,
        }
    }
}
