//! Eager (full-document) extraction entry points.
//!
//! These functions wait for every page, then return all rows at once in page
//! order. Use [`crate::stream::extract_stream`] instead when you want rows
//! page by page as they are classified.
//!
//! Pages are independent: each one is classified with its own
//! [`SectionState`], so they run on the blocking thread pool with at most
//! `config.concurrency` in flight. A page whose text could not be produced is
//! classified as empty and listed in `stats.skipped_pages`; it never aborts
//! the pass.

use crate::config::ExtractionConfig;
use crate::error::{DocflowError, PageError};
use crate::export::{self, ExportFormat, ExportOptions};
use crate::output::{ExtractionOutput, ExtractionStats, PageRows};
use crate::pipeline::classify::{Classifier, SectionState};
use crate::pipeline::{input, outline, pages};
use crate::pipeline::pages::PageText;
use crate::progress::ProgressCallback;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Row label used when neither the config nor the input supplies a name.
pub const DEFAULT_SOURCE_NAME: &str = "document.md";

/// Extract rows from a Markdown file or URL.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input`  — Local file path or HTTP/HTTPS URL to a Markdown document
/// * `config` — Extraction configuration
///
/// # Returns
/// `Ok(ExtractionOutput)` on success, even if some pages were skipped
/// (check `output.stats.skipped_pages`).
///
/// # Errors
/// Returns `Err(DocflowError)` only for fatal errors:
/// - File not found / permission denied / download failure
/// - Input is a raw PDF rather than Markdown
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, DocflowError> {
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let source_file = config
        .source_name
        .clone()
        .unwrap_or_else(|| resolved.name.clone());

    // ── Step 2: Split into pages ─────────────────────────────────────────
    let page_texts = pages::split_pages(&resolved.bytes, config.page_split);
    debug!(
        "Split {} bytes into {} page segment(s) ({:?})",
        resolved.bytes.len(),
        page_texts.len(),
        config.page_split
    );

    // ── Step 3: Classify + enrich ────────────────────────────────────────
    Ok(run_pages(page_texts, &source_file, config).await)
}

/// Classify pages delivered by any text producer.
///
/// Rows carry `config.source_name`, or [`DEFAULT_SOURCE_NAME`] when unset.
/// Outline enrichment is applied when `config.outline` is set.
pub async fn extract_pages(page_texts: Vec<PageText>, config: &ExtractionConfig) -> ExtractionOutput {
    let source_file = config
        .source_name
        .clone()
        .unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string());
    run_pages(page_texts, &source_file, config).await
}

/// Classify in-memory Markdown on the current thread.
///
/// No runtime is needed; pages are classified one after another. Splitting,
/// enrichment and progress events behave exactly as in [`extract`].
///
/// # Example
/// ```rust
/// use docflow::{extract_str, ExtractionConfig, SectionType};
///
/// let out = extract_str("# Intro\nHello there. Second one.", "notes.md", &ExtractionConfig::default());
/// assert_eq!(out.rows.len(), 3);
/// assert_eq!(out.rows[0].section_type, SectionType::Heading);
/// assert_eq!(out.rows[2].section_path, "Intro");
/// ```
pub fn extract_str(markdown: &str, source_file: &str, config: &ExtractionConfig) -> ExtractionOutput {
    let start = Instant::now();
    let page_texts = pages::split_pages(markdown.as_bytes(), config.page_split);
    let classifier = Classifier::new(config.classifier.clone());
    let total = page_texts.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(total);
    }
    let results: Vec<PageRows> = page_texts
        .into_iter()
        .map(|page| classify_page(&classifier, page, source_file, total, config.progress_callback.as_ref()))
        .collect();

    assemble(results, source_file, config, start)
}

/// Extract and write rows directly to a file.
///
/// The format follows the output extension (see [`ExportFormat::from_path`])
/// and the write is atomic (temp file + rename).
pub async fn extract_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    options: &ExportOptions,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, DocflowError> {
    let output = extract(input_str, config).await?;
    let path = output_path.as_ref();
    let format = ExportFormat::from_path(path).unwrap_or_default();
    export::write_file(path, &output.rows, format, options)?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, DocflowError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocflowError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_pages(page_texts: Vec<PageText>, source_file: &str, config: &ExtractionConfig) -> ExtractionOutput {
    let start = Instant::now();
    let total = page_texts.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(total);
    }

    let classifier = Arc::new(Classifier::new(config.classifier.clone()));
    let source: Arc<str> = Arc::from(source_file);
    let results: Vec<PageRows> = stream::iter(page_texts.into_iter().map(|page| {
        spawn_page(
            Arc::clone(&classifier),
            page,
            Arc::clone(&source),
            total,
            config.progress_callback.clone(),
        )
    }))
    .buffered(config.concurrency.max(1))
    .collect()
    .await;

    assemble(results, source_file, config, start)
}

/// Classify one page on the blocking pool.
///
/// A panicking or cancelled task becomes a [`PageError::TaskFailed`] for that
/// page only.
pub(crate) async fn spawn_page(
    classifier: Arc<Classifier>,
    page: PageText,
    source_file: Arc<str>,
    total_pages: usize,
    callback: Option<ProgressCallback>,
) -> PageRows {
    let page_no = page.page_no;
    let cb = callback.clone();
    let task = tokio::task::spawn_blocking(move || {
        classify_page(&classifier, page, &source_file, total_pages, callback.as_ref())
    });

    match task.await {
        Ok(result) => result,
        Err(e) => {
            let error = PageError::TaskFailed {
                page: page_no,
                detail: e.to_string(),
            };
            warn!("{}", error);
            if let Some(cb) = cb {
                cb.on_page_error(page_no, total_pages, &error.to_string());
            }
            PageRows {
                page_no,
                rows: Vec::new(),
                error: Some(error),
            }
        }
    }
}

/// Classify one page with fresh section state, firing progress events.
fn classify_page(
    classifier: &Classifier,
    page: PageText,
    source_file: &str,
    total_pages: usize,
    callback: Option<&ProgressCallback>,
) -> PageRows {
    let page_no = page.page_no;

    if let Some(error) = page.error {
        warn!("Skipping page {}: {}", page_no, error);
        if let Some(cb) = callback {
            cb.on_page_error(page_no, total_pages, &error.to_string());
        }
        return PageRows {
            page_no,
            rows: Vec::new(),
            error: Some(error),
        };
    }

    if let Some(cb) = callback {
        cb.on_page_start(page_no, total_pages);
    }
    let mut state = SectionState::default();
    let rows = classifier.classify_with_state(&mut state, &page.text, source_file, page_no);
    debug!("Page {}: {} rows", page_no, rows.len());
    if let Some(cb) = callback {
        cb.on_page_complete(page_no, total_pages, rows.len());
    }

    PageRows {
        page_no,
        rows,
        error: None,
    }
}

/// Flatten per-page results in page order, enrich, and compute stats.
fn assemble(
    mut results: Vec<PageRows>,
    source_file: &str,
    config: &ExtractionConfig,
    start: Instant,
) -> ExtractionOutput {
    // Stable: segments sharing a page number keep producer order.
    results.sort_by_key(|p| p.page_no);

    let total_pages = results.len();
    let skipped_pages: Vec<usize> = results
        .iter()
        .filter(|p| p.error.is_some())
        .map(|p| p.page_no)
        .collect();
    let page_count = results.iter().map(|p| p.page_no).max().unwrap_or(0);
    let mut rows: Vec<_> = results.into_iter().flat_map(|p| p.rows).collect();

    // ── Outline enrichment ───────────────────────────────────────────────
    // Rows with page_no 0 carry no page and are left alone by enrich_rows.
    let enriched_rows = match config.outline.as_deref() {
        Some(entries) => {
            let ranges = outline::outline_ranges(entries, page_count);
            outline::enrich_rows(&mut rows, &ranges)
        }
        None => 0,
    };

    let mut stats = ExtractionStats {
        total_pages,
        processed_pages: total_pages - skipped_pages.len(),
        skipped_pages,
        enriched_rows,
        ..Default::default()
    };
    stats.tally(&rows);
    stats.duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Extraction complete: {} rows from {}/{} pages, {}ms",
        stats.total_rows, stats.processed_pages, stats.total_pages, stats.duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(stats.total_pages, stats.processed_pages);
    }

    ExtractionOutput {
        source_file: source_file.to_string(),
        rows,
        stats,
    }
}
