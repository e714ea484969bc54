//! Streaming extraction API: emit each page's rows as soon as it is classified.
//!
//! Unlike the eager [`crate::extract::extract`] which returns only after all
//! pages finish, [`extract_stream`] yields [`PageRows`] items via a `Stream`.
//! Pages are still classified concurrently on the blocking pool, but the
//! stream is ordered: items always arrive in page order, so a consumer can
//! write rows straight to disk without re-sorting.
//!
//! Progress callbacks see the same events as the eager path;
//! `on_extraction_complete` fires once the last page has been yielded.
//!
//! Outline enrichment needs the final page count and is therefore not applied
//! here; call [`crate::pipeline::outline::enrich_rows`] on the collected rows
//! if you need it.

use crate::config::ExtractionConfig;
use crate::error::{DocflowError, PageError};
use crate::extract::spawn_page;
use crate::output::PageRows;
use crate::pipeline::classify::Classifier;
use crate::pipeline::pages::PageText;
use crate::pipeline::{input, pages};
use futures::future;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-page results.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageRows, PageError>> + Send>>;

/// Extract rows from a Markdown file or URL, streaming pages in page order.
///
/// # Returns
/// - `Ok(PageStream)` — a stream of `Result<PageRows, PageError>`; a skipped
///   page is an `Err` item and the stream continues with the next page
/// - `Err(DocflowError)` — fatal error (file not found, raw PDF, etc.)
///
/// # Example
/// ```rust,no_run
/// use docflow::{extract_stream, ExtractionConfig, PageSplit};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::builder().page_split(PageSplit::Comment).build()?;
/// let mut stream = extract_stream("report.md", &config).await?;
/// while let Some(page) = stream.next().await {
///     match page {
///         Ok(p) => println!("Page {}: {} rows", p.page_no, p.rows.len()),
///         Err(e) => eprintln!("Skipped: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn extract_stream(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<PageStream, DocflowError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming extraction: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let source_file = config
        .source_name
        .clone()
        .unwrap_or_else(|| resolved.name.clone());
    let page_texts = pages::split_pages(&resolved.bytes, config.page_split);

    Ok(stream_pages(page_texts, &source_file, config))
}

/// Stream rows for pages delivered by any text producer.
///
/// Pages are emitted in the order given; sort `page_texts` first if the
/// producer does not deliver them in page order.
pub fn stream_pages(page_texts: Vec<PageText>, source_file: &str, config: &ExtractionConfig) -> PageStream {
    let total = page_texts.len();
    let classifier = Arc::new(Classifier::new(config.classifier.clone()));
    let source: Arc<str> = Arc::from(source_file);
    let callback = config.progress_callback.clone();
    let done_callback = callback.clone();
    let succeeded = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&succeeded);

    if let Some(ref cb) = callback {
        cb.on_extraction_start(total);
    }

    let pages = stream::iter(page_texts.into_iter().map(move |page| {
        spawn_page(
            Arc::clone(&classifier),
            page,
            Arc::clone(&source),
            total,
            callback.clone(),
        )
    }))
    .buffered(config.concurrency.max(1))
    .map(move |mut page| match page.error.take() {
        Some(err) => Err(err),
        None => {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(page)
        }
    });

    let finish = stream::once(async move {
        let done = succeeded.load(Ordering::Relaxed);
        info!("Streaming extraction complete: {}/{} pages", done, total);
        if let Some(cb) = done_callback {
            cb.on_extraction_complete(total, done);
        }
        None
    })
    .filter_map(future::ready);

    Box::pin(pages.chain(finish))
}
