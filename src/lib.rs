//! # docflow
//!
//! Turn converted Markdown reports into typed, section-tagged rows.
//!
//! ## Why this crate?
//!
//! PDF-to-Markdown converters get the words right but leave the structure
//! implicit: headings come and go, captions repeat, tables are pipe soup.
//! Analysts want a flat table instead, one row per heading, bullet, table line
//! or sentence, each labelled with the `h1 > h2 > h3` section it sits in and
//! the page it came from. This crate produces exactly that, with a
//! deterministic text normalizer applied to every field.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Input     read local file or download from URL
//!  ├─ 2. Pages     split on form feeds or <!-- page N --> markers
//!  ├─ 3. Classify  heading / table / bullet / text rows (spawn_blocking)
//!  ├─ 4. Enrich    fill missing headings from the PDF outline
//!  └─ 5. Export    CSV / JSON / JSON Lines + per-page stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docflow::{extract, ExtractionConfig, PageSplit};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .page_split(PageSplit::Comment)
//!         .use_heuristics(true)
//!         .build()?;
//!     let output = extract("report.md", &config).await?;
//!     for row in &output.rows {
//!         println!("{:>3} {:<8} {} | {}", row.page_no, row.section_type.as_str(), row.section_path, row.text);
//!     }
//!     eprintln!("{} rows, {} pages skipped", output.stats.total_rows, output.stats.skipped_pages.len());
//!     Ok(())
//! }
//! ```
//!
//! For text already in memory, [`classify`] and [`normalize`] are plain
//! synchronous functions.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docflow` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docflow = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod row;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClassifierConfig, ExtractionConfig, ExtractionConfigBuilder, PageSplit};
pub use error::{DocflowError, PageError};
pub use export::{ExportFormat, ExportMetadata, ExportOptions};
pub use extract::{extract, extract_pages, extract_str, extract_sync, extract_to_file};
pub use output::{ExtractionOutput, ExtractionStats, PageRows};
pub use pipeline::classify::{classify, Classifier, SectionState};
pub use pipeline::normalize::{normalize, Normalizer};
pub use pipeline::outline::OutlineEntry;
pub use pipeline::pages::PageText;
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use row::{Row, SectionType};
pub use stream::{extract_stream, stream_pages, PageStream};
