//! End-to-end integration tests for docflow.
//!
//! Each test writes a small Markdown report into a temp directory, runs the
//! public API over it and checks the resulting rows, stats and exported
//! files. No network access is needed.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use docflow::export::{self, ExportFormat, ExportMetadata, ExportOptions};
use docflow::{
    extract, extract_stream, extract_sync, extract_to_file, DocflowError, ExtractionConfig,
    ExtractionProgressCallback, OutlineEntry, PageSplit, SectionType,
};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

const REPORT: &str = "\
<!-- page 1 -->
# Sustainability Report 2023
Table of Contents
## CEO Message
We made progress. Emissions fell by 12%.

<!-- page 2 -->
- Scope 1 down
- Scope 2 flat
| Metric | 2022 | 2023 |
|---|---|---|
| CO2 | 10 | 8.8 |

<!-- page 3 -->
References
Plain closing text.
";

/// Route library logs to the test harness; set RUST_LOG=docflow=debug to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn write_input(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn comment_config() -> ExtractionConfig {
    ExtractionConfig::builder()
        .page_split(PageSplit::Comment)
        .build()
        .unwrap()
}

#[derive(Default)]
struct Counting {
    started: AtomicUsize,
    completed_pages: AtomicUsize,
    rows: AtomicUsize,
    errors: AtomicUsize,
}

impl ExtractionProgressCallback for Counting {
    fn on_extraction_start(&self, total_pages: usize) {
        self.started.store(total_pages, Ordering::SeqCst);
    }
    fn on_page_complete(&self, _page_no: usize, _total: usize, row_count: usize) {
        self.completed_pages.fetch_add(1, Ordering::SeqCst);
        self.rows.fetch_add(row_count, Ordering::SeqCst);
    }
    fn on_page_error(&self, _page_no: usize, _total: usize, _error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Extraction ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_extract_paged_report() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_input(dir.path(), "esg.md", REPORT.as_bytes());

    let output = extract(path.to_str().unwrap(), &comment_config()).await.unwrap();
    assert_eq!(output.source_file, "esg.md");
    assert_eq!(output.stats.total_pages, 3);
    assert!(output.stats.skipped_pages.is_empty());

    let rows = &output.rows;
    assert!(rows.iter().all(|r| r.source_file == "esg.md"));
    assert!(
        !rows.iter().any(|r| r.text.contains("Table of Contents") || r.text == "References"),
        "noise lines are dropped"
    );

    let title = &rows[0];
    assert_eq!(title.section_type, SectionType::Heading);
    assert_eq!(title.heading_level, 1);
    assert_eq!(title.page_no, 1);

    let sentences: Vec<&str> = rows
        .iter()
        .filter(|r| r.page_no == 1 && r.section_type == SectionType::Text)
        .map(|r| r.text.as_str())
        .collect();
    assert_eq!(sentences, vec!["We made progress.", "Emissions fell by 12%."]);
    let first_sentence = rows.iter().find(|r| r.text == "We made progress.").unwrap();
    assert_eq!(first_sentence.section_path, "Sustainability Report 2023 > CEO Message");

    // Page 2 starts with fresh section state.
    let bullets: Vec<_> = rows
        .iter()
        .filter(|r| r.section_type == SectionType::Bullet)
        .collect();
    assert_eq!(bullets.len(), 2);
    assert!(bullets.iter().all(|r| r.page_no == 2 && r.h1.is_empty()));
    assert_eq!(bullets[0].text, "Scope 1 down");

    let tables: Vec<_> = rows.iter().filter(|r| r.is_table).collect();
    assert_eq!(tables.len(), 3);
    assert!(tables.iter().all(|r| r.section_type == SectionType::Table));

    let last = rows.last().unwrap();
    assert_eq!((last.page_no, last.text.as_str()), (3, "Plain closing text."));
}

#[tokio::test]
async fn test_invalid_utf8_page_is_skipped() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_input(
        dir.path(),
        "broken.txt",
        b"# One\nfirst page.\x0Cbroken \xC3\x28 bytes\x0Cthird page.",
    );
    let counter = Arc::new(Counting::default());
    let config = ExtractionConfig::builder()
        .page_split(PageSplit::FormFeed)
        .progress_callback(counter.clone() as Arc<dyn ExtractionProgressCallback>)
        .build()
        .unwrap();

    let output = extract(path.to_str().unwrap(), &config).await.unwrap();
    assert_eq!(output.stats.total_pages, 3);
    assert_eq!(output.stats.skipped_pages, vec![2]);
    assert_eq!(output.stats.processed_pages, 2);
    assert!(output.rows.iter().all(|r| r.page_no != 2));
    assert_eq!(counter.started.load(Ordering::SeqCst), 3);
    assert_eq!(counter.completed_pages.load(Ordering::SeqCst), 2);
    assert_eq!(counter.errors.load(Ordering::SeqCst), 1);
    assert_eq!(counter.rows.load(Ordering::SeqCst), output.rows.len());

    let err = output.into_result().unwrap_err();
    assert!(matches!(err, DocflowError::PagesSkipped { .. }));
}

#[tokio::test]
async fn test_outline_enrichment_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_input(
        dir.path(),
        "r.md",
        b"Intro words.\x0CBoard oversight.\x0C## Risks\nClimate risk.",
    );
    let config = ExtractionConfig::builder()
        .page_split(PageSplit::FormFeed)
        .outline(vec![
            OutlineEntry { level: 1, title: "Overview".into(), page: 1 },
            OutlineEntry { level: 1, title: "Governance".into(), page: 2 },
            OutlineEntry { level: 2, title: "Board".into(), page: 2 },
        ])
        .build()
        .unwrap();

    let output = extract(path.to_str().unwrap(), &config).await.unwrap();
    let by_text = |t: &str| output.rows.iter().find(|r| r.text == t).unwrap();

    assert_eq!(by_text("Intro words.").section_path, "Overview");
    assert_eq!(by_text("Board oversight.").section_path, "Governance > Board");
    // Board still covers page 3, but the classifier's own h2 is kept.
    let risk = by_text("Climate risk.");
    assert_eq!(risk.h1, "");
    assert_eq!(risk.h2, "Risks");
    assert_eq!(risk.section_path, "Risks");
    assert_eq!(output.stats.enriched_rows, 2);
}

#[tokio::test]
async fn test_heuristic_headings_move_cursor_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_input(
        dir.path(),
        "h.md",
        b"# Report\nCLIMATE STRATEGY\nWe plan ahead.\n1.2 Targets\nNet zero by 2050.",
    );
    let config = ExtractionConfig::builder().use_heuristics(true).build().unwrap();

    let output = extract(path.to_str().unwrap(), &config).await.unwrap();
    let headings: Vec<(u8, &str)> = output
        .rows
        .iter()
        .filter(|r| r.section_type == SectionType::Heading)
        .map(|r| (r.heading_level, r.text.as_str()))
        .collect();
    assert_eq!(
        headings,
        vec![(1, "Report"), (2, "CLIMATE STRATEGY"), (2, "1.2 Targets")]
    );

    let last = output.rows.last().unwrap();
    assert_eq!(last.current_section, "1.2 Targets");
    assert_eq!(last.section_path, "Report", "heuristic headings leave h1-h3 alone");
}

#[tokio::test]
async fn test_stream_matches_eager_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_input(dir.path(), "esg.md", REPORT.as_bytes());
    let config = comment_config();

    let eager = extract(path.to_str().unwrap(), &config).await.unwrap();
    let streamed: Vec<_> = extract_stream(path.to_str().unwrap(), &config)
        .await
        .unwrap()
        .collect()
        .await;

    let streamed_rows: Vec<_> = streamed
        .into_iter()
        .flat_map(|page| page.unwrap().rows)
        .collect();
    assert_eq!(streamed_rows, eager.rows);
}

#[test]
fn test_extract_sync_whole_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_input(dir.path(), "esg.md", REPORT.as_bytes());

    let output = extract_sync(path.to_str().unwrap(), &ExtractionConfig::default()).unwrap();
    assert_eq!(output.stats.total_pages, 1);
    assert!(output.rows.iter().all(|r| r.page_no == 0));

    // Without page splitting the heading stack carries across marker lines.
    let bullet = output
        .rows
        .iter()
        .find(|r| r.section_type == SectionType::Bullet)
        .unwrap();
    assert_eq!(bullet.section_path, "Sustainability Report 2023 > CEO Message");
}

#[tokio::test]
async fn test_rejects_raw_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_input(dir.path(), "raw.pdf", b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let err = extract(path.to_str().unwrap(), &ExtractionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DocflowError::UnconvertedPdf { .. }), "got: {err}");
}

#[tokio::test]
async fn test_nonexistent_input() {
    let err = extract("/no/such/report.md", &ExtractionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DocflowError::FileNotFound { .. }));
}

// ── Export ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_extract_to_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "esg.md", REPORT.as_bytes());
    let out_path = dir.path().join("out").join("rows.csv");
    let options = ExportOptions {
        metadata: ExportMetadata {
            company: Some("Acme".into()),
            year: Some("2023".into()),
            document_type: Some("ESG".into()),
        },
        display_headers: true,
        reclean: false,
    };

    let stats = extract_to_file(input.to_str().unwrap(), &out_path, &options, &comment_config())
        .await
        .unwrap();

    let mut reader = csv::Reader::from_path(&out_path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        headers,
        vec![
            "Company", "Year", "Document Type", "Source", "Line_No", "Page_No",
            "Section Type", "Heading Level", "Is Table", "Section", "Current Section",
            "Text", "H1", "H2", "H3",
        ]
    );
    let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(records.len(), stats.total_rows);
    assert_eq!(&records[0][0], "Acme");
    assert_eq!(&records[0][3], "esg.md");
    assert!(records.iter().any(|r| &r[8] == "1"), "is_table written as 1");
}

#[test]
fn test_export_jsonl_round_trips_rows() {
    let output = docflow::extract_str(REPORT, "esg.md", &comment_config());
    let bytes = export::to_bytes(&output.rows, ExportFormat::Jsonl, &ExportOptions::default()).unwrap();

    let parsed: Vec<docflow::Row> = String::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(parsed, output.rows);
}
