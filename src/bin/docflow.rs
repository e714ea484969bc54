//! CLI binary for docflow.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` / `ExportOptions`, runs the extraction and writes rows.

use anyhow::{Context, Result};
use clap::Parser;
use docflow::export::{self, ExportFormat, ExportMetadata, ExportOptions};
use docflow::pipeline::outline::load_outline;
use docflow::{
    extract, ExtractionConfig, ExtractionProgressCallback, ExtractionStats, PageSplit, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
/// Page callbacks arrive from blocking-pool threads, possibly out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_extraction_start` reports the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading input…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Classifying");
    }

    fn page_elapsed_ms(&self, page_no: usize) -> u128 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&page_no))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
    }

    fn on_page_start(&self, page_no: usize, _total: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(page_no, Instant::now());
        }
        self.bar.set_message(format!("page {page_no}"));
    }

    fn on_page_complete(&self, page_no: usize, total: usize, row_count: usize) {
        let elapsed_ms = self.page_elapsed_ms(page_no);
        if total > 1 {
            self.bar.println(format!(
                "  {} Page {:>3}/{:<3}  {:<8}  {}",
                green("✓"),
                page_no,
                total,
                dim(&format!("{row_count:>5} rows")),
                dim(&format!("{elapsed_ms}ms")),
            ));
        }
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_no: usize, total: usize, error: &str) {
        self.page_elapsed_ms(page_no);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['…']).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_no,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, _total_pages: usize, _success_count: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # JSON Lines to stdout, whole document as page 0
  docflow report.md

  # CSV with page numbers from <!-- page N --> separators
  docflow --split comment report.md -o rows.csv

  # Heuristic headings, outline enrichment, spreadsheet headers
  docflow --split formfeed --heuristics --outline outline.json \
          --display-headers report.txt -o rows.csv

  # Tag every row with document metadata
  docflow --company Acme --year 2023 --doc-type "Sustainability Report" \
          report.md -o rows.json

PAGE SPLITTING:
  whole     one segment, every row has page 0 (default)
  formfeed  pages separated by \f, numbered from 1 (pdftotext output)
  comment   "<!-- page N -->" lines start page N

OUTLINE FILE:
  JSON array of bookmarks: [{"level": 1, "title": "Overview", "page": 1}, ...]
  Only empty h1/h2/h3 fields of paged rows are filled.
"#;

/// Classify Markdown reports into section-tagged rows.
#[derive(Parser, Debug)]
#[command(
    name = "docflow",
    version,
    about = "Classify Markdown reports into section-tagged rows",
    long_about = "Turn converted Markdown documents (local files or URLs) into typed rows: \
headings, bullets, table lines and sentences, each tagged with its page and h1/h2/h3 section. \
Writes CSV, JSON or JSON Lines.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local Markdown file path or HTTP/HTTPS URL.
    input: String,

    /// Write rows to this file instead of stdout.
    #[arg(short, long, env = "DOCFLOW_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format. Default: from the output extension, else jsonl.
    #[arg(long, env = "DOCFLOW_FORMAT", value_enum)]
    format: Option<FormatArg>,

    /// Page splitting: whole, formfeed, comment.
    #[arg(long, env = "DOCFLOW_SPLIT", value_enum, default_value = "whole")]
    split: SplitArg,

    /// Also detect headings from numbering and capitalisation.
    #[arg(long, env = "DOCFLOW_HEURISTICS")]
    heuristics: bool,

    /// Label written to every row's source_file. Default: input file name.
    #[arg(long, env = "DOCFLOW_SOURCE_NAME")]
    source_name: Option<String>,

    /// JSON outline used to fill missing headings on paged rows.
    #[arg(long, env = "DOCFLOW_OUTLINE")]
    outline: Option<PathBuf>,

    /// Company name added as a metadata column.
    #[arg(long, env = "DOCFLOW_COMPANY")]
    company: Option<String>,

    /// Report year added as a metadata column.
    #[arg(long, env = "DOCFLOW_YEAR")]
    year: Option<String>,

    /// Document type added as a metadata column.
    #[arg(long, env = "DOCFLOW_DOC_TYPE")]
    doc_type: Option<String>,

    /// Use display names (Source, Line_No, …) as CSV headers.
    #[arg(long, env = "DOCFLOW_DISPLAY_HEADERS")]
    display_headers: bool,

    /// Number of pages classified in parallel.
    #[arg(short, long, env = "DOCFLOW_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOCFLOW_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "DOCFLOW_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCFLOW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCFLOW_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Csv,
    Json,
    Jsonl,
}

impl From<FormatArg> for ExportFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Jsonl => ExportFormat::Jsonl,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SplitArg {
    Whole,
    Formfeed,
    Comment,
}

impl From<SplitArg> for PageSplit {
    fn from(v: SplitArg) -> Self {
        match v {
            SplitArg::Whole => PageSplit::Whole,
            SplitArg::Formfeed => PageSplit::FormFeed,
            SplitArg::Comment => PageSplit::Comment,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs are hidden while the progress bar is drawing.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let options = build_export_options(&cli);
    let format = resolve_format(&cli);

    // ── Run extraction ───────────────────────────────────────────────────
    let output = extract(&cli.input, &config)
        .await
        .context("Extraction failed")?;

    // ── Write rows ───────────────────────────────────────────────────────
    if let Some(ref path) = cli.output {
        export::write_file(path, &output.rows, format, &options)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        export::write_rows(&mut handle, &output.rows, format, &options)
            .context("Failed to write to stdout")?;
        handle.flush().context("Failed to write to stdout")?;
    }

    // ── Summary ──────────────────────────────────────────────────────────
    if !cli.quiet {
        let target = cli
            .output
            .as_ref()
            .map_or_else(|| "stdout".to_string(), |p| p.display().to_string());
        for line in summary_lines(&output.stats, &target) {
            eprintln!("{line}");
        }
    }

    Ok(())
}

/// The end-of-run report printed to stderr; the progress bar prints none.
fn summary_lines(stats: &ExtractionStats, target: &str) -> Vec<String> {
    let mark = if stats.skipped_pages.is_empty() {
        green("✔")
    } else if stats.processed_pages == 0 {
        red("✘")
    } else {
        cyan("⚠")
    };
    let mut lines = vec![
        format!(
            "{}  {} rows  {}/{} pages  {}ms  →  {}",
            mark,
            stats.total_rows,
            stats.processed_pages,
            stats.total_pages,
            stats.duration_ms,
            bold(target),
        ),
        format!(
            "   {}",
            dim(&format!(
                "{} headings / {} bullets / {} table lines / {} text",
                stats.heading_rows, stats.bullet_rows, stats.table_rows, stats.text_rows
            ))
        ),
    ];
    if !stats.skipped_pages.is_empty() {
        lines.push(format!("   skipped pages: {:?}", stats.skipped_pages));
    }
    if stats.enriched_rows > 0 {
        lines.push(format!("   {} rows enriched from outline", stats.enriched_rows));
    }
    lines
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .use_heuristics(cli.heuristics)
        .page_split(cli.split.into())
        .concurrency(cli.concurrency)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref name) = cli.source_name {
        builder = builder.source_name(name.clone());
    }
    if let Some(ref path) = cli.outline {
        let entries = load_outline(path).context("Failed to load outline")?;
        builder = builder.outline(entries);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn build_export_options(cli: &Cli) -> ExportOptions {
    ExportOptions {
        metadata: ExportMetadata {
            company: cli.company.clone(),
            year: cli.year.clone(),
            document_type: cli.doc_type.clone(),
        },
        display_headers: cli.display_headers,
        reclean: false,
    }
}

/// `--format` wins, then the output extension, then JSON Lines.
fn resolve_format(cli: &Cli) -> ExportFormat {
    cli.format
        .map(ExportFormat::from)
        .or_else(|| cli.output.as_deref().and_then(ExportFormat::from_path))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "docflow",
            "report.md",
            "--split",
            "comment",
            "--heuristics",
            "-o",
            "rows.csv",
            "--company",
            "Acme",
        ])
        .unwrap();
        assert!(cli.heuristics);
        assert!(matches!(cli.split, SplitArg::Comment));
        assert_eq!(resolve_format(&cli), ExportFormat::Csv);
        assert_eq!(build_export_options(&cli).metadata.company.as_deref(), Some("Acme"));
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let cli = Cli::try_parse_from(["docflow", "r.md", "-o", "rows.csv", "--format", "json"]).unwrap();
        assert_eq!(resolve_format(&cli), ExportFormat::Json);

        let cli = Cli::try_parse_from(["docflow", "r.md"]).unwrap();
        assert_eq!(resolve_format(&cli), ExportFormat::Jsonl);
    }

    #[test]
    fn build_config_maps_args() {
        let cli = Cli::try_parse_from(["docflow", "r.md", "--split", "formfeed", "-c", "2"]).unwrap();
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.page_split, PageSplit::FormFeed);
        assert_eq!(config.concurrency, 2);
        assert!(!config.classifier.use_heuristics);
    }

    #[test]
    fn progress_bar_finishes_without_own_summary() {
        let cb = CliProgressCallback::new_dynamic();
        cb.on_extraction_start(2);
        cb.on_page_start(1, 2);
        cb.on_page_complete(1, 2, 5);
        cb.on_page_error(2, 2, "invalid UTF-8");
        cb.on_extraction_complete(2, 1);
        assert!(cb.bar.is_finished());
    }

    #[test]
    fn summary_reports_skips_once() {
        let stats = ExtractionStats {
            total_pages: 3,
            processed_pages: 2,
            skipped_pages: vec![2],
            total_rows: 7,
            ..Default::default()
        };
        let lines = summary_lines(&stats, "rows.csv");
        assert_eq!(lines.iter().filter(|l| l.contains("7 rows")).count(), 1);
        assert!(lines[0].contains("2/3 pages"));
        assert!(lines.iter().any(|l| l.contains("skipped pages: [2]")));
        assert!(!lines.iter().any(|l| l.contains("enriched")));
    }
}
