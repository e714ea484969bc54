//! Row export: CSV, pretty JSON and JSON Lines.
//!
//! Column order is stable across releases so downstream spreadsheets and
//! loaders can address columns by position:
//!
//! ```text
//! [Company, Year, Document Type,]  source_file, line_no, page_no, section_type,
//! heading_level, is_table, section_path, current_section, text, h1, h2, h3
//! ```
//!
//! The bracketed metadata columns only appear when [`ExportMetadata`] carries
//! at least one value. CSV headers use either the raw field names or the
//! display names from [`DISPLAY_HEADERS`]; JSON output always uses raw names.

use crate::error::DocflowError;
use crate::row::Row;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Raw field names in export order.
pub const FIELD_HEADERS: [&str; 12] = [
    "source_file",
    "line_no",
    "page_no",
    "section_type",
    "heading_level",
    "is_table",
    "section_path",
    "current_section",
    "text",
    "h1",
    "h2",
    "h3",
];

/// Human-readable column names, index-aligned with [`FIELD_HEADERS`].
pub const DISPLAY_HEADERS: [&str; 12] = [
    "Source",
    "Line_No",
    "Page_No",
    "Section Type",
    "Heading Level",
    "Is Table",
    "Section",
    "Current Section",
    "Text",
    "H1",
    "H2",
    "H3",
];

/// Metadata column names, in export order.
pub const METADATA_HEADERS: [&str; 3] = ["Company", "Year", "Document Type"];

/// Output serialisation format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    /// Pretty-printed JSON array.
    Json,
    /// One JSON object per line. (default)
    #[default]
    Jsonl,
}

impl ExportFormat {
    /// Infer the format from a file extension (`.csv`, `.json`, `.jsonl`,
    /// `.ndjson`), case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        ext.parse().ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Jsonl => "jsonl",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = DocflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "jsonl" | "ndjson" => Ok(ExportFormat::Jsonl),
            other => Err(DocflowError::InvalidConfig(format!(
                "Unknown export format '{other}' (expected csv, json or jsonl)"
            ))),
        }
    }
}

/// Document-level values repeated on every exported row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub company: Option<String>,
    pub year: Option<String>,
    pub document_type: Option<String>,
}

impl ExportMetadata {
    pub fn is_empty(&self) -> bool {
        self.company.is_none() && self.year.is_none() && self.document_type.is_none()
    }

    fn values(&self) -> [&str; 3] {
        [
            self.company.as_deref().unwrap_or(""),
            self.year.as_deref().unwrap_or(""),
            self.document_type.as_deref().unwrap_or(""),
        ]
    }
}

/// How rows are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub metadata: ExportMetadata,
    /// Use [`DISPLAY_HEADERS`] instead of raw field names in CSV headers.
    pub display_headers: bool,
    /// Run [`Row::reclean`] on every row before writing.
    pub reclean: bool,
}

/// Serialise `rows` into `writer`.
pub fn write_rows<W: Write>(
    writer: W,
    rows: &[Row],
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<(), DocflowError> {
    let recleaned;
    let rows = if options.reclean {
        recleaned = rows
            .iter()
            .cloned()
            .map(|mut r| {
                r.reclean();
                r
            })
            .collect::<Vec<_>>();
        recleaned.as_slice()
    } else {
        rows
    };

    match format {
        ExportFormat::Csv => write_csv(writer, rows, options),
        ExportFormat::Json => write_json(writer, rows, options),
        ExportFormat::Jsonl => write_jsonl(writer, rows, options),
    }
}

/// Serialise `rows` into an in-memory buffer.
pub fn to_bytes(rows: &[Row], format: ExportFormat, options: &ExportOptions) -> Result<Vec<u8>, DocflowError> {
    let mut buf = Vec::new();
    write_rows(&mut buf, rows, format, options)?;
    Ok(buf)
}

/// Write `rows` to `path` atomically.
///
/// Rows are written to a temp file in the destination directory, which is
/// then renamed over `path`, so readers never observe a partial file.
pub fn write_file(
    path: &Path,
    rows: &[Row],
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<(), DocflowError> {
    let write_err = |source: std::io::Error| DocflowError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    write_rows(&mut tmp, rows, format, options)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!("Wrote {} rows as {} to {}", rows.len(), format.as_str(), path.display());
    Ok(())
}

// ── CSV ──────────────────────────────────────────────────────────────────

fn write_csv<W: Write>(writer: W, rows: &[Row], options: &ExportOptions) -> Result<(), DocflowError> {
    let csv_err = |e: csv::Error| DocflowError::ExportFailed {
        format: "csv".into(),
        detail: e.to_string(),
    };
    let with_meta = !options.metadata.is_empty();
    let mut wtr = csv::Writer::from_writer(writer);

    let headers = if options.display_headers {
        DISPLAY_HEADERS
    } else {
        FIELD_HEADERS
    };
    let mut header: Vec<&str> = Vec::with_capacity(15);
    if with_meta {
        header.extend(METADATA_HEADERS);
    }
    header.extend(headers);
    wtr.write_record(&header).map_err(csv_err)?;

    let meta = options.metadata.values();
    for row in rows {
        let line_no = row.line_no.to_string();
        let page_no = row.page_no.to_string();
        let heading_level = row.heading_level.to_string();
        let fields: [&str; 12] = [
            row.source_file.as_str(),
            &line_no,
            &page_no,
            row.section_type.as_str(),
            &heading_level,
            if row.is_table { "1" } else { "0" },
            &row.section_path,
            &row.current_section,
            &row.text,
            &row.h1,
            &row.h2,
            &row.h3,
        ];
        if with_meta {
            wtr.write_record(meta.iter().chain(fields.iter()))
                .map_err(csv_err)?;
        } else {
            wtr.write_record(fields).map_err(csv_err)?;
        }
    }

    wtr.flush().map_err(|e| DocflowError::ExportFailed {
        format: "csv".into(),
        detail: e.to_string(),
    })
}

// ── JSON ─────────────────────────────────────────────────────────────────

/// A row as exported to JSON, with optional metadata fields ahead of it.
#[derive(Serialize)]
struct JsonRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    company: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_type: Option<&'a str>,
    #[serde(flatten)]
    row: &'a Row,
}

impl<'a> JsonRecord<'a> {
    fn new(row: &'a Row, meta: &'a ExportMetadata) -> Self {
        Self {
            company: meta.company.as_deref(),
            year: meta.year.as_deref(),
            document_type: meta.document_type.as_deref(),
            row,
        }
    }
}

fn json_err(e: serde_json::Error) -> DocflowError {
    DocflowError::ExportFailed {
        format: "json".into(),
        detail: e.to_string(),
    }
}

fn io_err(e: std::io::Error) -> DocflowError {
    DocflowError::ExportFailed {
        format: "json".into(),
        detail: e.to_string(),
    }
}

fn write_json<W: Write>(mut writer: W, rows: &[Row], options: &ExportOptions) -> Result<(), DocflowError> {
    let records: Vec<JsonRecord<'_>> = rows
        .iter()
        .map(|r| JsonRecord::new(r, &options.metadata))
        .collect();
    serde_json::to_writer_pretty(&mut writer, &records).map_err(json_err)?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)
}

fn write_jsonl<W: Write>(mut writer: W, rows: &[Row], options: &ExportOptions) -> Result<(), DocflowError> {
    for row in rows {
        serde_json::to_writer(&mut writer, &JsonRecord::new(row, &options.metadata)).map_err(json_err)?;
        writer.write_all(b"\n").map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::classify::classify;

    fn sample_rows() -> Vec<Row> {
        classify("# Intro\n| a | b |\nSome text here.", "r.md", 2, false)
    }

    fn csv_lines(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn csv_header_order_raw() {
        let out = to_bytes(&sample_rows(), ExportFormat::Csv, &ExportOptions::default()).unwrap();
        let lines = csv_lines(out);
        assert_eq!(
            lines[0],
            "source_file,line_no,page_no,section_type,heading_level,is_table,section_path,current_section,text,h1,h2,h3"
        );
        assert_eq!(lines[1], "r.md,1,2,heading,1,0,Intro,Intro,Intro,Intro,,");
        assert_eq!(lines[2], "r.md,2,2,table,0,1,Intro,Intro,a | b,Intro,,");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn csv_display_headers_with_metadata() {
        let options = ExportOptions {
            metadata: ExportMetadata {
                company: Some("Acme".into()),
                year: Some("2023".into()),
                document_type: None,
            },
            display_headers: true,
            reclean: false,
        };
        let lines = csv_lines(to_bytes(&sample_rows(), ExportFormat::Csv, &options).unwrap());
        assert!(lines[0].starts_with("Company,Year,Document Type,Source,Line_No,Page_No,Section Type"));
        assert!(lines[0].ends_with("Section,Current Section,Text,H1,H2,H3"));
        assert!(lines[1].starts_with("Acme,2023,,r.md,1,2,heading"));
    }

    #[test]
    fn csv_empty_rows_still_has_header() {
        let lines = csv_lines(to_bytes(&[], ExportFormat::Csv, &ExportOptions::default()).unwrap());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("source_file,"));
    }

    #[test]
    fn jsonl_one_object_per_row() {
        let out = to_bytes(&sample_rows(), ExportFormat::Jsonl, &ExportOptions::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let objects: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(objects.len(), 3);
        assert_eq!(objects[1]["section_type"], "table");
        assert_eq!(objects[1]["is_table"], true);
        assert!(objects[0].get("company").is_none());
    }

    #[test]
    fn json_array_carries_metadata() {
        let options = ExportOptions {
            metadata: ExportMetadata {
                company: Some("Acme".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let out = to_bytes(&sample_rows(), ExportFormat::Json, &options).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr[2]["company"], "Acme");
        assert_eq!(arr[2]["text"], "Some text here.");
    }

    #[test]
    fn reclean_option_normalizes_before_writing() {
        let mut rows = sample_rows();
        rows[2].text = "Fish &amp; chips".into();
        let options = ExportOptions {
            reclean: true,
            ..Default::default()
        };
        let out = to_bytes(&rows, ExportFormat::Jsonl, &options).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Fish & chips"));
    }

    #[test]
    fn format_from_path_and_str() {
        assert_eq!(ExportFormat::from_path(Path::new("out/rows.CSV")), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path(Path::new("rows.ndjson")), Some(ExportFormat::Jsonl));
        assert_eq!(ExportFormat::from_path(Path::new("rows.xlsx")), None);
        assert_eq!(ExportFormat::from_path(Path::new("rows")), None);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn write_file_is_atomic_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rows.csv");
        write_file(&path, &sample_rows(), ExportFormat::Csv, &ExportOptions::default()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("source_file,"));
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path() != path)
            .collect();
        assert!(leftovers.is_empty(), "temp file left behind");
    }
}
