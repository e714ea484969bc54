//! Result types returned by the extraction entry points.

use crate::error::{DocflowError, PageError};
use crate::row::{Row, SectionType};
use serde::{Deserialize, Serialize};

/// Rows produced from one page segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRows {
    /// 1-based page number, or 0 in whole-document mode.
    pub page_no: usize,
    /// Rows in line order.
    pub rows: Vec<Row>,
    /// Set when the page was skipped; `rows` is then empty.
    pub error: Option<PageError>,
}

/// Complete result of an extraction pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Label written to every row's `source_file`.
    pub source_file: String,
    /// All rows, in page order then line order.
    pub rows: Vec<Row>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// Convert to `Err` when any page was skipped.
    ///
    /// Useful for callers that prefer all-or-nothing semantics over the
    /// default "skip bad pages and carry on".
    pub fn into_result(self) -> Result<Self, DocflowError> {
        if self.stats.skipped_pages.is_empty() {
            Ok(self)
        } else {
            Err(DocflowError::PagesSkipped {
                skipped: self.stats.skipped_pages,
                total: self.stats.total_pages,
            })
        }
    }
}

/// Counters for an extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Page segments delivered by the producer.
    pub total_pages: usize,
    /// Segments that were classified.
    pub processed_pages: usize,
    /// Page numbers that failed upstream and were treated as empty.
    pub skipped_pages: Vec<usize>,
    pub total_rows: usize,
    pub heading_rows: usize,
    pub bullet_rows: usize,
    pub table_rows: usize,
    pub text_rows: usize,
    /// Rows whose headings were filled from the outline.
    pub enriched_rows: usize,
    pub duration_ms: u64,
}

impl ExtractionStats {
    /// Count rows by section type into the `*_rows` fields.
    pub fn tally(&mut self, rows: &[Row]) {
        self.total_rows = rows.len();
        self.heading_rows = 0;
        self.bullet_rows = 0;
        self.table_rows = 0;
        self.text_rows = 0;
        for row in rows {
            match row.section_type {
                SectionType::Heading => self.heading_rows += 1,
                SectionType::Bullet => self.bullet_rows += 1,
                SectionType::Table => self.table_rows += 1,
                SectionType::Text => self.text_rows += 1,
            }
        }
    }
}
