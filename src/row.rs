//! The row schema shared by the classifier, the enrichment step and every
//! exporter.
//!
//! A [`Row`] is one classified line (or one sentence of a plain-text line)
//! together with where it came from and which section it sits in. Rows are
//! immutable once the classifier emits them; the only sanctioned mutation is
//! outline enrichment, which goes through [`Row::fill_empty_headings`] so the
//! section path can never drift from the heading fields.

use crate::pipeline::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used when rendering a heading stack as a section path.
pub const SECTION_PATH_SEPARATOR: &str = " > ";

/// The kind of content a row carries. Exactly one applies to every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Heading,
    Bullet,
    Table,
    Text,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Heading => "heading",
            SectionType::Bullet => "bullet",
            SectionType::Table => "table",
            SectionType::Text => "text",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Label of the originating document, passed through untouched.
    pub source_file: String,
    /// 1-based line index within the text handed to the classifier.
    pub line_no: usize,
    /// 1-based page, or 0 in whole-document mode.
    pub page_no: usize,
    pub section_type: SectionType,
    /// 1–6 for headings, 0 for everything else.
    pub heading_level: u8,
    /// `true` iff `section_type == Table`.
    pub is_table: bool,
    pub h1: String,
    pub h2: String,
    pub h3: String,
    /// `h1 > h2 > h3` with empty entries omitted. Derived; see
    /// [`Row::recompute_section_path`].
    pub section_path: String,
    /// Most recent heading text at any level, forward-filled.
    pub current_section: String,
    /// Cleaned, trimmed content.
    pub text: String,
}

impl Row {
    /// Recompute `section_path` from the current `h1`/`h2`/`h3`.
    pub fn recompute_section_path(&mut self) {
        self.section_path = section_path(&self.h1, &self.h2, &self.h3);
    }

    /// Fill whichever of `h1`/`h2`/`h3` are currently empty, then refresh the
    /// section path. Non-empty fields are never overwritten.
    ///
    /// Returns `true` if any field changed.
    pub fn fill_empty_headings(&mut self, h1: &str, h2: &str, h3: &str) -> bool {
        let mut changed = false;
        for (slot, value) in [(&mut self.h1, h1), (&mut self.h2, h2), (&mut self.h3, h3)] {
            if slot.is_empty() && !value.is_empty() {
                *slot = value.to_string();
                changed = true;
            }
        }
        if changed {
            self.recompute_section_path();
        }
        changed
    }

    /// Re-run the normalizer over every free-text field.
    ///
    /// Used when rows produced by an older release (or edited by hand) are
    /// cleaned again before export. The section path is rebuilt from the
    /// cleaned headings rather than normalized on its own.
    pub fn reclean(&mut self) {
        self.text = normalize(&self.text);
        self.current_section = normalize(&self.current_section);
        self.h1 = normalize(&self.h1);
        self.h2 = normalize(&self.h2);
        self.h3 = normalize(&self.h3);
        self.recompute_section_path();
    }
}

/// Join the non-empty heading levels with [`SECTION_PATH_SEPARATOR`].
pub fn section_path(h1: &str, h2: &str, h3: &str) -> String {
    [h1, h2, h3]
        .into_iter()
        .filter(|h| !h.is_empty())
        .collect::<Vec<_>>()
        .join(SECTION_PATH_SEPARATOR)
}
