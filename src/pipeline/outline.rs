//! Outline enrichment: fill missing headings from a document outline.
//!
//! Converted Markdown often loses heading markers on some pages, leaving rows
//! with an empty `h1`/`h2`/`h3`. PDF bookmarks (the outline) still say which
//! chapter each page belongs to. This stage turns an outline dump into page
//! ranges and uses them to fill the gaps.
//!
//! Enrichment runs strictly after classification and is non-destructive:
//! a heading field the classifier set is never overwritten.

use crate::error::DocflowError;
use crate::row::Row;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One outline (bookmark) entry: `level` 1 is a top-level chapter and `page`
/// is the 1-based page the entry points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: u8,
    pub title: String,
    pub page: usize,
}

/// An outline entry resolved to the inclusive page range it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRange {
    pub level: u8,
    pub title: String,
    pub start: usize,
    pub end: usize,
}

/// Read outline entries from a JSON file holding an array of
/// `{"level": 1, "title": "…", "page": 3}` objects.
pub fn load_outline(path: &Path) -> Result<Vec<OutlineEntry>, DocflowError> {
    let raw = std::fs::read_to_string(path).map_err(|e| DocflowError::InvalidOutline {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| DocflowError::InvalidOutline {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Resolve outline entries (in document order) to page ranges.
///
/// Each entry runs until the page before the next entry starts, the last one
/// until `page_count`. Starts are clamped to ≥ 1 and ends to
/// `[start, page_count]`, so a range is never empty.
pub fn outline_ranges(entries: &[OutlineEntry], page_count: usize) -> Vec<OutlineRange> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let end = entries
                .get(i + 1)
                .map_or(page_count, |next| next.page.saturating_sub(1));
            let start = entry.page.max(1);
            let end = end.min(page_count).max(start);
            OutlineRange {
                level: entry.level,
                title: entry.title.trim().to_string(),
                start,
                end,
            }
        })
        .collect()
}

/// Best `(h1, h2, h3)` for `page_no` among the ranges covering it.
///
/// Covering ranges are visited in ascending level order; the first level-1
/// title fills h1, the first level-2 title h2, the first deeper title h3.
pub fn label_for_page(ranges: &[OutlineRange], page_no: usize) -> (String, String, String) {
    let mut covering: Vec<&OutlineRange> = ranges
        .iter()
        .filter(|r| r.start <= page_no && page_no <= r.end)
        .collect();
    covering.sort_by_key(|r| r.level);

    let (mut h1, mut h2, mut h3) = (String::new(), String::new(), String::new());
    for r in covering {
        let slot = match r.level {
            0 => continue,
            1 => &mut h1,
            2 => &mut h2,
            _ => &mut h3,
        };
        if slot.is_empty() {
            *slot = r.title.clone();
        }
    }
    (h1, h2, h3)
}

/// Fill empty heading fields of paged rows from `ranges`.
///
/// Rows with `page_no == 0` (whole-document mode) are left alone. Returns the
/// number of rows that changed.
pub fn enrich_rows(rows: &mut [Row], ranges: &[OutlineRange]) -> usize {
    if ranges.is_empty() {
        return 0;
    }
    let mut changed = 0;
    for row in rows.iter_mut().filter(|r| r.page_no > 0) {
        let (h1, h2, h3) = label_for_page(ranges, row.page_no);
        if row.fill_empty_headings(&h1, &h2, &h3) {
            changed += 1;
        }
    }
    debug!("Outline enrichment updated {} of {} rows", changed, rows.len());
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::classify::classify;

    fn entry(level: u8, title: &str, page: usize) -> OutlineEntry {
        OutlineEntry {
            level,
            title: title.into(),
            page,
        }
    }

    fn sample() -> Vec<OutlineRange> {
        outline_ranges(
            &[
                entry(1, "Overview ", 1),
                entry(2, "CEO Message", 2),
                entry(1, "Environment", 4),
                entry(2, "Climate", 4),
                entry(3, "Scope 3", 5),
            ],
            6,
        )
    }

    #[test]
    fn test_outline_ranges() {
        let ranges = sample();
        let spans: Vec<(usize, usize)> = ranges.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(spans, vec![(1, 1), (2, 3), (4, 4), (4, 4), (5, 6)]);
        assert_eq!(ranges[0].title, "Overview");
    }

    #[test]
    fn test_ranges_clamped() {
        let ranges = outline_ranges(&[entry(1, "A", 0), entry(1, "B", 9)], 5);
        assert_eq!((ranges[0].start, ranges[0].end), (1, 5));
        assert_eq!((ranges[1].start, ranges[1].end), (9, 9));
    }

    #[test]
    fn test_label_for_page() {
        let ranges = sample();
        assert_eq!(
            label_for_page(&ranges, 2),
            (String::new(), "CEO Message".into(), String::new())
        );
        assert_eq!(
            label_for_page(&ranges, 4),
            ("Environment".into(), "Climate".into(), String::new())
        );
        assert_eq!(
            label_for_page(&ranges, 6),
            (String::new(), String::new(), "Scope 3".into())
        );
        assert_eq!(label_for_page(&ranges, 99), Default::default());
    }

    #[test]
    fn test_enrich_fills_only_empty_fields() {
        let mut rows = classify("## Local H2\nBody text.", "r.pdf", 4, false);
        let changed = enrich_rows(&mut rows, &sample());
        assert_eq!(changed, 2);
        let body = &rows[1];
        assert_eq!(body.h1, "Environment");
        assert_eq!(body.h2, "Local H2", "classifier value wins");
        assert_eq!(body.section_path, "Environment > Local H2");
        assert_eq!(body.current_section, "Local H2");
    }

    #[test]
    fn test_enrich_skips_whole_document_rows() {
        let mut rows = classify("Body text.", "r.pdf", 0, false);
        assert_eq!(enrich_rows(&mut rows, &sample()), 0);
        assert_eq!(rows[0].section_path, "");
    }

    #[test]
    fn test_load_outline_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outline.json");
        std::fs::write(&path, r#"[{"level":1,"title":"Intro","page":1}]"#).unwrap();
        assert_eq!(load_outline(&path).unwrap(), vec![entry(1, "Intro", 1)]);

        std::fs::write(&path, "not json").unwrap();
        let err = load_outline(&path).unwrap_err();
        assert!(matches!(err, DocflowError::InvalidOutline { .. }));
    }
}
