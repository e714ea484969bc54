//! Page splitting: cut one Markdown input into `(page_no, text)` segments.
//!
//! The classifier never sees a PDF. Whatever converted the PDF hands us a
//! Markdown stream, optionally with page boundaries embedded in it; this
//! module recovers those boundaries so every row can carry its page number.
//!
//! Work happens on raw bytes so that one page with broken encoding does not
//! poison the rest: each segment is decoded on its own, and a segment that is
//! not valid UTF-8 becomes a [`PageText`] carrying a [`PageError`] (classified
//! as an empty page by the driver).

use crate::config::PageSplit;
use crate::error::PageError;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};

const FORM_FEED: u8 = 0x0C;

static RE_PAGE_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^[ \t]*<!--[ \t]*page[ \t]+(\d+)[ \t]*-->[ \t]*\r?$").unwrap()
});

/// One page of text as delivered by a text producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based page number, or 0 for a whole-document segment.
    pub page_no: usize,
    /// Markdown text of the page; empty when `error` is set.
    pub text: String,
    /// Why the producer could not deliver this page.
    pub error: Option<PageError>,
}

impl PageText {
    pub fn ok(page_no: usize, text: impl Into<String>) -> Self {
        Self {
            page_no,
            text: text.into(),
            error: None,
        }
    }

    pub fn failed(page_no: usize, error: PageError) -> Self {
        Self {
            page_no,
            text: String::new(),
            error: Some(error),
        }
    }

    /// Decode raw page bytes, turning bad UTF-8 into a page-level error.
    pub fn from_bytes(page_no: usize, bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::ok(page_no, text),
            Err(e) => Self::failed(
                page_no,
                PageError::InvalidUtf8 {
                    page: page_no,
                    offset: e.valid_up_to(),
                },
            ),
        }
    }
}

/// Split `input` into page segments according to `mode`.
///
/// * [`PageSplit::Whole`] — a single segment numbered 0.
/// * [`PageSplit::FormFeed`] — segments between `\x0C` bytes, numbered from 1.
///   A blank trailing segment (the form feed after the last page) is dropped.
/// * [`PageSplit::Comment`] — a `<!-- page N -->` line starts page N; any
///   non-blank text before the first marker is page 1. Without markers the
///   whole input is page 1.
pub fn split_pages(input: &[u8], mode: PageSplit) -> Vec<PageText> {
    match mode {
        PageSplit::Whole => vec![PageText::from_bytes(0, input)],
        PageSplit::FormFeed => split_form_feed(input),
        PageSplit::Comment => split_comment_markers(input),
    }
}

fn split_form_feed(input: &[u8]) -> Vec<PageText> {
    let mut segments: Vec<&[u8]> = input.split(|&b| b == FORM_FEED).collect();
    if segments.len() > 1 && segments.last().is_some_and(|s| is_blank(s)) {
        segments.pop();
    }
    segments
        .into_iter()
        .enumerate()
        .map(|(i, bytes)| PageText::from_bytes(i + 1, bytes))
        .collect()
}

fn split_comment_markers(input: &[u8]) -> Vec<PageText> {
    let mut pages = Vec::new();
    let mut current_page = 1usize;
    let mut start = 0usize;

    for caps in RE_PAGE_COMMENT.captures_iter(input) {
        let marker = caps.get(0).map_or(0..0, |m| m.range());
        let segment = &input[start..marker.start];
        if !(pages.is_empty() && current_page == 1 && is_blank(segment)) {
            pages.push(PageText::from_bytes(current_page, segment));
        }
        current_page = caps
            .get(1)
            .and_then(|m| std::str::from_utf8(m.as_bytes()).ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(current_page + 1);
        start = marker.end;
    }

    pages.push(PageText::from_bytes(current_page, &input[start..]));
    pages
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| b.is_ascii_whitespace())
}
