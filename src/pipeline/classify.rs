//! Line classifier: Markdown-like text → ordered, section-tagged [`Row`]s.
//!
//! One left-to-right pass over the lines of a page (or of a whole document).
//! Each line is matched against a fixed priority list and the first rule that
//! applies decides what the line becomes:
//!
//! ```text
//! noise ─▶ # heading ─▶ | table | ─▶ - bullet ─▶ heuristic heading ─▶ text
//! (drop)   (stack)      (row)        (row)       (cursor only)         (sentences)
//! ```
//!
//! Two pieces of running state are threaded through the pass in an explicit
//! [`SectionState`]: the `h1`/`h2`/`h3` heading stack, driven only by `#`
//! headings, and the flat `current_section` cursor, driven by every heading
//! including heuristic ones. Nothing is global, so independent pages or
//! documents can be classified on different threads.

use crate::config::ClassifierConfig;
use crate::pipeline::normalize::Normalizer;
use crate::row::{section_path, Row, SectionType};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Deepest heading level a row can carry.
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Cap for the level of a "short and shouty" heuristic heading.
const MAX_SHOUTY_LEVEL: u8 = 3;

// ── Line patterns ────────────────────────────────────────────────────────────

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap());
static RE_TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\|.+\|\s*$").unwrap());
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:[-*•]|\d+\.)\s+(.+)$").unwrap());

static RE_TOC_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(table of contents|contents|index)$").unwrap());
static RE_REFERENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(references|bibliography|works cited)\b").unwrap());

static RE_NUMERIC_OUTLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+(?:\.\d+){0,4})\s+\S.*$").unwrap());
static RE_ROMAN_OUTLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*[IVXLCDM]+\.\s+\S.*$").unwrap());
static RE_LETTER_OUTLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[A-Z]\.\s+\S.*$").unwrap());

/// Sentence boundary: terminal punctuation, whitespace, then an upper-case
/// letter or digit.
static RE_SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+[A-Z0-9]").unwrap());

// ── State ────────────────────────────────────────────────────────────────────

/// Running section state for one classification pass.
///
/// Create a fresh value per page (or per document) and hand it to
/// [`Classifier::classify_with_state`]. Never share one instance between
/// concurrent passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionState {
    pub h1: String,
    pub h2: String,
    pub h3: String,
    /// Text of the most recent heading at any level, explicit or heuristic.
    pub current_section: String,
    /// Level of the most recent heading, 0 before the first one.
    pub last_heading_level: u8,
}

impl SectionState {
    pub fn section_path(&self) -> String {
        section_path(&self.h1, &self.h2, &self.h3)
    }

    /// Apply an explicit `#` heading: scope the stack by level and move the
    /// cursor.
    fn push_heading(&mut self, level: u8, text: &str) {
        match level {
            1 => {
                self.h1 = text.to_string();
                self.h2.clear();
                self.h3.clear();
            }
            2 => {
                self.h2 = text.to_string();
                self.h3.clear();
            }
            _ => self.h3 = text.to_string(),
        }
        self.current_section = text.to_string();
        self.last_heading_level = level;
    }

    /// Apply a heuristic heading: cursor and level tracking only.
    fn mark_heuristic_heading(&mut self, level: u8, text: &str) {
        self.current_section = text.to_string();
        self.last_heading_level = level;
    }
}

// ── Classification ───────────────────────────────────────────────────────────

/// What a single line turned out to be. Evaluated in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineKind<'a> {
    /// Blank, table-of-contents or reference-list line.
    Noise,
    /// `#`-prefixed heading with its level and raw text.
    Heading { level: u8, text: &'a str },
    /// Pipe-delimited table line, kept whole.
    Table,
    /// List item; carries the content after the marker.
    Bullet(&'a str),
    /// Numbered, lettered or upper-case line promoted to a heading.
    HeuristicHeading { level: u8 },
    /// Anything else.
    Text,
}

/// Line classifier holding the tunables and a configured normalizer.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
    normalizer: Normalizer,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        let normalizer = Normalizer::with_keywords(&config.bilingual_keywords);
        Self { config, normalizer }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one page (or whole document) with fresh section state.
    pub fn classify(&self, text: &str, source_file: &str, page_no: usize) -> Vec<Row> {
        let mut state = SectionState::default();
        self.classify_with_state(&mut state, text, source_file, page_no)
    }

    /// Classify `text`, reading and updating caller-owned `state`.
    ///
    /// Lines are numbered from 1 within `text`. Output order follows input
    /// order; a plain-text line may yield several rows, any other line at
    /// most one.
    pub fn classify_with_state(
        &self,
        state: &mut SectionState,
        text: &str,
        source_file: &str,
        page_no: usize,
    ) -> Vec<Row> {
        let mut rows = Vec::new();
        let mut line_count = 0usize;

        for (idx, raw) in text.lines().enumerate() {
            line_count += 1;
            let line = raw.trim_end();
            let at = RowOrigin {
                source_file,
                line_no: idx + 1,
                page_no,
            };

            match self.classify_line(line, state) {
                LineKind::Noise => {}
                LineKind::Heading { level, text } => {
                    let cleaned = self.normalizer.clean(text);
                    if cleaned.is_empty() {
                        continue;
                    }
                    state.push_heading(level, &cleaned);
                    rows.push(at.row(state, SectionType::Heading, level, cleaned));
                }
                LineKind::Table => {
                    let cleaned = self.normalizer.clean(line);
                    if !cleaned.is_empty() {
                        rows.push(at.row(state, SectionType::Table, 0, cleaned));
                    }
                }
                LineKind::Bullet(content) => {
                    let cleaned = self.normalizer.clean(content);
                    if !cleaned.is_empty() {
                        rows.push(at.row(state, SectionType::Bullet, 0, cleaned));
                    }
                }
                LineKind::HeuristicHeading { level } => {
                    let cleaned = self.normalizer.clean(line);
                    if cleaned.is_empty() {
                        continue;
                    }
                    state.mark_heuristic_heading(level, &cleaned);
                    rows.push(at.row(state, SectionType::Heading, level, cleaned));
                }
                LineKind::Text => {
                    for fragment in split_sentences(line.trim()) {
                        let cleaned = self.normalizer.clean(fragment);
                        if !cleaned.is_empty() {
                            rows.push(at.row(state, SectionType::Text, 0, cleaned));
                        }
                    }
                }
            }
        }

        debug!(
            "Classified {} lines of '{}' (page {}) into {} rows",
            line_count,
            source_file,
            page_no,
            rows.len()
        );
        rows
    }

    fn classify_line<'a>(&self, line: &'a str, state: &SectionState) -> LineKind<'a> {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_noise(trimmed) {
            return LineKind::Noise;
        }

        if let Some(caps) = RE_HEADING.captures(line) {
            let level = caps[1].len() as u8;
            let text = caps.get(2).map_or("", |m| m.as_str());
            return LineKind::Heading { level, text };
        }

        if RE_TABLE.is_match(line) {
            return LineKind::Table;
        }

        if let Some(caps) = RE_BULLET.captures(line) {
            return LineKind::Bullet(caps.get(1).map_or("", |m| m.as_str()));
        }

        if self.config.use_heuristics {
            if let Some(level) = self.heuristic_level(trimmed, state.last_heading_level) {
                return LineKind::HeuristicHeading { level };
            }
        }

        LineKind::Text
    }

    /// Infer a heading level from numbering or capitalisation.
    ///
    /// Tried in order: `1.2.3 Title`, `IV. Title`, `B. Title`, then short
    /// upper-case lines.
    fn heuristic_level(&self, trimmed: &str, last_level: u8) -> Option<u8> {
        if let Some(caps) = RE_NUMERIC_OUTLINE.captures(trimmed) {
            let dots = caps[1].matches('.').count();
            return Some((dots + 1).min(MAX_HEADING_LEVEL as usize) as u8);
        }
        if RE_ROMAN_OUTLINE.is_match(trimmed) {
            return Some(1);
        }
        if RE_LETTER_OUTLINE.is_match(trimmed) {
            return Some(2);
        }
        if self.is_shouty(trimmed) {
            return Some(last_level.saturating_add(1).min(MAX_SHOUTY_LEVEL));
        }
        None
    }

    /// Short, unpunctuated and mostly upper-case, e.g. `CLIMATE STRATEGY`.
    fn is_shouty(&self, trimmed: &str) -> bool {
        if trimmed.split_whitespace().count() > self.config.max_shouty_tokens {
            return false;
        }
        if trimmed.ends_with(['.', '!', '?']) {
            return false;
        }
        let (letters, upper) = trimmed
            .chars()
            .filter(|c| c.is_alphabetic())
            .fold((0usize, 0usize), |(l, u), c| (l + 1, u + usize::from(c.is_uppercase())));
        letters > 0 && (upper as f64 / letters as f64) >= self.config.min_caps_ratio
    }
}

/// Table-of-contents endings and reference-list openings.
fn is_noise(trimmed: &str) -> bool {
    RE_TOC_HINT.is_match(trimmed) || RE_REFERENCES.is_match(trimmed)
}

/// Split a paragraph line into sentence-like fragments.
///
/// Not grammar-aware: `e.g. Foo` and `3. 5` split too.
pub fn split_sentences(line: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut start = 0;
    for m in RE_SENTENCE_BOUNDARY.find_iter(line) {
        // Both ends of the match are single-byte ASCII.
        fragments.push(&line[start..m.start() + 1]);
        start = m.end() - 1;
    }
    fragments.push(&line[start..]);
    fragments
}

/// Position metadata shared by every row produced from one line.
struct RowOrigin<'a> {
    source_file: &'a str,
    line_no: usize,
    page_no: usize,
}

impl RowOrigin<'_> {
    fn row(&self, state: &SectionState, section_type: SectionType, level: u8, text: String) -> Row {
        Row {
            source_file: self.source_file.to_string(),
            line_no: self.line_no,
            page_no: self.page_no,
            section_type,
            heading_level: level,
            is_table: section_type == SectionType::Table,
            h1: state.h1.clone(),
            h2: state.h2.clone(),
            h3: state.h3.clone(),
            section_path: state.section_path(),
            current_section: state.current_section.clone(),
            text,
        }
    }
}

/// Classify `text` with default tunables.
///
/// `page_no` is 0 for whole-document mode, otherwise the 1-based page the
/// text came from.
pub fn classify(text: &str, source_file: &str, page_no: usize, use_heuristics: bool) -> Vec<Row> {
    let config = ClassifierConfig {
        use_heuristics,
        ..ClassifierConfig::default()
    };
    Classifier::new(config).classify(text, source_file, page_no)
}

// ── Tests ────────────────────────────────────────────────────────────────────
