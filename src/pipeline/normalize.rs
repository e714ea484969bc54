//! Normalizer: deterministic cleanup of one text fragment.
//!
//! PDF-to-Markdown converters leave a predictable set of artefacts in their
//! output: HTML entities, full-width and ligature code points, stray control
//! characters, table pipes leaking into plain text, bilingual captions in
//! corporate reports (`〈native caption〉 English caption`), and captions
//! emitted twice in a row. Every fragment the classifier emits goes through
//! [`normalize`] first.
//!
//! ## Rule Order
//!
//! Entities are decoded before Unicode folding so that `&#xFF21;` is folded
//! like a literal `Ａ`; control characters become spaces before whitespace is
//! collapsed; and the two content-level rules (bilingual prefix, duplicate
//! phrase) run last, on fully cleaned text.
//!
//! ## Idempotence
//!
//! A single pass is not always a fixed point (`&amp;amp;` decodes one layer
//! per pass, `a a a a` halves per pass), so [`Normalizer::clean`] repeats the
//! pass until the output stops changing. Nesting depth and repeat counts are
//! unbounded in principle, so there is no fixed pass limit: `&amp;` nested
//! ten deep takes ten passes, 1024 copies of a word take eleven.

use crate::config::DEFAULT_BILINGUAL_KEYWORDS;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use unicode_normalization::UnicodeNormalization;

static DEFAULT_NORMALIZER: Lazy<Normalizer> = Lazy::new(Normalizer::default);

/// Clean one fragment with the default bilingual keyword set.
///
/// Total and idempotent: `normalize(normalize(s)) == normalize(s)`, and
/// `normalize("") == ""`. An empty result means "drop this row".
pub fn normalize(input: &str) -> String {
    DEFAULT_NORMALIZER.clean(input)
}

/// A normalizer with a configurable bilingual keyword set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    /// Lower-case keywords; the Latin half of a bilingual line must contain
    /// one of them before the non-Latin prefix is dropped.
    keywords: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::with_keywords(DEFAULT_BILINGUAL_KEYWORDS.iter().copied())
    }
}

impl Normalizer {
    /// Build a normalizer whose bilingual-prefix rule fires on `keywords`.
    ///
    /// Keywords are matched case-insensitively as substrings; blank entries
    /// are ignored. An empty set disables the rule entirely.
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Apply all cleanup rules until the text is stable.
    ///
    /// Rules (applied in order on every pass):
    /// 1. Decode HTML entities (`&amp;` → `&`, `&nbsp;` → space)
    /// 2. NFKC-normalise (full-width forms, ligatures)
    /// 3. Replace C0 controls, DEL and no-break spaces with a space
    /// 4. Strip one leading and one trailing table pipe
    /// 5. Trim and collapse runs of horizontal whitespace
    /// 6. Drop a non-Latin prefix in front of a recognised English caption
    /// 7. Collapse an exactly repeated phrase (`X X` → `X`)
    /// 8. Final trim
    pub fn clean(&self, input: &str) -> String {
        let mut current = self.clean_once(input);
        loop {
            let next = self.clean_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn clean_once(&self, input: &str) -> String {
        if input.is_empty() {
            return String::new();
        }
        let s = decode_entities(input);
        let s = fold_compatibility(&s);
        let s = replace_control_chars(&s);
        let s = strip_edge_pipes(&s);
        let s = collapse_whitespace(&s);
        let s = self.strip_bilingual_prefix(&s);
        let s = collapse_duplicate_phrase(&s);
        s.trim().to_string()
    }

    // ── Rule 6: Bilingual prefix ─────────────────────────────────────────────

    fn strip_bilingual_prefix<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let Some(caps) = RE_BILINGUAL.captures(input) else {
            return Cow::Borrowed(input);
        };
        let latin = caps["latin"].trim();
        let lower = latin.to_lowercase();
        if self.keywords.iter().any(|k| lower.contains(k.as_str())) {
            Cow::Owned(latin.to_string())
        } else {
            Cow::Borrowed(input)
        }
    }
}

// ── Rule 1: HTML entities ────────────────────────────────────────────────────

fn decode_entities(input: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(input)
}

// ── Rule 2: Unicode compatibility folding ────────────────────────────────────

fn fold_compatibility(input: &str) -> String {
    input.nfkc().collect()
}

// ── Rule 3: Control characters and no-break spaces ───────────────────────────

fn is_blank_artifact(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}' | '\u{00A0}' | '\u{2007}' | '\u{202F}')
}

fn replace_control_chars(input: &str) -> String {
    input
        .chars()
        .map(|c| if is_blank_artifact(c) { ' ' } else { c })
        .collect()
}

// ── Rule 4: Leaked table pipes ───────────────────────────────────────────────

static RE_LEADING_PIPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\|\s*").unwrap());
static RE_TRAILING_PIPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\|\s*$").unwrap());

fn strip_edge_pipes(input: &str) -> String {
    let s = RE_LEADING_PIPE.replace(input, "");
    RE_TRAILING_PIPE.replace(&s, "").into_owned()
}

// ── Rule 5: Whitespace ───────────────────────────────────────────────────────

static RE_MULTISPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_MULTISPACE.replace_all(input.trim(), " ").into_owned()
}

// ── Rule 6 pattern ───────────────────────────────────────────────────────────

static RE_BILINGUAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<nonlatin>[^\x00-\x7F]{2,}[\s:|/\-]+)(?P<latin>[A-Za-z].+)$").unwrap()
});

// ── Rule 7: Duplicate phrase ─────────────────────────────────────────────────

/// `"Annual Report annual report"` → `"Annual Report"`.
///
/// Equivalent to `^(.+?)\s+\1$` (case-insensitive) with the shortest
/// repeated unit winning; the regex crate has no back-references.
fn collapse_duplicate_phrase(input: &str) -> String {
    // ASCII lower-casing keeps byte length, so only split points whose head
    // and tail are the same length can match.
    let ascii = input.is_ascii();
    for (idx, c) in input.char_indices() {
        if !c.is_whitespace() || idx == 0 {
            continue;
        }
        let head = &input[..idx];
        if head.ends_with(char::is_whitespace) {
            continue;
        }
        let tail = input[idx..].trim_start();
        if tail.is_empty() || (ascii && tail.len() != head.len()) {
            continue;
        }
        if eq_ignore_case(head, tail) {
            return head.to_string();
        }
    }
    input.to_string()
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

// ── Tests ────────────────────────────────────────────────────────────────────
