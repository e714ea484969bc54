//! Configuration types for Markdown-to-rows extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The classifier's tunable constants
//! live in [`ClassifierConfig`] so they can be overridden per run instead of
//! being buried as literals in the heuristics.
//!
//! The default constants below were chosen empirically on bilingual
//! sustainability reports. They are tuning knobs, not semantics: changing
//! them shifts precision/recall of heading detection and caption cleanup but
//! never breaks the row contract.

use crate::error::DocflowError;
use crate::pipeline::outline::OutlineEntry;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keywords that mark the Latin half of a bilingual caption as worth keeping.
pub const DEFAULT_BILINGUAL_KEYWORDS: &[&str] = &[
    "message",
    "report",
    "sustainability",
    "ceo",
    "target",
    "governance",
];

/// A line with more whitespace-separated tokens than this is never a
/// "short and shouty" heading.
pub const DEFAULT_MAX_SHOUTY_TOKENS: usize = 12;

/// Minimum share of upper-case letters among all letters for a line to count
/// as "shouty".
pub const DEFAULT_MIN_CAPS_RATIO: f64 = 0.6;

/// Default number of pages classified at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Tunables for the line classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Detect headings from numbering and capitalisation, not just `#`
    /// markers. Default: false.
    ///
    /// Heuristic headings only move the flat `current_section` cursor; they
    /// never touch the `h1`/`h2`/`h3` stack.
    pub use_heuristics: bool,

    /// Token limit for the "short and shouty" heuristic. Default: 12.
    pub max_shouty_tokens: usize,

    /// Upper-case ratio threshold for the "short and shouty" heuristic.
    /// Range: (0, 1]. Default: 0.6.
    pub min_caps_ratio: f64,

    /// Keywords for the normalizer's bilingual-prefix rule.
    pub bilingual_keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            use_heuristics: false,
            max_shouty_tokens: DEFAULT_MAX_SHOUTY_TOKENS,
            min_caps_ratio: DEFAULT_MIN_CAPS_RATIO,
            bilingual_keywords: DEFAULT_BILINGUAL_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl ClassifierConfig {
    /// Default configuration with heuristic heading detection switched on.
    pub fn with_heuristics() -> Self {
        Self {
            use_heuristics: true,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), DocflowError> {
        if !(self.min_caps_ratio > 0.0 && self.min_caps_ratio <= 1.0) {
            return Err(DocflowError::InvalidConfig(format!(
                "Caps ratio must be in (0, 1], got {}",
                self.min_caps_ratio
            )));
        }
        if self.max_shouty_tokens == 0 {
            return Err(DocflowError::InvalidConfig(
                "Shouty-heading token limit must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}

/// How a Markdown input is cut into pages before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSplit {
    /// The whole input is one segment with `page_no = 0`. (default)
    #[default]
    Whole,
    /// Pages are separated by form-feed characters (`\x0C`), as written by
    /// `pdftotext` and similar tools.
    FormFeed,
    /// Pages start at `<!-- page N -->` comment lines, as written by
    /// PDF-to-Markdown converters with a comment page separator.
    Comment,
}

/// Configuration for an extraction pass.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use docflow::{ExtractionConfig, PageSplit};
///
/// let config = ExtractionConfig::builder()
///     .use_heuristics(true)
///     .page_split(PageSplit::Comment)
///     .concurrency(8)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Classifier tunables.
    pub classifier: ClassifierConfig,

    /// Page splitting mode. Default: [`PageSplit::Whole`].
    pub page_split: PageSplit,

    /// Label written to every row's `source_file`. If None, the input's file
    /// name (or last URL segment) is used.
    pub source_name: Option<String>,

    /// Number of pages classified in parallel. Default: 4.
    ///
    /// Each page gets its own classifier state, so pages are independent.
    /// Rows are always returned in page order regardless of this setting.
    pub concurrency: usize,

    /// Document outline used to fill empty `h1`/`h2`/`h3` on paged rows.
    /// Applied strictly after classification.
    pub outline: Option<Vec<OutlineEntry>>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            page_split: PageSplit::default(),
            source_name: None,
            concurrency: DEFAULT_CONCURRENCY,
            outline: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("classifier", &self.classifier)
            .field("page_split", &self.page_split)
            .field("source_name", &self.source_name)
            .field("concurrency", &self.concurrency)
            .field("outline_entries", &self.outline.as_ref().map(Vec::len))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.config.classifier = classifier;
        self
    }

    pub fn use_heuristics(mut self, v: bool) -> Self {
        self.config.classifier.use_heuristics = v;
        self
    }

    pub fn max_shouty_tokens(mut self, n: usize) -> Self {
        self.config.classifier.max_shouty_tokens = n;
        self
    }

    pub fn min_caps_ratio(mut self, ratio: f64) -> Self {
        self.config.classifier.min_caps_ratio = ratio;
        self
    }

    pub fn bilingual_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.classifier.bilingual_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_split(mut self, split: PageSplit) -> Self {
        self.config.page_split = split;
        self
    }

    pub fn source_name(mut self, name: impl Into<String>) -> Self {
        self.config.source_name = Some(name.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn outline(mut self, entries: Vec<OutlineEntry>) -> Self {
        self.config.outline = Some(entries);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, DocflowError> {
        let c = &self.config;
        c.classifier.validate()?;
        if c.concurrency == 0 {
            return Err(DocflowError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(DocflowError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
