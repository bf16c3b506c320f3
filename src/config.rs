//! Tunables for page reconciliation and parameter matching.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ParamexError, Result};

/// Words dropped from a parameter name before keyword matching.
pub const DEFAULT_STOP_WORDS: &[&str] = &["the", "a", "an", "of", "in", "to", "for", "range"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Minimum partial-overlap score (0-100) for an approximate match.
    pub fuzzy_threshold: u8,

    /// Upper bound on approximate-match confidence.
    ///
    /// Must stay at or below `exact_confidence` so an exact hit always
    /// outranks a fuzzy one.
    pub fuzzy_confidence_cap: u8,

    pub exact_confidence: u8,
    pub keyword_confidence: u8,

    /// Lines shorter than this (after trimming) are never fuzzy matched.
    pub min_fuzzy_line_len: usize,

    /// Number of flattened lines assigned to a page once its first line is found.
    pub structural_window: usize,

    /// Characters compared when locating a page's first line.
    pub prefix_len: usize,

    /// Fraction of lines structural matching must cover before it is trusted.
    pub min_coverage: f64,

    /// Lines of surrounding text kept on each side of a match.
    pub context_lines: usize,

    pub stop_words: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 80,
            fuzzy_confidence_cap: 90,
            exact_confidence: 95,
            keyword_confidence: 75,
            min_fuzzy_line_len: 5,
            structural_window: 30,
            prefix_len: 30,
            min_coverage: 0.1,
            context_lines: 2,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl ExtractorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file. `~` and environment variables in the path are expanded.
    pub fn from_path(path: &str) -> Result<Self> {
        let expanded = shellexpand::full(path).map_err(|e| ParamexError::Config {
            reason: e.to_string(),
        })?;
        let path = Path::new(expanded.as_ref());
        let contents =
            std::fs::read_to_string(path).map_err(|e| ParamexError::io(path, e))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the confidence constants keep exact ≥ fuzzy ≥ keyword.
    pub fn validate(&self) -> Result<()> {
        let confidences = [
            self.exact_confidence,
            self.fuzzy_confidence_cap,
            self.keyword_confidence,
        ];
        if confidences.iter().any(|&c| c > 100) {
            return Err(ParamexError::Config {
                reason: "confidence values must lie in 0..=100".to_string(),
            });
        }
        if self.exact_confidence < self.fuzzy_confidence_cap
            || self.fuzzy_confidence_cap < self.keyword_confidence
        {
            return Err(ParamexError::Config {
                reason: format!(
                    "confidence ordering violated: exact {} >= fuzzy cap {} >= keyword {} required",
                    self.exact_confidence, self.fuzzy_confidence_cap, self.keyword_confidence
                ),
            });
        }
        if self.fuzzy_threshold > 100 {
            return Err(ParamexError::Config {
                reason: format!("fuzzy threshold {} exceeds 100", self.fuzzy_threshold),
            });
        }
        if !(0.0..=1.0).contains(&self.min_coverage) {
            return Err(ParamexError::Config {
                reason: format!("min_coverage {} must lie in 0.0..=1.0", self.min_coverage),
            });
        }
        Ok(())
    }

    pub fn with_fuzzy_threshold(mut self, threshold: u8) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    pub fn with_structural_window(mut self, window: usize) -> Self {
        self.structural_window = window;
        self
    }

    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words.into_iter().map(Into::into).collect();
        self
    }
}
