//! Line matching strategies.
//!
//! Every strategy scans the flattened lines in document order, applies its own
//! relevance test and then the value parser. A line only becomes a candidate
//! when both succeed; relevant lines without a value are skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use strsim::normalized_levenshtein;
use tracing::trace;

use crate::config::ExtractorConfig;
use crate::document::FlattenedDocument;
use crate::logging::MATCHER;
use crate::page_map::PageMapping;
use crate::result::ExtractionMethod;
use crate::value::ValueParser;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// A line that passed a strategy's relevance test and yielded a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub line_index: usize,
    /// Trimmed line text.
    pub line_text: String,
    pub value: String,
    pub unit: String,
    pub page_number: u32,
    pub confidence: u8,
}

/// Everything a strategy reads while scanning.
#[derive(Debug, Clone, Copy)]
pub struct LineSource<'a> {
    pub document: &'a FlattenedDocument,
    pub mapping: &'a PageMapping,
    pub parser: &'a ValueParser,
}

impl<'a> LineSource<'a> {
    pub fn new(
        document: &'a FlattenedDocument,
        mapping: &'a PageMapping,
        parser: &'a ValueParser,
    ) -> Self {
        Self {
            document,
            mapping,
            parser,
        }
    }

    fn candidate(&self, line_index: usize, line: &str, confidence: u8) -> Option<MatchCandidate> {
        let parsed = self.parser.parse(line)?;
        Some(MatchCandidate {
            line_index,
            line_text: line.trim().to_string(),
            value: parsed.value,
            unit: parsed.unit,
            page_number: self.mapping.page_for_line(line_index).unwrap_or(1),
            confidence,
        })
    }

    /// Candidates in document order for every line `relevance` scores.
    fn scan<F>(self, relevance: F) -> impl Iterator<Item = MatchCandidate> + 'a
    where
        F: Fn(&str) -> Option<u8> + 'a,
    {
        self.document
            .lines()
            .iter()
            .enumerate()
            .filter_map(move |(line_index, line)| {
                let confidence = relevance(line.as_str())?;
                let candidate = self.candidate(line_index, line, confidence);
                if candidate.is_none() {
                    trace!(target: MATCHER, line_index, "Relevant line has no value");
                }
                candidate
            })
    }
}

pub trait MatchStrategy: Send + Sync {
    fn method(&self) -> ExtractionMethod;

    /// All candidates, best first.
    fn candidates(&self, query: &str, source: &LineSource<'_>) -> Vec<MatchCandidate>;

    fn best(&self, query: &str, source: &LineSource<'_>) -> Option<MatchCandidate> {
        self.candidates(query, source).into_iter().next()
    }
}

/// Case-insensitive substring containment of the full parameter name.
#[derive(Debug, Clone)]
pub struct ExactMatch {
    confidence: u8,
}

impl ExactMatch {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            confidence: config.exact_confidence,
        }
    }
}

impl MatchStrategy for ExactMatch {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Exact
    }

    fn candidates(&self, query: &str, source: &LineSource<'_>) -> Vec<MatchCandidate> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let confidence = self.confidence;
        source
            .scan(move |line| line.to_lowercase().contains(&needle).then_some(confidence))
            .collect()
    }

    // Exact hits are unambiguous; stop at the first one.
    fn best(&self, query: &str, source: &LineSource<'_>) -> Option<MatchCandidate> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let confidence = self.confidence;
        source
            .scan(move |line| line.to_lowercase().contains(&needle).then_some(confidence))
            .next()
    }
}

/// Partial-overlap similarity between the parameter name and each line.
#[derive(Debug, Clone)]
pub struct FuzzyMatch {
    threshold: u8,
    cap: u8,
    min_line_len: usize,
}

impl FuzzyMatch {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            threshold: config.fuzzy_threshold,
            cap: config.fuzzy_confidence_cap,
            min_line_len: config.min_fuzzy_line_len,
        }
    }
}

impl MatchStrategy for FuzzyMatch {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Fuzzy
    }

    fn candidates(&self, query: &str, source: &LineSource<'_>) -> Vec<MatchCandidate> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return Vec::new();
        }
        let (threshold, cap, min_line_len) = (self.threshold, self.cap, self.min_line_len);

        let mut candidates: Vec<MatchCandidate> = source
            .scan(move |line| {
                if line.trim().chars().count() < min_line_len {
                    return None;
                }
                let score = partial_ratio(&query, line);
                (score >= threshold).then(|| score.min(cap))
            })
            .collect();

        // Stable: equal confidence keeps document order.
        candidates.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        candidates
    }
}

/// Any content word of the parameter name appearing in the line.
#[derive(Debug, Clone)]
pub struct KeywordMatch {
    confidence: u8,
    stop_words: Vec<String>,
}

impl KeywordMatch {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            confidence: config.keyword_confidence,
            stop_words: config
                .stop_words
                .iter()
                .map(|word| word.to_lowercase())
                .collect(),
        }
    }

    pub fn keywords(&self, query: &str) -> SmallVec<[String; 4]> {
        keywords(query, &self.stop_words)
    }
}

impl MatchStrategy for KeywordMatch {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Keyword
    }

    fn candidates(&self, query: &str, source: &LineSource<'_>) -> Vec<MatchCandidate> {
        let keywords: SmallVec<[String; 4]> = self
            .keywords(query)
            .into_iter()
            .map(|keyword| keyword.to_lowercase())
            .collect();
        if keywords.is_empty() {
            return Vec::new();
        }
        let confidence = self.confidence;
        source
            .scan(move |line| {
                let line = line.to_lowercase();
                keywords
                    .iter()
                    .any(|keyword| line.contains(keyword.as_str()))
                    .then_some(confidence)
            })
            .collect()
    }
}

/// Content words of `query`: `\w+` tokens that are not stop-words.
///
/// `stop_words` are expected in lower case.
pub fn keywords(query: &str, stop_words: &[String]) -> SmallVec<[String; 4]> {
    WORD.find_iter(query)
        .map(|word| word.as_str())
        .filter(|word| !stop_words.iter().any(|stop| *stop == word.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Best similarity (0-100) between the shorter string and every equal-length
/// window of the longer one, compared case-insensitively.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let width = short.chars().count();
    if width == 0 {
        return 0;
    }

    let mut best = 0.0_f64;
    for window in char_windows(&long, width) {
        best = best.max(normalized_levenshtein(&short, window));
        if best >= 1.0 {
            break;
        }
    }

    (best * 100.0).round() as u8
}

/// The stretch of `line` that best resembles `query`, in the line's own
/// spelling. A line no longer than the query is returned whole.
pub fn best_window<'a>(query: &str, line: &'a str) -> &'a str {
    let query = query.trim().to_lowercase();
    let width = query.chars().count();
    if width == 0 || line.chars().count() <= width {
        return line.trim();
    }

    let mut best = ("", -1.0_f64);
    for window in char_windows(line, width) {
        let score = normalized_levenshtein(&query, &window.to_lowercase());
        if score > best.1 {
            best = (window, score);
        }
    }
    best.0.trim()
}

/// Every run of `width` consecutive chars in `text`, left to right.
fn char_windows(text: &str, width: usize) -> impl Iterator<Item = &str> {
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let count = bounds.len().saturating_sub(width);
    (0..count).map(move |start| &text[bounds[start]..bounds[start + width]])
}
