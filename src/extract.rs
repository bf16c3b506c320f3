//! Per-parameter extraction: strategy priority, provenance and the not-found
//! sentinel, plus normalization of results from an external extractor.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ExtractorConfig;
use crate::document::{FlattenedDocument, StructuredPage};
use crate::highlight::correlate;
use crate::logging::EXTRACT;
use crate::matcher::{
    best_window, ExactMatch, FuzzyMatch, KeywordMatch, LineSource, MatchCandidate, MatchStrategy,
};
use crate::page_map::PageMapping;
use crate::result::{ExtractionMethod, ExtractionResult, NOT_FOUND_VALUE};
use crate::value::ValueParser;

pub const NOT_FOUND_NOTE: &str = "Not found in datasheet";
pub const EXTERNAL_NOT_FOUND_NOTE: &str = "Not found by external extractor";

/// Confidence given to an external result that did not report one.
pub const DEFAULT_EXTERNAL_CONFIDENCE: u8 = 85;

/// The inputs of one extraction session, borrowed from the caller.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    pub document: &'a FlattenedDocument,
    pub mapping: &'a PageMapping,
    pub pages: &'a [StructuredPage],
}

impl<'a> ExtractionContext<'a> {
    pub fn new(
        document: &'a FlattenedDocument,
        mapping: &'a PageMapping,
        pages: &'a [StructuredPage],
    ) -> Self {
        Self {
            document,
            mapping,
            pages,
        }
    }
}

/// A per-parameter record as returned by an external extraction service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegateRecord {
    pub name: String,
    pub value: String,
    pub unit: String,
    pub confidence: Option<f64>,
    pub source_text: String,
    pub notes: String,
    pub source_page: Option<u32>,
}

pub struct Extractor<'a> {
    context: ExtractionContext<'a>,
    parser: ValueParser,
    strategies: Vec<Box<dyn MatchStrategy>>,
    keyword: KeywordMatch,
    context_lines: usize,
}

impl<'a> Extractor<'a> {
    pub fn new(context: ExtractionContext<'a>, config: &ExtractorConfig) -> Self {
        Self::with_parser(context, config, ValueParser::default())
    }

    pub fn with_parser(
        context: ExtractionContext<'a>,
        config: &ExtractorConfig,
        parser: ValueParser,
    ) -> Self {
        let keyword = KeywordMatch::new(config);
        Self {
            context,
            parser,
            strategies: vec![
                Box::new(ExactMatch::new(config)),
                Box::new(FuzzyMatch::new(config)),
                Box::new(keyword.clone()),
            ],
            keyword,
            context_lines: config.context_lines,
        }
    }

    fn line_source(&self) -> LineSource<'_> {
        LineSource::new(self.context.document, self.context.mapping, &self.parser)
    }

    /// Resolve one parameter. Never fails; an unresolved name yields the sentinel.
    pub fn extract(&self, name: &str) -> ExtractionResult {
        let name = name.trim();
        if name.is_empty() {
            return ExtractionResult::not_found(name, NOT_FOUND_NOTE);
        }

        let source = self.line_source();
        let hit = self.strategies.iter().find_map(|strategy| {
            let candidate = strategy.best(name, &source);
            if candidate.is_none() {
                debug!(
                    target: EXTRACT,
                    parameter = name,
                    method = %strategy.method(),
                    "Strategy miss"
                );
            }
            candidate.map(|candidate| (strategy.method(), candidate))
        });

        match hit {
            Some((method, candidate)) => {
                let result = self.build_result(name, method, candidate);
                info!(
                    target: EXTRACT,
                    parameter = name,
                    method = %method,
                    value = %result.value,
                    unit = %result.unit,
                    page = ?result.source_page,
                    line = ?result.line_index,
                    confidence = result.confidence,
                    "Extracted parameter"
                );
                result
            }
            None => {
                info!(target: EXTRACT, parameter = name, "Parameter not found");
                ExtractionResult::not_found(name, NOT_FOUND_NOTE)
            }
        }
    }

    /// Resolve every name in parallel. Output order matches input order.
    pub fn extract_all<S>(&self, names: &[S]) -> Vec<ExtractionResult>
    where
        S: AsRef<str> + Sync,
    {
        names
            .par_iter()
            .map(|name| self.extract(name.as_ref()))
            .collect()
    }

    fn build_result(
        &self,
        name: &str,
        method: ExtractionMethod,
        candidate: MatchCandidate,
    ) -> ExtractionResult {
        // Highlight the parameter as it is spelled in the matched line.
        let keywords = self.keyword.keywords(name);
        let line_lower = candidate.line_text.to_lowercase();
        let (highlight_text, notes) = match method {
            ExtractionMethod::Fuzzy => (
                best_window(name, &candidate.line_text),
                format!("Matched with: {}", candidate.line_text),
            ),
            ExtractionMethod::Keyword => (
                keywords
                    .iter()
                    .find(|keyword| line_lower.contains(&keyword.to_lowercase()))
                    .map(String::as_str)
                    .unwrap_or(name),
                format!("Matched keywords: {}", keywords.join(", ")),
            ),
            _ => (name, String::new()),
        };

        let highlights = correlate(
            candidate.page_number,
            highlight_text,
            &candidate.value,
            self.context.pages,
        );

        ExtractionResult {
            name: name.to_string(),
            value: candidate.value,
            unit: candidate.unit,
            source_page: Some(candidate.page_number),
            line_index: Some(candidate.line_index),
            extraction_method: method,
            confidence: candidate.confidence,
            manually_edited: false,
            context: self
                .context
                .document
                .context(candidate.line_index, self.context_lines),
            source_text: candidate.line_text,
            notes,
            highlights,
        }
    }

    /// Bring one external record into the common result shape.
    pub fn normalize_record(&self, record: &DelegateRecord) -> ExtractionResult {
        let name = record.name.trim();
        let value = record.value.trim();
        if value.is_empty() || value == NOT_FOUND_VALUE {
            let notes = if record.notes.trim().is_empty() {
                EXTERNAL_NOT_FOUND_NOTE
            } else {
                record.notes.trim()
            };
            return ExtractionResult::not_found(name, notes);
        }

        let source_text = record.source_text.trim();
        let line_index = self.context.document.find_line_containing(source_text);
        let source_page = line_index
            .and_then(|line| self.context.mapping.page_for_line(line))
            .or_else(|| {
                record
                    .source_page
                    .filter(|page| (1..=self.context.mapping.total_pages()).contains(page))
            })
            .unwrap_or(1);

        let confidence = record
            .confidence
            .map(|c| c.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(DEFAULT_EXTERNAL_CONFIDENCE);

        ExtractionResult {
            name: name.to_string(),
            value: value.to_string(),
            unit: record.unit.trim().to_string(),
            source_page: Some(source_page),
            line_index,
            extraction_method: ExtractionMethod::External,
            confidence,
            manually_edited: false,
            source_text: source_text.to_string(),
            context: line_index
                .map(|line| self.context.document.context(line, self.context_lines))
                .unwrap_or_default(),
            notes: record.notes.trim().to_string(),
            highlights: correlate(source_page, name, value, self.context.pages),
        }
    }

    /// Normalize the outcome of an external extraction run for `names`.
    ///
    /// A failed run, or a name the service did not report, yields the sentinel.
    pub fn normalize_external<S, E>(
        &self,
        names: &[S],
        outcome: Result<Vec<DelegateRecord>, E>,
    ) -> Vec<ExtractionResult>
    where
        S: AsRef<str>,
        E: std::fmt::Display,
    {
        let records = match outcome {
            Ok(records) => records,
            Err(e) => {
                warn!(target: EXTRACT, error = %e, "External extraction failed");
                Vec::new()
            }
        };

        names
            .iter()
            .map(|name| {
                let name = name.as_ref().trim();
                records
                    .iter()
                    .find(|record| record.name.trim().eq_ignore_ascii_case(name))
                    .map(|record| {
                        let mut result = self.normalize_record(record);
                        result.name = name.to_string();
                        result
                    })
                    .unwrap_or_else(|| ExtractionResult::not_found(name, EXTERNAL_NOT_FOUND_NOTE))
            })
            .collect()
    }
}
