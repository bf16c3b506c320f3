use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::Fragment;

/// Value marker for a parameter that no strategy could resolve.
pub const NOT_FOUND_VALUE: &str = "NF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Exact,
    Fuzzy,
    Keyword,
    External,
    NotFound,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Exact => "exact",
            ExtractionMethod::Fuzzy => "fuzzy",
            ExtractionMethod::Keyword => "keyword",
            ExtractionMethod::External => "external",
            ExtractionMethod::NotFound => "not_found",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    Parameter,
    Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub text: String,
    pub bbox: [f32; 4],
    #[serde(rename = "type")]
    pub kind: HighlightKind,
}

impl Highlight {
    pub fn from_fragment(fragment: &Fragment, kind: HighlightKind) -> Self {
        let (x0, y0, x1, y1) = fragment.bbox;
        Self {
            text: fragment.text.clone(),
            bbox: [x0, y0, x1, y1],
            kind,
        }
    }
}

/// One extracted parameter. Created once per (document, parameter) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub name: String,
    pub value: String,
    pub unit: String,
    pub source_page: Option<u32>,
    pub line_index: Option<usize>,
    pub extraction_method: ExtractionMethod,
    pub confidence: u8,
    /// Set by downstream editors only; always false coming out of extraction.
    pub manually_edited: bool,
    pub source_text: String,
    pub context: String,
    pub notes: String,
    pub highlights: Vec<Highlight>,
}

impl ExtractionResult {
    /// The sentinel for an unresolved parameter.
    pub fn not_found(name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: NOT_FOUND_VALUE.to_string(),
            unit: String::new(),
            source_page: None,
            line_index: None,
            extraction_method: ExtractionMethod::NotFound,
            confidence: 0,
            manually_edited: false,
            source_text: String::new(),
            context: String::new(),
            notes: notes.into(),
            highlights: Vec::new(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.extraction_method != ExtractionMethod::NotFound && self.value != NOT_FOUND_VALUE
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub total_parameters: usize,
    pub extracted_count: usize,
    pub not_found_count: usize,
    pub manually_edited_count: usize,
}

impl ExtractionSummary {
    pub fn from_results(results: &[ExtractionResult]) -> Self {
        let extracted_count = results.iter().filter(|r| r.is_found()).count();
        Self {
            total_parameters: results.len(),
            extracted_count,
            not_found_count: results.len() - extracted_count,
            manually_edited_count: results.iter().filter(|r| r.manually_edited).count(),
        }
    }
}

/// Results wrapped with their summary, the shape written by `--report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub metadata: ExtractionSummary,
    pub parameters: Vec<ExtractionResult>,
}

impl ExtractionReport {
    pub fn new(parameters: Vec<ExtractionResult>) -> Self {
        Self {
            metadata: ExtractionSummary::from_results(&parameters),
            parameters,
        }
    }
}
