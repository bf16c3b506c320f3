//! Loading a serialized extraction session and parameter lists.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ExtractorConfig;
use crate::document::{FlattenedDocument, StructuredPage};
use crate::error::{ParamexError, Result};
use crate::extract::{ExtractionContext, Extractor};
use crate::logging::EXTRACT;
use crate::page_map::{PageEvidence, PageMapping, PageReconciler};
use crate::result::ExtractionResult;

/// Everything the converter produced for one document, plus the parameters
/// to look for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSession {
    /// Flattened text. Ignored when `lines` is given.
    pub markdown: Option<String>,
    pub lines: Option<Vec<String>>,
    /// Known `line_index → page_number` observations.
    pub page_mapping: PageEvidence,
    pub total_pages: Option<u32>,
    pub pages: Vec<StructuredPage>,
    pub parameters: Vec<String>,
}

impl ExtractionSession {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ParamexError::io(path, e))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn document(&self) -> FlattenedDocument {
        match (&self.lines, &self.markdown) {
            (Some(lines), _) => FlattenedDocument::from_lines(lines.iter().cloned()),
            (None, Some(markdown)) => FlattenedDocument::from_text(markdown),
            (None, None) => FlattenedDocument::default(),
        }
    }

    /// Explicit page count, otherwise the highest page number seen.
    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages.filter(|&t| t > 0).or_else(|| {
            self.pages
                .iter()
                .map(|page| page.page_number)
                .chain(self.page_mapping.values().copied())
                .max()
        })
    }

    pub fn parameters(&self) -> Vec<String> {
        clean_parameters(self.parameters.iter().map(String::as_str))
    }

    pub fn with_parameters(mut self, parameters: Vec<String>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.parameters().is_empty() {
            return Err(ParamexError::NoParameters);
        }
        if self.lines.is_none() && self.markdown.is_none() && self.pages.is_empty() {
            return Err(ParamexError::NoDocument);
        }
        Ok(())
    }

    pub fn page_mapping(
        &self,
        document: &FlattenedDocument,
        config: &ExtractorConfig,
    ) -> PageMapping {
        let supplied = (!self.page_mapping.is_empty()).then_some(&self.page_mapping);
        PageReconciler::from_config(config).map_document(
            document,
            &self.pages,
            supplied,
            self.total_pages(),
        )
    }

    /// Validate, reconcile pages and extract every parameter.
    pub fn run(&self, config: &ExtractorConfig) -> Result<Vec<ExtractionResult>> {
        self.validate()?;

        let document = self.document();
        let mapping = self.page_mapping(&document, config);
        info!(
            target: EXTRACT,
            lines = document.len(),
            pages = mapping.total_pages(),
            source = ?mapping.source(),
            "Document loaded"
        );

        let context = ExtractionContext::new(&document, &mapping, &self.pages);
        let extractor = Extractor::new(context, config);
        Ok(extractor.extract_all(&self.parameters()))
    }
}

/// Trim names and drop empty ones.
pub fn clean_parameters<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a parameter list from `.json`, `.csv` or `.txt`.
pub fn load_parameters(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_lowercase();
    if !matches!(extension.as_str(), "json" | "csv" | "txt") {
        return Err(ParamexError::UnsupportedFormat { extension });
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ParamexError::io(path, e))?;
    match extension.as_str() {
        "json" => parse_parameter_json(&contents),
        "csv" => Ok(parse_parameter_csv(&contents)),
        _ => Ok(parse_parameter_lines(&contents)),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParameterList {
    Names(Vec<serde_json::Value>),
    Wrapped { parameters: Vec<serde_json::Value> },
}

/// A JSON array of names, or an object with a `parameters` array.
pub fn parse_parameter_json(contents: &str) -> Result<Vec<String>> {
    let values = match serde_json::from_str::<ParameterList>(contents)? {
        ParameterList::Names(values) | ParameterList::Wrapped { parameters: values } => values,
    };
    let names: Vec<String> = values
        .iter()
        .filter_map(|value| match value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect();
    Ok(clean_parameters(names.iter().map(String::as_str)))
}

/// First column of each CSV row. The first non-blank row is always the
/// header and is skipped.
pub fn parse_parameter_csv(contents: &str) -> Vec<String> {
    let rows = contents
        .lines()
        .filter(|row| !row.trim().is_empty())
        .skip(1)
        .map(first_column);
    clean_parameters(rows)
}

/// One name per line, no header.
pub fn parse_parameter_lines(contents: &str) -> Vec<String> {
    clean_parameters(contents.lines())
}

fn first_column(row: &str) -> &str {
    let row = row.trim();
    if let Some(quoted) = row.strip_prefix('"') {
        return quoted.split('"').next().unwrap_or_default();
    }
    row.split(',').next().unwrap_or_default().trim()
}
