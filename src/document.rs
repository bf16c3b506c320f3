use std::fmt;

use serde::{Deserialize, Serialize};

/// A positioned piece of text on a page, as produced by the converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    /// (x0, y0, x1, y1)
    pub bbox: (f32, f32, f32, f32),
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
}

impl Fragment {
    pub fn new(text: impl Into<String>, bbox: (f32, f32, f32, f32)) -> Self {
        Self {
            text: text.into(),
            bbox,
            size: None,
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" ({:.2}, {:.2}, {:.2}, {:.2})",
            self.text, self.bbox.0, self.bbox.1, self.bbox.2, self.bbox.3
        )
    }
}

/// One page of the source document with its own text rendering and fragments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredPage {
    pub page_number: u32,
    #[serde(default, alias = "raw_text")]
    pub text: String,
    #[serde(default, alias = "blocks")]
    pub fragments: Vec<Fragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

impl StructuredPage {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_fragment(mut self, fragment: Fragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    /// First non-empty line of the page's own rendering, trimmed.
    pub fn first_text_line(&self) -> Option<&str> {
        self.text.lines().map(str::trim).find(|line| !line.is_empty())
    }
}

/// The flattened, line-ordered rendering of a whole document.
///
/// Line indices are 0-based and follow reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedDocument {
    lines: Vec<String>,
}

impl FlattenedDocument {
    /// Split on `\n`. A trailing carriage return is dropped from each line.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text
                .split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
                .collect(),
        }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines `[index - radius, index + radius]` joined with newlines.
    pub fn context(&self, index: usize, radius: usize) -> String {
        if index >= self.lines.len() {
            return String::new();
        }
        let start = index.saturating_sub(radius);
        let end = (index + radius + 1).min(self.lines.len());
        self.lines[start..end].join("\n")
    }

    /// Index of the first line containing `needle` (exact, case-sensitive).
    pub fn find_line_containing(&self, needle: &str) -> Option<usize> {
        if needle.is_empty() {
            return None;
        }
        self.lines.iter().position(|line| line.contains(needle))
    }
}
