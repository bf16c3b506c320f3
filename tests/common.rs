#![allow(dead_code)]

use std::sync::Once;

use paramex::{
    extract_parameters, ExtractionResult, ExtractorConfig, FlattenedDocument, Fragment,
    PageEvidence, PageMapping, PageReconciler, StructuredPage,
};

static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(|| {
        paramex::logging::init_logging();
    });
}

/// Builds a flattened document together with its page structure.
#[derive(Default)]
pub struct DocumentBuilder {
    lines: Vec<String>,
    pages: Vec<StructuredPage>,
    evidence: PageEvidence,
    total_pages: Option<u32>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, text: &str) -> Self {
        self.lines.push(text.to_string());
        self
    }

    /// Append `count` lines that never match a parameter or carry a value.
    pub fn filler(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.lines.push("lorem ipsum dolor sit amet".to_string());
        }
        self
    }

    /// Mark every line added from now on as belonging to `page_number`
    /// until the next call.
    pub fn on_page(mut self, page_number: u32) -> Self {
        self.evidence.insert(self.lines.len(), page_number);
        self
    }

    pub fn page(mut self, page: StructuredPage) -> Self {
        self.pages.push(page);
        self
    }

    pub fn total_pages(mut self, total: u32) -> Self {
        self.total_pages = Some(total);
        self
    }

    pub fn build(self) -> Fixture {
        let document = FlattenedDocument::from_lines(self.lines);
        let total_pages = self.total_pages.or_else(|| {
            self.pages
                .iter()
                .map(|p| p.page_number)
                .chain(self.evidence.values().copied())
                .max()
        });

        // Marked pages run until the next mark; expand so coverage is complete.
        let mut evidence = PageEvidence::new();
        let marks: Vec<(usize, u32)> = self.evidence.into_iter().collect();
        for (i, &(start, page)) in marks.iter().enumerate() {
            let end = marks.get(i + 1).map(|&(next, _)| next).unwrap_or(document.len());
            for line in start..end {
                evidence.insert(line, page);
            }
        }

        let mapping = PageReconciler::default().map_document(
            &document,
            &self.pages,
            (!evidence.is_empty()).then_some(&evidence),
            total_pages,
        );
        Fixture {
            document,
            mapping,
            pages: self.pages,
        }
    }
}

pub struct Fixture {
    pub document: FlattenedDocument,
    pub mapping: PageMapping,
    pub pages: Vec<StructuredPage>,
}

impl Fixture {
    pub fn extract(&self, name: &str) -> ExtractionResult {
        self.extract_with(name, &ExtractorConfig::default())
    }

    pub fn extract_with(&self, name: &str, config: &ExtractorConfig) -> ExtractionResult {
        self.extract_all(&[name], config).remove(0)
    }

    pub fn extract_all(&self, names: &[&str], config: &ExtractorConfig) -> Vec<ExtractionResult> {
        extract_parameters(&self.document, &self.mapping, &self.pages, names, config)
    }
}

pub fn fragment(text: &str, x0: f32, y0: f32) -> Fragment {
    Fragment::new(text, (x0, y0, x0 + 10.0 * text.len() as f32, y0 + 12.0))
}
