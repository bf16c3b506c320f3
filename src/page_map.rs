//! Line → page reconciliation between the flattened text and the page structure.
//!
//! Reconciliation runs as a small state machine:
//! `StructuralMatch → (insufficient coverage) → UniformEstimate → GapFill`.
//! Every path ends in `GapFill`, which guarantees a page for every line.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, event, Level};

use crate::config::ExtractorConfig;
use crate::document::{FlattenedDocument, StructuredPage};
use crate::logging::RECONCILE;

/// Partial `line_index → page_number` observations.
pub type PageEvidence = BTreeMap<usize, u32>;

/// Which stage produced the final assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingSource {
    Structural,
    Estimated,
    /// No evidence and nothing to estimate from; every line is page 1.
    Default,
}

/// Total mapping from every flattened line to a 1-based page number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMapping {
    pages: Vec<u32>,
    total_pages: u32,
    source: MappingSource,
}

impl PageMapping {
    pub fn page_for_line(&self, line_index: usize) -> Option<u32> {
        self.pages.get(line_index).copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn source(&self) -> MappingSource {
        self.source
    }

    /// Number of lines assigned to each page.
    pub fn distribution(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for page in &self.pages {
            *counts.entry(*page).or_insert(0) += 1;
        }
        counts
    }
}

enum Stage {
    StructuralMatch(PageEvidence),
    UniformEstimate,
    GapFill(PageEvidence, MappingSource),
}

#[derive(Debug, Clone)]
pub struct PageReconciler {
    window: usize,
    prefix_len: usize,
    min_coverage: f64,
}

impl Default for PageReconciler {
    fn default() -> Self {
        Self::from_config(&ExtractorConfig::default())
    }
}

impl PageReconciler {
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            window: config.structural_window.max(1),
            prefix_len: config.prefix_len.max(1),
            min_coverage: config.min_coverage,
        }
    }

    /// Locate each page's first line inside the flattened text and assign the
    /// following window of lines to that page.
    pub fn collect_evidence(
        &self,
        document: &FlattenedDocument,
        pages: &[StructuredPage],
    ) -> PageEvidence {
        let lines = document.lines();
        let mut evidence = PageEvidence::new();
        let mut offset = 0;

        for page in pages {
            let Some(first_line) = page.first_text_line() else {
                debug!(
                    target: RECONCILE,
                    page = page.page_number,
                    "Page has no text to anchor on"
                );
                continue;
            };
            let page_prefix = char_prefix(first_line, self.prefix_len);

            let hit = (offset..lines.len()).find(|&n| {
                let line = lines[n].trim();
                !line.is_empty()
                    && (line.contains(page_prefix)
                        || first_line.contains(char_prefix(line, self.prefix_len)))
            });

            match hit {
                Some(start) => {
                    let end = (start + self.window).min(lines.len());
                    for line_index in start..end {
                        evidence.insert(line_index, page.page_number);
                    }
                    offset = start + self.window;
                    debug!(
                        target: RECONCILE,
                        page = page.page_number,
                        start,
                        end,
                        "Anchored page in flattened text"
                    );
                }
                None => {
                    debug!(
                        target: RECONCILE,
                        page = page.page_number,
                        anchor = page_prefix,
                        "Page anchor not found"
                    );
                }
            }
        }

        evidence
    }

    /// Build a total page mapping from partial evidence.
    ///
    /// A missing or zero `total_pages` is treated as a single-page document.
    pub fn reconcile(
        &self,
        evidence: &PageEvidence,
        line_count: usize,
        total_pages: Option<u32>,
    ) -> PageMapping {
        let total_pages = total_pages.filter(|&t| t > 0).unwrap_or(1);

        let observed: PageEvidence = evidence
            .iter()
            .filter(|&(&line, &page)| {
                line < line_count && (1..=total_pages).contains(&page)
            })
            .map(|(&line, &page)| (line, page))
            .collect();
        if observed.len() < evidence.len() {
            debug!(
                target: RECONCILE,
                discarded = evidence.len() - observed.len(),
                "Discarded out-of-range page observations"
            );
        }

        let mut stage = Stage::StructuralMatch(observed);
        loop {
            stage = match stage {
                Stage::StructuralMatch(observed) => {
                    let required = line_count as f64 * self.min_coverage;
                    if (observed.len() as f64) < required {
                        event!(
                            target: RECONCILE,
                            Level::INFO,
                            mapped = observed.len(),
                            line_count,
                            "Structural evidence too sparse, estimating pages"
                        );
                        Stage::UniformEstimate
                    } else {
                        Stage::GapFill(observed, MappingSource::Structural)
                    }
                }
                Stage::UniformEstimate => Stage::GapFill(
                    uniform_estimate(line_count, total_pages),
                    MappingSource::Estimated,
                ),
                Stage::GapFill(observed, source) => {
                    let mapping = gap_fill(&observed, line_count, total_pages, source);
                    debug!(
                        target: RECONCILE,
                        source = ?mapping.source,
                        distribution = ?mapping.distribution(),
                        "Page mapping complete"
                    );
                    return mapping;
                }
            };
        }
    }

    /// Collect structural evidence, merge any caller-supplied observations on
    /// top, and reconcile.
    pub fn map_document(
        &self,
        document: &FlattenedDocument,
        pages: &[StructuredPage],
        supplied: Option<&PageEvidence>,
        total_pages: Option<u32>,
    ) -> PageMapping {
        let mut evidence = self.collect_evidence(document, pages);
        if let Some(supplied) = supplied {
            evidence.extend(supplied.iter().map(|(&line, &page)| (line, page)));
        }
        self.reconcile(&evidence, document.len(), total_pages)
    }
}

/// Reconcile with default settings.
pub fn reconcile(
    evidence: &PageEvidence,
    line_count: usize,
    total_pages: Option<u32>,
) -> PageMapping {
    PageReconciler::default().reconcile(evidence, line_count, total_pages)
}

/// Spread lines evenly over the pages; the last page absorbs any remainder.
pub fn uniform_estimate(line_count: usize, total_pages: u32) -> PageEvidence {
    let total_pages = total_pages.max(1);
    let lines_per_page = (line_count / total_pages as usize).max(1);
    (0..line_count)
        .map(|line| {
            let page = (line / lines_per_page + 1).min(total_pages as usize) as u32;
            (line, page)
        })
        .collect()
}

fn gap_fill(
    observed: &PageEvidence,
    line_count: usize,
    total_pages: u32,
    source: MappingSource,
) -> PageMapping {
    let Some(&first_page) = observed.values().next() else {
        return PageMapping {
            pages: vec![1; line_count],
            total_pages,
            source: MappingSource::Default,
        };
    };

    let mut current = first_page;
    let pages = (0..line_count)
        .map(|line| {
            if let Some(&page) = observed.get(&line) {
                current = page;
            }
            current
        })
        .collect();

    PageMapping {
        pages,
        total_pages,
        source,
    }
}

fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
