use tracing::debug;

use crate::document::StructuredPage;
use crate::logging::HIGHLIGHT;
use crate::result::{Highlight, HighlightKind};

/// Find fragments on `page_number` that show the parameter name or the value.
///
/// Parameter hits (case-insensitive) come first, then value hits (literal
/// match). A fragment containing both appears twice. Empty search text never
/// matches and an unknown page yields no highlights.
pub fn correlate(
    page_number: u32,
    parameter_text: &str,
    value_text: &str,
    pages: &[StructuredPage],
) -> Vec<Highlight> {
    let Some(page) = pages.iter().find(|page| page.page_number == page_number) else {
        return Vec::new();
    };

    let parameter_lower = parameter_text.trim().to_lowercase();
    let value_text = value_text.trim();

    let parameter_hits = page
        .fragments
        .iter()
        .filter(|_| !parameter_lower.is_empty())
        .filter(|fragment| fragment.text.to_lowercase().contains(&parameter_lower))
        .map(|fragment| Highlight::from_fragment(fragment, HighlightKind::Parameter));

    let value_hits = page
        .fragments
        .iter()
        .filter(|_| !value_text.is_empty())
        .filter(|fragment| fragment.text.contains(value_text))
        .map(|fragment| Highlight::from_fragment(fragment, HighlightKind::Value));

    let highlights: Vec<Highlight> = parameter_hits.chain(value_hits).collect();

    debug!(
        target: HIGHLIGHT,
        page = page_number,
        parameter = parameter_text,
        value = value_text,
        count = highlights.len(),
        "Correlated highlights"
    );

    highlights
}
