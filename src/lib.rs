pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod highlight;
pub mod logging;
pub mod matcher;
pub mod page_map;
pub mod result;
pub mod session;
pub mod value;

pub use config::ExtractorConfig;
pub use document::{FlattenedDocument, Fragment, StructuredPage};
pub use error::{ParamexError, Result};
pub use extract::{DelegateRecord, ExtractionContext, Extractor};
pub use page_map::{PageEvidence, PageMapping, PageReconciler};
pub use result::{ExtractionMethod, ExtractionReport, ExtractionResult, ExtractionSummary};
pub use session::ExtractionSession;

/// Extract `parameters` from an already reconciled document.
///
/// Results come back in the same order as `parameters`, one per name.
pub fn extract_parameters<S>(
    document: &FlattenedDocument,
    mapping: &PageMapping,
    pages: &[StructuredPage],
    parameters: &[S],
    config: &ExtractorConfig,
) -> Vec<ExtractionResult>
where
    S: AsRef<str> + Sync,
{
    let context = ExtractionContext::new(document, mapping, pages);
    Extractor::new(context, config).extract_all(parameters)
}

/// Run a serialized session and return the results as JSON
///
/// # Arguments
/// * `session_json` - An `ExtractionSession` serialized as JSON
/// * `config` - Matching and reconciliation settings
/// * `report` - Wrap the results with summary counts
/// * `pretty` - Pretty print the output
pub fn process_session(
    session_json: &str,
    config: &ExtractorConfig,
    report: bool,
    pretty: bool,
) -> Result<String> {
    let session = ExtractionSession::from_json(session_json)?;
    let results = session.run(config)?;
    to_json(results, report, pretty)
}

/// Serialize results, optionally wrapped in an `ExtractionReport`.
pub fn to_json(results: Vec<ExtractionResult>, report: bool, pretty: bool) -> Result<String> {
    let json = match (report, pretty) {
        (true, true) => serde_json::to_string_pretty(&ExtractionReport::new(results))?,
        (true, false) => serde_json::to_string(&ExtractionReport::new(results))?,
        (false, true) => serde_json::to_string_pretty(&results)?,
        (false, false) => serde_json::to_string(&results)?,
    };
    Ok(json)
}
