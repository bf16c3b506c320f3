//! Errors raised while loading inputs around the extraction core.
//!
//! The matching engine itself never fails; everything here belongs to the
//! surrounding layer that reads sessions, parameter lists and config files.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamexError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported parameter list format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("no parameters loaded")]
    NoParameters,

    #[error("no document loaded")]
    NoDocument,

    #[error("config error: {reason}")]
    Config { reason: String },
}

impl ParamexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ParamexError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParamexError>;
