//! Error types for phase validation and plan loading

use thiserror::Error;

/// A malformed phase parameter
///
/// The only error the engine and orchestrator raise. It is fatal to the
/// calculation that produced it and carries the offending field name.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid parameter `{field}`: {message}")]
pub struct InvalidParameterError {
    pub field: &'static str,
    pub message: String,
}

impl InvalidParameterError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors raised while reading a plan file
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read plan file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV plan: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON plan: {0}")]
    Json(#[from] serde_json::Error),

    /// `index` is the 1-based phase number within the file
    #[error("phase {index}: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: InvalidParameterError,
    },

    #[error("plan file contains no phases")]
    Empty,

    #[error("unsupported plan file extension: {0:?}")]
    UnsupportedFormat(String),
}
