//! Errors surfaced by the completion client

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::functions::{BoxError, DispatchError};
use crate::providers::ProviderError;
use crate::template::TemplateError;
use thiserror::Error;

/// Result type for completion operations
pub type CompletionResult<T> = Result<T, CompletionError>;

/// Errors that abort a completion call
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The model called a function that is not registered
    #[error("Undefined function '{0}'")]
    UndefinedFunction(String),

    /// A required parameter was absent. Recovered inside the completion loop;
    /// only surfaced by direct dispatch.
    #[error("Missing required parameter '{parameter}' for function '{function}'")]
    MissingParameter { function: String, parameter: String },

    /// The reply was still truncated after the allowed continuations
    #[error("Reply still truncated after {max} continuations")]
    MaxContinuationsExceeded { max: u32 },

    /// Network or provider failure, passed through unchanged
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A registered function failed; its error is passed through unchanged
    #[error(transparent)]
    FunctionFailed(BoxError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Cache could not be opened. Lookup and store failures never abort.
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<DispatchError> for CompletionError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::UndefinedFunction(name) => CompletionError::UndefinedFunction(name),
            DispatchError::MissingParameter {
                function,
                parameter,
            } => CompletionError::MissingParameter {
                function,
                parameter,
            },
            DispatchError::Failed(source) => CompletionError::FunctionFailed(source),
        }
    }
}
