//! Request cache keyed by a fingerprint of the request state
//!
//! The cache is a best-effort shortcut: a hit skips the network call
//! entirely, a failure of any kind falls through to a live call. Entries
//! never expire.

mod file;
mod memory;

pub use file::FileRequestCache;
pub use memory::{MemoryCache, NoCache};

use crate::protocol::ChatRequest;
use thiserror::Error;

/// Errors raised by cache backends
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache file '{path}' is corrupt: {message}")]
    Corrupt { path: String, message: String },

    #[error("Failed to serialize cache key: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Flat key to final-text store
pub trait RequestCache: Send {
    /// Previously stored text for `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, overwriting any previous entry
    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Remove every entry
    fn clear(&mut self) -> Result<(), CacheError>;
}

/// Cache key for a request body plus the pending user input.
///
/// Computed before the input is appended to the history, so the same
/// question asked on the same history maps to the same key.
pub fn fingerprint(request: &ChatRequest, input: Option<&str>) -> Result<String, CacheError> {
    Ok(serde_json::to_string(&(request, input))?)
}
