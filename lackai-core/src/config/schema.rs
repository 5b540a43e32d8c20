//! Client configuration schema with serde support

use super::error::ValidationError;
use super::secrets::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default OpenAI API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Root configuration of a completion client
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// API key (supports environment variable interpolation)
    pub api_key: SecretString,

    /// Base URL of the chat completions API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token cap for each completion cycle
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Ask the model for a JSON object reply
    #[serde(default)]
    pub json_mode: bool,

    /// How many times a length-truncated reply may be continued
    #[serde(default = "default_max_continuations")]
    pub max_continuations: u32,

    /// Minimum growth in characters between two streaming callbacks
    #[serde(default = "default_flush_threshold")]
    pub stream_flush_threshold: usize,

    /// File used by the request cache; no cache when unset
    #[serde(default)]
    pub cache_file: Option<PathBuf>,

    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Longest idle gap between two reads of the response, in milliseconds.
    /// A stream that keeps delivering chunks is never cut off.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::default(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            json_mode: false,
            max_continuations: default_max_continuations(),
            stream_flush_threshold: default_flush_threshold(),
            cache_file: None,
            connect_timeout_ms: default_connect_timeout(),
            read_timeout_ms: default_read_timeout(),
        }
    }
}

// Default value functions for serde
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_model() -> String { crate::conversation::DEFAULT_MODEL.to_string() }
fn default_temperature() -> f32 { crate::conversation::DEFAULT_TEMPERATURE }
fn default_max_continuations() -> u32 { 2 }
fn default_flush_threshold() -> usize { 250 }
fn default_connect_timeout() -> u64 { 10_000 }
fn default_read_timeout() -> u64 { 120_000 }

impl ClientConfig {
    /// Create a configuration with defaults and the given API key
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the maximum number of continuations
    pub fn with_max_continuations(mut self, max: u32) -> Self {
        self.max_continuations = max;
        self
    }

    /// Set the cache file
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(path.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::required("api_key"));
        }

        if self.model.trim().is_empty() {
            return Err(ValidationError::required("model"));
        }

        match url::Url::parse(&self.base_url) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::invalid_url(
                        "base_url",
                        format!("URL scheme must be http or https, got: {}", url.scheme()),
                    ));
                }
            }
            Err(e) => return Err(ValidationError::invalid_url("base_url", e.to_string())),
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::out_of_range(
                "temperature",
                "Must be between 0.0 and 2.0",
            ));
        }

        if self.max_tokens == Some(0) {
            return Err(ValidationError::out_of_range(
                "max_tokens",
                "Must be greater than 0",
            ));
        }

        if self.stream_flush_threshold == 0 {
            return Err(ValidationError::out_of_range(
                "stream_flush_threshold",
                "Must be greater than 0",
            ));
        }

        if self.read_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                "read_timeout_ms",
                "Timeouts must be greater than 0",
            ));
        }

        Ok(())
    }
}
