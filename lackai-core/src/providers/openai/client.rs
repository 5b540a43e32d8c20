//! OpenAI client implementation

use super::error::map_error_response;
use super::streaming::parse_stream;
use crate::config::{ClientConfig, SecretString};
use crate::protocol::ChatRequest;
use crate::providers::{ChatProvider, ChatStream, ProviderError, ProviderResult};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Default user agent
const USER_AGENT: &str = concat!("lackai/", env!("CARGO_PKG_VERSION"));

/// OpenAI provider implementation
pub struct OpenAIProvider {
    api_key: SecretString,
    base_url: String,
    client: Client,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from the client configuration
    pub fn new(config: &ClientConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .read_timeout(Duration::from_millis(config.read_timeout_ms))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn stream_chat(&self, request: &ChatRequest) -> ProviderResult<ChatStream> {
        let mut body = request.clone();
        body.stream = Some(true);

        let url = self.completions_url();
        debug!("Streaming chat completion from {} (model: {})", url, body.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret().trim())
            .header(ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(parse_stream(response.bytes_stream()));
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!("Chat completion failed with status {}", status);
        Err(map_error_response(status, retry_after.as_deref(), body))
    }
}
