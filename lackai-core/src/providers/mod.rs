//! Provider abstraction for streamed chat completions
//!
//! The orchestrator only needs one operation from a provider: send a request
//! and hand back the stream of chunks. Keeping that behind a trait lets tests
//! script responses without a network.

pub mod error;
pub mod openai;

pub use error::{ProviderError, ProviderResult};
pub use openai::OpenAIProvider;

use crate::protocol::{ChatRequest, ChatStreamChunk};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Stream of parsed chunks for one completion cycle
pub type ChatStream = Pin<Box<dyn Stream<Item = ProviderResult<ChatStreamChunk>> + Send>>;

/// A chat completions backend
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Get the provider's name
    fn name(&self) -> &str;

    /// Send a streaming request and return the chunk stream.
    async fn stream_chat(&self, request: &ChatRequest) -> ProviderResult<ChatStream>;
}
