//! OpenAI provider implementation
//!
//! Sends chat completion requests with `stream: true` and parses the
//! server-sent event stream into [`ChatStreamChunk`](crate::protocol::ChatStreamChunk)s.

mod client;
pub mod error;
mod streaming;

pub use client::OpenAIProvider;
pub use error::{map_error_response, map_stream_error, OpenAIError, OpenAIErrorDetail};
pub use streaming::parse_stream;
