//! Protocol module for chat completion request/response structures
//!
//! This module defines the data models exchanged with the chat completions
//! endpoint. These structures are designed to be:
//! - Serialized directly as the request body
//! - Deterministic when serialized, so they can be used as cache keys
//! - Forward-compatible with streaming

pub mod types;

pub use types::{
    ChatRequest, ChatStreamChunk, ContentPart, FinishReason, FunctionCall, FunctionCallDelta,
    FunctionDefinition, ImageUrl, Message, MessageContent, MessageDelta, MessageRole,
    ResponseFormat, StreamChoice,
};

// Re-export common traits for convenience
pub use types::{IntoMessage, MessageBuilder};
