//! Accumulation of streamed deltas into one assistant message
//!
//! The provider may split a function name or its JSON arguments across any
//! number of chunks, so every fragment is appended verbatim in delivery order.
//! Argument JSON is only interpreted once the stream has ended.

use crate::protocol::{
    ChatStreamChunk, FinishReason, FunctionCall, Message, MessageContent, MessageDelta,
    MessageRole,
};
use serde_json::{Map, Value};
use tracing::warn;

/// Running state of one streamed assistant turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseAccumulator {
    content: String,
    function_name: String,
    function_arguments: String,
    finish_reason: Option<FinishReason>,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one delta fragment.
    pub fn add_delta(&mut self, delta: &MessageDelta) {
        if let Some(call) = &delta.function_call {
            if let Some(name) = &call.name {
                self.function_name.push_str(name);
            }
            if let Some(arguments) = &call.arguments {
                self.function_arguments.push_str(arguments);
            }
        }
        if let Some(content) = &delta.content {
            self.content.push_str(content);
        }
    }

    /// Feed a whole stream chunk. Only the first choice is tracked.
    pub fn add_chunk(&mut self, chunk: &ChatStreamChunk) {
        let Some(choice) = chunk.choices.first() else {
            return;
        };
        self.add_delta(&choice.delta);
        if let Some(reason) = &choice.finish_reason {
            self.finish_reason = Some(FinishReason::from(reason.as_str()));
        }
    }

    /// Accumulated plain-text content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Accumulated function name (possibly still incomplete mid-stream)
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Raw accumulated argument string
    pub fn raw_function_arguments(&self) -> &str {
        &self.function_arguments
    }

    /// Last finish reason seen on the stream
    pub fn finish_reason(&self) -> Option<&FinishReason> {
        self.finish_reason.as_ref()
    }

    pub fn is_function_call(&self) -> bool {
        !self.function_name.is_empty()
    }

    /// Parse the accumulated arguments as a JSON object.
    ///
    /// An empty, malformed or non-object argument string yields an empty map.
    pub fn function_arguments(&self) -> Map<String, Value> {
        if self.function_arguments.trim().is_empty() {
            return Map::new();
        }
        match serde_json::from_str::<Value>(&self.function_arguments) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                warn!(
                    "Function arguments for '{}' are not a JSON object: {}",
                    self.function_name, other
                );
                Map::new()
            }
            Err(e) => {
                warn!(
                    "Malformed function arguments for '{}': {}",
                    self.function_name, e
                );
                Map::new()
            }
        }
    }

    /// Build the assistant message to append to the history.
    ///
    /// `function_call` is only set when a function name was streamed.
    pub fn to_message(&self) -> Message {
        let function_call = self.is_function_call().then(|| FunctionCall {
            name: self.function_name.clone(),
            arguments: self.function_arguments.clone(),
        });
        Message {
            role: MessageRole::Assistant,
            content: MessageContent::Text(self.content.clone()),
            name: None,
            function_call,
        }
    }
}
