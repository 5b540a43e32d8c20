//! Message history and generation parameters of one chat session

use crate::accumulator::ResponseAccumulator;
use crate::protocol::{ChatRequest, FunctionDefinition, Message, ResponseFormat};
use serde_json::Value;

/// Default model when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Ordered message history plus the parameters used to build each request.
///
/// History is append-only between resets.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    json_mode: bool,
    messages: Vec<Message>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl Conversation {
    /// Create an empty conversation for the given model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            json_mode: false,
            messages: Vec::new(),
        }
    }

    /// Clear the history, optionally seeding it with a system message.
    pub fn reset(&mut self, system: Option<&str>) {
        self.messages.clear();
        if let Some(system) = system.filter(|s| !s.is_empty()) {
            self.messages.push(Message::system(system));
        }
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn add_user_content(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Append the accumulated assistant turn.
    pub fn add_response(&mut self, response: &ResponseAccumulator) {
        self.messages.push(response.to_message());
    }

    /// Append a function result turn with the JSON-encoded value.
    pub fn add_function_result(&mut self, name: impl Into<String>, result: &Value) {
        self.messages.push(Message::function(name, result.to_string()));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        self.temperature = temperature;
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn set_max_tokens(&mut self, max_tokens: Option<u32>) {
        self.max_tokens = max_tokens;
    }

    pub fn json_mode(&self) -> bool {
        self.json_mode
    }

    pub fn set_json_mode(&mut self, enabled: bool) {
        self.json_mode = enabled;
    }

    /// Build the request body for the current state.
    pub fn to_request(&self, functions: &[FunctionDefinition]) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: self.messages.clone(),
            functions: functions.to_vec(),
            temperature: Some(self.temperature),
            max_tokens: self.max_tokens,
            response_format: self.json_mode.then_some(ResponseFormat::JsonObject),
            stream: None,
        }
    }

    /// Pretty-printed request body, for debugging.
    pub fn to_json_pretty(&self, functions: &[FunctionDefinition]) -> String {
        serde_json::to_string_pretty(&self.to_request(functions)).unwrap_or_default()
    }
}
