//! Event sink for the completion cycle
//!
//! Every method has an empty default so a logger only implements the events
//! it cares about. Loggers observe; they cannot fail or alter control flow.

use crate::protocol::{ChatRequest, Message};
use serde_json::{Map, Value};
use tracing::{debug, info, trace};

/// Receiver of discrete completion events
pub trait CompletionLogger: Send {
    /// Outgoing request, before it is sent
    fn log_server_request(&mut self, _request: &ChatRequest) {}

    /// Complete assistant message after the stream ended
    fn log_server_response(&mut self, _response: &Message) {}

    /// One streamed content fragment
    fn log_stream_output(&mut self, _fragment: &str) {}

    /// Function about to be dispatched
    fn log_function_call(&mut self, _name: &str, _arguments: &Map<String, Value>) {}

    /// Function result (or the error text sent back to the model)
    fn log_function_result(&mut self, _name: &str, _result: &Value) {}

    /// Request answered from the cache
    fn log_cache_hit(&mut self, _key: &str) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl CompletionLogger for TracingLogger {
    fn log_server_request(&mut self, request: &ChatRequest) {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            functions = request.functions.len(),
            "Server request"
        );
        trace!(
            "Server request body: {}",
            serde_json::to_string(request).unwrap_or_default()
        );
    }

    fn log_server_response(&mut self, response: &Message) {
        debug!(
            function_call = response.function_call.is_some(),
            "Server response: {}",
            serde_json::to_string(response).unwrap_or_default()
        );
    }

    fn log_stream_output(&mut self, fragment: &str) {
        trace!(fragment, "Stream output");
    }

    fn log_function_call(&mut self, name: &str, arguments: &Map<String, Value>) {
        let arguments = Value::Object(arguments.clone());
        info!(function = name, "Function call ({})", arguments);
    }

    fn log_function_result(&mut self, name: &str, result: &Value) {
        info!(function = name, "Function result: {}", result);
    }

    fn log_cache_hit(&mut self, key: &str) {
        info!(key_len = key.len(), "Cache hit");
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl CompletionLogger for NullLogger {}
