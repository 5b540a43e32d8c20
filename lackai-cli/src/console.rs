//! Terminal output: incremental reply printing and a visible event log

use lackai_core::protocol::{ChatRequest, Message};
use lackai_core::{CompletionLogger, CompletionResponse, TracingLogger};
use serde_json::{Map, Value};
use std::io::{self, Write};

/// Prints only the part of each streamed snapshot not shown yet.
#[derive(Debug, Default)]
pub struct IncrementalPrinter {
    printed: usize,
}

impl IncrementalPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of `partial` past what was already printed
    pub fn unseen<'a>(&mut self, partial: &'a CompletionResponse) -> &'a str {
        let text = partial.text();
        match text.get(self.printed..) {
            Some(rest) => {
                self.printed = text.len();
                rest
            }
            None => "",
        }
    }

    pub fn print(&mut self, partial: &CompletionResponse) {
        let rest = self.unseen(partial);
        if !rest.is_empty() {
            print!("{rest}");
            let _ = io::stdout().flush();
        }
    }
}

/// Shows function calls and cache hits on stderr, forwarding everything to tracing.
#[derive(Debug, Default)]
pub struct ConsoleLogger {
    inner: TracingLogger,
}

impl CompletionLogger for ConsoleLogger {
    fn log_server_request(&mut self, request: &ChatRequest) {
        self.inner.log_server_request(request);
    }

    fn log_server_response(&mut self, response: &Message) {
        self.inner.log_server_response(response);
    }

    fn log_stream_output(&mut self, fragment: &str) {
        self.inner.log_stream_output(fragment);
    }

    fn log_function_call(&mut self, name: &str, arguments: &Map<String, Value>) {
        eprintln!("\n> Function call: {name} ({})", Value::Object(arguments.clone()));
        self.inner.log_function_call(name, arguments);
    }

    fn log_function_result(&mut self, name: &str, result: &Value) {
        eprintln!("\n< Function result of {name}: {result}");
        self.inner.log_function_result(name, result);
    }

    fn log_cache_hit(&mut self, key: &str) {
        eprintln!("(cached)");
        self.inner.log_cache_hit(key);
    }
}
