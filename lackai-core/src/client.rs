//! Completion orchestrator
//!
//! One call to [`CompletionClient::text_complete`] runs a small state machine:
//!
//! ```text
//! Idle -> Streaming -> Continuing      -> Streaming ...
//!                   -> FunctionPending -> Streaming ...
//!                   -> Done
//! ```
//!
//! A reply cut off by the token limit is continued up to `max_continuations`
//! times. At most one function call is handled per call; the counter for
//! continuations is shared by the cycles before and after it.

use crate::accumulator::ResponseAccumulator;
use crate::cache::{fingerprint, FileRequestCache, NoCache, RequestCache};
use crate::config::{ClientConfig, ConfigError};
use crate::conversation::Conversation;
use crate::error::{CompletionError, CompletionResult};
use crate::facet::Facet;
use crate::functions::{
    strip_namespace, Arguments, BoxError, DispatchError, FunctionRegistry, FunctionSet,
    FunctionSpec,
};
use crate::logger::{CompletionLogger, TracingLogger};
use crate::protocol::FunctionDefinition;
use crate::providers::{ChatProvider, OpenAIProvider};
use crate::response::CompletionResponse;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// User turn appended when a reply stopped at the token limit
pub const CONTINUATION_INSTRUCTION: &str =
    "Your reply was cut off. Continue exactly where you stopped without repeating anything.";

/// Streaming callback receiving the full text produced so far
pub type Streamer<'a> = &'a mut (dyn FnMut(&CompletionResponse) + Send);

enum Phase {
    Streaming,
    Continuing,
    FunctionPending(ResponseAccumulator),
    Done,
}

/// Text and callback bookkeeping for one top-level call
struct Emission<'a> {
    text: String,
    last_flush: usize,
    threshold: usize,
    streamer: Option<Streamer<'a>>,
}

impl Emission<'_> {
    fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
        if self.text.len() > self.last_flush + self.threshold {
            self.last_flush = self.text.len();
            self.flush();
        }
    }

    fn flush(&mut self) {
        if let Some(streamer) = self.streamer.as_deref_mut() {
            streamer(&CompletionResponse::new(self.text.clone()));
        }
    }
}

/// Chat session with history, registered functions, cache and logger
pub struct CompletionClient {
    provider: Box<dyn ChatProvider>,
    conversation: Conversation,
    functions: FunctionRegistry,
    cache: Box<dyn RequestCache>,
    logger: Box<dyn CompletionLogger>,
    max_continuations: u32,
    flush_threshold: usize,
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("provider", &self.provider.name())
            .field("conversation", &self.conversation)
            .field("functions", &self.functions)
            .field("max_continuations", &self.max_continuations)
            .field("flush_threshold", &self.flush_threshold)
            .finish()
    }
}

impl CompletionClient {
    /// Client talking to the OpenAI API described by `config`.
    pub fn new(config: ClientConfig) -> CompletionResult<Self> {
        config.validate().map_err(ConfigError::from)?;
        let provider = OpenAIProvider::new(&config)?;
        Self::with_provider(provider, &config)
    }

    /// Client using an arbitrary provider; the config supplies everything else.
    pub fn with_provider<P>(provider: P, config: &ClientConfig) -> CompletionResult<Self>
    where
        P: ChatProvider + 'static,
    {
        let cache: Box<dyn RequestCache> = match &config.cache_file {
            Some(path) => Box::new(FileRequestCache::new(path)?),
            None => Box::new(NoCache),
        };

        let mut conversation = Conversation::new(config.model.as_str());
        conversation.set_temperature(config.temperature);
        conversation.set_max_tokens(config.max_tokens);
        conversation.set_json_mode(config.json_mode);

        Ok(Self {
            provider: Box::new(provider),
            conversation,
            functions: FunctionRegistry::new(),
            cache,
            logger: Box::new(TracingLogger),
            max_continuations: config.max_continuations,
            flush_threshold: config.stream_flush_threshold,
        })
    }

    pub fn with_cache(mut self, cache: impl RequestCache + 'static) -> Self {
        self.cache = Box::new(cache);
        self
    }

    pub fn with_logger(mut self, logger: impl CompletionLogger + 'static) -> Self {
        self.logger = Box::new(logger);
        self
    }

    /// Start a new session. `None` keeps the current temperature or model.
    pub fn reset(&mut self, system: Option<&str>, temperature: Option<f32>, model: Option<&str>) {
        self.conversation.reset(system);
        if let Some(temperature) = temperature {
            self.conversation.set_temperature(temperature);
        }
        if let Some(model) = model {
            self.conversation.set_model(model);
        }
    }

    /// Register a function the model may call.
    pub fn add_function<F>(&mut self, spec: FunctionSpec, callback: F)
    where
        F: Fn(&Arguments) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.functions.register(spec, callback);
    }

    /// Register every function of a set.
    pub fn register_all<S: FunctionSet>(&mut self, set: Arc<S>) {
        self.functions.register_all(set);
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    pub fn cache_mut(&mut self) -> &mut dyn RequestCache {
        self.cache.as_mut()
    }

    /// Template helpers bound to this client
    pub fn facet(&mut self) -> Facet<'_> {
        Facet::new(self)
    }

    /// Pretty-printed request body for the current history
    pub fn dump(&self) -> String {
        self.conversation
            .to_json_pretty(&self.functions.definitions())
    }

    /// Ask the model, optionally appending `question` as a new user turn.
    pub async fn text_complete(
        &mut self,
        question: Option<&str>,
    ) -> CompletionResult<CompletionResponse> {
        self.complete(question, None).await
    }

    /// Like [`text_complete`](Self::text_complete), calling `streamer` with the
    /// text so far whenever it grew past the flush threshold, and once at the end.
    pub async fn text_complete_streaming<F>(
        &mut self,
        question: Option<&str>,
        mut streamer: F,
    ) -> CompletionResult<CompletionResponse>
    where
        F: FnMut(&CompletionResponse) + Send,
    {
        let streamer: Streamer<'_> = &mut streamer;
        self.complete(question, Some(streamer)).await
    }

    async fn complete(
        &mut self,
        question: Option<&str>,
        streamer: Option<Streamer<'_>>,
    ) -> CompletionResult<CompletionResponse> {
        let mut emission = Emission {
            text: String::new(),
            last_flush: 0,
            threshold: self.flush_threshold,
            streamer,
        };

        let definitions = self.functions.definitions();
        let cache_key = match fingerprint(&self.conversation.to_request(&definitions), question) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!("Failed to compute cache key: {}", e);
                None
            }
        };

        if let Some(key) = &cache_key {
            match self.cache.get(key) {
                Ok(Some(cached)) => {
                    self.logger.log_cache_hit(key);
                    emission.text = cached;
                    emission.flush();
                    return Ok(CompletionResponse::new(emission.text));
                }
                Ok(None) => {}
                Err(e) => warn!("Cache lookup failed: {}", e),
            }
        }

        if let Some(question) = question.filter(|q| !q.is_empty()) {
            self.conversation.add_user_content(question);
        }

        let mut continuations = 0u32;
        let mut function_handled = false;
        let mut phase = Phase::Streaming;

        loop {
            phase = match phase {
                Phase::Streaming => {
                    let response = self.stream_cycle(&definitions, &mut emission).await?;
                    self.conversation.add_response(&response);
                    self.next_phase(response, function_handled)
                }
                Phase::Continuing => {
                    if continuations >= self.max_continuations {
                        return Err(CompletionError::MaxContinuationsExceeded {
                            max: self.max_continuations,
                        });
                    }
                    continuations += 1;
                    debug!(continuations, "Reply truncated, asking the model to continue");
                    self.conversation.add_user_content(CONTINUATION_INSTRUCTION);
                    Phase::Streaming
                }
                Phase::FunctionPending(response) => {
                    function_handled = true;
                    self.run_function(&response)?;
                    Phase::Streaming
                }
                Phase::Done => break,
            };
        }

        if let Some(key) = &cache_key {
            if let Err(e) = self.cache.set(key, &emission.text) {
                warn!("Failed to store reply in cache: {}", e);
            }
        }
        emission.flush();
        Ok(CompletionResponse::new(emission.text))
    }

    async fn stream_cycle(
        &mut self,
        definitions: &[FunctionDefinition],
        emission: &mut Emission<'_>,
    ) -> CompletionResult<ResponseAccumulator> {
        let request = self.conversation.to_request(definitions);
        self.logger.log_server_request(&request);

        let mut stream = self.provider.stream_chat(&request).await?;
        let mut response = ResponseAccumulator::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            response.add_chunk(&chunk);
            let fragment = chunk
                .choices
                .first()
                .and_then(|choice| choice.delta.content.as_deref())
                .unwrap_or_default();
            if !fragment.is_empty() {
                self.logger.log_stream_output(fragment);
                emission.push(fragment);
            }
        }

        self.logger.log_server_response(&response.to_message());
        Ok(response)
    }

    fn next_phase(&self, response: ResponseAccumulator, function_handled: bool) -> Phase {
        if response.finish_reason().is_some_and(|r| r.is_truncated()) {
            return Phase::Continuing;
        }
        if response.is_function_call() {
            if !function_handled {
                return Phase::FunctionPending(response);
            }
            warn!(
                function = response.function_name(),
                "Ignoring second function call in the same completion"
            );
        }
        Phase::Done
    }

    fn run_function(&mut self, response: &ResponseAccumulator) -> CompletionResult<()> {
        let name = strip_namespace(response.function_name()).to_string();
        let arguments = response.function_arguments();
        self.logger.log_function_call(&name, &arguments);

        let result = match self.functions.dispatch(&name, &arguments) {
            Ok(value) => value,
            Err(DispatchError::MissingParameter {
                function,
                parameter,
            }) => {
                warn!(function = %function, parameter = %parameter, "Model omitted a required parameter");
                Value::String(format!(
                    "Error: Missing required parameter '{parameter}' for function '{function}'. \
                     Please append the missing parameter and try again. {}",
                    Uuid::new_v4()
                ))
            }
            Err(e) => return Err(e.into()),
        };

        self.logger.log_function_result(&name, &result);
        self.conversation.add_function_result(name.as_str(), &result);
        Ok(())
    }
}
