//! Integration tests for the completion state machine

mod common;

use common::{content, finish, function, text_cycle, ScriptedProvider};
use lackai_core::functions::{FunctionSpec, ParameterSpec, ParameterType};
use lackai_core::protocol::{Message, MessageRole};
use lackai_core::{
    ClientConfig, CompletionClient, CompletionError, CompletionLogger, CompletionResponse,
    FileRequestCache, MemoryCache, CONTINUATION_INSTRUCTION,
};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn config() -> ClientConfig {
    ClientConfig::new("test-key")
}

fn client(provider: &ScriptedProvider) -> CompletionClient {
    CompletionClient::with_provider(provider.clone(), &config()).unwrap()
}

fn weather_spec() -> FunctionSpec {
    FunctionSpec::new("get_weather")
        .with_description("Current weather for a city")
        .with_param(ParameterSpec::required(
            "city",
            ParameterType::String,
            "City name",
        ))
        .with_param(ParameterSpec::optional(
            "unit",
            ParameterType::String,
            "celsius or fahrenheit",
            json!("celsius"),
        ))
}

/// Registers `get_weather` and returns its invocation counter.
fn add_weather(client: &mut CompletionClient) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    client.add_function(weather_spec(), move |args| {
        counter.fetch_add(1, Ordering::SeqCst);
        let city: String = args.get(0)?;
        let unit: String = args.get(1)?;
        Ok(json!({ "city": city, "temp": 21, "unit": unit }))
    });
    calls
}

fn roles(messages: &[Message]) -> Vec<MessageRole> {
    messages.iter().map(|m| m.role).collect()
}

#[derive(Clone, Default)]
struct RecordingLogger {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingLogger {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl CompletionLogger for RecordingLogger {
    fn log_server_request(&mut self, _request: &lackai_core::protocol::ChatRequest) {
        self.events.lock().unwrap().push("request".to_string());
    }

    fn log_function_call(&mut self, name: &str, _arguments: &Map<String, Value>) {
        self.events.lock().unwrap().push(format!("call:{name}"));
    }

    fn log_function_result(&mut self, name: &str, _result: &Value) {
        self.events.lock().unwrap().push(format!("result:{name}"));
    }

    fn log_cache_hit(&mut self, _key: &str) {
        self.events.lock().unwrap().push("cache-hit".to_string());
    }
}

#[tokio::test]
async fn test_plain_reply() {
    let provider = ScriptedProvider::new().with_cycle(vec![
        content("Hello"),
        content(", world"),
        finish("stop"),
    ]);
    let mut client = client(&provider);
    client.reset(Some("You are terse."), None, None);

    let reply = client.text_complete(Some("Greet me")).await.unwrap();

    assert_eq!(reply.text(), "Hello, world");
    assert_eq!(
        roles(client.conversation().messages()),
        vec![MessageRole::System, MessageRole::User, MessageRole::Assistant]
    );
    let request = &provider.requests()[0];
    assert_eq!(request.model, "gpt-4");
    assert_eq!(request.messages.len(), 2);
    assert!(request.functions.is_empty());
}

#[tokio::test]
async fn test_function_call_round_trip() {
    let provider = ScriptedProvider::new()
        .with_cycle(vec![
            function(Some("functions.get_wea"), ""),
            function(Some("ther"), "{\"ci"),
            function(None, "ty\": \"Berlin\"}"),
            finish("function_call"),
        ])
        .with_cycle(vec![
            content("It is 21"),
            content(" degrees."),
            finish("stop"),
        ]);
    let logger = RecordingLogger::default();
    let mut client = client(&provider).with_logger(logger.clone());
    let calls = add_weather(&mut client);
    client.reset(Some("You are a weather bot."), None, None);

    let reply = client.text_complete(Some("Weather in Berlin?")).await.unwrap();

    assert_eq!(reply.text(), "It is 21 degrees.");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let messages = client.conversation().messages();
    assert_eq!(
        roles(messages),
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::Function,
            MessageRole::Assistant,
        ]
    );
    let call = messages[2].function_call.as_ref().unwrap();
    assert_eq!(call.name, "functions.get_weather");
    assert_eq!(call.arguments, "{\"city\": \"Berlin\"}");
    assert_eq!(messages[3].name.as_deref(), Some("get_weather"));
    assert_eq!(
        messages[3].text(),
        Some("{\"city\":\"Berlin\",\"temp\":21,\"unit\":\"celsius\"}")
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].functions.len(), 1);
    assert_eq!(requests[0].functions[0].name, "get_weather");
    assert_eq!(requests[1].messages.len(), 4);

    assert_eq!(
        logger.events(),
        vec!["request", "call:get_weather", "result:get_weather", "request"]
    );
}

#[tokio::test]
async fn test_missing_parameter_is_sent_back_to_model() {
    let provider = ScriptedProvider::new()
        .with_cycle(vec![function(Some("get_weather"), "{}"), finish("function_call")])
        .with_cycle(text_cycle("Which city?", "stop"));
    let mut client = client(&provider);
    let calls = add_weather(&mut client);

    let reply = client.text_complete(Some("Weather?")).await.unwrap();

    assert_eq!(reply.text(), "Which city?");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let result = &client.conversation().messages()[2];
    assert_eq!(result.role, MessageRole::Function);
    let text = result.text().unwrap();
    let decoded: String = serde_json::from_str(text).unwrap();
    assert!(decoded.contains("Missing required parameter 'city'"));
    assert!(decoded.contains("try again"));
}

#[tokio::test]
async fn test_missing_parameter_messages_are_unique() {
    let provider = ScriptedProvider::new()
        .with_cycle(vec![function(Some("get_weather"), "{}"), finish("function_call")])
        .with_cycle(text_cycle("?", "stop"))
        .with_cycle(vec![function(Some("get_weather"), "{}"), finish("function_call")])
        .with_cycle(text_cycle("?", "stop"));
    let mut client = client(&provider);
    add_weather(&mut client);

    client.text_complete(Some("Weather?")).await.unwrap();
    client.text_complete(Some("Weather?")).await.unwrap();

    let results: Vec<&str> = client
        .conversation()
        .messages()
        .iter()
        .filter(|m| m.role == MessageRole::Function)
        .filter_map(Message::text)
        .collect();
    assert_eq!(results.len(), 2);
    assert_ne!(results[0], results[1]);
}

#[tokio::test]
async fn test_undefined_function_aborts() {
    let provider = ScriptedProvider::new()
        .with_cycle(vec![function(Some("launch_rocket"), "{}"), finish("function_call")]);
    let mut client = client(&provider);
    add_weather(&mut client);

    let err = client.text_complete(Some("Go")).await.unwrap_err();

    assert!(matches!(err, CompletionError::UndefinedFunction(ref name) if name == "launch_rocket"));
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_function_failure_propagates_unchanged() {
    let provider = ScriptedProvider::new()
        .with_cycle(vec![function(Some("explode"), "{}"), finish("function_call")]);
    let mut client = client(&provider);
    client.add_function(FunctionSpec::new("explode"), |_| Err("boom".into()));

    let err = client.text_complete(Some("Go")).await.unwrap_err();

    assert!(matches!(err, CompletionError::FunctionFailed(_)));
    assert_eq!(err.to_string(), "boom");
}

#[tokio::test]
async fn test_second_function_call_is_not_handled() {
    let provider = ScriptedProvider::new()
        .with_cycle(vec![
            function(Some("get_weather"), "{\"city\": \"Oslo\"}"),
            finish("function_call"),
        ])
        .with_cycle(vec![
            function(Some("get_weather"), "{\"city\": \"Rome\"}"),
            finish("function_call"),
        ]);
    let mut client = client(&provider);
    let calls = add_weather(&mut client);

    let reply = client.text_complete(Some("Weather?")).await.unwrap();

    assert_eq!(reply.text(), "");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn test_truncated_reply_is_continued() {
    let provider = ScriptedProvider::new()
        .with_cycle(text_cycle("Once upon ", "length"))
        .with_cycle(text_cycle("a time ", "length"))
        .with_cycle(text_cycle("the end.", "stop"));
    let mut client = client(&provider);

    let reply = client.text_complete(Some("Tell a story")).await.unwrap();

    assert_eq!(reply.text(), "Once upon a time the end.");
    assert_eq!(provider.request_count(), 3);
    let continuations = client
        .conversation()
        .messages()
        .iter()
        .filter(|m| m.text() == Some(CONTINUATION_INSTRUCTION))
        .count();
    assert_eq!(continuations, 2);
}

#[tokio::test]
async fn test_truncation_limit_is_fatal() {
    let provider = ScriptedProvider::new()
        .with_cycle(text_cycle("a", "length"))
        .with_cycle(text_cycle("b", "length"))
        .with_cycle(text_cycle("c", "length"));
    let mut client = client(&provider);

    let err = client.text_complete(Some("Tell a story")).await.unwrap_err();

    assert!(matches!(err, CompletionError::MaxContinuationsExceeded { max: 2 }));
    assert_eq!(provider.request_count(), 3);
}

#[tokio::test]
async fn test_continuation_budget_is_configurable() {
    let provider = ScriptedProvider::new().with_cycle(text_cycle("a", "length"));
    let mut client =
        CompletionClient::with_provider(provider.clone(), &config().with_max_continuations(0))
            .unwrap();

    let err = client.text_complete(Some("Go")).await.unwrap_err();

    assert!(matches!(err, CompletionError::MaxContinuationsExceeded { max: 0 }));
}

#[tokio::test]
async fn test_length_wins_over_function_call() {
    let provider = ScriptedProvider::new()
        .with_cycle(vec![function(Some("get_weather"), "{\"ci"), finish("length")])
        .with_cycle(text_cycle("Sorry.", "stop"));
    let mut client = client(&provider);
    let calls = add_weather(&mut client);

    let reply = client.text_complete(Some("Weather?")).await.unwrap();

    assert_eq!(reply.text(), "Sorry.");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_provider_error_propagates() {
    let provider = ScriptedProvider::new();
    provider.push_items(vec![Ok(content("partial")), Err("connection reset".to_string())]);
    let mut client = client(&provider);

    let err = client.text_complete(Some("Hi")).await.unwrap_err();

    assert!(matches!(err, CompletionError::Provider(_)));
    assert!(err.to_string().contains("connection reset"));
}

#[tokio::test]
async fn test_streamer_is_throttled() {
    let provider = ScriptedProvider::new().with_cycle(vec![
        content("aaaa"),
        content("bbbb"),
        content("cccc"),
        content("dddd"),
        content("eeee"),
        content("ffff"),
        finish("stop"),
    ]);
    let mut settings = config();
    settings.stream_flush_threshold = 10;
    let mut client = CompletionClient::with_provider(provider.clone(), &settings).unwrap();

    let mut seen = Vec::new();
    let reply = client
        .text_complete_streaming(Some("Go"), |partial: &CompletionResponse| {
            seen.push(partial.text().len())
        })
        .await
        .unwrap();

    assert_eq!(reply.text().len(), 24);
    assert_eq!(seen, vec![12, 24, 24]);
}

#[tokio::test]
async fn test_cache_hit_skips_provider() {
    let dir = TempDir::new().unwrap();
    let settings = config().with_cache_file(dir.path().join("cache.json"));

    let first = ScriptedProvider::new().with_cycle(text_cycle("Paris", "stop"));
    let mut client = CompletionClient::with_provider(first.clone(), &settings).unwrap();
    client.reset(Some("Geography quiz"), None, None);
    let reply = client.text_complete(Some("Capital of France?")).await.unwrap();
    assert_eq!(reply.text(), "Paris");

    let second = ScriptedProvider::new();
    let logger = RecordingLogger::default();
    let mut client = CompletionClient::with_provider(second.clone(), &settings)
        .unwrap()
        .with_logger(logger.clone());
    client.reset(Some("Geography quiz"), None, None);

    let mut streamed = Vec::new();
    let reply = client
        .text_complete_streaming(Some("Capital of France?"), |partial: &CompletionResponse| {
            streamed.push(partial.text().to_string())
        })
        .await
        .unwrap();

    assert_eq!(reply.text(), "Paris");
    assert_eq!(streamed, vec!["Paris"]);
    assert_eq!(second.request_count(), 0);
    assert_eq!(client.conversation().messages().len(), 1);
    assert_eq!(logger.events(), vec!["cache-hit"]);
}

#[tokio::test]
async fn test_cache_key_depends_on_history() {
    let provider = ScriptedProvider::new()
        .with_cycle(text_cycle("one", "stop"))
        .with_cycle(text_cycle("two", "stop"));
    let mut client = client(&provider).with_cache(MemoryCache::new());

    assert_eq!(client.text_complete(Some("Count")).await.unwrap().text(), "one");
    // Same question, longer history: a different key.
    assert_eq!(client.text_complete(Some("Count")).await.unwrap().text(), "two");
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn test_corrupt_cache_falls_through() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.json");
    let cache = FileRequestCache::new(&path).unwrap();
    std::fs::write(&path, "not json").unwrap();

    let provider = ScriptedProvider::new().with_cycle(text_cycle("live", "stop"));
    let mut client = client(&provider).with_cache(cache);

    let reply = client.text_complete(Some("Hi")).await.unwrap();

    assert_eq!(reply.text(), "live");
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_reset_applies_model_and_temperature() {
    let provider = ScriptedProvider::new().with_cycle(text_cycle("ok", "stop"));
    let mut client = client(&provider);
    client.reset(None, Some(0.7), Some("gpt-4o"));

    client.text_complete(Some("Hi")).await.unwrap();

    let request = &provider.requests()[0];
    assert_eq!(request.model, "gpt-4o");
    assert_eq!(request.temperature, Some(0.7));
    assert_eq!(request.messages.len(), 1);
    assert!(client.dump().contains("\"gpt-4o\""));
}
