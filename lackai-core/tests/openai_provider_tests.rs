//! Tests for the OpenAI provider against a mock server

use futures::StreamExt;
use lackai_core::protocol::{ChatRequest, ChatStreamChunk, Message, MessageRole};
use lackai_core::providers::{ChatProvider, OpenAIProvider, ProviderError};
use lackai_core::{ClientConfig, CompletionClient, CompletionError};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(events: &[serde_json::Value]) -> String {
    let mut body = String::new();
    for event in events {
        body.push_str(&format!("data: {}\n\n", event));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn content_event(text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion.chunk",
        "created": 1,
        "model": "gpt-4",
        "choices": [{ "index": 0, "delta": { "content": text }, "finish_reason": null }]
    })
}

fn finish_event(reason: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion.chunk",
        "created": 1,
        "model": "gpt-4",
        "choices": [{ "index": 0, "delta": {}, "finish_reason": reason }]
    })
}

fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

fn provider_for(server: &MockServer) -> OpenAIProvider {
    OpenAIProvider::new(&ClientConfig::new("test-key").with_base_url(server.uri())).unwrap()
}

fn request() -> ChatRequest {
    ChatRequest::new("gpt-4", vec![Message::user("Hello")])
}

#[tokio::test]
async fn test_stream_chat_parses_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("accept", "text/event-stream"))
        .and(body_partial_json(json!({ "model": "gpt-4", "stream": true })))
        .respond_with(sse_response(sse(&[
            content_event("Hel"),
            content_event("lo"),
            finish_event("stop"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let chunks: Vec<ChatStreamChunk> = provider
        .stream_chat(&request())
        .await
        .unwrap()
        .map(|chunk| chunk.unwrap())
        .collect()
        .await;

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].choices[0].delta.content.as_deref(), Some("Hel"));
    assert_eq!(chunks[2].choices[0].finish_reason.as_deref(), Some("stop"));
}

#[tokio::test]
async fn test_invalid_events_are_skipped() {
    let server = MockServer::start().await;
    let body = format!(
        "data: {{not json}}\n\n{}",
        sse(&[content_event("ok"), finish_event("stop")])
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse_response(body))
        .mount(&server)
        .await;

    let chunks: Vec<_> = provider_for(&server)
        .stream_chat(&request())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(Result::is_ok));
}

#[tokio::test]
async fn test_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .stream_chat(&request())
        .await
        .err()
        .unwrap();

    assert!(matches!(err, ProviderError::Authentication(ref m) if m.contains("Incorrect API key")));
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_json(json!({
                    "error": { "message": "Slow down", "type": "requests", "code": "rate_limit_exceeded" }
                })),
        )
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .stream_chat(&request())
        .await
        .err()
        .unwrap();

    match err {
        ProviderError::RateLimit {
            message,
            retry_after_secs,
        } => {
            assert_eq!(message, "Slow down");
            assert_eq!(retry_after_secs, Some(7));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_without_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .stream_chat(&request())
        .await
        .err()
        .unwrap();

    assert!(matches!(err, ProviderError::ServiceUnavailable(_)));
}

#[tokio::test]
async fn test_client_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system", "content": "Be brief." },
                { "role": "user", "content": "Hi" }
            ]
        })))
        .respond_with(sse_response(sse(&[
            content_event("Hi "),
            content_event("there"),
            finish_event("stop"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new("test-key").with_base_url(server.uri());
    let mut client = CompletionClient::new(config).unwrap();
    client.reset(Some("Be brief."), None, None);

    let reply = client.text_complete(Some("Hi")).await.unwrap();

    assert_eq!(reply.text(), "Hi there");
}

#[tokio::test]
async fn test_client_surfaces_provider_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "message": "The model does not exist", "type": "invalid_request_error", "code": "model_not_found" }
        })))
        .mount(&server)
        .await;

    let config = ClientConfig::new("test-key")
        .with_base_url(server.uri())
        .with_model("gpt-missing");
    let mut client = CompletionClient::new(config).unwrap();

    let err = client.text_complete(Some("Hi")).await.unwrap_err();

    assert!(matches!(
        err,
        CompletionError::Provider(ProviderError::ModelNotFound(_))
    ));
}

#[tokio::test]
async fn test_error_event_inside_stream_is_not_cached() {
    let server = MockServer::start().await;
    let body = format!(
        "data: {}\n\ndata: [DONE]\n\n",
        json!({ "error": { "message": "The server had an error", "type": "server_error" } })
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse_response(body))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let cache_file = dir.path().join("cache.json");
    let config = ClientConfig::new("test-key")
        .with_base_url(server.uri())
        .with_cache_file(cache_file.clone());
    let mut client = CompletionClient::new(config).unwrap();

    let err = client.text_complete(Some("hi")).await.unwrap_err();

    match err {
        CompletionError::Provider(ProviderError::Api { code, message }) => {
            assert_eq!(code, "server_error");
            assert_eq!(message, "The server had an error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(client
        .conversation()
        .messages()
        .iter()
        .all(|m| m.role != MessageRole::Assistant));
    assert_eq!(std::fs::read_to_string(&cache_file).unwrap(), "{}");
}

#[test]
fn test_client_rejects_invalid_config() {
    let err = CompletionClient::new(ClientConfig::new("  ")).unwrap_err();
    assert!(matches!(err, CompletionError::Config(_)));
}
