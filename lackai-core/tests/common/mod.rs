//! Scripted provider and chunk builders shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use lackai_core::protocol::{
    ChatRequest, ChatStreamChunk, FunctionCallDelta, MessageDelta, StreamChoice,
};
use lackai_core::providers::{ChatProvider, ChatStream, ProviderError, ProviderResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted stream item; `Err` becomes a network error mid-stream
pub type ScriptItem = Result<ChatStreamChunk, String>;

/// Provider replaying canned streams, one per request, and recording requests
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    cycles: Arc<Mutex<VecDeque<Vec<ScriptItem>>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cycle(self, chunks: Vec<ChatStreamChunk>) -> Self {
        self.push_items(chunks.into_iter().map(Ok).collect());
        self
    }

    pub fn push_items(&self, items: Vec<ScriptItem>) {
        self.cycles.lock().unwrap().push_back(items);
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_chat(&self, request: &ChatRequest) -> ProviderResult<ChatStream> {
        self.requests.lock().unwrap().push(request.clone());
        let items = self
            .cycles
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::Network("script exhausted".to_string()))?;
        let items: Vec<ProviderResult<ChatStreamChunk>> = items
            .into_iter()
            .map(|item| item.map_err(ProviderError::Network))
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

fn chunk(delta: MessageDelta, finish_reason: Option<&str>) -> ChatStreamChunk {
    ChatStreamChunk {
        id: "chatcmpl-test".to_string(),
        object: "chat.completion.chunk".to_string(),
        created: 0,
        model: "gpt-4".to_string(),
        choices: vec![StreamChoice {
            index: 0,
            delta,
            finish_reason: finish_reason.map(str::to_string),
        }],
    }
}

pub fn content(text: &str) -> ChatStreamChunk {
    chunk(
        MessageDelta {
            content: Some(text.to_string()),
            ..Default::default()
        },
        None,
    )
}

pub fn function(name: Option<&str>, arguments: &str) -> ChatStreamChunk {
    chunk(
        MessageDelta {
            function_call: Some(FunctionCallDelta {
                name: name.map(str::to_string),
                arguments: Some(arguments.to_string()),
            }),
            ..Default::default()
        },
        None,
    )
}

pub fn finish(reason: &str) -> ChatStreamChunk {
    chunk(MessageDelta::default(), Some(reason))
}

/// A complete text reply ending with `reason`
pub fn text_cycle(text: &str, reason: &str) -> Vec<ChatStreamChunk> {
    vec![content(text), finish(reason)]
}
