//! Streaming support for OpenAI responses

use super::error::map_stream_error;
use crate::protocol::ChatStreamChunk;
use crate::providers::{ChatStream, ProviderError};
use bytes::Bytes;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::{Stream, StreamExt};

/// Marker payload of the last event
const DONE_MARKER: &str = "[DONE]";

/// Parse the Server-Sent Events stream of a chat completion.
///
/// Each event carries one JSON chunk; the stream ends with `data: [DONE]`.
/// An `error` payload is yielded as an error; other payloads that are not
/// valid chunks are skipped with a warning.
pub fn parse_stream(
    stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
) -> ChatStream {
    let event_stream = stream.eventsource();

    Box::pin(event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => {
                let data = event.data.trim();
                if data.is_empty() || data == DONE_MARKER {
                    return None;
                }
                if let Some(err) = map_stream_error(data) {
                    tracing::warn!("Error event in stream: {}", err);
                    return Some(Err(err));
                }

                match serde_json::from_str::<ChatStreamChunk>(data) {
                    Ok(chunk) => Some(Ok(chunk)),
                    Err(e) => {
                        tracing::warn!("Failed to parse stream chunk: {}", e);
                        None
                    }
                }
            }
            Err(EventStreamError::Transport(e)) => Some(Err(ProviderError::from(e))),
            Err(e) => Some(Err(ProviderError::ParseError(format!("Stream error: {}", e)))),
        }
    }))
}
