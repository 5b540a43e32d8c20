//! Mapping of OpenAI error responses to [`ProviderError`]

use crate::providers::ProviderError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// OpenAI error envelope: `{ "error": { ... } }`
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIError {
    pub error: OpenAIErrorDetail,
}

/// OpenAI error detail
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIErrorDetail {
    pub message: String,

    #[serde(rename = "type", default)]
    pub error_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

/// Map a non-success response to a provider error.
///
/// The OpenAI error body is preferred; the status code is the fallback.
pub fn map_error_response(
    status: StatusCode,
    retry_after: Option<&str>,
    body: String,
) -> ProviderError {
    let retry_after_secs = retry_after.and_then(|v| v.trim().parse::<u64>().ok());

    if let Ok(error) = serde_json::from_str::<OpenAIError>(&body) {
        let detail = error.error;
        return match map_error_kind(&detail, retry_after_secs) {
            Some(err) => err,
            None => map_status(status, detail.message, retry_after_secs),
        };
    }

    map_status(status, body, retry_after_secs)
}

/// Map an `error` event delivered inside a successful stream.
///
/// Returns `None` when the payload is not an OpenAI error envelope.
pub fn map_stream_error(data: &str) -> Option<ProviderError> {
    let detail = serde_json::from_str::<OpenAIError>(data).ok()?.error;
    Some(map_error_kind(&detail, None).unwrap_or_else(|| ProviderError::Api {
        code: detail
            .code
            .or(detail.error_type)
            .unwrap_or_else(|| "stream_error".to_string()),
        message: detail.message,
    }))
}

fn map_error_kind(
    detail: &OpenAIErrorDetail,
    retry_after_secs: Option<u64>,
) -> Option<ProviderError> {
    let kind = detail
        .code
        .as_deref()
        .or(detail.error_type.as_deref())
        .unwrap_or_default();
    let message = detail.message.clone();
    match kind {
        "invalid_api_key" => Some(ProviderError::Authentication(message)),
        "rate_limit_exceeded" => Some(ProviderError::RateLimit {
            message,
            retry_after_secs,
        }),
        "model_not_found" => Some(ProviderError::ModelNotFound(message)),
        "insufficient_quota" => Some(ProviderError::InsufficientQuota(message)),
        _ => None,
    }
}

fn map_status(status: StatusCode, message: String, retry_after_secs: Option<u64>) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimit {
            message,
            retry_after_secs,
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ProviderError::InvalidRequest(message)
        }
        StatusCode::NOT_FOUND => ProviderError::ModelNotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::Timeout,
        status if status.is_server_error() => ProviderError::ServiceUnavailable(message),
        _ => ProviderError::Api {
            code: status.as_u16().to_string(),
            message,
        },
    }
}
