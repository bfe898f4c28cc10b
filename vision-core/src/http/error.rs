//! HTTP error mapping utilities

use crate::providers::error::ProviderError;
use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

/// Map a non-success status and its body to a [`ProviderError`]
///
/// 429 and 503 become [`ProviderError::Transient`]; everything else becomes
/// [`ProviderError::Status`]. The body is kept verbatim, and the provider's
/// own error code and message, when present, are folded into the reason.
pub fn map_http_error(status: StatusCode, body: Option<String>, request_id: Uuid) -> ProviderError {
    let details = body
        .as_deref()
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| extract_error_details(&v));

    let canonical = status.canonical_reason().unwrap_or("Unknown Status");
    let reason = match details {
        Some(details) => format!(
            "{} [{}: {}] [request_id: {}]",
            canonical, details.code, details.message, request_id
        ),
        None => format!("{} [request_id: {}]", canonical, request_id),
    };

    let body = body.filter(|b| !b.is_empty());
    ProviderError::from_status(status.as_u16(), Some(reason), body)
}

/// Error details extracted from a response body
#[derive(Debug, PartialEq, Eq)]
struct ErrorDetails {
    code: String,
    message: String,
}

/// Extract `{ "error": { "code", "message" } }`, the provider's error format
fn extract_error_details(json: &Value) -> Option<ErrorDetails> {
    let error = json.get("error")?;
    let message = error.get("message").and_then(Value::as_str)?;
    let code = error
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("Unknown");

    Some(ErrorDetails {
        code: code.to_string(),
        message: message.to_string(),
    })
}
