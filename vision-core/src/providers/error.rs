//! Provider error types and handling

use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// HTTP statuses the provider uses to signal throttling or temporary
/// unavailability
pub const TRANSIENT_STATUS_CODES: [u16; 2] = [429, 503];

/// Errors that can occur when calling the image-analysis provider
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Invalid construction parameters (limiter capacity, retry policy)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The governing cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,

    /// Throttling or temporary unavailability reported by the provider
    #[error("Provider temporarily unavailable ({status}{}){}", reason_suffix(.reason), body_suffix(.body))]
    Transient {
        status: u16,
        reason: Option<String>,
        body: Option<String>,
    },

    /// Any other non-success response
    #[error("Provider request failed ({status}{}){}", reason_suffix(.reason), body_suffix(.body))]
    Status {
        status: u16,
        reason: Option<String>,
        body: Option<String>,
    },

    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// The outbound call exceeded its timeout
    #[error("Request timed out")]
    Timeout,

    /// A successful response could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The caller's input was rejected before any outbound call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(" {}", r)).unwrap_or_default()
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref().map(|b| format!(": {}", b)).unwrap_or_default()
}

impl ProviderError {
    /// Build the error for a non-success HTTP status
    pub fn from_status(status: u16, reason: Option<String>, body: Option<String>) -> Self {
        if TRANSIENT_STATUS_CODES.contains(&status) {
            ProviderError::Transient {
                status,
                reason,
                body,
            }
        } else {
            ProviderError::Status {
                status,
                reason,
                body,
            }
        }
    }

    /// Whether this outcome is a throttling / unavailability signal
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProviderError::Cancelled)
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Transient { status, .. } | ProviderError::Status { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Response body carried by the error, if any
    pub fn body(&self) -> Option<&str> {
        match self {
            ProviderError::Transient { body, .. } | ProviderError::Status { body, .. } => {
                body.as_deref()
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_connect() {
            ProviderError::Network(format!("Connection failed: {}", err))
        } else if let Some(status) = err.status() {
            ProviderError::from_status(
                status.as_u16(),
                status.canonical_reason().map(str::to_string),
                None,
            )
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}
