//! HTTP client module for calling the image-analysis provider
//!
//! This module implements the HTTP layer, handling:
//! - Connection pooling and client management
//! - URL building for both transports
//! - Error mapping from non-success responses
//! - Request ID generation and correlation

pub mod client;
pub mod error;

pub use client::VisionHttpClient;
pub use error::map_http_error;

use std::time::Duration;
use uuid::Uuid;

/// Header carrying the per-attempt request id
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Header carrying the caller's correlation id
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-Id";

/// Options for one outbound attempt
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Unique id of this attempt
    pub request_id: Uuid,

    /// Correlation id of the inbound request this attempt serves
    pub correlation_id: String,

    /// Per-attempt timeout, overriding the client default
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Create options with a freshly generated request id
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            correlation_id: correlation_id.into(),
            timeout: None,
        }
    }

    /// Set the timeout for this attempt
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Use the trimmed incoming correlation id, or generate one when it is
/// missing or blank
pub fn resolve_correlation_id(incoming: Option<&str>) -> String {
    match incoming.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}
