//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::SecretString;
use crate::protocol::Transport;
use crate::providers::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Only supported schema version
pub const CONFIG_VERSION: &str = "0.1";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VisionConfig {
    /// Schema version (required - no default)
    pub version: String,

    pub provider: ProviderConfig,

    #[serde(default)]
    pub resilience: ResilienceConfig,

    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub uploads: UploadPolicy,
}

/// Image-analysis provider endpoint and credentials
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Resource endpoint, e.g. `https://my-resource.cognitiveservices.azure.com`
    pub endpoint: String,

    /// Subscription key (supports environment variable interpolation)
    pub api_key: SecretString,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Path of the analyze operation, appended to the endpoint
    #[serde(default = "default_analyze_path")]
    pub analyze_path: String,

    /// Header carrying the subscription key
    #[serde(default = "default_key_header")]
    pub key_header: String,

    /// Transport used when a request does not pick one
    #[serde(default)]
    pub default_transport: Transport,
}

/// Concurrency bound and retry behavior for outbound calls
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResilienceConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: i64,

    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Per-attempt request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,

    /// Keep-alive timeout in seconds
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_idle_per_host: default_max_idle(),
            keepalive_secs: default_keepalive(),
        }
    }
}

/// Limits applied to uploaded images before they are sent
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UploadPolicy {
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,

    /// Accepted content types, compared case-insensitively
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            allowed_content_types: default_allowed_content_types(),
        }
    }
}

impl UploadPolicy {
    pub fn allows_content_type(&self, content_type: &str) -> bool {
        let content_type = content_type.trim();
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
    }
}

fn default_api_version() -> String { "2024-02-01".to_string() }
fn default_analyze_path() -> String { "/computervision/imageanalysis:analyze".to_string() }
fn default_key_header() -> String { "Ocp-Apim-Subscription-Key".to_string() }
fn default_max_concurrency() -> i64 { 8 }
fn default_connect_timeout() -> u64 { 10000 }
fn default_request_timeout() -> u64 { 30000 }
fn default_max_idle() -> usize { 10 }
fn default_keepalive() -> u64 { 90 }
fn default_max_file_size() -> u64 { 20 * 1024 * 1024 }
fn default_allowed_content_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl VisionConfig {
    /// Build a configuration with defaults for everything but the provider
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<SecretString>) -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            provider: ProviderConfig::new(endpoint, api_key),
            resilience: ResilienceConfig::default(),
            connection: ConnectionConfig::default(),
            uploads: UploadPolicy::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::InvalidVersion {
                    expected: CONFIG_VERSION.to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        self.provider.validate("provider")?;
        self.resilience.validate("resilience")?;
        self.connection.validate("connection")?;
        self.uploads.validate("uploads")?;
        Ok(())
    }
}

impl ProviderConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<SecretString>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: default_api_version(),
            analyze_path: default_analyze_path(),
            key_header: default_key_header(),
            default_transport: Transport::default(),
        }
    }

    /// Validate provider configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.endpoint.is_empty() {
            return Err(ValidationError::required(format!("{}.endpoint", path)));
        }

        match url::Url::parse(&self.endpoint) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::invalid_url(
                        format!("{}.endpoint", path),
                        format!("URL scheme must be http or https, got: {}", url.scheme()),
                    ));
                }
            }
            Err(e) => {
                return Err(ValidationError::invalid_url(
                    format!("{}.endpoint", path),
                    e.to_string(),
                ));
            }
        }

        if self.api_key.is_empty() {
            return Err(ValidationError::required(format!("{}.api_key", path)));
        }

        if self.api_version.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.api_version", path)));
        }

        if !self.analyze_path.starts_with('/') {
            return Err(ValidationError::invalid_format(
                format!("{}.analyze_path", path),
                "Must start with '/'",
            ));
        }

        if reqwest::header::HeaderName::from_bytes(self.key_header.as_bytes()).is_err() {
            return Err(ValidationError::invalid_format(
                format!("{}.key_header", path),
                format!("'{}' is not a valid header name", self.key_header),
            ));
        }

        Ok(())
    }
}

impl ResilienceConfig {
    /// Validate concurrency and retry settings
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.max_concurrency < 1 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_concurrency", path),
                "Must be at least 1",
            )
            .with_context(format!("got {}", self.max_concurrency)));
        }

        let retry = format!("{}.retry", path);
        if self.retry.max_attempts == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_attempts", retry),
                "Must be at least 1",
            ));
        }

        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ValidationError::new(
                format!("{}.max_delay_ms", retry),
                ValidationErrorKind::Incompatible {
                    message: "Must be >= base_delay_ms".to_string(),
                },
            ));
        }

        Ok(())
    }
}

impl ConnectionConfig {
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.connect_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.connect_timeout_ms", path),
                "Must be greater than 0",
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.request_timeout_ms", path),
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl UploadPolicy {
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.max_file_size_bytes == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_file_size_bytes", path),
                "Must be greater than 0",
            ));
        }

        if self.allowed_content_types.is_empty() {
            return Err(ValidationError::required(format!("{}.allowed_content_types", path)));
        }

        Ok(())
    }
}
