//! HTTP client implementation using reqwest

use crate::config::{ConnectionConfig, ProviderConfig, VisionConfig};
use crate::http::error::map_http_error;
use crate::http::{RequestOptions, CORRELATION_ID_HEADER, REQUEST_ID_HEADER};
use crate::protocol::ImageSource;
use crate::providers::adapter::VisionBackend;
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::features::VisualFeatures;
use crate::providers::typed::TypedResult;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Maximum accepted response size (10MB)
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("vision-core/", env!("CARGO_PKG_VERSION"));

/// Provider client speaking both the typed and the REST call shapes
#[derive(Clone)]
pub struct VisionHttpClient {
    client: Arc<Client>,
    analyze_url: Url,
    api_version: String,
    key_header: HeaderName,
    key_value: HeaderValue,
    request_timeout: Duration,
    max_response_size: usize,
}

impl VisionHttpClient {
    /// Create a client from a loaded configuration
    pub fn from_config(config: &VisionConfig) -> ProviderResult<Self> {
        Self::new(&config.provider, &config.connection)
    }

    /// Create a client for `provider` using the given connection settings
    pub fn new(provider: &ProviderConfig, connection: &ConnectionConfig) -> ProviderResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(connection.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(connection.keepalive_secs))
            .connect_timeout(Duration::from_millis(connection.connect_timeout_ms))
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| ProviderError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let joined = format!(
            "{}{}",
            provider.endpoint.trim_end_matches('/'),
            provider.analyze_path
        );
        let analyze_url = Url::parse(&joined).map_err(|e| {
            ProviderError::Configuration(format!("Invalid analyze URL '{}': {}", joined, e))
        })?;

        let key_header = HeaderName::from_bytes(provider.key_header.as_bytes()).map_err(|e| {
            ProviderError::Configuration(format!("Invalid key header '{}': {}", provider.key_header, e))
        })?;
        let mut key_value = HeaderValue::from_str(provider.api_key.expose_secret()).map_err(|_| {
            ProviderError::Configuration("Subscription key is not a valid header value".to_string())
        })?;
        key_value.set_sensitive(true);

        debug!(
            "Vision client for {} using key {}",
            analyze_url,
            provider.api_key.partial_redact()
        );

        Ok(Self {
            client: Arc::new(client),
            analyze_url,
            api_version: provider.api_version.clone(),
            key_header,
            key_value,
            request_timeout: Duration::from_millis(connection.request_timeout_ms),
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    /// Full analyze URL for a comma-separated feature list
    /// Override the response body limit
    pub fn with_max_response_size(mut self, bytes: usize) -> Self {
        self.max_response_size = bytes;
        self
    }

    pub fn build_url(&self, features_csv: &str) -> Url {
        let mut url = self.analyze_url.clone();
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version)
            .append_pair("features", features_csv);
        url
    }

    fn request(&self, image: &ImageSource, features_csv: &str, options: &RequestOptions) -> RequestBuilder {
        let builder = self
            .client
            .post(self.build_url(features_csv))
            .timeout(options.timeout.unwrap_or(self.request_timeout))
            .header(self.key_header.clone(), self.key_value.clone())
            .header(REQUEST_ID_HEADER, options.request_id.to_string())
            .header(CORRELATION_ID_HEADER, options.correlation_id.as_str());

        match image {
            ImageSource::Url(url) => builder.json(&json!({ "url": url })),
            ImageSource::Bytes { data, .. } => builder
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(data.clone()),
        }
    }

    /// Send one attempt and return the body of a successful response
    async fn send(
        &self,
        image: &ImageSource,
        features_csv: &str,
        options: &RequestOptions,
    ) -> ProviderResult<String> {
        let request_id = options.request_id;

        info!(
            "Executing analyze request [features: {}] [request_id: {}] [correlation_id: {}]",
            features_csv, request_id, options.correlation_id
        );

        let mut response = self
            .request(image, features_csv, options)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!("Request timeout [request_id: {}]", request_id);
                } else {
                    error!("Request error [request_id: {}]: {}", request_id, e);
                }
                ProviderError::from(e)
            })?;

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        if !status.is_success() {
            let body = response.text().await.ok();
            warn!(
                "Request failed with status {} [request_id: {}]",
                status, request_id
            );
            return Err(map_http_error(status, body, request_id));
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_response_size {
                return Err(ProviderError::Parse(format!(
                    "Response size {} exceeds maximum {} [request_id: {}]",
                    length, self.max_response_size, request_id
                )));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            ProviderError::Network(format!(
                "Failed to read response body: {} [request_id: {}]",
                e, request_id
            ))
        })? {
            if body.len() + chunk.len() > self.max_response_size {
                return Err(ProviderError::Parse(format!(
                    "Response exceeds maximum {} bytes [request_id: {}]",
                    self.max_response_size, request_id
                )));
            }
            body.extend_from_slice(&chunk);
        }

        let text = String::from_utf8(body).map_err(|e| {
            ProviderError::Parse(format!(
                "Response body is not valid UTF-8: {} [request_id: {}]",
                e, request_id
            ))
        })?;

        info!("Request completed successfully [request_id: {}]", request_id);
        Ok(text)
    }
}

#[async_trait]
impl VisionBackend for VisionHttpClient {
    fn name(&self) -> &str {
        "vision-http"
    }

    async fn analyze_typed(
        &self,
        image: &ImageSource,
        features: VisualFeatures,
        options: &RequestOptions,
    ) -> ProviderResult<TypedResult> {
        let text = self.send(image, &features.to_query_value(), options).await?;

        serde_json::from_str(&text).map_err(|e| {
            error!(
                "Failed to parse typed result [request_id: {}]: {}",
                options.request_id, e
            );
            ProviderError::Parse(format!(
                "Invalid typed result: {} [request_id: {}]",
                e, options.request_id
            ))
        })
    }

    async fn analyze_rest(
        &self,
        image_url: &str,
        features_csv: &str,
        options: &RequestOptions,
    ) -> ProviderResult<Value> {
        let image = ImageSource::url(image_url);
        let text = self.send(&image, features_csv, options).await?;

        serde_json::from_str(&text).map_err(|e| {
            error!(
                "REST response is not JSON [request_id: {}]: {}",
                options.request_id, e
            );
            ProviderError::Parse(format!(
                "Invalid JSON document: {} [request_id: {}]",
                e, options.request_id
            ))
        })
    }
}
