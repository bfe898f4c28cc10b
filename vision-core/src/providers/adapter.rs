//! Backend trait for the image-analysis provider
//!
//! Defines the two outbound call shapes the service can use. The concrete
//! HTTP implementation lives in [`crate::http::VisionHttpClient`]; tests
//! substitute in-memory fakes.

use crate::http::RequestOptions;
use crate::protocol::ImageSource;
use crate::providers::error::ProviderResult;
use crate::providers::features::VisualFeatures;
use crate::providers::typed::TypedResult;
use async_trait::async_trait;
use serde_json::Value;

/// One outbound attempt against the provider
///
/// Implementations make exactly one call per invocation; retries and
/// concurrency bounding are applied around them by the executor.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Get the backend's name, for logging
    fn name(&self) -> &str;

    /// Typed call over a URL or an in-memory upload
    async fn analyze_typed(
        &self,
        image: &ImageSource,
        features: VisualFeatures,
        options: &RequestOptions,
    ) -> ProviderResult<TypedResult>;

    /// REST call over a URL, returning the untouched JSON document
    async fn analyze_rest(
        &self,
        image_url: &str,
        features_csv: &str,
        options: &RequestOptions,
    ) -> ProviderResult<Value>;
}
