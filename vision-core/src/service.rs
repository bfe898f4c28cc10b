//! Analysis service facade
//!
//! Entry point for the API layer: validates the request, translates the
//! requested capabilities, runs the outbound call through the executor and
//! normalizes whatever came back. Each logical request runs inside a
//! `vision_analyze` span and is counted in [`VisionTelemetry`].

use crate::config::{UploadPolicy, VisionConfig};
use crate::http::{RequestOptions, VisionHttpClient};
use crate::protocol::{AnalyzeUrlRequest, CanonicalResponse, CapabilitySet, ImageSource, Transport};
use crate::providers::{
    ConcurrencyLimiter, FeatureTranslator, ProviderError, ProviderFeatureSelector,
    ProviderResult, RawAnalysis, RequestExecutor, ResponseNormalizer, RetryResult, VisionBackend,
    VisualFeatures,
};
use crate::telemetry::{outcome_status, VisionTelemetry};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, info, info_span, warn, Instrument};

pub struct VisionAnalysisService {
    backend: Arc<dyn VisionBackend>,
    executor: RequestExecutor,
    uploads: UploadPolicy,
    default_transport: Transport,
    telemetry: Arc<VisionTelemetry>,
}

/// Provider call resolved from the feature selector and the image source
enum Route<'a> {
    Typed(VisualFeatures),
    Rest { url: &'a str, features_csv: String },
}

impl VisionAnalysisService {
    pub fn new(backend: Arc<dyn VisionBackend>, executor: RequestExecutor) -> Self {
        Self {
            backend,
            executor,
            uploads: UploadPolicy::default(),
            default_transport: Transport::default(),
            telemetry: Arc::new(VisionTelemetry::new()),
        }
    }

    /// Wire the HTTP client, limiter and retry policy described by `config`
    pub fn from_config(config: &VisionConfig) -> ProviderResult<Self> {
        let backend = VisionHttpClient::from_config(config)?;
        let limiter = ConcurrencyLimiter::with_capacity(config.resilience.max_concurrency)?;
        let executor = RequestExecutor::new(Arc::new(limiter), config.resilience.retry.clone())?;

        Ok(Self::new(Arc::new(backend), executor)
            .with_upload_policy(config.uploads.clone())
            .with_default_transport(config.provider.default_transport))
    }

    pub fn with_upload_policy(mut self, uploads: UploadPolicy) -> Self {
        self.uploads = uploads;
        self
    }

    pub fn with_default_transport(mut self, transport: Transport) -> Self {
        self.default_transport = transport;
        self
    }

    /// Share one telemetry sink between several services
    pub fn with_telemetry(mut self, telemetry: Arc<VisionTelemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn telemetry(&self) -> &Arc<VisionTelemetry> {
        &self.telemetry
    }

    /// Analyze an image by URL with the request's transport, or the default
    pub async fn analyze_url(
        &self,
        correlation_id: &str,
        request: &AnalyzeUrlRequest,
        cancel: &CancellationToken,
    ) -> ProviderResult<CanonicalResponse> {
        let url = validate_image_url(&request.url)?;
        let transport = request.engine.unwrap_or(self.default_transport);

        self.analyze(
            correlation_id,
            &ImageSource::url(url),
            &request.requirements,
            transport,
            cancel,
        )
        .await
    }

    /// Analyze an uploaded image through the typed transport
    pub async fn analyze_bytes(
        &self,
        correlation_id: &str,
        data: Vec<u8>,
        content_type: &str,
        requirements: &CapabilitySet,
        cancel: &CancellationToken,
    ) -> ProviderResult<CanonicalResponse> {
        self.validate_upload(&data, content_type)?;

        let image = ImageSource::bytes(data, content_type);
        self.analyze(correlation_id, &image, requirements, Transport::Typed, cancel)
            .await
    }

    /// Translate, execute and normalize one logical request
    pub async fn analyze(
        &self,
        correlation_id: &str,
        image: &ImageSource,
        requirements: &CapabilitySet,
        transport: Transport,
        cancel: &CancellationToken,
    ) -> ProviderResult<CanonicalResponse> {
        if requirements.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "At least one requirement must be provided".to_string(),
            ));
        }

        let selector = FeatureTranslator::to_selector(requirements, transport);
        let route = match (&selector, image) {
            (ProviderFeatureSelector::Bits(features), _) => Route::Typed(*features),
            (ProviderFeatureSelector::Tokens(_), ImageSource::Url(url)) => Route::Rest {
                url,
                features_csv: selector.to_csv(),
            },
            (ProviderFeatureSelector::Tokens(_), ImageSource::Bytes { .. }) => {
                return Err(ProviderError::InvalidRequest(
                    "Uploaded images can only be analyzed through the typed transport".to_string(),
                ));
            }
        };

        let span = info_span!(
            "vision_analyze",
            correlation_id = %correlation_id,
            transport = %transport,
            requirements = %requirements,
            attempts = field::Empty,
            status = field::Empty,
            duration_ms = field::Empty,
        );

        self.telemetry.record_request(transport);
        let started = Instant::now();
        info!(parent: &span, "Analyzing image");

        let result = self
            .execute(correlation_id, image, route, transport, cancel)
            .instrument(span.clone())
            .await;

        let elapsed = started.elapsed();
        let status = outcome_status(&result.outcome);
        self.telemetry.record_duration(transport, status, elapsed);
        span.record("attempts", result.attempts);
        span.record("duration_ms", elapsed.as_millis() as u64);
        if let Some(status) = status {
            span.record("status", status);
        }
        let _entered = span.enter();

        let raw = match result.outcome {
            Ok(raw) => raw,
            Err(error) => {
                warn!(
                    "Analysis failed after {} attempts in {:?}: {}",
                    result.attempts, elapsed, error
                );
                return Err(error);
            }
        };

        debug!(
            "Normalizing {} result after {} attempts ({:?} in backoff)",
            raw.shape_name(),
            result.attempts,
            result.total_delay
        );
        let response = ResponseNormalizer::normalize(correlation_id, &raw, requirements);

        info!(
            "Analysis completed in {:?} [backend: {}]",
            elapsed,
            self.backend.name()
        );
        Ok(response)
    }

    async fn execute(
        &self,
        correlation_id: &str,
        image: &ImageSource,
        route: Route<'_>,
        transport: Transport,
        cancel: &CancellationToken,
    ) -> RetryResult<RawAnalysis> {
        let backend = self.backend.as_ref();
        let telemetry = self.telemetry.as_ref();

        match route {
            Route::Typed(features) => {
                self.executor
                    .execute_detailed(cancel, || {
                        let options = RequestOptions::new(correlation_id);
                        async move {
                            let outcome = backend.analyze_typed(image, features, &options).await;
                            count_throttle(telemetry, transport, &outcome);
                            outcome.map(RawAnalysis::Typed)
                        }
                    })
                    .await
            }
            Route::Rest { url, features_csv } => {
                let features_csv = features_csv.as_str();
                self.executor
                    .execute_detailed(cancel, || {
                        let options = RequestOptions::new(correlation_id);
                        async move {
                            let outcome = backend.analyze_rest(url, features_csv, &options).await;
                            count_throttle(telemetry, transport, &outcome);
                            outcome.map(RawAnalysis::Rest)
                        }
                    })
                    .await
            }
        }
    }

    fn validate_upload(&self, data: &[u8], content_type: &str) -> ProviderResult<()> {
        if data.is_empty() {
            return Err(ProviderError::InvalidRequest("File is required.".to_string()));
        }

        if data.len() as u64 > self.uploads.max_file_size_bytes {
            return Err(ProviderError::InvalidRequest(format!(
                "File too large. Max {} bytes.",
                self.uploads.max_file_size_bytes
            )));
        }

        if !self.uploads.allows_content_type(content_type) {
            return Err(ProviderError::InvalidRequest(format!(
                "Unsupported content-type: {}",
                content_type
            )));
        }

        Ok(())
    }
}

fn count_throttle<T>(telemetry: &VisionTelemetry, transport: Transport, outcome: &ProviderResult<T>) {
    if let Err(ProviderError::Transient { status: 429, .. }) = outcome {
        telemetry.record_throttle(transport);
    }
}

/// Check the scheme and return the trimmed URL that is sent to the provider
fn validate_image_url(raw: &str) -> ProviderResult<&str> {
    let trimmed = raw.trim();
    let url = url::Url::parse(trimmed)
        .map_err(|e| ProviderError::InvalidRequest(format!("Invalid image URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(trimmed),
        other => Err(ProviderError::InvalidRequest(format!(
            "Image URL scheme must be http or https, got: {}",
            other
        ))),
    }
}
