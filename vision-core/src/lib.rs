//! Vision Core Library
//!
//! Resilient, transport-independent access to an image-analysis provider:
//! bounded and retried outbound calls, and normalization of the typed and
//! REST result shapes into one canonical response.

pub mod config;
pub mod http;
pub mod protocol;
pub mod providers;
pub mod service;
pub mod telemetry;

pub use protocol::{AnalyzeUrlRequest, CanonicalResponse, Capability, CapabilitySet, Transport};
pub use providers::{ProviderError, ProviderResult};
pub use service::VisionAnalysisService;
pub use telemetry::{TelemetrySnapshot, VisionTelemetry};

/// Returns the version of the Vision Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
