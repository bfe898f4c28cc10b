//! Provider resilience and normalization
//!
//! This module implements the core of the crate: translating requested
//! capabilities into provider feature selectors, bounding and retrying
//! outbound calls, and normalizing the two raw result shapes into the
//! canonical response.

pub mod adapter;
pub mod error;
pub mod executor;
pub mod features;
pub mod limiter;
pub mod normalizer;
pub mod retry;
pub mod typed;

pub use adapter::VisionBackend;
pub use error::{ProviderError, ProviderResult, TRANSIENT_STATUS_CODES};
pub use executor::{RequestExecutor, RetryResult};
pub use features::{FeatureTranslator, ProviderFeatureSelector, VisualFeatures};
pub use limiter::{ConcurrencyLimiter, LimiterPermit};
pub use normalizer::{
    parse_bounding_box, parse_polygon, RawAnalysis, ResponseNormalizer, RestReadShape,
    UNKNOWN_OBJECT_NAME,
};
pub use retry::RetryPolicy;
pub use typed::TypedResult;
