//! Canonical protocol types for image analysis
//!
//! This module defines the transport-independent request and response
//! shapes that the rest of the crate produces and consumes.

pub mod types;

pub use types::{
    AnalyzeUrlRequest, BoundingBox, CanonicalResponse, Capability, CapabilitySet, Caption,
    DetectedObject, ImageSource, Point, ReadLine, Transport, UnknownCapability, Word,
};
