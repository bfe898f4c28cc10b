//! Request counters and timings for the analysis service
//!
//! Every recorded event is also emitted as a structured `tracing` event
//! carrying the metric name, so a subscriber can forward them to whatever
//! metrics backend the host uses.

use crate::protocol::Transport;
use crate::providers::ProviderResult;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

pub const REQUESTS_TOTAL: &str = "vision.requests.total";
pub const THROTTLES_429_TOTAL: &str = "vision.throttles_429.total";
pub const REQUEST_DURATION_MS: &str = "vision.request.duration_ms";

/// Aggregated durations for one `(transport, status)` pair
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DurationStats {
    pub count: u64,
    pub total_ms: f64,
    pub max_ms: f64,
}

impl DurationStats {
    fn record(&mut self, ms: f64) {
        self.count += 1;
        self.total_ms += ms;
        if ms > self.max_ms {
            self.max_ms = ms;
        }
    }

    pub fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub typed_requests: u64,
    pub rest_requests: u64,
    pub throttles_429: u64,
    /// Keyed by transport and final status; `None` means no HTTP status
    /// (cancelled, network or parse failures)
    pub durations: HashMap<(Transport, Option<u16>), DurationStats>,
}

impl TelemetrySnapshot {
    pub fn requests_total(&self) -> u64 {
        self.typed_requests + self.rest_requests
    }

    pub fn requests_for(&self, transport: Transport) -> u64 {
        match transport {
            Transport::Typed => self.typed_requests,
            Transport::RestJson => self.rest_requests,
        }
    }

    pub fn duration(&self, transport: Transport, status: Option<u16>) -> Option<&DurationStats> {
        self.durations.get(&(transport, status))
    }
}

/// Process-wide request telemetry, shared between service instances
#[derive(Debug, Default)]
pub struct VisionTelemetry {
    typed_requests: AtomicU64,
    rest_requests: AtomicU64,
    throttles_429: AtomicU64,
    durations: Mutex<HashMap<(Transport, Option<u16>), DurationStats>>,
}

impl VisionTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, transport: Transport) {
        let counter = match transport {
            Transport::Typed => &self.typed_requests,
            Transport::RestJson => &self.rest_requests,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        debug!(metric = REQUESTS_TOTAL, transport = %transport, "request counted");
    }

    /// Count one attempt the provider answered with 429
    pub fn record_throttle(&self, transport: Transport) {
        self.throttles_429.fetch_add(1, Ordering::Relaxed);
        debug!(metric = THROTTLES_429_TOTAL, transport = %transport, "throttle counted");
    }

    pub fn record_duration(&self, transport: Transport, status: Option<u16>, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.durations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((transport, status))
            .or_default()
            .record(ms);
        debug!(
            metric = REQUEST_DURATION_MS,
            transport = %transport,
            status = status,
            duration_ms = ms,
            "duration recorded"
        );
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            typed_requests: self.typed_requests.load(Ordering::Relaxed),
            rest_requests: self.rest_requests.load(Ordering::Relaxed),
            throttles_429: self.throttles_429.load(Ordering::Relaxed),
            durations: self
                .durations
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

/// Status label for a finished request: 200 on success, the provider's
/// status on HTTP failures, `None` otherwise
pub fn outcome_status<T>(outcome: &ProviderResult<T>) -> Option<u16> {
    match outcome {
        Ok(_) => Some(200),
        Err(error) => error.status(),
    }
}
