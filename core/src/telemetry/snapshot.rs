//! telemetry/snapshot.rs
//!
//! Design notes:
//! - `TelemetrySnapshot` is a point-in-time copy of `TelemetryCounters`.
//! - Throughput is payload bytes over the lifetime of the stream so far.

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub frames_data: u64,
    pub frames_ping: u64,
    pub bytes_payload: u64,
    pub bytes_overhead: u64,
    pub ping_errors: u64,
    pub payload_bytes_per_sec: f64,
    pub elapsed: Duration,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters) -> Self {
        let elapsed = counters.elapsed();
        let bytes_payload = counters.bytes_payload();

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            bytes_payload as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            frames_data: counters.frames_data(),
            frames_ping: counters.frames_ping(),
            bytes_payload,
            bytes_overhead: counters.bytes_overhead(),
            ping_errors: counters.ping_errors(),
            payload_bytes_per_sec: throughput,
            elapsed,
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.frames_data + self.frames_ping
    }

    /// Bytes on the wire in total (payload + prefixes).
    pub fn wire_bytes(&self) -> u64 {
        self.bytes_payload + self.bytes_overhead
    }

    /// Fraction of wire bytes spent on framing. 0.0 for an empty stream.
    pub fn overhead_ratio(&self) -> f64 {
        let wire = self.wire_bytes();
        if wire == 0 {
            0.0
        } else {
            self.bytes_overhead as f64 / wire as f64
        }
    }
}
