//! telemetry/counters.rs
//! Live counters updated while a stream is being framed or unframed.
//!
//! Summary: one `TelemetryCounters` per encoder or decoder, shared through an `Arc`
//! with its background task. Converted into a `TelemetrySnapshot` on demand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::constants::LENGTH_PREFIX_LEN;

#[derive(Debug)]
pub struct TelemetryCounters {
    frames_data: AtomicU64,
    frames_ping: AtomicU64,
    bytes_payload: AtomicU64,
    bytes_overhead: AtomicU64,
    ping_errors: AtomicU64,
    started: Instant,
}

impl Default for TelemetryCounters {
    fn default() -> Self {
        Self {
            frames_data: AtomicU64::new(0),
            frames_ping: AtomicU64::new(0),
            bytes_payload: AtomicU64::new(0),
            bytes_overhead: AtomicU64::new(0),
            ping_errors: AtomicU64::new(0),
            started: Instant::now(),
        }
    }
}

impl TelemetryCounters {
    /// Record one data frame carrying `payload_len` application bytes.
    pub fn add_data(&self, payload_len: usize) {
        self.frames_data.fetch_add(1, Ordering::Relaxed);
        self.bytes_payload.fetch_add(payload_len as u64, Ordering::Relaxed);
        self.bytes_overhead.fetch_add(LENGTH_PREFIX_LEN as u64, Ordering::Relaxed);
    }

    /// Record one ping frame (sent or elided).
    pub fn add_ping(&self) {
        self.frames_ping.fetch_add(1, Ordering::Relaxed);
        self.bytes_overhead.fetch_add(LENGTH_PREFIX_LEN as u64, Ordering::Relaxed);
    }

    /// Record a ping write that failed and was swallowed.
    pub fn add_ping_error(&self) {
        self.ping_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_data(&self) -> u64 {
        self.frames_data.load(Ordering::Relaxed)
    }

    pub fn frames_ping(&self) -> u64 {
        self.frames_ping.load(Ordering::Relaxed)
    }

    pub fn bytes_payload(&self) -> u64 {
        self.bytes_payload.load(Ordering::Relaxed)
    }

    pub fn bytes_overhead(&self) -> u64 {
        self.bytes_overhead.load(Ordering::Relaxed)
    }

    pub fn ping_errors(&self) -> u64 {
        self.ping_errors.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
