//! Encoder and decoder configuration.
//!
//! The ping interval is the only protocol tunable. Everything else here is local
//! to one side of the stream and never crosses the wire.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COPY_BUF_SIZE, DEFAULT_PING_INTERVAL};
use crate::types::StreamError;

/// Called by the decoder task once for every ping frame it drops.
pub type PingHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Period of the background ping task.
    pub ping_interval: Duration,

    /// Flush the sink after each ping so it actually leaves buffered writers.
    /// - `true` (default) → a ping reaches the transport immediately.
    /// - `false` → pings ride along with the next flush.
    pub flush_pings: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ping_interval: DEFAULT_PING_INTERVAL,
            flush_pings: true,
        }
    }
}

impl EncoderConfig {
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    pub fn with_flush_pings(mut self, flush: bool) -> Self {
        self.flush_pings = flush;
        self
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if self.ping_interval.is_zero() {
            return Err(StreamError::Config("ping_interval must be non-zero".into()));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct DecoderConfig {
    /// Observability hook for elided pings.
    pub on_ping: Option<PingHook>,

    /// Largest chunk handed to the consumer in one piece.
    pub copy_buf_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            on_ping: None,
            copy_buf_size: DEFAULT_COPY_BUF_SIZE,
        }
    }
}

impl fmt::Debug for DecoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderConfig")
            .field("on_ping", &self.on_ping.as_ref().map(|_| "<hook>"))
            .field("copy_buf_size", &self.copy_buf_size)
            .finish()
    }
}

impl DecoderConfig {
    pub fn with_ping_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_ping = Some(Arc::new(hook));
        self
    }

    pub fn with_copy_buf_size(mut self, size: usize) -> Self {
        self.copy_buf_size = size;
        self
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if self.copy_buf_size == 0 {
            return Err(StreamError::Config("copy_buf_size must be non-zero".into()));
        }
        Ok(())
    }
}

/// Serializable form of both configs, e.g. for a service's settings file.
///
/// ```json
/// { "ping_interval_ms": 10000, "flush_pings": true, "copy_buf_size": 65536 }
/// ```
///
/// Every field is optional and falls back to the defaults above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PingProtoConfig {
    pub ping_interval_ms: u64,
    pub flush_pings: bool,
    pub copy_buf_size: usize,
}

impl Default for PingProtoConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: DEFAULT_PING_INTERVAL.as_millis() as u64,
            flush_pings: true,
            copy_buf_size: DEFAULT_COPY_BUF_SIZE,
        }
    }
}

impl PingProtoConfig {
    pub fn from_json_str(s: &str) -> Result<Self, StreamError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.encoder().validate()?;
        cfg.decoder().validate()?;
        Ok(cfg)
    }

    pub fn encoder(&self) -> EncoderConfig {
        EncoderConfig {
            ping_interval: Duration::from_millis(self.ping_interval_ms),
            flush_pings: self.flush_pings,
        }
    }

    /// Decoder settings. The ping hook is code, not config, so it starts empty.
    pub fn decoder(&self) -> DecoderConfig {
        DecoderConfig {
            on_ping: None,
            copy_buf_size: self.copy_buf_size,
        }
    }
}
