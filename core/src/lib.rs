//! pingproto
//!
//! Stream keepalive framing for long-lived HTTP response bodies.
//! Length-prefixed frames on the wire, zero-length frames as pings, decoded
//! back into the application bytes on the client. Opt-in per exchange through
//! `Accept-Encoding` / `Content-Encoding`.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod config;

// Wire format and counters
pub mod framing;
pub mod telemetry;

// Stream layers
pub mod stream;
pub mod negotiation;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::config::{DecoderConfig, EncoderConfig, PingProtoConfig};
    pub use crate::constants::PROTOCOL_TOKEN;
    pub use crate::framing::{FrameError, FrameKind};
    pub use crate::negotiation::{
        try_content_encoding, ClientBody, HttpClient, ResponseBody, RoundTrip, ServerBody,
    };
    pub use crate::stream::{Close, Decoder, Encoder};
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::StreamError;
}
