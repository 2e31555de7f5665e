//! telemetry/mod.rs
//! Frame and byte counters for encoders and decoders, plus immutable snapshots.
//!
//! Notes:
//! - Counters are shared between the caller and the background task, so they are atomic.
//! - Snapshots are plain data and serialize with serde.

pub mod counters;
pub mod snapshot;

pub use counters::*;
pub use snapshot::*;
