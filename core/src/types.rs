use std::io;
use thiserror::Error;

use crate::framing::FrameError;

/// Unified stream error covering I/O, framing, configuration and lifecycle.
/// - `From<T>` impls enable `?` across encoder, decoder and negotiation.
/// - Converts into `io::Error` so it can cross a `Read`/`Write` boundary.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Transport or thread-spawn failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Wire framing error (validation or parse).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Rejected configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Config document could not be parsed.
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation on an encoder or decoder that was already closed.
    #[error("stream closed")]
    Closed,
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Io(e) => e,
            StreamError::Frame(e) => e.into(),
            StreamError::Config(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            StreamError::Json(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            StreamError::Closed => io::Error::new(io::ErrorKind::BrokenPipe, "stream closed"),
        }
    }
}
