use std::io;
use thiserror::Error;

/// What a length prefix announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Zero-length keepalive, no payload follows.
    Ping,
    /// Application payload of exactly this many bytes.
    Data(u32),
}

impl FrameKind {
    #[inline(always)]
    pub const fn from_len(len: u32) -> Self {
        if len == 0 {
            FrameKind::Ping
        } else {
            FrameKind::Data(len)
        }
    }

    #[inline(always)]
    pub const fn is_ping(self) -> bool {
        matches!(self, FrameKind::Ping)
    }

    /// Payload bytes that follow the prefix.
    #[inline(always)]
    pub const fn payload_len(self) -> u32 {
        match self {
            FrameKind::Ping => 0,
            FrameKind::Data(n) => n,
        }
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame length {0} does not fit in a u32 prefix")]
    LengthOverflow(usize),

    #[error("truncated length prefix: read {read} of 4 bytes")]
    TruncatedPrefix { read: usize },

    #[error("truncated payload: expected {expected} bytes, read {read}")]
    TruncatedPayload { expected: u32, read: u64 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<FrameError> for io::Error {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Io(e) => e,
            e @ FrameError::LengthOverflow(_) => io::Error::new(io::ErrorKind::InvalidInput, e),
            e @ (FrameError::TruncatedPrefix { .. } | FrameError::TruncatedPayload { .. }) => {
                io::Error::new(io::ErrorKind::UnexpectedEof, e)
            }
        }
    }
}
