//! Wire framing for pingproto.
//!
//! Responsibilities:
//! - Encode/decode the 4-byte little-endian length prefix
//! - Read and write whole frames on a byte stream
//! - Classify frames (ping vs data)
//!
//! Non-responsibilities:
//! - Scheduling pings
//! - Threading
//! - Negotiation

pub mod types;
pub mod encode;
pub mod decode;

pub use types::{FrameError, FrameKind};
pub use encode::{encode_frame, encode_length, write_frame, write_ping};
pub use decode::{decode_length, read_length};
