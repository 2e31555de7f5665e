//! stream: concurrent pumping of the pingproto framing.
//!
//! - `Encoder` frames application writes and runs a background ping ticker.
//! - `Decoder` runs a background unframing task and hands payload bytes to
//!   the consumer through a rendezvous `pipe`.
//!
//! One background thread per encoder and per decoder. No shared pool.

pub mod io;
pub mod pipe;
pub mod encoder;
pub mod decoder;

pub use io::{close_all, Close, NopCloser};
pub use pipe::{pipe, PipeReader, PipeWriter};
pub use encoder::Encoder;
pub use decoder::Decoder;
