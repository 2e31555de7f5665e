use std::time::Duration;

/// Protocol token exchanged during negotiation.
/// Advertised in `Accept-Encoding`, echoed in `Content-Encoding`.
pub const PROTOCOL_TOKEN: &str = "pingproto/1.0";

/// Length prefix size on the wire (little-endian u32).
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Largest payload a single frame can describe.
pub const MAX_FRAME_LEN: usize = u32::MAX as usize;

/// Defaults when the caller does not override them
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_COPY_BUF_SIZE: usize = 64 * 1024; // 64 KiB

/// Thread names, visible in debuggers and panic messages.
pub mod thread_names {
    pub const ENCODER_PING: &str = "pingproto-ping";
    pub const DECODER_UNFRAME: &str = "pingproto-unframe";
}
