use std::io::Write;
use byteorder::{ByteOrder, LittleEndian};

use crate::constants::{LENGTH_PREFIX_LEN, MAX_FRAME_LEN};
use crate::framing::types::FrameError;

/// Encode a payload length into the 4-byte little-endian prefix.
///
/// Lengths above `u32::MAX` are rejected; callers chunk larger writes.
#[inline]
pub fn encode_length(n: usize) -> Result<[u8; LENGTH_PREFIX_LEN], FrameError> {
    if n > MAX_FRAME_LEN {
        return Err(FrameError::LengthOverflow(n));
    }
    let mut out = [0u8; LENGTH_PREFIX_LEN];
    LittleEndian::write_u32(&mut out, n as u32);
    Ok(out)
}

/// Encode a whole frame into one buffer.
///
/// Layout:
///
/// ```text
/// [ length (4, LE) ]
/// [ payload (length) ]
/// ```
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let prefix = encode_length(payload.len())?;
    let mut out = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    out.extend_from_slice(&prefix);
    out.extend_from_slice(payload);
    Ok(out)
}

/// Write one frame: prefix, then payload.
///
/// Not atomic on its own. The encoder serializes calls behind its mutex.
pub fn write_frame<W: Write + ?Sized>(w: &mut W, payload: &[u8]) -> Result<(), FrameError> {
    let prefix = encode_length(payload.len())?;
    w.write_all(&prefix)?;
    if !payload.is_empty() {
        w.write_all(payload)?;
    }
    Ok(())
}

/// Write a single zero-length frame.
#[inline]
pub fn write_ping<W: Write + ?Sized>(w: &mut W) -> Result<(), FrameError> {
    w.write_all(&[0u8; LENGTH_PREFIX_LEN])?;
    Ok(())
}
