use std::io::{self, Read};
use byteorder::{ByteOrder, LittleEndian};

use crate::constants::LENGTH_PREFIX_LEN;
use crate::framing::types::FrameError;

#[inline]
pub fn decode_length(bytes: [u8; LENGTH_PREFIX_LEN]) -> u32 {
    LittleEndian::read_u32(&bytes)
}

/// Read the next length prefix from a stream.
///
/// - `Ok(None)`: clean end of stream, no prefix byte was read
/// - `Ok(Some(len))`: a full prefix
/// - `Err(TruncatedPrefix)`: the stream ended inside the prefix
///
/// `read_exact` cannot tell the first two cases apart, hence the manual loop.
pub fn read_length<R: Read + ?Sized>(r: &mut R) -> Result<Option<u32>, FrameError> {
    let mut buf = [0u8; LENGTH_PREFIX_LEN];
    let mut off = 0;

    while off < LENGTH_PREFIX_LEN {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FrameError::Io(e)),
        }
    }

    match off {
        0 => Ok(None),
        LENGTH_PREFIX_LEN => Ok(Some(decode_length(buf))),
        read => Err(FrameError::TruncatedPrefix { read }),
    }
}
