// ## Server side: upgrade the response body if the client asked for it

use std::io::{self, Write};
use http::header::{HeaderValue, CONTENT_ENCODING};
use http::HeaderMap;
use tracing::debug;

use crate::config::EncoderConfig;
use crate::constants::PROTOCOL_TOKEN;
use crate::negotiation::accepts_pingproto;
use crate::stream::{Close, Encoder};
use crate::telemetry::TelemetrySnapshot;
use crate::types::StreamError;

/// Response body writer chosen by negotiation.
///
/// Close it when the response is complete: for an upgraded body that stops the
/// ping task, for a passthrough body it does nothing.
pub enum ServerBody<W: Write + Send + 'static> {
    /// Framed, with periodic pings.
    Upgraded(Encoder<W>),
    /// Written through untouched.
    Passthrough(W),
}

/// Decide whether to frame the response body.
///
/// If `request_headers` advertise the token, sets `Content-Encoding` on
/// `response_headers` and wraps `body` in an [`Encoder`]. Otherwise leaves the
/// headers alone and returns `body` as is.
pub fn try_content_encoding<W>(
    request_headers: &HeaderMap,
    response_headers: &mut HeaderMap,
    body: W,
    config: &EncoderConfig,
) -> Result<ServerBody<W>, StreamError>
where
    W: Write + Send + 'static,
{
    if !accepts_pingproto(request_headers) {
        debug!("client did not advertise pingproto, body passes through");
        return Ok(ServerBody::Passthrough(body));
    }

    // Encoder first, so a failed start never leaves the marker header behind.
    let encoder = Encoder::new(body, config)?;
    response_headers.insert(CONTENT_ENCODING, HeaderValue::from_static(PROTOCOL_TOKEN));
    debug!(interval_ms = config.ping_interval.as_millis() as u64, "response upgraded to pingproto");

    Ok(ServerBody::Upgraded(encoder))
}

impl<W: Write + Send + 'static> ServerBody<W> {
    pub fn is_upgraded(&self) -> bool {
        matches!(self, ServerBody::Upgraded(_))
    }

    /// A ping when upgraded; a no-op otherwise.
    pub fn ping(&self) -> io::Result<()> {
        match self {
            ServerBody::Upgraded(enc) => enc.ping(),
            ServerBody::Passthrough(_) => Ok(()),
        }
    }

    pub fn telemetry(&self) -> Option<TelemetrySnapshot> {
        match self {
            ServerBody::Upgraded(enc) => Some(enc.telemetry()),
            ServerBody::Passthrough(_) => None,
        }
    }

    /// Stop pinging (when upgraded) and hand back the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        match self {
            ServerBody::Upgraded(enc) => enc.into_inner(),
            ServerBody::Passthrough(w) => Ok(w),
        }
    }
}

impl<W: Write + Send + 'static> Write for ServerBody<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ServerBody::Upgraded(enc) => enc.write(buf),
            ServerBody::Passthrough(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ServerBody::Upgraded(enc) => enc.flush(),
            ServerBody::Passthrough(w) => w.flush(),
        }
    }
}

impl<W: Write + Send + 'static> Close for ServerBody<W> {
    fn close(&mut self) -> io::Result<()> {
        match self {
            ServerBody::Upgraded(enc) => enc.close(),
            ServerBody::Passthrough(_) => Ok(()),
        }
    }
}
