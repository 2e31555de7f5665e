// ## Client side: advertise pingproto, unwrap upgraded responses transparently

use std::fmt;
use std::io::{self, Read};
use bytes::Bytes;
use http::header::{HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING};
use http::{Request, Response, Uri};
use tracing::debug;

use crate::config::DecoderConfig;
use crate::constants::PROTOCOL_TOKEN;
use crate::negotiation::is_pingproto_response;
use crate::stream::{close_all, Close, Decoder, NopCloser};
use crate::telemetry::TelemetrySnapshot;

/// Transport seam: sends one request and returns the response with its body
/// still streaming.
pub trait RoundTrip {
    fn round_trip(&self, request: Request<Bytes>) -> io::Result<Response<ResponseBody>>;
}

impl<F> RoundTrip for F
where
    F: Fn(Request<Bytes>) -> io::Result<Response<ResponseBody>>,
{
    fn round_trip(&self, request: Request<Bytes>) -> io::Result<Response<ResponseBody>> {
        self(request)
    }
}

/// Streaming response body as produced by a transport.
///
/// Reader and closer are separate so the transport can still be closed while
/// a decoder task owns the reader (e.g. a socket and its `try_clone`).
pub struct ResponseBody {
    reader: Box<dyn Read + Send>,
    closer: Box<dyn Close + Send>,
}

impl ResponseBody {
    pub fn new<R, C>(reader: R, closer: C) -> Self
    where
        R: Read + Send + 'static,
        C: Close + Send + 'static,
    {
        Self {
            reader: Box::new(reader),
            closer: Box::new(closer),
        }
    }

    /// A body with nothing to release beyond dropping the reader.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::new(reader, NopCloser(()))
    }

    pub fn into_parts(self) -> (Box<dyn Read + Send>, Box<dyn Close + Send>) {
        (self.reader, self.closer)
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}

impl Read for ResponseBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Close for ResponseBody {
    fn close(&mut self) -> io::Result<()> {
        self.closer.close()
    }
}

/// Response body handed to the caller of [`HttpClient::send`].
pub enum ClientBody {
    /// Server did not upgrade; bytes as received.
    Raw(ResponseBody),
    /// Server upgraded; pings already stripped.
    Decoded {
        decoder: Decoder,
        transport: Box<dyn Close + Send>,
    },
}

impl ClientBody {
    pub fn is_decoded(&self) -> bool {
        matches!(self, ClientBody::Decoded { .. })
    }

    pub fn telemetry(&self) -> Option<TelemetrySnapshot> {
        match self {
            ClientBody::Raw(_) => None,
            ClientBody::Decoded { decoder, .. } => Some(decoder.telemetry()),
        }
    }
}

impl fmt::Debug for ClientBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientBody::Raw(body) => f.debug_tuple("Raw").field(body).finish(),
            ClientBody::Decoded { decoder, .. } => f
                .debug_struct("Decoded")
                .field("decoder", decoder)
                .finish_non_exhaustive(),
        }
    }
}

impl Read for ClientBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ClientBody::Raw(body) => body.read(buf),
            ClientBody::Decoded { decoder, .. } => decoder.read(buf),
        }
    }
}

impl Close for ClientBody {
    /// For a decoded body: close the decoder, then the transport body, and
    /// report the first error.
    fn close(&mut self) -> io::Result<()> {
        match self {
            ClientBody::Raw(body) => body.close(),
            ClientBody::Decoded { decoder, transport } => {
                let mut closers: [&mut dyn Close; 2] = [decoder, transport];
                close_all(&mut closers)
            }
        }
    }
}

/// Client wrapper that speaks pingproto with servers that support it.
///
/// Every request advertises the token; upgraded responses come back with the
/// marker header removed and the body already unwrapped.
#[derive(Debug)]
pub struct HttpClient<T> {
    transport: T,
    config: DecoderConfig,
}

impl<T: RoundTrip> HttpClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, DecoderConfig::default())
    }

    pub fn with_config(transport: T, config: DecoderConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `GET uri` with an empty body.
    pub fn get<U>(&self, uri: U) -> io::Result<Response<ClientBody>>
    where
        U: TryInto<Uri>,
        U::Error: Into<http::Error>,
    {
        let request = Request::get(uri)
            .body(Bytes::new())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.send(request)
    }

    pub fn send(&self, mut request: Request<Bytes>) -> io::Result<Response<ClientBody>> {
        request
            .headers_mut()
            .append(ACCEPT_ENCODING, HeaderValue::from_static(PROTOCOL_TOKEN));

        let (mut parts, body) = self.transport.round_trip(request)?.into_parts();

        if !is_pingproto_response(&parts.headers) {
            return Ok(Response::from_parts(parts, ClientBody::Raw(body)));
        }

        // The upgrade is invisible to our caller.
        parts.headers.remove(CONTENT_ENCODING);

        let (reader, mut transport) = body.into_parts();
        let decoder = match Decoder::new(reader, &self.config) {
            Ok(decoder) => decoder,
            Err(e) => {
                if let Err(close_err) = transport.close() {
                    debug!(error = %close_err, "closing transport body after decoder failure");
                }
                return Err(e.into());
            }
        };
        debug!(status = %parts.status, "response unwrapped from pingproto");

        Ok(Response::from_parts(parts, ClientBody::Decoded { decoder, transport }))
    }
}
