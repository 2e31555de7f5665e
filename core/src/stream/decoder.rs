//! Decoder: strips pings and hands application bytes to the consumer.
//!
//! ```text
//! source ──▶ unframe task ──(pipe, one chunk)──▶ Decoder::read
//!              │
//!              └─ length 0 → on_ping hook, dropped
//! ```

use std::io::{self, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace, warn};

use crate::config::{DecoderConfig, PingHook};
use crate::constants::thread_names;
use crate::framing::{read_length, FrameError, FrameKind};
use crate::stream::io::Close;
use crate::stream::pipe::{pipe, PipeReader, PipeWriter};
use crate::telemetry::{TelemetryCounters, TelemetrySnapshot};
use crate::types::StreamError;

/// Reads the application bytes carried by a pingproto stream.
///
/// The source is owned by a background task for the decoder's whole life.
/// Read until end of stream or `close` the decoder; a decoder that is neither
/// drained nor closed keeps its task parked on the next handoff.
#[derive(Debug)]
pub struct Decoder {
    reader: PipeReader,
    telemetry: Arc<TelemetryCounters>,
}

impl Decoder {
    /// Wrap `source` and start the unframing task.
    pub fn new<R>(source: R, config: &DecoderConfig) -> Result<Self, StreamError>
    where
        R: Read + Send + 'static,
    {
        config.validate()?;

        let (reader, writer) = pipe();
        let telemetry = Arc::new(TelemetryCounters::default());

        let task = UnframeTask {
            source,
            out: writer,
            on_ping: config.on_ping.clone(),
            buf_size: config.copy_buf_size,
            telemetry: Arc::clone(&telemetry),
        };

        thread::Builder::new()
            .name(thread_names::DECODER_UNFRAME.into())
            .spawn(move || task.run())?;

        Ok(Self { reader, telemetry })
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::from(&self.telemetry)
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_closed()
    }
}

impl Read for Decoder {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Close for Decoder {
    /// Close the consumer side without waiting for the task.
    ///
    /// The task stops at its next handoff. If the source is stalled it stays
    /// parked in that read, but the caller is never blocked by it.
    fn close(&mut self) -> io::Result<()> {
        self.reader.close()
    }
}

// ============================================================
// Unframe task
// ============================================================

/// Why the pump loop stopped.
enum Stop {
    /// Source failed or carried a malformed frame.
    Source(io::Error),
    /// Consumer closed its side; nobody is left to report to.
    ConsumerGone,
}

struct UnframeTask<R> {
    source: R,
    out: PipeWriter,
    on_ping: Option<PingHook>,
    buf_size: usize,
    telemetry: Arc<TelemetryCounters>,
}

impl<R: Read> UnframeTask<R> {
    fn run(mut self) {
        debug!(buf_size = self.buf_size, "unframe task started");

        // A panicking source or ping hook must not read as a clean end of stream.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.pump()))
            .unwrap_or_else(|_| Err(Stop::Source(io::Error::other("unframe task panicked"))));

        let terminal = match outcome {
            Ok(()) => {
                debug!(
                    frames = self.telemetry.frames_data(),
                    pings = self.telemetry.frames_ping(),
                    "source exhausted"
                );
                None
            }
            Err(Stop::Source(e)) => {
                warn!(error = %e, "pingproto stream terminated with error");
                Some(e)
            }
            Err(Stop::ConsumerGone) => {
                debug!("consumer closed, unframe task exiting");
                return;
            }
        };

        if self.out.close_with_error(terminal).is_err() {
            debug!("consumer closed before the terminal state was delivered");
        }
    }

    fn pump(&mut self) -> Result<(), Stop> {
        let mut buf = vec![0u8; self.buf_size];

        loop {
            let len = match read_length(&mut self.source) {
                Ok(Some(len)) => len,
                Ok(None) => return Ok(()),
                Err(e) => return Err(Stop::Source(e.into())),
            };

            match FrameKind::from_len(len) {
                FrameKind::Ping => {
                    self.telemetry.add_ping();
                    trace!("ping elided");
                    if let Some(hook) = &self.on_ping {
                        hook();
                    }
                }
                FrameKind::Data(len) => {
                    self.forward(len, &mut buf)?;
                    self.telemetry.add_data(len as usize);
                }
            }
        }
    }

    /// Copy exactly `len` payload bytes from the source to the consumer.
    fn forward(&mut self, len: u32, buf: &mut [u8]) -> Result<(), Stop> {
        let mut copied: u64 = 0;

        while copied < len as u64 {
            let want = buf.len().min((len as u64 - copied) as usize);
            let n = match self.source.read(&mut buf[..want]) {
                Ok(0) => {
                    let e = FrameError::TruncatedPayload { expected: len, read: copied };
                    return Err(Stop::Source(e.into()));
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Stop::Source(e)),
            };

            write_chunk(&mut self.out, &buf[..n])?;
            copied += n as u64;
        }

        Ok(())
    }
}

fn write_chunk(out: &mut PipeWriter, chunk: &[u8]) -> Result<(), Stop> {
    out.write_all(chunk).map_err(|_| Stop::ConsumerGone)
}
