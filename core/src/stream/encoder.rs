//! Encoder: frames application writes and keeps an idle stream alive.
//!
//! ```text
//! caller ──send()──┐
//!                  ├──▶ Mutex<W> ──▶ [len][payload] [0000] [len][payload] ...
//! ping task ─ping()┘
//! ```
//!
//! The mutex is the only thing standing between the two writers, so a frame's
//! prefix and payload always land back to back.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use crossbeam::channel::{bounded, select, tick, Receiver, Sender};
use tracing::{debug, trace};

use crate::config::EncoderConfig;
use crate::constants::{thread_names, MAX_FRAME_LEN};
use crate::framing::{write_frame, write_ping};
use crate::stream::io::Close;
use crate::telemetry::{TelemetryCounters, TelemetrySnapshot};
use crate::types::StreamError;

/// Sink shared by the caller and the ping task.
struct SharedSink<W> {
    writer: Mutex<W>,
    telemetry: TelemetryCounters,
    flush_pings: bool,
}

fn poisoned() -> io::Error {
    io::Error::other("encoder sink mutex poisoned")
}

impl<W: Write> SharedSink<W> {
    fn lock(&self) -> io::Result<MutexGuard<'_, W>> {
        self.writer.lock().map_err(|_| poisoned())
    }

    fn send(&self, payload: &[u8]) -> io::Result<()> {
        let mut w = self.lock()?;
        write_frame(&mut *w, payload)?;
        self.telemetry.add_data(payload.len());
        trace!(len = payload.len(), "data frame written");
        Ok(())
    }

    fn ping(&self) -> io::Result<()> {
        let mut w = self.lock()?;
        write_ping(&mut *w)?;
        if self.flush_pings {
            w.flush()?;
        }
        self.telemetry.add_ping();
        trace!("ping written");
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        self.lock()?.flush()
    }
}

/// Wraps a writer, framing every write and injecting pings while idle.
///
/// The caller must `close` the encoder (or drop it) to stop the ping task.
/// Closing never closes the wrapped writer; use `into_inner` to get it back.
pub struct Encoder<W: Write + Send + 'static> {
    sink: Arc<SharedSink<W>>,
    // Dropping `close_tx` asks the task to stop; `done_rx` disconnects once it has.
    close_tx: Option<Sender<()>>,
    done_rx: Receiver<()>,
}

impl<W: Write + Send + 'static> Encoder<W> {
    /// Wrap `writer` and start the ping task.
    pub fn new(writer: W, config: &EncoderConfig) -> Result<Self, StreamError> {
        config.validate()?;

        let sink = Arc::new(SharedSink {
            writer: Mutex::new(writer),
            telemetry: TelemetryCounters::default(),
            flush_pings: config.flush_pings,
        });

        let (close_tx, close_rx) = bounded::<()>(0);
        let (done_tx, done_rx) = bounded::<()>(0);
        let ticker = tick(config.ping_interval);
        let interval = config.ping_interval;
        let task_sink = Arc::clone(&sink);

        thread::Builder::new()
            .name(thread_names::ENCODER_PING.into())
            .spawn(move || {
                run_ping_task(&task_sink, &ticker, &close_rx, interval);
                // Release the sink before signalling, so `into_inner` finds it unshared.
                drop(task_sink);
                drop(done_tx);
            })?;

        Ok(Self {
            sink,
            close_tx: Some(close_tx),
            done_rx,
        })
    }

    /// Frame `payload` and write it. Returns the number of payload bytes framed.
    ///
    /// - Empty payloads write nothing and return `Ok(0)`; a zero-length frame is
    ///   always a ping.
    /// - Payloads above `u32::MAX` bytes are framed up to that size and the short
    ///   count is returned, as `Write::write` allows.
    /// - Every transport error is returned as is.
    pub fn send(&self, payload: &[u8]) -> io::Result<usize> {
        if self.is_closed() {
            return Err(StreamError::Closed.into());
        }
        if payload.is_empty() {
            return Ok(0);
        }
        let n = payload.len().min(MAX_FRAME_LEN);
        self.sink.send(&payload[..n])?;
        Ok(n)
    }

    /// Write a ping now, outside the ticker schedule.
    pub fn ping(&self) -> io::Result<()> {
        if self.is_closed() {
            return Err(StreamError::Closed.into());
        }
        self.sink.ping()
    }

    pub fn is_closed(&self) -> bool {
        self.close_tx.is_none()
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::from(&self.sink.telemetry)
    }

    /// Stop the ping task and hand back the wrapped writer.
    ///
    /// The writer is not flushed, so a failing flush can never lose it; flush
    /// it after taking it back if needed.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.stop_ping_task();
        let sink = Arc::clone(&self.sink);
        drop(self);

        match Arc::try_unwrap(sink) {
            Ok(sink) => sink.writer.into_inner().map_err(|_| poisoned()),
            Err(_) => Err(io::Error::other("encoder sink still shared after close")),
        }
    }

    /// Returns `true` if this call stopped the task.
    fn stop_ping_task(&mut self) -> bool {
        let Some(close_tx) = self.close_tx.take() else {
            return false;
        };
        drop(close_tx);
        // Disconnection is the completion signal; the error is expected.
        let _ = self.done_rx.recv();
        true
    }
}

fn run_ping_task<W: Write>(
    sink: &SharedSink<W>,
    ticker: &Receiver<Instant>,
    close_rx: &Receiver<()>,
    interval: Duration,
) {
    debug!(interval_ms = interval.as_millis() as u64, "ping task started");

    loop {
        let stop = select! {
            recv(ticker) -> _ => {
                // Errors are sticky on a broken sink: the next application write reports it.
                if let Err(e) = sink.ping() {
                    sink.telemetry.add_ping_error();
                    debug!(error = %e, "ping write failed, ignored");
                }
                false
            }
            recv(close_rx) -> _ => true,
        };
        if stop {
            break;
        }
    }

    debug!(
        pings = sink.telemetry.frames_ping(),
        ping_errors = sink.telemetry.ping_errors(),
        "ping task stopped"
    );
}

impl<W: Write + Send + 'static> Close for Encoder<W> {
    /// Stop the ping task, wait for it, then flush the wrapped writer.
    ///
    /// Once this returns the task writes nothing more. Calling it again is a no-op.
    fn close(&mut self) -> io::Result<()> {
        if self.stop_ping_task() {
            self.sink.flush()
        } else {
            Ok(())
        }
    }
}

impl<W: Write + Send + 'static> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.send(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

impl<W: Write + Send + 'static> Drop for Encoder<W> {
    fn drop(&mut self) {
        self.stop_ping_task();
    }
}
