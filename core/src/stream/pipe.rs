//! Synchronous in-memory pipe.
//!
//! A zero-capacity crossbeam channel: every chunk the writer hands over blocks
//! until a reader takes it, so at most one chunk is ever in flight and the
//! writer can never run ahead of the reader. The last message is the terminal
//! state (clean close or error). Dropping the writer without closing reads as
//! a clean end of stream, like an OS pipe.
//!
//! Closing the reader drops the receiving end, which wakes a blocked writer
//! with an error instead of leaving it parked forever.

use std::io::{self, Read, Write};
use bytes::{Buf, Bytes};
use crossbeam::channel::{bounded, Receiver, Sender};

use crate::stream::io::Close;

enum Handoff {
    Data(Bytes),
    Close(Option<io::Error>),
}

/// Terminal state remembered by the reader so later reads repeat it.
#[derive(Debug, Clone)]
enum Terminal {
    Eof,
    Failed(io::ErrorKind, String),
}

impl Terminal {
    fn from_error(e: &io::Error) -> Self {
        Terminal::Failed(e.kind(), e.to_string())
    }

    fn replay(&self) -> io::Result<usize> {
        match self {
            Terminal::Eof => Ok(0),
            Terminal::Failed(kind, msg) => Err(io::Error::new(*kind, msg.clone())),
        }
    }
}

/// Create a connected reader/writer pair.
pub fn pipe() -> (PipeReader, PipeWriter) {
    let (tx, rx) = bounded::<Handoff>(0);
    (
        PipeReader {
            rx: Some(rx),
            pending: Bytes::new(),
            terminal: None,
        },
        PipeWriter { tx: Some(tx) },
    )
}

fn read_after_close() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "read on closed pipe")
}

fn write_after_close() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "write on closed pipe")
}

fn reader_gone() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed")
}

// ================= Reader =================

#[derive(Debug)]
pub struct PipeReader {
    rx: Option<Receiver<Handoff>>,
    pending: Bytes,
    terminal: Option<Terminal>,
}

impl PipeReader {
    pub fn is_closed(&self) -> bool {
        self.rx.is_none()
    }
}

impl Close for PipeReader {
    /// Close the read side. Blocked and future writes fail immediately.
    fn close(&mut self) -> io::Result<()> {
        self.rx = None;
        self.pending = Bytes::new();
        Ok(())
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let Some(rx) = self.rx.as_ref() else {
                return Err(read_after_close());
            };

            // Drain what the last handoff left behind first
            if !self.pending.is_empty() {
                let n = buf.len().min(self.pending.len());
                buf[..n].copy_from_slice(&self.pending[..n]);
                self.pending.advance(n);
                return Ok(n);
            }

            if let Some(terminal) = &self.terminal {
                return terminal.replay();
            }

            match rx.recv() {
                Ok(Handoff::Data(chunk)) => self.pending = chunk,
                Ok(Handoff::Close(None)) | Err(_) => self.terminal = Some(Terminal::Eof),
                Ok(Handoff::Close(Some(e))) => {
                    self.terminal = Some(Terminal::from_error(&e));
                    return Err(e);
                }
            }
        }
    }
}

// ================= Writer =================

#[derive(Debug)]
pub struct PipeWriter {
    tx: Option<Sender<Handoff>>,
}

impl PipeWriter {
    /// Deliver the terminal state and close the write side.
    ///
    /// `None` is a clean end of stream. Blocks until the reader takes the
    /// marker or closes; fails if the reader is already gone.
    pub fn close_with_error(&mut self, err: Option<io::Error>) -> io::Result<()> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };
        tx.send(Handoff::Close(err)).map_err(|_| reader_gone())
    }
}

impl Close for PipeWriter {
    fn close(&mut self) -> io::Result<()> {
        self.close_with_error(None)
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let tx = self.tx.as_ref().ok_or_else(write_after_close)?;
        tx.send(Handoff::Data(Bytes::copy_from_slice(buf)))
            .map_err(|_| reader_gone())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
