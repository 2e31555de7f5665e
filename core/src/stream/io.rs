// ## Close semantics shared by encoder, decoder and negotiated bodies

use std::io::{self, Read, Write};
use tracing::debug;

/// Explicit, fallible release of a stream resource.
///
/// `Drop` still cleans up, but cannot report errors or be sequenced, so
/// wrappers that own background tasks expose this as well.
pub trait Close {
    fn close(&mut self) -> io::Result<()>;
}

impl<T: Close + ?Sized> Close for Box<T> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<T: Close + ?Sized> Close for &mut T {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Wraps a reader or writer whose close is a no-op.
#[derive(Debug, Default)]
pub struct NopCloser<T>(pub T);

impl<T> NopCloser<T> {
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    pub fn get_ref(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Close for NopCloser<T> {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Read> Read for NopCloser<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<T: Write> Write for NopCloser<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// Close every resource in order and report the first failure.
///
/// A failing closer never prevents the ones after it from running.
pub fn close_all(closers: &mut [&mut dyn Close]) -> io::Result<()> {
    let mut first: Option<io::Error> = None;

    for closer in closers.iter_mut() {
        if let Err(e) = closer.close() {
            match first {
                None => first = Some(e),
                Some(_) => debug!(error = %e, "additional close error dropped"),
            }
        }
    }

    match first {
        None => Ok(()),
        Some(e) => Err(e),
    }
}
