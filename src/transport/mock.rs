//! Mock transport for testing.
//!
//! Implements the [`Transport`] trait without hardware. It provides:
//! - A scripted queue of reply lines
//! - A log of everything written, for test verification
//! - Controllable one-shot failure injection
//!
//! The mock is a clone-able handle over shared state, so tests can keep a
//! clone for inspection after handing the transport to the client.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use super::Transport;
use crate::error::{Error, Result};

#[derive(Default)]
struct Inner {
    open: bool,
    written: Vec<Vec<u8>>,
    replies: VecDeque<Vec<u8>>,
    fail_next: bool,
}

/// Mock transport double.
///
/// Starts open, so protocol tests can skip the connect step. An empty reply
/// queue behaves like a read timeout: `read_until` returns no bytes.
///
/// # Example
///
/// ```
/// use cornerstone260::transport::{MockTransport, Transport};
///
/// let mock = MockTransport::new();
/// mock.push_reply("500.000");
///
/// let mut transport = mock.clone();
/// transport.write(b"WAVE?\r\n").unwrap();
/// assert_eq!(transport.read_until(b"\r\n").unwrap(), b"500.000\r\n");
/// assert_eq!(mock.written(), vec!["WAVE?\r\n"]);
/// ```
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a new mock transport, already open.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                open: true,
                ..Inner::default()
            })),
        }
    }

    /// Queue a reply line. The line terminator is appended, as the device
    /// terminates every line it sends.
    pub fn push_reply(&self, line: &str) {
        self.inner
            .lock()
            .unwrap()
            .replies
            .push_back(format!("{line}\r\n").into_bytes());
    }

    /// Everything written so far, decoded for assertion convenience.
    pub fn written(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .written
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    /// Trigger a failure on the next I/O operation.
    pub fn trigger_failure(&self) {
        self.inner.lock().unwrap().fail_next = true;
    }

    /// Whether the transport is currently open.
    pub fn is_open(&self) -> bool {
        self.inner.lock().unwrap().open
    }

    fn injected_failure(inner: &mut Inner) -> Result<()> {
        if std::mem::take(&mut inner.fail_next) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "injected mock failure",
            )));
        }
        Ok(())
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> Result<()> {
        self.inner.lock().unwrap().open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.inner.lock().unwrap().open = false;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.open {
            return Err(Error::NotConnected);
        }
        Self::injected_failure(&mut inner)?;
        inner.written.push(bytes.to_vec());
        Ok(bytes.len())
    }

    fn read_until(&mut self, _delimiter: &[u8]) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.open {
            return Err(Error::NotConnected);
        }
        Self::injected_failure(&mut inner)?;
        // Empty queue reads as a timeout with nothing buffered.
        Ok(inner.replies.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies_come_back_in_order_with_terminator() {
        let mock = MockTransport::new();
        mock.push_reply("WAVE?");
        mock.push_reply("500.000");

        let mut transport = mock.clone();
        assert_eq!(transport.read_until(b"\r\n").unwrap(), b"WAVE?\r\n");
        assert_eq!(transport.read_until(b"\r\n").unwrap(), b"500.000\r\n");
    }

    #[test]
    fn empty_queue_reads_as_timeout() {
        let mut transport = MockTransport::new();
        assert!(transport.read_until(b"\r\n").unwrap().is_empty());
    }

    #[test]
    fn written_log_is_shared_across_clones() {
        let mock = MockTransport::new();
        let mut transport = mock.clone();
        transport.write(b"ABORT \r\n").unwrap();
        assert_eq!(mock.written(), vec!["ABORT \r\n"]);
    }

    #[test]
    fn failure_is_one_shot() {
        // trigger_failure only affects the very next operation and then
        // resets itself automatically.
        let mock = MockTransport::new();
        mock.trigger_failure();

        let mut transport = mock.clone();
        assert!(transport.write(b"X\r\n").is_err());
        assert!(transport.write(b"X\r\n").is_ok());
    }

    #[test]
    fn close_is_idempotent_and_blocks_io() {
        let mock = MockTransport::new();
        let mut transport = mock.clone();

        transport.close().unwrap();
        transport.close().unwrap();
        assert!(!mock.is_open());
        assert!(matches!(transport.write(b"X"), Err(Error::NotConnected)));

        transport.open().unwrap();
        assert!(mock.is_open());
        assert!(transport.write(b"X").is_ok());
    }
}
