//! Byte-level transport layer.
//!
//! The protocol client talks to the instrument exclusively through the narrow
//! [`Transport`] capability trait defined here. Two implementations are
//! provided:
//!
//! - [`SerialTransport`]: a real RS-232 port via the `serialport` crate
//!   (requires the `transport_serial` feature, enabled by default).
//! - [`MockTransport`]: an in-memory double with a scripted reply queue and a
//!   written-bytes log, for testing the protocol layer without hardware.

pub mod mock;
#[cfg(feature = "transport_serial")]
pub mod serial;

pub use mock::MockTransport;
#[cfg(feature = "transport_serial")]
pub use serial::SerialTransport;

use crate::error::Result;

/// The capability interface the protocol client requires from a transport.
///
/// This is deliberately narrow: a duplex byte stream with an explicit
/// open/close lifecycle and timeout-bounded delimited reads. Nothing about
/// the instrument protocol (framing, casing, echo handling) lives here.
pub trait Transport {
    /// Open the underlying channel. Opening an already-open transport is a
    /// no-op.
    fn open(&mut self) -> Result<()>;

    /// Release the underlying channel. Closing twice is harmless.
    fn close(&mut self) -> Result<()>;

    /// Write raw bytes, returning the number of bytes written.
    fn write(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Read until `delimiter` is seen or the transport timeout elapses.
    ///
    /// Returns everything read including the delimiter. On timeout the
    /// partial buffer is returned as-is; distinguishing a short read from a
    /// complete line is the caller's concern.
    fn read_until(&mut self, delimiter: &[u8]) -> Result<Vec<u8>>;
}
