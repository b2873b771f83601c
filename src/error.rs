//! Error types for the Cornerstone 260 driver.
//!
//! This module defines the single error type, [`Error`], used across the crate.
//! Using the `thiserror` crate, it provides a centralized and consistent way to
//! distinguish the three kinds of failure an exchange with the instrument can
//! produce:
//!
//! - **Validation** (`FilterOutOfRange`, `LabelTooLong`): a command argument
//!   violated a device-imposed precondition. Raised before anything is written,
//!   so the wire is never touched.
//! - **Protocol** (`UnexpectedReply`): the device answered, but the reply does
//!   not match the documented shape (wrong field count, non-numeric payload).
//!   This usually means the client and the device have desynchronized.
//! - **Transport** (`NotConnected`, `Serial`, `Io`): the underlying channel
//!   failed. Propagated unchanged; the driver adds no retry logic of its own.
//!
//! By using `#[from]`, `Error` can be seamlessly created from the underlying
//! I/O error types, simplifying error handling throughout the driver with the
//! `?` operator.

use thiserror::Error;

/// Convenience alias for results using the driver error type.
pub type Result<T> = std::result::Result<T, Error>;

/// An error produced while talking to the monochromator.
#[derive(Error, Debug)]
pub enum Error {
    /// Filter position outside the 6-position wheel. Nothing was sent.
    #[error("invalid filter position {0}: must be between 1 and 6")]
    FilterOutOfRange(i32),

    /// Filter label longer than the 8 characters the device stores.
    /// Nothing was sent.
    #[error("filter label '{0}' is too long: must be at most 8 characters")]
    LabelTooLong(String),

    /// A reply that does not match the expected shape.
    #[error("unexpected reply '{reply}' while reading {expected}")]
    UnexpectedReply {
        /// The offending reply, terminator stripped.
        reply: String,
        /// What the driver was trying to parse out of it.
        expected: &'static str,
    },

    /// An exchange was attempted on a closed transport.
    #[error("transport is not connected")]
    NotConnected,

    /// Serial port error (open failure, invalid port name).
    #[cfg(feature = "transport_serial")]
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error from the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_name_the_constraint() {
        let err = Error::FilterOutOfRange(9);
        assert_eq!(
            err.to_string(),
            "invalid filter position 9: must be between 1 and 6"
        );

        let err = Error::LabelTooLong("VERYLONGLABEL".into());
        assert!(err.to_string().contains("at most 8 characters"));
    }

    #[test]
    fn unexpected_reply_carries_the_payload() {
        let err = Error::UnexpectedReply {
            reply: "1,1200".into(),
            expected: "grating as number,lines,label",
        };
        assert!(err.to_string().contains("1,1200"));
        assert!(err.to_string().contains("grating"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
