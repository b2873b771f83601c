//! Oriel Cornerstone 260 monochromator driver.
//!
//! Reference: Oriel Cornerstone 260 User's Manual
//!
//! Protocol Overview:
//! - Format: line-oriented ASCII, case-insensitive (normalized to upper case
//!   on send)
//! - Baud: 9600, 8N1, no flow control
//! - Terminator: CRLF (`\r\n`) in both directions
//! - Commands: `gowave`, `step`, `abort`, `grat`, `filter`, `shutter`,
//!   `outport`, `slit{n}microns` (one acknowledgement line each)
//! - Queries: suffixed `?`; the device echoes the statement, then answers on
//!   a second line
//!
//! # Important Notes
//!
//! - Every query costs exactly two reads (echo + payload). Reading only one
//!   line desynchronizes every subsequent exchange.
//! - The device snaps `gowave` targets to the nearest addressable wavelength,
//!   so setters re-query and report the device's stored value rather than
//!   echoing the input.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use cornerstone260::Cornerstone260;
//!
//! fn main() -> cornerstone260::Result<()> {
//!     let mut mono = Cornerstone260::open("/dev/ttyUSB0", Duration::from_secs(5))?;
//!
//!     // Move to 500 nm; the device reports where it actually landed
//!     let reached = mono.goto(500.0)?;
//!     println!("at {reached:.3} nm");
//!
//!     // Close the shutter
//!     mono.set_shutter(true)?;
//!     assert!(mono.shuttered()?);
//!
//!     mono.disconnect()?;
//!     Ok(())
//! }
//! ```

use std::str::FromStr;

use log::{debug, warn};

use crate::error::{Error, Result};
#[cfg(feature = "transport_serial")]
use crate::transport::SerialTransport;
use crate::transport::Transport;

#[cfg(feature = "transport_serial")]
use std::time::Duration;

/// Line terminator appended to every outbound message and expected at the end
/// of every inbound line.
const TERM_CHARS: &str = "\r\n";

const FILTER_MIN: i32 = 1;
const FILTER_MAX: i32 = 6;
const LABEL_MAX_CHARS: usize = 8;

/// A query round trip: the statement sent (without terminator) and the line
/// the device returned, both right-trimmed of terminator whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// The echoed query statement.
    pub statement: String,
    /// The payload line.
    pub response: String,
}

/// Properties of the currently selected diffraction grating.
///
/// Parsed fresh from the device on every query; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grating {
    /// Grating number on the turret.
    pub number: i32,
    /// Line density in lines per millimeter.
    pub lines: i32,
    /// User-assigned label.
    pub label: String,
}

/// Protocol client for the Oriel Cornerstone 260.
///
/// Owns its transport for the lifetime of the session. Every getter issues a
/// fresh query; no device state is cached client-side, so the returned value
/// is always authoritative per the last round trip. The transport is released
/// on [`disconnect`](Self::disconnect) and unconditionally on drop; closing
/// twice is harmless.
pub struct Cornerstone260<T: Transport> {
    transport: T,
}

#[cfg(feature = "transport_serial")]
impl Cornerstone260<SerialTransport> {
    /// Open `port` (e.g. "/dev/ttyUSB0", "COM3") and connect.
    ///
    /// # Errors
    /// Returns an error if the serial port cannot be opened.
    pub fn open(port: &str, timeout: Duration) -> Result<Self> {
        let mut transport = SerialTransport::new(port, timeout);
        transport.open()?;
        log::info!("connected to Cornerstone 260 on {port}");
        Ok(Self { transport })
    }
}

impl<T: Transport> Cornerstone260<T> {
    /// Wrap an existing transport. The transport is used as-is; call
    /// [`connect`](Self::connect) first if it is not already open.
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Open the transport. A no-op if already connected.
    pub fn connect(&mut self) -> Result<()> {
        self.transport.open()
    }

    /// Release the transport. Safe to call more than once.
    pub fn disconnect(&mut self) -> Result<()> {
        debug!("closing monochromator session");
        self.transport.close()
    }

    // --- low level methods ---

    /// Frame and send one message: append the terminator, fold to upper case,
    /// encode as UTF-8, write. Returns the number of bytes written.
    ///
    /// # Errors
    /// Transport failures propagate unchanged; there are no retries.
    pub fn write(&mut self, message: &str) -> Result<usize> {
        let framed = format!("{message}{TERM_CHARS}").to_uppercase();
        let count = self.transport.write(framed.as_bytes())?;
        debug!("sent: {}", framed.trim_end());
        Ok(count)
    }

    /// Read one line, terminator included.
    ///
    /// Blocks until the terminator arrives or the transport timeout elapses;
    /// a timeout yields whatever partial text was buffered.
    pub fn read(&mut self) -> Result<String> {
        let raw = self.transport.read_until(TERM_CHARS.as_bytes())?;
        let line = String::from_utf8_lossy(&raw).into_owned();
        debug!("received: {}", line.trim_end());
        Ok(line)
    }

    /// Send a command and read its acknowledgement line, right-trimmed.
    ///
    /// Arguments are joined with single spaces after the command name; the
    /// vocabulary never requires escaping.
    pub fn command(&mut self, name: &str, args: &[&str]) -> Result<String> {
        let message = format!("{} {}", name, args.join(" "));
        self.write(&message)?;
        Ok(self.read()?.trim_end().to_string())
    }

    /// Send a query and read the echoed statement plus the payload line.
    ///
    /// A `?` is appended only if `message` does not already end with one, so
    /// `"wave"` and `"wave?"` put the same bytes on the wire.
    pub fn query(&mut self, message: &str) -> Result<Exchange> {
        let message = if message.ends_with('?') {
            message.to_string()
        } else {
            format!("{message}?")
        };

        self.write(&message)?;
        let statement = self.read()?.trim_end().to_string();
        let response = self.read()?.trim_end().to_string();
        Ok(Exchange {
            statement,
            response,
        })
    }

    // --- high level methods ---

    /// Device info string, verbatim.
    pub fn info(&mut self) -> Result<String> {
        Ok(self.query("info")?.response)
    }

    /// Current wavelength position in nanometers.
    pub fn position(&mut self) -> Result<f64> {
        let reply = self.query("wave")?.response;
        parse_reply(&reply, "wavelength in nm")
    }

    /// Move the grating drive by a signed number of steps. No bounds check.
    pub fn step(&mut self, steps: i32) -> Result<()> {
        self.command("step", &[&steps.to_string()])?;
        Ok(())
    }

    /// Move to `wavelength` (nanometers) and return the position the device
    /// actually reached.
    ///
    /// The target is formatted to exactly three decimal places on the wire.
    /// The device may snap to the nearest addressable wavelength, so the
    /// position is re-queried rather than echoed back.
    pub fn goto(&mut self, wavelength: f64) -> Result<f64> {
        self.command("gowave", &[&format!("{wavelength:.3}")])?;
        self.position()
    }

    /// Halt any motion in progress.
    pub fn abort(&mut self) -> Result<()> {
        self.command("abort", &[])?;
        Ok(())
    }

    /// Properties of the currently selected grating.
    ///
    /// # Errors
    /// [`Error::UnexpectedReply`] if the reply does not have exactly the
    /// three `number,lines,label` fields.
    pub fn grating(&mut self) -> Result<Grating> {
        let reply = self.query("grat")?.response;
        let fields: Vec<&str> = reply.split(',').collect();
        if fields.len() != 3 {
            return Err(Error::UnexpectedReply {
                reply,
                expected: "grating as number,lines,label",
            });
        }

        Ok(Grating {
            number: parse_reply(fields[0], "grating number")?,
            lines: parse_reply(fields[1], "grating line density")?,
            label: fields[2].to_string(),
        })
    }

    /// Select a grating by number. Sent as-is; the device rejects invalid
    /// numbers itself.
    pub fn set_grating(&mut self, grating: i32) -> Result<()> {
        self.command("grat", &[&grating.to_string()])?;
        Ok(())
    }

    /// Current filter wheel position.
    pub fn filter(&mut self) -> Result<i32> {
        let reply = self.query("filter")?.response;
        parse_reply(&reply, "filter position")
    }

    /// Move the filter wheel to `pos`.
    ///
    /// # Errors
    /// [`Error::FilterOutOfRange`] if `pos` is outside `1..=6`; nothing is
    /// sent in that case.
    pub fn set_filter(&mut self, pos: i32) -> Result<()> {
        validate_filter(pos)?;
        self.command("filter", &[&pos.to_string()])?;
        Ok(())
    }

    /// Get or set the label of filter `filter`.
    ///
    /// With `Some(label)` the label is written first; in both cases the
    /// device's stored label is re-queried and returned, so the caller
    /// observes what the instrument kept, not an echo of the input.
    ///
    /// # Errors
    /// [`Error::FilterOutOfRange`] for an invalid filter number and
    /// [`Error::LabelTooLong`] for labels over 8 characters, both before
    /// anything is sent.
    pub fn filter_label(&mut self, filter: i32, label: Option<&str>) -> Result<String> {
        validate_filter(filter)?;
        let cmd = format!("filter{filter}label");

        if let Some(label) = label {
            if label.chars().count() > LABEL_MAX_CHARS {
                return Err(Error::LabelTooLong(label.to_string()));
            }
            self.command(&cmd, &[label])?;
        }

        Ok(self.query(&cmd)?.response)
    }

    /// Whether the shutter is closed: `true` exactly when the device reports
    /// `"C"`, `false` for any other reply.
    pub fn shuttered(&mut self) -> Result<bool> {
        Ok(self.query("shutter")?.response == "C")
    }

    /// Close (`close = true`) or open (`close = false`) the shutter.
    pub fn set_shutter(&mut self, close: bool) -> Result<()> {
        let state = if close { "C" } else { "O" };
        self.command("shutter", &[state])?;
        Ok(())
    }

    /// Current output port number.
    pub fn outport(&mut self) -> Result<i32> {
        let reply = self.query("outport")?.response;
        parse_reply(&reply, "output port number")
    }

    /// Select the output port. Sent as-is.
    pub fn set_outport(&mut self, port: i32) -> Result<()> {
        self.command("outport", &[&port.to_string()])?;
        Ok(())
    }

    /// Get or set the width of slit `slit` in microns.
    ///
    /// With `Some(width)` the width is written first; the width is always
    /// re-queried, so the returned value is the one the device settled on.
    pub fn slit_width(&mut self, slit: i32, width: Option<i32>) -> Result<i32> {
        let cmd = format!("slit{slit}microns");

        if let Some(width) = width {
            self.command(&cmd, &[&width.to_string()])?;
        }

        let reply = self.query(&cmd)?.response;
        parse_reply(&reply, "slit width in microns")
    }
}

impl<T: Transport> Drop for Cornerstone260<T> {
    fn drop(&mut self) {
        // close is idempotent, so an explicit disconnect beforehand is fine
        if let Err(e) = self.transport.close() {
            warn!("failed to release transport: {e}");
        }
    }
}

/// Validate a filter wheel position against the device's fixed `1..=6` range.
fn validate_filter(pos: i32) -> Result<()> {
    if !(FILTER_MIN..=FILTER_MAX).contains(&pos) {
        return Err(Error::FilterOutOfRange(pos));
    }
    Ok(())
}

/// Parse a trimmed reply into a typed value, mapping failure to a protocol
/// error that names what was expected.
fn parse_reply<V: FromStr>(reply: &str, expected: &'static str) -> Result<V> {
    reply.parse().map_err(|_| Error::UnexpectedReply {
        reply: reply.to_string(),
        expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn client(mock: &MockTransport) -> Cornerstone260<MockTransport> {
        Cornerstone260::with_transport(mock.clone())
    }

    #[test]
    fn filter_validation() {
        assert!(validate_filter(0).is_err());
        assert!(validate_filter(1).is_ok());
        assert!(validate_filter(6).is_ok());
        assert!(validate_filter(7).is_err());
        assert!(validate_filter(-1).is_err());
    }

    #[test]
    fn write_frames_upper_case_with_terminator() {
        let mock = MockTransport::new();
        let count = client(&mock).write("gowave 500.000").unwrap();

        assert_eq!(mock.written(), vec!["GOWAVE 500.000\r\n"]);
        assert_eq!(count, 16);
    }

    #[test]
    fn zero_arg_command_keeps_trailing_space() {
        let mock = MockTransport::new();
        mock.push_reply("ABORT");
        client(&mock).abort().unwrap();

        assert_eq!(mock.written(), vec!["ABORT \r\n"]);
    }

    #[test]
    fn command_joins_args_with_single_spaces() {
        let mock = MockTransport::new();
        mock.push_reply("STEP -54");
        let ack = client(&mock).command("step", &["-54"]).unwrap();

        assert_eq!(mock.written(), vec!["STEP -54\r\n"]);
        assert_eq!(ack, "STEP -54");
    }

    #[test]
    fn query_consumes_echo_and_payload() {
        let mock = MockTransport::new();
        mock.push_reply("WAVE?");
        mock.push_reply("500.032");

        let exchange = client(&mock).query("wave").unwrap();
        assert_eq!(exchange.statement, "WAVE?");
        assert_eq!(exchange.response, "500.032");
    }

    #[test]
    fn read_returns_terminator_intact() {
        let mock = MockTransport::new();
        mock.push_reply("500.032");
        assert_eq!(client(&mock).read().unwrap(), "500.032\r\n");
    }
}
