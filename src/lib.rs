//! # Oriel Cornerstone 260 Driver
//!
//! This crate is a command/response protocol client for the Oriel Cornerstone
//! 260 monochromator. It translates high-level operations (move to wavelength,
//! select grating, open/close the shutter, pick a filter or output port, set a
//! slit width) into the instrument's line-oriented ASCII protocol over a
//! serial link, and parses the device's textual replies back into typed
//! values.
//!
//! ## Crate Structure
//!
//! The library is organized into three modules, each with a distinct
//! responsibility:
//!
//! - **`cornerstone`**: the protocol client, [`Cornerstone260`]. Owns message
//!   framing (CRLF termination, upper-casing, UTF-8), the command/query
//!   exchange primitives, and the typed high-level operations.
//! - **`transport`**: the narrow byte-stream capability the client consumes
//!   ([`Transport`]), with a real serial implementation
//!   ([`SerialTransport`], behind the default `transport_serial` feature) and
//!   an in-memory mock for tests.
//! - **`error`**: the [`Error`] enum covering validation, protocol, and
//!   transport failures, plus the crate [`Result`] alias.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use cornerstone260::Cornerstone260;
//!
//! fn main() -> cornerstone260::Result<()> {
//!     let mut mono = Cornerstone260::open("/dev/ttyUSB0", Duration::from_secs(5))?;
//!     println!("device: {}", mono.info()?);
//!
//!     let reached = mono.goto(632.8)?;
//!     println!("parked at {reached:.3} nm");
//!     Ok(())
//! }
//! ```

pub mod cornerstone;
pub mod error;
pub mod transport;

pub use cornerstone::{Cornerstone260, Exchange, Grating};
pub use error::{Error, Result};
#[cfg(feature = "transport_serial")]
pub use transport::SerialTransport;
pub use transport::Transport;
