//! RS-232 transport over the `serialport` crate.
//!
//! The Cornerstone 260 talks at 9600 baud, 8N1, no flow control. The port is
//! opened lazily on [`Transport::open`] so a transport can be constructed,
//! handed to the client, and connected explicitly.

use std::io::{self, Read, Write};
use std::time::Duration;

use log::debug;
use serialport::SerialPort;

use super::Transport;
use crate::error::{Error, Result};

const BAUD_RATE: u32 = 9600;

/// A serial port transport with an explicit open/close lifecycle.
///
/// Dropping the transport releases the port; an explicit [`Transport::close`]
/// beforehand is equivalent and idempotent.
pub struct SerialTransport {
    port_name: String,
    baud_rate: u32,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Create a transport for `port_name` (e.g. "/dev/ttyUSB0", "COM3") with
    /// the given read/write timeout. The port is not opened yet.
    pub fn new(port_name: &str, timeout: Duration) -> Self {
        Self {
            port_name: port_name.to_string(),
            baud_rate: BAUD_RATE,
            timeout,
            port: None,
        }
    }

    /// Override the baud rate (the instrument's native rate is 9600).
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// The configured port name.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = serialport::new(&self.port_name, self.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(self.timeout)
            .open()?;

        debug!("opened serial port {}", self.port_name);
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            debug!("closed serial port {}", self.port_name);
        }
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.write_all(bytes)?;
        Ok(bytes.len())
    }

    fn read_until(&mut self, delimiter: &[u8]) -> Result<Vec<u8>> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        let mut buf = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    buf.push(byte[0]);
                    if buf.ends_with(delimiter) {
                        break;
                    }
                }
                // Timeout returns whatever was buffered so far, matching the
                // read-until contract the protocol client assumes.
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_instrument_baud_rate() {
        let transport = SerialTransport::new("/dev/ttyUSB0", Duration::from_secs(5));
        assert_eq!(transport.port_name(), "/dev/ttyUSB0");
        assert_eq!(transport.baud_rate, 9600);
        assert!(transport.port.is_none());
    }

    #[test]
    fn baud_rate_override() {
        let transport =
            SerialTransport::new("/dev/ttyUSB0", Duration::from_secs(5)).with_baud_rate(19200);
        assert_eq!(transport.baud_rate, 19200);
    }

    #[test]
    fn io_before_open_is_not_connected() {
        let mut transport = SerialTransport::new("/dev/ttyUSB0", Duration::from_secs(5));
        assert!(matches!(
            transport.write(b"WAVE?\r\n"),
            Err(Error::NotConnected)
        ));
        assert!(matches!(
            transport.read_until(b"\r\n"),
            Err(Error::NotConnected)
        ));
    }

    #[test]
    fn close_before_open_is_harmless() {
        let mut transport = SerialTransport::new("/dev/ttyUSB0", Duration::from_secs(5));
        transport.close().unwrap();
        transport.close().unwrap();
    }
}
