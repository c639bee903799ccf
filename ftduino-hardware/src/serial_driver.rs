//! Serial driver for low-level hardware communication
//!
//! Provides blocking, timeout-bounded line I/O with the ftDuino.

use ftduino_core::{FtduinoError, LinkSettings, Result};
use serialport::{ClearBuffer, SerialPort};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Trait for serial transport abstraction
///
/// This trait enables testing of `FtDuino` and discovery without real
/// hardware by allowing mock implementations.
pub trait SerialTransport {
    /// Write raw bytes; no retry
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read up to and including `\n`, or until the timeout elapses
    ///
    /// On timeout whatever was buffered is returned, possibly nothing.
    fn read_line(&mut self) -> Result<Vec<u8>>;

    /// Discard unread input and unflushed output
    fn reset_buffers(&mut self) -> Result<()>;

    /// Get the port path, if the transport has one
    fn port_path(&self) -> Option<&str> {
        None
    }
}

impl<T: SerialTransport + ?Sized> SerialTransport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        (**self).read_line()
    }

    fn reset_buffers(&mut self) -> Result<()> {
        (**self).reset_buffers()
    }

    fn port_path(&self) -> Option<&str> {
        (**self).port_path()
    }
}

/// Serial driver for hardware communication
///
/// The port is closed when the driver is dropped.
pub struct SerialDriver {
    port: Box<dyn SerialPort>,
    port_path: String,
    timeout: Duration,
}

impl SerialDriver {
    /// Open a serial device
    ///
    /// Applies the link timeout to reads and writes, then sleeps for the
    /// settle delay because opening the CDC port resets the board.
    ///
    /// # Arguments
    /// * `port_path` - Path to the serial device (e.g., "/dev/ttyACM0", "COM9")
    /// * `link` - Baud rate, timeout and settle delay
    pub fn open(port_path: &str, link: &LinkSettings) -> Result<Self> {
        debug!("Opening serial port: {}", port_path);

        let port = serialport::new(port_path, link.baud_rate)
            .timeout(link.timeout())
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| {
                error!("Failed to open serial port {}: {}", port_path, e);
                FtduinoError::Connection(format!(
                    "Failed to open serial port {}: {}",
                    port_path, e
                ))
            })?;

        std::thread::sleep(link.settle_delay());
        debug!("Serial port opened successfully");

        Ok(Self {
            port,
            port_path: port_path.to_string(),
            timeout: link.timeout(),
        })
    }

    /// Release the port
    pub fn close(self) {
        debug!("Closing serial port: {}", self.port_path);
    }

    fn connection_error(&self, what: &str, e: impl std::fmt::Display) -> FtduinoError {
        error!("{} failed on {}: {}", what, self.port_path, e);
        FtduinoError::Connection(format!("{} failed on {}: {}", what, self.port_path, e))
    }
}

impl SerialTransport for SerialDriver {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.port
            .write_all(bytes)
            .map_err(|e| self.connection_error("Write", e))?;
        self.port
            .flush()
            .map_err(|e| self.connection_error("Flush", e))
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        let deadline = Instant::now() + self.timeout;
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            self.port
                .set_timeout(remaining)
                .map_err(|e| self.connection_error("Setting timeout", e))?;

            match self.port.read(&mut byte) {
                Ok(0) => continue,
                Ok(_) => {
                    line.push(byte[0]);
                    if byte[0] == b'\n' {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.connection_error("Read", e)),
            }
        }

        // Restore the configured timeout for writes.
        self.port
            .set_timeout(self.timeout)
            .map_err(|e| self.connection_error("Setting timeout", e))?;

        if line.last() != Some(&b'\n') {
            debug!("Read timed out with {} byte(s) buffered", line.len());
        }
        Ok(line)
    }

    fn reset_buffers(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::All).map_err(|e| {
            warn!("Failed to clear buffers on {}: {}", self.port_path, e);
            FtduinoError::Connection(format!("Failed to clear buffers: {}", e))
        })
    }

    fn port_path(&self) -> Option<&str> {
        Some(&self.port_path)
    }
}
