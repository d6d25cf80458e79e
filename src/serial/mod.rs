//! # Serial Communication Module
//!
//! Handles the serial ports on both sides of the bridge.
//!
//! This module handles:
//! - Opening the CRSF input port (8N1, up to 3.75 Mbaud)
//! - Opening SBUS output ports (100,000 baud, 8E2)
//! - Buffering encoder output and draining it to the port

mod port_trait;

pub use port_trait::{BufferedLink, OutputLink, DEFAULT_TX_BUFFER_SIZE};

#[cfg(test)]
pub use port_trait::{mocks, MockOutputLink};

use crate::error::{Result, SbusBridgeError};
use tokio::io::AsyncReadExt;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info};

/// SBUS line rate
pub const SBUS_BAUD_RATE: u32 = 100_000;

/// Baud rates accepted on the CRSF input side
pub const CRSF_BAUD_RATES: &[u32] = &[115_200, 400_000, 420_000, 921_600, 1_870_000, 3_750_000];

/// An opened serial port and the path it was opened from.
pub struct SerialPort {
    port: tokio_serial::SerialStream,
    device_path: String,
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SerialPort {
    /// Open the CRSF input port
    ///
    /// # Arguments
    ///
    /// * `path` - Device path (e.g., "/dev/ttyUSB0")
    /// * `baud_rate` - Receiver UART rate
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sbus_bridge::serial::SerialPort;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let input = SerialPort::open_input("/dev/ttyUSB0", 420_000)?;
    ///     println!("Reading CRSF from {}", input.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open_input(path: &str, baud_rate: u32) -> Result<Self> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| open_error(path, e))?;

        info!("Opened CRSF input at {} ({} baud)", path, baud_rate);
        Ok(Self {
            port,
            device_path: path.to_string(),
        })
    }

    /// Open an SBUS output port (100,000 baud, 8 data bits, even parity, 2 stop bits)
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be opened
    pub fn open_output(path: &str) -> Result<Self> {
        let port = tokio_serial::new(path, SBUS_BAUD_RATE)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::Even)
            .stop_bits(tokio_serial::StopBits::Two)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| open_error(path, e))?;

        info!("Opened SBUS output at {}", path);
        Ok(Self {
            port,
            device_path: path.to_string(),
        })
    }

    /// Read whatever bytes are available into `buf`
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of bytes read (0 means the port closed)
    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self
            .port
            .read(buf)
            .await
            .map_err(|e| SbusBridgeError::Serial(format!("Failed to read {}: {}", self.device_path, e)))?;
        Ok(n)
    }

    /// Drain a buffered link into this port
    pub async fn send(&mut self, link: &mut BufferedLink) -> Result<usize> {
        let n = link.drain_to(&mut self.port).await?;
        if n > 0 {
            debug!("Wrote {} bytes to {}", n, self.device_path);
        }
        Ok(n)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

fn open_error(path: &str, e: tokio_serial::Error) -> SbusBridgeError {
    if e.kind == tokio_serial::ErrorKind::NoDevice {
        SbusBridgeError::SerialPortNotFound(path.to_string())
    } else {
        SbusBridgeError::Serial(format!("Failed to open {}: {}", path, e))
    }
}
