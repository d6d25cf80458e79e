//! Output link abstraction: a non-blocking byte sink with a free-space estimate.

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::error::{Result, SbusBridgeError};

/// Default transmit buffer size, the depth of a typical UART TX FIFO
pub const DEFAULT_TX_BUFFER_SIZE: usize = 64;

/// Byte sink the SBUS encoder writes into.
///
/// `write` must never block. Callers check `available_for_write` first and
/// only write when the whole payload fits.
#[cfg_attr(test, mockall::automock)]
pub trait OutputLink {
    /// Bytes that can be written right now without blocking
    fn available_for_write(&self) -> usize;

    /// Append bytes to the link
    fn write(&mut self, data: &[u8]);
}

/// Bounded in-memory transmit buffer in front of a serial port.
///
/// The encoder appends into it synchronously; the async loop later drains it
/// into the port with [`BufferedLink::drain_to`].
#[derive(Debug)]
pub struct BufferedLink {
    buffer: BytesMut,
    capacity: usize,
}

impl Default for BufferedLink {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferedLink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TX_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Bytes waiting to be drained
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Pending bytes, oldest first
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Write all pending bytes into `writer` and flush it
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of bytes drained
    ///
    /// # Errors
    ///
    /// Returns [`SbusBridgeError::Serial`] if the write or flush fails. The
    /// pending bytes are dropped in that case so a stale frame is never
    /// resent.
    pub async fn drain_to<W>(&mut self, writer: &mut W) -> Result<usize>
    where
        W: AsyncWrite + Unpin,
    {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let data = self.buffer.split();
        writer
            .write_all(&data)
            .await
            .map_err(|e| SbusBridgeError::Serial(format!("Failed to write output: {}", e)))?;
        writer
            .flush()
            .await
            .map_err(|e| SbusBridgeError::Serial(format!("Failed to flush output: {}", e)))?;

        Ok(data.len())
    }
}

impl OutputLink for BufferedLink {
    fn available_for_write(&self) -> usize {
        self.capacity.saturating_sub(self.buffer.len())
    }

    fn write(&mut self, data: &[u8]) {
        let accepted = data.len().min(self.available_for_write());
        if accepted < data.len() {
            warn!(
                "Output buffer full, dropping {} of {} bytes",
                data.len() - accepted,
                data.len()
            );
        }
        self.buffer.extend_from_slice(&data[..accepted]);
    }
}
