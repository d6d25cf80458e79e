//! # CRSF Frame Decoder
//!
//! Pulls CRC-checked frames out of the receiver byte stream and unpacks RC
//! channel payloads.

use bytes::{Buf, BytesMut};

use super::crc::crc8_dvb_s2;
use super::protocol::*;
use crate::error::{Result, SbusBridgeError};
use crate::sbus::frame::unpack_channels;

/// Smallest valid length byte: type(1) + crc(1)
const CRSF_MIN_LENGTH: usize = 2;

/// Largest valid length byte: max frame minus sync and length bytes
const CRSF_MAX_LENGTH: usize = CRSF_MAX_FRAME_SIZE - 2;

/// Decode a complete CRSF frame
///
/// # Arguments
///
/// * `frame` - Complete CRSF frame bytes (sync, length, type, payload, crc)
///
/// # Errors
///
/// Returns error if:
/// - Frame is too short
/// - Sync byte is incorrect
/// - CRC check fails
pub fn decode_frame(frame: &[u8]) -> Result<CrsfFrame> {
    // sync(1) + length(1) + type(1) + crc(1)
    if frame.len() < 4 {
        return Err(SbusBridgeError::CrsfProtocol("Frame too short".to_string()));
    }

    if frame[0] != CRSF_SYNC_BYTE {
        return Err(SbusBridgeError::CrsfProtocol(format!(
            "Invalid sync byte: 0x{:02X}",
            frame[0]
        )));
    }

    let length = frame[1] as usize;
    if !(CRSF_MIN_LENGTH..=CRSF_MAX_LENGTH).contains(&length) {
        return Err(SbusBridgeError::CrsfProtocol(format!(
            "Invalid length byte: {}",
            length
        )));
    }

    if frame.len() < 2 + length {
        return Err(SbusBridgeError::CrsfProtocol(format!(
            "Frame too short: expected {} bytes, got {}",
            2 + length,
            frame.len()
        )));
    }

    // CRC covers type + payload
    let received_crc = frame[1 + length];
    let calculated_crc = crc8_dvb_s2(&frame[2..1 + length]);
    if calculated_crc != received_crc {
        return Err(SbusBridgeError::CrsfProtocol(format!(
            "CRC mismatch: expected 0x{:02X}, got 0x{:02X}",
            calculated_crc, received_crc
        )));
    }

    CrsfFrame::new(frame[2], frame[3..1 + length].to_vec())
}

/// Decode an RC channels payload
///
/// # Errors
///
/// Returns error if the payload is shorter than 22 bytes
pub fn decode_rc_channels(payload: &[u8]) -> Result<RcChannels> {
    if payload.len() < CRSF_RC_CHANNELS_PAYLOAD_SIZE {
        return Err(SbusBridgeError::CrsfProtocol(format!(
            "RC channels payload too short: {} bytes",
            payload.len()
        )));
    }

    Ok(unpack_channels(&payload[..CRSF_RC_CHANNELS_PAYLOAD_SIZE]))
}

/// Incremental frame extractor for the receiver byte stream.
///
/// Bytes are pushed in as they arrive; complete frames are pulled out with
/// [`FrameReader::next_frame`]. Garbage before a sync byte and frames with an
/// impossible length are skipped.
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: BytesMut,
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(CRSF_MAX_FRAME_SIZE * 2),
        }
    }

    /// Append received bytes
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Bytes buffered but not yet consumed
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Pull the next complete frame, if any
    ///
    /// # Returns
    ///
    /// * `None` - Not enough bytes for a frame yet
    /// * `Some(Ok(frame))` - A CRC-checked frame
    /// * `Some(Err(_))` - A complete frame that failed validation (already consumed)
    pub fn next_frame(&mut self) -> Option<Result<CrsfFrame>> {
        loop {
            match self.buffer.iter().position(|&b| b == CRSF_SYNC_BYTE) {
                Some(start) => self.buffer.advance(start),
                None => {
                    self.buffer.clear();
                    return None;
                }
            }

            if self.buffer.len() < 2 {
                return None;
            }

            let length = self.buffer[1] as usize;
            if !(CRSF_MIN_LENGTH..=CRSF_MAX_LENGTH).contains(&length) {
                // Not a real frame start, resync past this byte
                self.buffer.advance(1);
                continue;
            }

            if self.buffer.len() < 2 + length {
                return None;
            }

            let frame = self.buffer.split_to(2 + length);
            return Some(decode_frame(&frame));
        }
    }
}
