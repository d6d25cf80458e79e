//! # CRSF Protocol Constants and Types
//!
//! The subset of CRSF needed to receive RC channels from an ExpressLRS
//! receiver.

use crate::error::{Result, SbusBridgeError};

/// CRSF frame sync byte (flight controller address)
pub const CRSF_SYNC_BYTE: u8 = 0xC8;

/// RC Channels packet type
pub const CRSF_FRAMETYPE_RC_CHANNELS_PACKED: u8 = 0x16;

/// Maximum CRSF frame size including sync and length bytes
pub const CRSF_MAX_FRAME_SIZE: usize = 64;

/// Maximum CRSF payload size: sync(1) + length(1) + type(1) + payload(N) + crc(1) <= 64
pub const CRSF_MAX_PAYLOAD_SIZE: usize = CRSF_MAX_FRAME_SIZE - 4;

/// RC channels payload size (22 bytes for 16 channels × 11 bits)
pub const CRSF_RC_CHANNELS_PAYLOAD_SIZE: usize = 22;

/// Number of RC channels
pub const CRSF_NUM_CHANNELS: usize = 16;

/// Nominal channel range produced by ExpressLRS (988us / 1500us / 2012us)
pub const CRSF_CHANNEL_VALUE_MIN: u16 = 172;
pub const CRSF_CHANNEL_VALUE_MID: u16 = 992;
pub const CRSF_CHANNEL_VALUE_MAX: u16 = 1811;

/// RC channels array type (16 channels, 11-bit values)
pub type RcChannels = [u16; CRSF_NUM_CHANNELS];

/// A CRC-checked CRSF frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrsfFrame {
    /// Frame type
    pub frame_type: u8,

    /// Payload data
    pub payload: Vec<u8>,
}

impl CrsfFrame {
    /// Create a new CRSF frame
    ///
    /// # Errors
    ///
    /// Returns error if payload exceeds CRSF_MAX_PAYLOAD_SIZE (60 bytes)
    pub fn new(frame_type: u8, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > CRSF_MAX_PAYLOAD_SIZE {
            return Err(SbusBridgeError::CrsfProtocol(format!(
                "Payload size {} exceeds maximum {}",
                payload.len(),
                CRSF_MAX_PAYLOAD_SIZE
            )));
        }

        Ok(Self {
            frame_type,
            payload,
        })
    }

    pub fn is_rc_channels(&self) -> bool {
        self.frame_type == CRSF_FRAMETYPE_RC_CHANNELS_PACKED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_value_ranges() {
        assert!(CRSF_CHANNEL_VALUE_MIN < CRSF_CHANNEL_VALUE_MID);
        assert!(CRSF_CHANNEL_VALUE_MID < CRSF_CHANNEL_VALUE_MAX);
        assert_eq!(
            CRSF_CHANNEL_VALUE_MID - CRSF_CHANNEL_VALUE_MIN,
            (CRSF_CHANNEL_VALUE_MAX - CRSF_CHANNEL_VALUE_MIN + 1) / 2
        );
    }

    #[test]
    fn test_crsf_frame() {
        let frame = CrsfFrame::new(CRSF_FRAMETYPE_RC_CHANNELS_PACKED, vec![0u8; 22]).unwrap();
        assert!(frame.is_rc_channels());
        assert_eq!(frame.payload.len(), CRSF_RC_CHANNELS_PAYLOAD_SIZE);
    }

    #[test]
    fn test_crsf_frame_payload_too_large() {
        assert!(CrsfFrame::new(CRSF_FRAMETYPE_RC_CHANNELS_PACKED, vec![0u8; 61]).is_err());
        assert!(CrsfFrame::new(CRSF_FRAMETYPE_RC_CHANNELS_PACKED, vec![0u8; 60]).is_ok());
    }
}
