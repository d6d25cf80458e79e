//! # SBUS Frame Encoding
//!
//! Fixed 25-byte SBUS frame layout:
//!
//! ```text
//! +--------+---------------------------------+-------+--------+
//! | 0x0F   | 16 x 11-bit channels (22 bytes) | flags | 0x00   |
//! +--------+---------------------------------+-------+--------+
//! ```
//!
//! Channels are packed as a continuous bitstream, LSB first, exactly like the
//! CRSF RC channels payload. The flags byte carries the signal-loss (bit 2)
//! and failsafe-active (bit 3) markers.

use crate::crsf::protocol::{RcChannels, CRSF_NUM_CHANNELS};
use crate::error::{Result, SbusBridgeError};

/// SBUS frame header byte
pub const SBUS_HEADER: u8 = 0x0F;

/// SBUS frame footer byte
pub const SBUS_FOOTER: u8 = 0x00;

/// Total SBUS frame size in bytes
pub const SBUS_FRAME_LEN: usize = 25;

/// Packed channel payload size (16 channels x 11 bits)
pub const SBUS_PAYLOAD_LEN: usize = 22;

/// Largest value an 11-bit channel slot can carry
pub const SBUS_CHANNEL_VALUE_MAX: u16 = 0x07FF;

/// Flags bit: a frame was missed this cycle
pub const SBUS_FLAG_SIGNAL_LOSS: u8 = 1 << 2;

/// Flags bit: the link is effectively failsafed
pub const SBUS_FLAG_FAILSAFE_ACTIVE: u8 = 1 << 3;

/// A complete SBUS frame as it goes on the wire
pub type SbusFrame = [u8; SBUS_FRAME_LEN];

/// Status flags carried in byte 23 of the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SbusFlags {
    /// Set when the upstream frame for this cycle was missed
    pub signal_loss: bool,
    /// Set when the link is failsafed or a model-match check failed
    pub failsafe_active: bool,
}

impl SbusFlags {
    /// Encode into the wire flags byte.
    pub fn to_byte(self) -> u8 {
        let mut flags = 0;
        if self.signal_loss {
            flags |= SBUS_FLAG_SIGNAL_LOSS;
        }
        if self.failsafe_active {
            flags |= SBUS_FLAG_FAILSAFE_ACTIVE;
        }
        flags
    }

    /// Decode from the wire flags byte. Digital channels 17/18 (bits 0-1) are ignored.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            signal_loss: byte & SBUS_FLAG_SIGNAL_LOSS != 0,
            failsafe_active: byte & SBUS_FLAG_FAILSAFE_ACTIVE != 0,
        }
    }
}

/// Encode 16 channels and status flags into a complete SBUS frame
///
/// # Arguments
///
/// * `channels` - Array of 16 channel values (11-bit: 0-2047, larger values are clamped)
/// * `flags` - Status flags for this frame
///
/// # Examples
///
/// ```
/// use sbus_bridge::sbus::frame::{encode_sbus_frame, SbusFlags, SBUS_HEADER};
///
/// let frame = encode_sbus_frame(&[992u16; 16], SbusFlags::default());
/// assert_eq!(frame.len(), 25);
/// assert_eq!(frame[0], SBUS_HEADER);
/// ```
pub fn encode_sbus_frame(channels: &RcChannels, flags: SbusFlags) -> SbusFrame {
    let mut frame = [0u8; SBUS_FRAME_LEN];
    frame[0] = SBUS_HEADER;
    pack_channels(channels, &mut frame[1..1 + SBUS_PAYLOAD_LEN]);
    frame[SBUS_FRAME_LEN - 2] = flags.to_byte();
    frame[SBUS_FRAME_LEN - 1] = SBUS_FOOTER;
    frame
}

/// Decode an SBUS frame back into channels and flags
///
/// # Errors
///
/// Returns [`SbusBridgeError::SbusFrame`] if the header or footer byte is wrong.
pub fn decode_sbus_frame(frame: &SbusFrame) -> Result<(RcChannels, SbusFlags)> {
    if frame[0] != SBUS_HEADER {
        return Err(SbusBridgeError::SbusFrame(format!(
            "Invalid header byte: 0x{:02X}",
            frame[0]
        )));
    }
    if frame[SBUS_FRAME_LEN - 1] != SBUS_FOOTER {
        return Err(SbusBridgeError::SbusFrame(format!(
            "Invalid footer byte: 0x{:02X}",
            frame[SBUS_FRAME_LEN - 1]
        )));
    }

    let channels = unpack_channels(&frame[1..1 + SBUS_PAYLOAD_LEN]);
    let flags = SbusFlags::from_byte(frame[SBUS_FRAME_LEN - 2]);
    Ok((channels, flags))
}

/// Pack 16 channels (11 bits each) into `out`, LSB first.
///
/// `out` must be at least 22 bytes long; it is zeroed before packing.
///
/// ```text
/// Byte 0: Ch1[0:7]
/// Byte 1: Ch1[8:10] | Ch2[0:4]
/// Byte 2: Ch2[5:10] | Ch3[0:1]
/// ...
/// ```
pub fn pack_channels(channels: &RcChannels, out: &mut [u8]) {
    out[..SBUS_PAYLOAD_LEN].fill(0);
    let mut bit_index = 0;

    for &channel in channels.iter() {
        let value = channel.min(SBUS_CHANNEL_VALUE_MAX);

        for bit in 0..11 {
            if (value >> bit) & 1 == 1 {
                out[bit_index / 8] |= 1 << (bit_index % 8);
            }
            bit_index += 1;
        }
    }
}

/// Unpack 16 channels (11 bits each, LSB first) from a 22-byte payload.
pub fn unpack_channels(payload: &[u8]) -> RcChannels {
    let mut channels = [0u16; CRSF_NUM_CHANNELS];
    let mut bit_index = 0;

    for channel in channels.iter_mut() {
        for bit in 0..11 {
            if (payload[bit_index / 8] >> (bit_index % 8)) & 1 == 1 {
                *channel |= 1 << bit;
            }
            bit_index += 1;
        }
    }

    channels
}
