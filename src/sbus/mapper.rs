//! # Channel Mapper
//!
//! Converts upstream CRSF channel values into the values placed in the SBUS
//! frame.
//!
//! Standard SBUS output copies channels unchanged. DJI RS output rescales
//! through a fixed slot table:
//!
//! | Slot | Source | Function | Output |
//! |------|--------|----------|--------|
//! | 0 | CH1 | Pan | 352-1696 |
//! | 1 | CH2 | Tilt | 352-1696 |
//! | 2 | CH3 | Focus motor | 352-1696 |
//! | 3 | CH4 | Roll | 352-1696 |
//! | 4 | CH6 | Record / photo | 352-1696 |
//! | 5 | CH7 | Gimbal mode | 352-1696 |
//! | 6 | CH8 | Recenter / selfie | 176-848 |
//! | 7 | CH9 | Gimbal speed | 352-1696 |
//! | 8 | CH10 | Zoom | 352-1696 |
//! | 9 | CH12 | Locking mode | 352 / 1696 |
//! | 10 | CH12 | Reserved | 352-1696 |
//! | 11 | CH13 | Reserved | 352-1696 |
//! | 12 | CH14 | Reserved | 352-1696 |
//! | 13 | CH15 | Reserved | 352-1696 |
//! | 14 | CH16 | Reserved | 352-1696 |
//! | 15 | CH5 | On | 352 / 1696 |
//!
//! CH11 is not used. The order is what the gimbal expects; do not reorder.

use crate::config::OutputProtocol;
use crate::crsf::protocol::{
    RcChannels, CRSF_CHANNEL_VALUE_MAX, CRSF_CHANNEL_VALUE_MID, CRSF_CHANNEL_VALUE_MIN,
    CRSF_NUM_CHANNELS,
};

use super::frame::SBUS_CHANNEL_VALUE_MAX;

/// Low end of the DJI RS channel range
pub const DJI_VALUE_MIN: u16 = 352;

/// High end of the DJI RS channel range
pub const DJI_VALUE_MAX: u16 = 1696;

/// Low end of the recenter/selfie channel range
pub const DJI_RECENTER_MIN: u16 = 176;

/// High end of the recenter/selfie channel range
pub const DJI_RECENTER_MAX: u16 = 848;

/// Slot indices in the DJI RS channel layout.
pub mod slots {
    pub const PAN: usize = 0;
    pub const TILT: usize = 1;
    pub const FOCUS: usize = 2;
    pub const ROLL: usize = 3;
    pub const RECORD: usize = 4;
    pub const MODE: usize = 5;
    pub const RECENTER: usize = 6;
    pub const SPEED: usize = 7;
    pub const ZOOM: usize = 8;
    pub const LOCK: usize = 9;
    pub const ON: usize = 15;
}

/// How a source channel becomes a slot value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scaling {
    /// Affine rescale of the CRSF range onto `[min, max]`
    Linear { min: u16, max: u16 },
    /// 1696 when the source is strictly above the midpoint, else 352
    SwitchAboveMid,
    /// 352 when the source is strictly below the midpoint, else 1696
    SwitchBelowMid,
}

/// One entry of the slot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotMapping {
    /// Upstream channel index feeding this slot
    pub source: usize,
    pub scaling: Scaling,
}

const FULL: Scaling = Scaling::Linear {
    min: DJI_VALUE_MIN,
    max: DJI_VALUE_MAX,
};

const fn slot(source: usize, scaling: Scaling) -> SlotMapping {
    SlotMapping { source, scaling }
}

/// DJI RS slot table, indexed by output slot.
pub const DJI_RS_SLOTS: [SlotMapping; CRSF_NUM_CHANNELS] = [
    slot(0, FULL),
    slot(1, FULL),
    slot(2, FULL),
    slot(3, FULL),
    slot(5, FULL),
    slot(6, FULL),
    slot(
        7,
        Scaling::Linear {
            min: DJI_RECENTER_MIN,
            max: DJI_RECENTER_MAX,
        },
    ),
    slot(8, FULL),
    slot(9, FULL),
    slot(11, Scaling::SwitchAboveMid),
    slot(11, FULL),
    slot(12, FULL),
    slot(13, FULL),
    slot(14, FULL),
    slot(15, FULL),
    slot(4, Scaling::SwitchBelowMid),
];

/// Map channels for the given output protocol.
///
/// Only [`OutputProtocol::DjiRsPro`] rescales; every other selection is an
/// identity copy.
pub fn map_channels(protocol: OutputProtocol, channels: &RcChannels) -> RcChannels {
    match protocol {
        OutputProtocol::DjiRsPro => map_dji_rs(channels),
        _ => *channels,
    }
}

/// Apply the DJI RS slot table.
pub fn map_dji_rs(channels: &RcChannels) -> RcChannels {
    core::array::from_fn(|slot| apply(&DJI_RS_SLOTS[slot], channels))
}

fn apply(mapping: &SlotMapping, channels: &RcChannels) -> u16 {
    let value = channels[mapping.source];
    match mapping.scaling {
        Scaling::Linear { min, max } => fmap(
            value,
            CRSF_CHANNEL_VALUE_MIN,
            CRSF_CHANNEL_VALUE_MAX,
            min,
            max,
        ),
        Scaling::SwitchAboveMid => {
            if value > CRSF_CHANNEL_VALUE_MID {
                DJI_VALUE_MAX
            } else {
                DJI_VALUE_MIN
            }
        }
        Scaling::SwitchBelowMid => {
            if value < CRSF_CHANNEL_VALUE_MID {
                DJI_VALUE_MIN
            } else {
                DJI_VALUE_MAX
            }
        }
    }
}

/// Linear range mapping with round-half-up.
///
/// `out = out_min + (x - in_min) * (out_max - out_min) / (in_max - in_min)`
///
/// Inputs outside `[in_min, in_max]` extrapolate; the result is clamped to
/// what an 11-bit slot can carry.
///
/// # Examples
///
/// ```
/// use sbus_bridge::sbus::mapper::fmap;
///
/// assert_eq!(fmap(172, 172, 1811, 352, 1696), 352);
/// assert_eq!(fmap(992, 172, 1811, 352, 1696), 1024);
/// assert_eq!(fmap(1811, 172, 1811, 352, 1696), 1696);
/// ```
pub fn fmap(x: u16, in_min: u16, in_max: u16, out_min: u16, out_max: u16) -> u16 {
    let (x, in_min, in_max) = (i32::from(x), i32::from(in_min), i32::from(in_max));
    let (out_min, out_max) = (i32::from(out_min), i32::from(out_max));
    if in_max == in_min {
        return out_min as u16;
    }

    let doubled = (x - in_min) * (out_max - out_min) * 2 / (in_max - in_min) + out_min * 2 + 1;
    (doubled / 2).clamp(0, i32::from(SBUS_CHANNEL_VALUE_MAX)) as u16
}
