//! # DJI RS Command Packets
//!
//! 5-byte command packets sent ahead of the SBUS frame when the output link
//! drives a DJI RS gimbal:
//!
//! ```text
//! [0xAA] [command id] [value hi] [value lo] [0x00]
//! ```
//!
//! The lock-mode packet uses a command-set / command-id pair in bytes 1-2
//! and a single lock code in byte 3.

use crate::crsf::protocol::RcChannels;

use super::mapper::{slots, DJI_VALUE_MAX};

/// Command packet header byte
pub const GIMBAL_HEADER: u8 = 0xAA;

/// Command packet footer byte
pub const GIMBAL_FOOTER: u8 = 0x00;

/// Command packet size in bytes
pub const GIMBAL_PACKET_LEN: usize = 5;

/// Focus motor command id
pub const CMD_FOCUS_MOTOR: u8 = 0x12;

/// Zoom command id
pub const CMD_ZOOM: u8 = 0x13;

/// Gimbal speed command id
pub const CMD_GIMBAL_SPEED: u8 = 0x14;

/// Gimbal control command set
pub const CMD_SET_GIMBAL_CONTROL: u8 = 0x0E;

/// Operating mode settings command id (within the gimbal control set)
pub const CMD_OPERATING_MODE: u8 = 0x0D;

/// Lock code: gimbal locked
pub const LOCK_CODE_LOCKED: u8 = 0x00;

/// Lock code: gimbal unlocked
pub const LOCK_CODE_UNLOCKED: u8 = 0x01;

/// Number of command packets emitted per cycle
pub const GIMBAL_PACKETS_PER_CYCLE: usize = 4;

/// A single command packet as it goes on the wire
pub type GimbalPacket = [u8; GIMBAL_PACKET_LEN];

/// Functions controlled through command packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GimbalCommand {
    /// Focus motor position
    FocusMotor(u16),
    /// Zoom position
    Zoom(u16),
    /// Pan speed
    GimbalSpeed(u16),
    /// Locking mode
    LockMode { locked: bool },
}

impl GimbalCommand {
    /// Encode into the 5-byte wire packet.
    pub fn encode(self) -> GimbalPacket {
        match self {
            GimbalCommand::FocusMotor(value) => value_packet(CMD_FOCUS_MOTOR, value),
            GimbalCommand::Zoom(value) => value_packet(CMD_ZOOM, value),
            GimbalCommand::GimbalSpeed(value) => value_packet(CMD_GIMBAL_SPEED, value),
            GimbalCommand::LockMode { locked } => [
                GIMBAL_HEADER,
                CMD_SET_GIMBAL_CONTROL,
                CMD_OPERATING_MODE,
                if locked {
                    LOCK_CODE_LOCKED
                } else {
                    LOCK_CODE_UNLOCKED
                },
                GIMBAL_FOOTER,
            ],
        }
    }
}

fn value_packet(command: u8, value: u16) -> GimbalPacket {
    let [hi, lo] = value.to_be_bytes();
    [GIMBAL_HEADER, command, hi, lo, GIMBAL_FOOTER]
}

/// Derive this cycle's commands from DJI-mapped slots, in wire order:
/// focus, zoom, gimbal speed, lock mode.
pub fn gimbal_commands(mapped: &RcChannels) -> [GimbalCommand; GIMBAL_PACKETS_PER_CYCLE] {
    [
        GimbalCommand::FocusMotor(mapped[slots::FOCUS]),
        GimbalCommand::Zoom(mapped[slots::ZOOM]),
        GimbalCommand::GimbalSpeed(mapped[slots::SPEED]),
        GimbalCommand::LockMode {
            locked: mapped[slots::LOCK] == DJI_VALUE_MAX,
        },
    ]
}

/// Encode this cycle's command packets, in wire order.
pub fn encode_gimbal_packets(mapped: &RcChannels) -> [GimbalPacket; GIMBAL_PACKETS_PER_CYCLE] {
    gimbal_commands(mapped).map(GimbalCommand::encode)
}
