//! # SBUS Output Module
//!
//! Serializes RC channels into SBUS frames, optionally preceded by DJI RS
//! gimbal command packets.
//!
//! This module handles:
//! - Gating output on connection, failsafe and model-match state
//! - Remapping channels for the selected output protocol
//! - Packing 25-byte SBUS frames and 5-byte gimbal commands
//! - Telling the scheduler when to call again

pub mod frame;
pub mod gate;
pub mod gimbal;
pub mod mapper;
pub mod output;
pub mod pacing;

pub use output::SbusOutput;
pub use pacing::Pacing;
