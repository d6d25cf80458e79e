//! # CRSF Protocol Module
//!
//! Receive side of the Crossfire (CRSF) protocol, used to read RC channels
//! from an ExpressLRS receiver.
//!
//! This module handles:
//! - CRC8-DVB-S2 checksum calculation
//! - Frame synchronization and validation
//! - RC channels payload decoding (16 channels, 11-bit resolution)

pub mod crc;
pub mod decoder;
pub mod protocol;
