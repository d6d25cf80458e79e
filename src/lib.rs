//! # SBUS Bridge Library
//!
//! Drive SBUS servos, flight controllers and DJI RS gimbals from an
//! ExpressLRS receiver.
//!
//! CRSF RC frames come in on one serial port; every configured output link
//! gets gated, remapped and packed into SBUS frames (plus DJI RS command
//! packets where selected), paced by the hint the encoder returns.

pub mod config;
pub mod crsf;
pub mod error;
pub mod link;
pub mod sbus;
pub mod serial;
