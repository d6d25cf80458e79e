//! # Error Types
//!
//! Custom error types for SBUS Bridge using `thiserror`.
//!
//! The encoding core in [`crate::sbus`] never fails; these errors only come
//! from the I/O and configuration around it.

use thiserror::Error;

/// Main error type for SBUS Bridge
#[derive(Debug, Error)]
pub enum SbusBridgeError {
    /// CRSF protocol errors
    #[error("CRSF protocol error: {0}")]
    CrsfProtocol(String),

    /// SBUS frame errors (only raised when decoding)
    #[error("SBUS frame error: {0}")]
    SbusFrame(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for SBUS Bridge
pub type Result<T> = std::result::Result<T, SbusBridgeError>;
