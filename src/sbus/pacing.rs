//! # Pacing Controller
//!
//! The encoder never sleeps. After every invocation it hands the caller a
//! [`Pacing`] hint saying when it wants to be called again.

use std::time::Duration;

/// Interval returned while the link is not ready to carry output (ms)
pub const UNCONNECTED_CALLBACK_INTERVAL_MS: u32 = 10;

/// Interval returned after a frame went out (ms), one SBUS frame period
pub const SBUS_CALLBACK_INTERVAL_MS: u32 = 9;

/// Reserved sentinel meaning "invoke again as soon as possible"
pub const DURATION_IMMEDIATELY: u32 = 0;

/// Re-invocation hint returned by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Nothing to do yet, check back after the idle interval
    Idle,
    /// Nothing was written but the next tick may differ, call again right away
    Immediate,
    /// A frame was written, call again after one frame period
    Steady,
}

impl Pacing {
    /// Delay in milliseconds, with [`DURATION_IMMEDIATELY`] for [`Pacing::Immediate`].
    pub const fn as_millis(self) -> u32 {
        match self {
            Pacing::Idle => UNCONNECTED_CALLBACK_INTERVAL_MS,
            Pacing::Immediate => DURATION_IMMEDIATELY,
            Pacing::Steady => SBUS_CALLBACK_INTERVAL_MS,
        }
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(u64::from(self.as_millis()))
    }

    /// True if the invocation that produced this hint wrote a frame.
    pub const fn transmitted(self) -> bool {
        matches!(self, Pacing::Steady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_values() {
        assert_eq!(Pacing::Idle.as_millis(), 10);
        assert_eq!(Pacing::Immediate.as_millis(), 0);
        assert_eq!(Pacing::Steady.as_millis(), 9);
    }

    #[test]
    fn test_as_duration() {
        assert_eq!(Pacing::Steady.as_duration(), Duration::from_millis(9));
        assert_eq!(Pacing::Immediate.as_duration(), Duration::ZERO);
    }

    #[test]
    fn test_steady_period_fits_frame_on_wire() {
        // 25 bytes at 100000 baud 8E2 (12 bits per byte) = 3ms on the wire
        let wire_time_us = 25 * 12 * 1_000_000 / 100_000;
        assert!(wire_time_us < SBUS_CALLBACK_INTERVAL_MS * 1000);
    }

    #[test]
    fn test_only_steady_transmitted() {
        assert!(Pacing::Steady.transmitted());
        assert!(!Pacing::Idle.transmitted());
        assert!(!Pacing::Immediate.transmitted());
    }
}
