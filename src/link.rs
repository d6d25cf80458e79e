//! # Input Link Tracking
//!
//! Turns the stream of decoded CRSF RC frames into what the SBUS encoder
//! reads every cycle: the latest channels, whether a new frame arrived,
//! whether one was missed, and the connection / failsafe state.

use std::time::{Duration, Instant};

use crate::config::FailsafeConfig;
use crate::crsf::protocol::{RcChannels, CRSF_CHANNEL_VALUE_MID, CRSF_NUM_CHANNELS};

/// Connection state of the upstream link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Connection, failsafe and model-match state read by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus {
    pub connection: ConnectionState,
    /// Source signal lost
    pub failsafe: bool,
    /// Primary link model-match check passed
    pub model_match: bool,
    /// Team-race link model-match check passed
    pub teamrace_model_match: bool,
}

impl LinkStatus {
    /// Connected, not failsafed, both model-match checks passing.
    pub fn connected() -> Self {
        Self {
            connection: ConnectionState::Connected,
            failsafe: false,
            model_match: true,
            teamrace_model_match: true,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Failsafed, or either model-match check failed.
    pub fn effectively_failsafed(&self) -> bool {
        self.failsafe || !self.model_match || !self.teamrace_model_match
    }
}

/// Per-cycle input handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RcInput {
    pub channels: RcChannels,
    /// A new upstream frame arrived since the previous cycle
    pub frame_available: bool,
    /// The expected upstream frame did not arrive
    pub frame_missed: bool,
}

/// Position of one consumer in the tracker's frame sequence.
///
/// Each output link keeps its own cursor so every link sees each new frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputCursor {
    seen: u64,
}

/// Tracks the upstream CRSF link.
#[derive(Debug, Clone)]
pub struct LinkTracker {
    channels: RcChannels,
    last_frame: Option<Instant>,
    frame_seq: u64,
    timeout: Duration,
    frame_interval: Duration,
}

impl LinkTracker {
    /// Create a tracker
    ///
    /// # Arguments
    ///
    /// * `timeout` - Silence after which the link is failsafed and disconnected
    /// * `frame_interval` - Silence after which a cycle counts as a missed frame
    pub fn new(timeout: Duration, frame_interval: Duration) -> Self {
        Self {
            channels: [CRSF_CHANNEL_VALUE_MID; CRSF_NUM_CHANNELS],
            last_frame: None,
            frame_seq: 0,
            timeout,
            frame_interval,
        }
    }

    pub fn from_config(config: &FailsafeConfig) -> Self {
        Self::new(
            Duration::from_millis(config.timeout_ms),
            Duration::from_millis(config.frame_interval_ms),
        )
    }

    /// Record a decoded RC channels frame.
    pub fn on_rc_frame(&mut self, channels: RcChannels, now: Instant) {
        self.channels = channels;
        self.last_frame = Some(now);
        self.frame_seq += 1;
    }

    /// Latest channel values (all centered before the first frame).
    pub fn channels(&self) -> &RcChannels {
        &self.channels
    }

    /// Total RC frames received.
    pub fn frames_received(&self) -> u64 {
        self.frame_seq
    }

    fn silence(&self, now: Instant) -> Option<Duration> {
        self.last_frame.map(|at| now.saturating_duration_since(at))
    }

    /// Connection and failsafe state at `now`.
    ///
    /// Model-match is always reported as passing; CRSF channel frames carry
    /// no model-match information.
    pub fn status(&self, now: Instant) -> LinkStatus {
        let silence = self.silence(now);
        let connected = silence.is_some_and(|s| s <= self.timeout);

        LinkStatus {
            connection: if connected {
                ConnectionState::Connected
            } else {
                ConnectionState::Disconnected
            },
            failsafe: silence.is_some_and(|s| s > self.timeout),
            model_match: true,
            teamrace_model_match: true,
        }
    }

    /// Build one consumer's input for this cycle and advance its cursor.
    pub fn snapshot(&self, cursor: &mut InputCursor, now: Instant) -> (RcInput, LinkStatus) {
        let frame_available = self.frame_seq != cursor.seen;
        cursor.seen = self.frame_seq;

        let frame_missed =
            !frame_available && self.silence(now).is_some_and(|s| s > self.frame_interval);

        let input = RcInput {
            channels: self.channels,
            frame_available,
            frame_missed,
        };
        (input, self.status(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(1000);
    const INTERVAL: Duration = Duration::from_millis(20);

    fn tracker() -> LinkTracker {
        LinkTracker::new(TIMEOUT, INTERVAL)
    }

    #[test]
    fn test_effectively_failsafed() {
        let status = LinkStatus::connected();
        assert!(!status.effectively_failsafed());
        assert!(LinkStatus { failsafe: true, ..status }.effectively_failsafed());
        assert!(LinkStatus { model_match: false, ..status }.effectively_failsafed());
        assert!(LinkStatus { teamrace_model_match: false, ..status }.effectively_failsafed());
    }

    #[test]
    fn test_initial_state_is_disconnected() {
        let tracker = tracker();
        let status = tracker.status(Instant::now());

        assert_eq!(status.connection, ConnectionState::Disconnected);
        assert!(!status.failsafe);
        assert_eq!(tracker.channels(), &[CRSF_CHANNEL_VALUE_MID; 16]);
    }

    #[test]
    fn test_frame_connects_link() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        tracker.on_rc_frame([1500; 16], t0);

        let status = tracker.status(t0 + Duration::from_millis(5));
        assert!(status.is_connected());
        assert!(!status.effectively_failsafed());
        assert_eq!(tracker.frames_received(), 1);
    }

    #[test]
    fn test_timeout_enters_failsafe() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        tracker.on_rc_frame([1500; 16], t0);

        let status = tracker.status(t0 + TIMEOUT + Duration::from_millis(1));
        assert_eq!(status.connection, ConnectionState::Disconnected);
        assert!(status.failsafe);
    }

    #[test]
    fn test_snapshot_consumes_frame_once() {
        let mut tracker = tracker();
        let mut cursor = InputCursor::default();
        let t0 = Instant::now();
        tracker.on_rc_frame([1500; 16], t0);

        let (first, _) = tracker.snapshot(&mut cursor, t0);
        assert!(first.frame_available);
        assert!(!first.frame_missed);
        assert_eq!(first.channels, [1500; 16]);

        let (second, _) = tracker.snapshot(&mut cursor, t0 + Duration::from_millis(5));
        assert!(!second.frame_available);
        assert!(!second.frame_missed);
    }

    #[test]
    fn test_snapshot_reports_missed_frame() {
        let mut tracker = tracker();
        let mut cursor = InputCursor::default();
        let t0 = Instant::now();
        tracker.on_rc_frame([1500; 16], t0);
        tracker.snapshot(&mut cursor, t0);

        let (input, status) = tracker.snapshot(&mut cursor, t0 + INTERVAL * 2);
        assert!(!input.frame_available);
        assert!(input.frame_missed);
        assert!(status.is_connected());
    }

    #[test]
    fn test_no_missed_frame_before_first_frame() {
        let tracker = tracker();
        let mut cursor = InputCursor::default();

        let (input, _) = tracker.snapshot(&mut cursor, Instant::now());
        assert!(!input.frame_available);
        assert!(!input.frame_missed);
    }

    #[test]
    fn test_cursors_are_independent() {
        let mut tracker = tracker();
        let mut first = InputCursor::default();
        let mut second = InputCursor::default();
        let t0 = Instant::now();
        tracker.on_rc_frame([1500; 16], t0);

        assert!(tracker.snapshot(&mut first, t0).0.frame_available);
        assert!(tracker.snapshot(&mut second, t0).0.frame_available);
        assert!(!tracker.snapshot(&mut first, t0).0.frame_available);
    }
}
