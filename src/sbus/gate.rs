//! # Gate Evaluator
//!
//! Decides, once per invocation, whether the output link gets a frame.
//!
//! Order of checks:
//!
//! 1. **Suppress** - failsafe mode is `no_pulses` and the link is effectively
//!    failsafed, or nothing has ever been sent and the link is not connected.
//! 2. **Defer** - nothing new to send (no fresh frame, no missed frame, not
//!    failsafed), or the output link cannot take a whole SBUS frame.
//! 3. **Transmit** - everything else.
//!
//! Once a frame has gone out the [`SendLatch`] stays set, so a link that
//! later drops into failsafe keeps emitting failsafe-flagged frames instead
//! of going silent.

use crate::config::FailsafeMode;
use crate::link::{LinkStatus, RcInput};

use super::frame::SBUS_FRAME_LEN;

/// One-shot latch recording that this output link has transmitted.
///
/// Starts cleared and can only be set. Each output link owns its own latch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendLatch {
    sent: bool,
}

impl SendLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a frame has ever been transmitted on this link.
    pub fn is_set(&self) -> bool {
        self.sent
    }

    /// Set the latch. Returns `true` if this call is the one that set it.
    pub fn set(&mut self) -> bool {
        let first = !self.sent;
        self.sent = true;
        first
    }
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// No write, come back after the idle interval
    Suppress,
    /// No write, come back as soon as possible
    Defer,
    /// Encode and write a frame
    Transmit {
        /// Value for the frame's failsafe-active flag
        failsafe_active: bool,
    },
}

/// Evaluate the gate for one invocation
///
/// # Arguments
///
/// * `status` - Connection, failsafe and model-match state of the input link
/// * `input` - This cycle's frame-available / frame-missed flags
/// * `mode` - Configured failsafe mode
/// * `latch` - The output link's send latch
/// * `free_space` - Bytes the output link can accept without blocking
pub fn evaluate(
    status: &LinkStatus,
    input: &RcInput,
    mode: FailsafeMode,
    latch: &SendLatch,
    free_space: usize,
) -> GateDecision {
    let failsafed = status.effectively_failsafed();

    let no_pulses = failsafed && mode == FailsafeMode::NoPulses;
    let never_connected = !latch.is_set() && !status.is_connected();
    if no_pulses || never_connected {
        return GateDecision::Suppress;
    }

    let nothing_new = !input.frame_available && !input.frame_missed && !failsafed;
    if nothing_new || free_space < SBUS_FRAME_LEN {
        return GateDecision::Defer;
    }

    GateDecision::Transmit {
        failsafe_active: failsafed,
    }
}
