//! # SBUS Output Routine
//!
//! One [`SbusOutput`] per physical output link. Each invocation of
//! [`SbusOutput::send_rc_frame`] runs gate, mapper, builder and pacing in
//! that order and writes at most one cycle's worth of bytes.

use tracing::{debug, info, trace};

use crate::config::{FailsafeMode, OutputProtocol};
use crate::link::{LinkStatus, RcInput};
use crate::serial::OutputLink;

use super::frame::{encode_sbus_frame, SbusFlags, SBUS_FRAME_LEN};
use super::gate::{self, GateDecision, SendLatch};
use super::gimbal::{encode_gimbal_packets, GIMBAL_PACKETS_PER_CYCLE, GIMBAL_PACKET_LEN};
use super::mapper::map_channels;
use super::pacing::Pacing;

/// Per-link encoder state.
///
/// Protocol selection and failsafe mode are resolved when the output is
/// built. The send latch lives here, so separate links never share it.
#[derive(Debug, Clone)]
pub struct SbusOutput {
    protocol: OutputProtocol,
    failsafe_mode: FailsafeMode,
    latch: SendLatch,
    frames_sent: u64,
}

impl SbusOutput {
    pub fn new(protocol: OutputProtocol, failsafe_mode: FailsafeMode) -> Self {
        Self {
            protocol,
            failsafe_mode,
            latch: SendLatch::new(),
            frames_sent: 0,
        }
    }

    pub fn protocol(&self) -> OutputProtocol {
        self.protocol
    }

    /// Whether this link has ever transmitted.
    pub fn has_started(&self) -> bool {
        self.latch.is_set()
    }

    /// SBUS frames transmitted so far.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Run one output cycle
    ///
    /// # Arguments
    ///
    /// * `link` - Output link to append to
    /// * `status` - Current connection / failsafe / model-match state
    /// * `input` - This cycle's channels and frame flags
    ///
    /// # Returns
    ///
    /// * `Pacing` - When the caller should invoke this again
    ///
    /// # Examples
    ///
    /// ```
    /// use sbus_bridge::config::{FailsafeMode, OutputProtocol};
    /// use sbus_bridge::link::{LinkStatus, RcInput};
    /// use sbus_bridge::sbus::{Pacing, SbusOutput};
    /// use sbus_bridge::serial::{BufferedLink, OutputLink};
    ///
    /// let mut output = SbusOutput::new(OutputProtocol::Sbus, FailsafeMode::LastPosition);
    /// let mut link = BufferedLink::new();
    /// let input = RcInput { channels: [992; 16], frame_available: true, frame_missed: false };
    ///
    /// let pacing = output.send_rc_frame(&mut link, &LinkStatus::connected(), &input);
    /// assert_eq!(pacing, Pacing::Steady);
    /// assert_eq!(link.len(), 25);
    /// ```
    pub fn send_rc_frame<L>(&mut self, link: &mut L, status: &LinkStatus, input: &RcInput) -> Pacing
    where
        L: OutputLink + ?Sized,
    {
        let decision = gate::evaluate(
            status,
            input,
            self.failsafe_mode,
            &self.latch,
            link.available_for_write(),
        );

        let failsafe_active = match decision {
            GateDecision::Suppress => {
                trace!("Output suppressed ({:?})", status.connection);
                return Pacing::Idle;
            }
            GateDecision::Defer => {
                trace!("Nothing to send this cycle");
                return Pacing::Immediate;
            }
            GateDecision::Transmit { failsafe_active } => failsafe_active,
        };

        // A cycle is written whole or not at all
        let cycle_len = self.cycle_len();
        if link.available_for_write() < cycle_len {
            trace!("Need {} bytes of free space, deferring", cycle_len);
            return Pacing::Immediate;
        }

        if self.latch.set() {
            info!("Starting {:?} output", self.protocol);
        }

        let channels = map_channels(self.protocol, &input.channels);

        if self.protocol == OutputProtocol::DjiRsPro {
            for packet in encode_gimbal_packets(&channels) {
                link.write(&packet);
            }
        }

        let flags = SbusFlags {
            signal_loss: input.frame_missed,
            failsafe_active,
        };
        link.write(&encode_sbus_frame(&channels, flags));

        self.frames_sent += 1;
        debug!(
            "Sent SBUS frame #{} (failsafe: {}, signal loss: {})",
            self.frames_sent, flags.failsafe_active, flags.signal_loss
        );

        Pacing::Steady
    }

    /// Bytes written by one transmitting cycle on this link.
    fn cycle_len(&self) -> usize {
        match self.protocol {
            OutputProtocol::DjiRsPro => SBUS_FRAME_LEN + GIMBAL_PACKETS_PER_CYCLE * GIMBAL_PACKET_LEN,
            _ => SBUS_FRAME_LEN,
        }
    }
}
