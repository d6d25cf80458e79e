//! End-to-end encoder scenarios against the public API.

use std::time::{Duration, Instant};

use sbus_bridge::config::{FailsafeMode, OutputProtocol};
use sbus_bridge::crsf::protocol::{
    RcChannels, CRSF_CHANNEL_VALUE_MAX, CRSF_CHANNEL_VALUE_MID, CRSF_CHANNEL_VALUE_MIN,
};
use sbus_bridge::link::{ConnectionState, InputCursor, LinkStatus, LinkTracker, RcInput};
use sbus_bridge::sbus::frame::{decode_sbus_frame, SbusFrame, SBUS_FRAME_LEN};
use sbus_bridge::sbus::gimbal::{GIMBAL_PACKET_LEN, LOCK_CODE_LOCKED, LOCK_CODE_UNLOCKED};
use sbus_bridge::sbus::{Pacing, SbusOutput};
use sbus_bridge::serial::{BufferedLink, OutputLink};

fn fresh(channels: RcChannels) -> RcInput {
    RcInput {
        channels,
        frame_available: true,
        frame_missed: false,
    }
}

fn stale(channels: RcChannels) -> RcInput {
    RcInput {
        frame_available: false,
        ..fresh(channels)
    }
}

fn frame_at(link: &BufferedLink, offset: usize) -> SbusFrame {
    link.pending()[offset..offset + SBUS_FRAME_LEN]
        .try_into()
        .unwrap()
}

/// Drop everything written so far.
fn clear(link: &mut BufferedLink) {
    let mut sink: Vec<u8> = Vec::new();
    tokio_test::block_on(link.drain_to(&mut sink)).unwrap();
}

#[test]
fn test_connected_standard_output_sends_clean_frame() {
    let channels: RcChannels = core::array::from_fn(|i| 172 + i as u16 * 109);
    let mut output = SbusOutput::new(OutputProtocol::Sbus, FailsafeMode::LastPosition);
    let mut link = BufferedLink::new();

    let pacing = output.send_rc_frame(&mut link, &LinkStatus::connected(), &fresh(channels));

    assert_eq!(pacing, Pacing::Steady);
    assert_eq!(pacing.as_millis(), 9);
    assert_eq!(link.len(), SBUS_FRAME_LEN);

    let frame = frame_at(&link, 0);
    assert_eq!(frame[0], 0x0F);
    assert_eq!(frame[23], 0x00);
    assert_eq!(frame[24], 0x00);
    assert_eq!(decode_sbus_frame(&frame).unwrap().0, channels);
}

#[test]
fn test_no_pulses_failsafe_writes_nothing() {
    let mut output = SbusOutput::new(OutputProtocol::Sbus, FailsafeMode::NoPulses);
    let mut link = BufferedLink::new();
    let status = LinkStatus {
        failsafe: true,
        ..LinkStatus::connected()
    };

    let pacing = output.send_rc_frame(&mut link, &status, &fresh([CRSF_CHANNEL_VALUE_MID; 16]));

    assert_eq!(pacing, Pacing::Idle);
    assert_eq!(pacing.as_millis(), 10);
    assert!(link.is_empty());
}

#[test]
fn test_nothing_written_before_first_connection() {
    let mut output = SbusOutput::new(OutputProtocol::Sbus, FailsafeMode::SetPosition);
    let mut link = BufferedLink::new();
    let status = LinkStatus {
        connection: ConnectionState::Disconnected,
        ..LinkStatus::connected()
    };

    for _ in 0..5 {
        let pacing = output.send_rc_frame(&mut link, &status, &fresh([CRSF_CHANNEL_VALUE_MID; 16]));
        assert_eq!(pacing, Pacing::Idle);
    }
    assert!(link.is_empty());
    assert!(!output.has_started());
}

#[test]
fn test_latched_output_never_idles_again() {
    let mut output = SbusOutput::new(OutputProtocol::Sbus, FailsafeMode::LastPosition);
    let mut link = BufferedLink::new();
    let channels = [CRSF_CHANNEL_VALUE_MID; 16];

    output.send_rc_frame(&mut link, &LinkStatus::connected(), &fresh(channels));
    clear(&mut link);

    let lost = LinkStatus {
        connection: ConnectionState::Disconnected,
        failsafe: true,
        ..LinkStatus::connected()
    };
    for _ in 0..3 {
        let pacing = output.send_rc_frame(&mut link, &lost, &stale(channels));
        assert_eq!(pacing, Pacing::Steady);

        let (_, flags) = decode_sbus_frame(&frame_at(&link, 0)).unwrap();
        assert!(flags.failsafe_active);
        assert!(!flags.signal_loss);
        clear(&mut link);
    }
}

#[test]
fn test_signal_loss_follows_frame_missed() {
    let mut output = SbusOutput::new(OutputProtocol::Sbus, FailsafeMode::LastPosition);
    let mut link = BufferedLink::new();
    let channels = [CRSF_CHANNEL_VALUE_MID; 16];

    let missed = RcInput {
        frame_missed: true,
        ..stale(channels)
    };
    output.send_rc_frame(&mut link, &LinkStatus::connected(), &missed);
    let (_, flags) = decode_sbus_frame(&frame_at(&link, 0)).unwrap();
    assert!(flags.signal_loss);
    assert!(!flags.failsafe_active);
    clear(&mut link);

    output.send_rc_frame(&mut link, &LinkStatus::connected(), &fresh(channels));
    let (_, flags) = decode_sbus_frame(&frame_at(&link, 0)).unwrap();
    assert!(!flags.signal_loss);
}

#[test]
fn test_full_link_defers_without_partial_write() {
    let mut output = SbusOutput::new(OutputProtocol::Sbus, FailsafeMode::LastPosition);
    let mut link = BufferedLink::with_capacity(40);
    let channels = [CRSF_CHANNEL_VALUE_MID; 16];

    output.send_rc_frame(&mut link, &LinkStatus::connected(), &fresh(channels));
    assert_eq!(link.available_for_write(), 15);

    let pacing = output.send_rc_frame(&mut link, &LinkStatus::connected(), &fresh(channels));
    assert_eq!(pacing, Pacing::Immediate);
    assert_eq!(pacing.as_millis(), 0);
    assert_eq!(link.len(), SBUS_FRAME_LEN);
}

#[test]
fn test_dji_link_without_room_for_full_cycle_defers() {
    let mut output = SbusOutput::new(OutputProtocol::DjiRsPro, FailsafeMode::LastPosition);
    let mut link = BufferedLink::with_capacity(40);
    let channels = [CRSF_CHANNEL_VALUE_MID; 16];

    let pacing = output.send_rc_frame(&mut link, &LinkStatus::connected(), &fresh(channels));

    assert_eq!(pacing, Pacing::Immediate);
    assert!(link.is_empty());
    assert!(!output.has_started());
    assert_eq!(output.frames_sent(), 0);
}

#[test]
fn test_dji_lock_above_midpoint() {
    let mut channels = [CRSF_CHANNEL_VALUE_MID; 16];
    channels[11] = CRSF_CHANNEL_VALUE_MID + 200;

    let mut output = SbusOutput::new(OutputProtocol::DjiRsPro, FailsafeMode::LastPosition);
    let mut link = BufferedLink::new();
    let pacing = output.send_rc_frame(&mut link, &LinkStatus::connected(), &fresh(channels));

    assert_eq!(pacing, Pacing::Steady);
    assert_eq!(link.len(), 4 * GIMBAL_PACKET_LEN + SBUS_FRAME_LEN);

    let bytes = link.pending();
    assert_eq!(&bytes[0..2], &[0xAA, 0x12]);
    assert_eq!(&bytes[5..7], &[0xAA, 0x13]);
    assert_eq!(&bytes[10..12], &[0xAA, 0x14]);
    assert_eq!(&bytes[15..20], &[0xAA, 0x0E, 0x0D, LOCK_CODE_LOCKED, 0x00]);

    let (mapped, _) = decode_sbus_frame(&frame_at(&link, 20)).unwrap();
    assert_eq!(mapped[9], 1696);
}

#[test]
fn test_dji_unlock_below_midpoint() {
    let mut channels = [CRSF_CHANNEL_VALUE_MID; 16];
    channels[11] = CRSF_CHANNEL_VALUE_MIN;

    let mut output = SbusOutput::new(OutputProtocol::DjiRsPro, FailsafeMode::LastPosition);
    let mut link = BufferedLink::new();
    output.send_rc_frame(&mut link, &LinkStatus::connected(), &fresh(channels));

    assert_eq!(link.pending()[18], LOCK_CODE_UNLOCKED);
    let (mapped, _) = decode_sbus_frame(&frame_at(&link, 20)).unwrap();
    assert_eq!(mapped[9], 352);
}

#[test]
fn test_dji_ranges_at_endpoints() {
    let mut output = SbusOutput::new(OutputProtocol::DjiRsPro, FailsafeMode::LastPosition);

    for (input, full, recenter) in [
        (CRSF_CHANNEL_VALUE_MIN, 352, 176),
        (CRSF_CHANNEL_VALUE_MID, 1024, 512),
        (CRSF_CHANNEL_VALUE_MAX, 1696, 848),
    ] {
        let mut link = BufferedLink::new();
        output.send_rc_frame(&mut link, &LinkStatus::connected(), &fresh([input; 16]));

        let (mapped, _) = decode_sbus_frame(&frame_at(&link, 20)).unwrap();
        assert_eq!(mapped[0], full, "pan at {}", input);
        assert_eq!(mapped[6], recenter, "recenter at {}", input);

        // Focus packet carries slot 2, big-endian
        assert_eq!(&link.pending()[2..4], &full.to_be_bytes());
    }
}

#[test]
fn test_tracker_drives_output_through_failsafe() {
    let mut tracker = LinkTracker::new(Duration::from_millis(100), Duration::from_millis(20));
    let mut cursor = InputCursor::default();
    let mut output = SbusOutput::new(OutputProtocol::Sbus, FailsafeMode::LastPosition);
    let mut link = BufferedLink::new();
    let t0 = Instant::now();

    // Nothing received yet
    let (input, status) = tracker.snapshot(&mut cursor, t0);
    assert_eq!(output.send_rc_frame(&mut link, &status, &input), Pacing::Idle);

    tracker.on_rc_frame([1500; 16], t0);
    let (input, status) = tracker.snapshot(&mut cursor, t0 + Duration::from_millis(1));
    assert_eq!(output.send_rc_frame(&mut link, &status, &input), Pacing::Steady);
    clear(&mut link);

    // Same frame again: nothing new
    let (input, status) = tracker.snapshot(&mut cursor, t0 + Duration::from_millis(5));
    assert_eq!(output.send_rc_frame(&mut link, &status, &input), Pacing::Immediate);

    // Receiver goes quiet past the timeout
    let (input, status) = tracker.snapshot(&mut cursor, t0 + Duration::from_millis(500));
    assert_eq!(output.send_rc_frame(&mut link, &status, &input), Pacing::Steady);

    let (channels, flags) = decode_sbus_frame(&frame_at(&link, 0)).unwrap();
    assert_eq!(channels, [1500; 16]);
    assert!(flags.failsafe_active);
    assert!(flags.signal_loss);
}
