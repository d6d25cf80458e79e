//! # SBUS Bridge
//!
//! Reads CRSF RC channels from an ExpressLRS receiver and drives one or more
//! SBUS outputs.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (first CLI argument, or `config/default.toml`)
//!    - Set up logging with tracing subscriber
//!    - Open the CRSF input and every SBUS output port
//!
//! 2. **Main Loop**
//!    - Feed received bytes through the CRSF frame reader
//!    - Run each output when its pacing deadline is due
//!    - Drain each output's buffer to its port
//!    - Handle Ctrl+C for graceful shutdown
//!
//! # Examples
//!
//! ```bash
//! cargo run --release -- config/default.toml
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use sbus_bridge::config::{Config, FailsafeMode, LoggingConfig, OutputConfig, OutputProtocol};
use sbus_bridge::crsf::decoder::{decode_rc_channels, FrameReader};
use sbus_bridge::link::{InputCursor, LinkTracker};
use sbus_bridge::sbus::SbusOutput;
use sbus_bridge::serial::{BufferedLink, SerialPort};

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Number of frames between status log messages
const LOG_INTERVAL_FRAMES: u64 = 1000;

/// Shortest wait between output cycles; the immediate sentinel is clamped to this
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Read buffer size for the CRSF input port
const READ_CHUNK_SIZE: usize = 128;

/// One output link and everything it owns.
struct OutputChannel {
    encoder: SbusOutput,
    link: BufferedLink,
    port: SerialPort,
    cursor: InputCursor,
    next_due: Instant,
    last_log_count: u64,
}

impl OutputChannel {
    fn open(config: &OutputConfig, failsafe_mode: FailsafeMode) -> Result<Self> {
        let port = SerialPort::open_output(&config.port)
            .with_context(|| format!("opening output {}", config.port))?;

        match config.protocol {
            OutputProtocol::InvertedSbus => {
                info!("{}: inverted SBUS, line inversion must be done in hardware", config.port)
            }
            OutputProtocol::Unsupported => {
                warn!("{}: unsupported protocol, falling back to SBUS", config.port)
            }
            _ => {}
        }

        Ok(Self {
            encoder: SbusOutput::new(config.protocol, failsafe_mode),
            link: BufferedLink::new(),
            port,
            cursor: InputCursor::default(),
            next_due: Instant::now(),
            last_log_count: 0,
        })
    }

    /// Run one encoder cycle and push the result to the port.
    async fn run_cycle(&mut self, tracker: &LinkTracker, now: Instant) {
        let (input, status) = tracker.snapshot(&mut self.cursor, now.into_std());
        let pacing = self.encoder.send_rc_frame(&mut self.link, &status, &input);

        if let Err(e) = self.port.send(&mut self.link).await {
            warn!("{}: {}", self.port.device_path(), e);
        }

        self.next_due = now + pacing.as_duration().max(MIN_POLL_INTERVAL);

        let sent = self.encoder.frames_sent();
        if pacing.transmitted() && sent - self.last_log_count >= LOG_INTERVAL_FRAMES {
            info!("{}: sent {} SBUS frames", self.port.device_path(), sent);
            self.last_log_count = sent;
        }
    }
}

fn load_config() -> Result<Config> {
    match std::env::args().nth(1) {
        Some(path) => Config::load(&path).with_context(|| format!("loading {}", path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("loading {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Initialize console logging, plus a daily rolling file when configured.
///
/// The returned guard must be held for the lifetime of the program so that
/// buffered file output is flushed on exit.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "sbus-bridge.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    let _log_guard = init_logging(&config.logging);

    info!("SBUS Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut input = SerialPort::open_input(&config.input.port, config.input.baud_rate)
        .with_context(|| format!("opening input {}", config.input.port))?;

    let mut outputs = config
        .outputs
        .iter()
        .map(|output| OutputChannel::open(output, config.failsafe.mode))
        .collect::<Result<Vec<_>>>()?;

    let mut tracker = LinkTracker::from_config(&config.failsafe);
    let mut reader = FrameReader::new();
    let mut read_buf = [0u8; READ_CHUNK_SIZE];

    info!(
        "Bridging {} -> {} output(s), failsafe mode {:?}",
        input.device_path(),
        outputs.len(),
        config.failsafe.mode
    );
    info!("Press Ctrl+C to exit");

    loop {
        let next_due = outputs
            .iter()
            .map(|o| o.next_due)
            .min()
            .unwrap_or_else(|| Instant::now() + MIN_POLL_INTERVAL);

        tokio::select! {
            read = input.read_chunk(&mut read_buf) => {
                let n = read?;
                if n == 0 {
                    warn!("Input port {} closed", input.device_path());
                    break;
                }

                reader.push(&read_buf[..n]);
                while let Some(frame) = reader.next_frame() {
                    match frame {
                        Ok(frame) if frame.is_rc_channels() => match decode_rc_channels(&frame.payload) {
                            Ok(channels) => tracker.on_rc_frame(channels, Instant::now().into_std()),
                            Err(e) => warn!("Dropping RC frame: {}", e),
                        },
                        Ok(frame) => debug!("Ignoring CRSF frame type 0x{:02X}", frame.frame_type),
                        Err(e) => warn!("Dropping CRSF frame: {}", e),
                    }
                }
                if reader.buffered() > 0 {
                    trace!("{} bytes waiting for the rest of a frame", reader.buffered());
                }
            }

            _ = sleep_until(next_due) => {
                let now = Instant::now();
                for output in outputs.iter_mut().filter(|o| o.next_due <= now) {
                    output.run_cycle(&tracker, now).await;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    info!("Total RC frames received: {}", tracker.frames_received());
    for output in &outputs {
        info!(
            "{} ({:?}): {} SBUS frames sent",
            output.port.device_path(),
            output.encoder.protocol(),
            output.encoder.frames_sent()
        );
    }

    Ok(())
}
