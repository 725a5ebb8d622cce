//! # Stick Nav
//!
//! Pan and orbit a CAD viewport with two analog sticks.
//!
//! Reads the sticks through evdev and drives a USB HID gadget (mouse, keyboard
//! and optional joystick) so the host sees ordinary middle-drag navigation.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stick_nav::config::Config;
use stick_nav::hid::HidGadget;
use stick_nav::motion::TickOutcome;
use stick_nav::pipeline::StickPipeline;
use stick_nav::sticks::evdev_sampler::EvdevSampler;

/// Configuration file used when `--config` is not given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Number of consecutive failed ticks between repeated warnings
const ERROR_LOG_INTERVAL: u64 = 500;

/// Stick Nav - CAD pan/orbit navigation from two analog sticks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "STICK_NAV_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Also write logs to daily rotated files in this directory
    #[arg(long, env = "STICK_NAV_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

/// Install the tracing subscriber.
///
/// The returned guard must live until exit so buffered file output is flushed.
fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer());

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "stick-nav.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

/// Tick period for a polling rate in Hz
fn tick_period(rate_hz: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(rate_hz.max(1)))
}

/// Main entry point for Stick Nav
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Parse arguments, set up logging, load configuration
///    - Open the stick input device and the HID gadget endpoints
///    - Recenter the sticks if `calibrate_on_startup` is set
///
/// 2. **Main Loop**
///    - One pipeline tick per interval (default 100Hz)
///    - Failed ticks are logged and the loop continues; the arbiter resumes an
///      interrupted gesture on the next tick
///
/// 3. **Graceful Shutdown**
///    - On Ctrl+C, end any gesture in progress so nothing stays held on the host
///
/// # Errors
///
/// Returns error if configuration cannot be loaded or a device cannot be opened.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(args.log_dir.as_deref());

    info!("Stick Nav v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    info!("Configuration loaded from {}", args.config.display());

    let mut sampler = EvdevSampler::open(&config.input).context("Failed to open stick input")?;
    let mut gadget = HidGadget::open(&config.hid)
        .await
        .context("Failed to open HID gadget")?;

    let mut pipeline = StickPipeline::from_config(&config, Instant::now())?;
    if config.calibration.calibrate_on_startup {
        pipeline
            .startup_calibrate(&mut sampler)
            .context("Startup calibration failed")?;
    }

    let mut ticker = interval(tick_period(config.motion.tick_rate_hz));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Polling sticks at {}Hz", config.motion.tick_rate_hz);
    info!("Press Ctrl+C to exit");

    let mut gestures: u64 = 0;
    let mut consecutive_errors: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match pipeline.tick(&mut sampler, &mut gadget, Instant::now()).await {
                    Ok(outcome) => {
                        if consecutive_errors > 0 {
                            info!("Recovered after {} failed ticks", consecutive_errors);
                            consecutive_errors = 0;
                        }
                        match outcome {
                            TickOutcome::Started { stick, .. } => {
                                gestures += 1;
                                debug!("Gesture {} started on {} stick", gestures, stick);
                            }
                            TickOutcome::Stopped { stick, unwind_steps } => {
                                debug!("{} stick released ({} unwind steps)", stick, unwind_steps);
                            }
                            TickOutcome::Idle | TickOutcome::Moved { .. } => {}
                        }
                    }
                    Err(e) => {
                        if consecutive_errors % ERROR_LOG_INTERVAL == 0 {
                            warn!("Tick failed: {}", e);
                        }
                        consecutive_errors += 1;
                        continue;
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                if let Err(e) = pipeline.shutdown(&mut gadget).await {
                    warn!("Failed to release gesture: {}", e);
                }
                info!("Total gestures: {}", gestures);
                break;
            }
        }
    }

    Ok(())
}
