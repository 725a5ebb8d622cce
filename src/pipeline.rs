//! # Stick Pipeline
//!
//! One tick of the navigation loop:
//!
//! ```text
//! sampler.refresh() → raw sample → debounce buttons → normalize
//!     → joystick report (optional) → arbiter.tick(sink) → calibration log (optional)
//! ```
//!
//! The pipeline owns all per-process state (calibration, motion state, debouncers,
//! log writer). Hardware is passed in on every call so tests can substitute mocks.

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::hid::report::JoystickReport;
use crate::hid::sink::OutputSink;
use crate::motion::{MotionArbiter, MotionSettings, MotionState, TickOutcome};
use crate::sticks::axis::{NormalizedAxes, NUM_BUTTONS};
use crate::sticks::calibration::CalibrationStore;
use crate::sticks::debounce::ButtonBank;
use crate::sticks::sampler::{read_buttons, read_sticks, StickSampler};
use crate::telemetry::{CalibrationRecord, TelemetryLogger};

/// Per-process navigation state driven once per tick.
#[derive(Debug)]
pub struct StickPipeline {
    calibration: CalibrationStore,
    arbiter: MotionArbiter,
    buttons: ButtonBank,
    logger: Option<TelemetryLogger>,
    joystick_reports: bool,
}

impl StickPipeline {
    pub fn new(
        calibration: CalibrationStore,
        arbiter: MotionArbiter,
        buttons: ButtonBank,
        logger: Option<TelemetryLogger>,
        joystick_reports: bool,
    ) -> Self {
        Self {
            calibration,
            arbiter,
            buttons,
            logger,
            joystick_reports,
        }
    }

    /// Builds the pipeline described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `Telemetry` if the calibration log is enabled and its directory
    /// cannot be created.
    pub fn from_config(config: &Config, now: Instant) -> Result<Self> {
        let calibration =
            CalibrationStore::new(config.calibration.axes, config.calibration.polarity);
        info!("Axis polarity: {:?}", calibration.polarity());
        calibration.warn_misordered();

        let logger = if config.telemetry.enabled {
            Some(TelemetryLogger::new(&config.telemetry)?)
        } else {
            None
        };

        Ok(Self::new(
            calibration,
            MotionArbiter::new(MotionSettings::from(config)),
            ButtonBank::new(Duration::from_millis(config.input.button_debounce_ms), now),
            logger,
            config.hid.joystick_reports,
        ))
    }

    /// Recenters every axis on the current reading. Run once while the sticks rest.
    pub fn startup_calibrate<S>(&mut self, sampler: &mut S) -> Result<()>
    where
        S: StickSampler + ?Sized,
    {
        sampler.refresh()?;
        let raw = read_sticks(&*sampler);
        info!("Recentering sticks on {:?}", raw.0);
        self.calibration.recenter(&raw);
        Ok(())
    }

    /// Runs one tick.
    ///
    /// # Errors
    ///
    /// Returns sampler errors before anything is sent, and sink errors from the
    /// joystick report or the arbiter. The joystick report goes out first, so a
    /// failed pointer write does not drop it. Calibration log failures are logged
    /// and do not fail the tick.
    pub async fn tick<Sa, Si>(
        &mut self,
        sampler: &mut Sa,
        sink: &mut Si,
        now: Instant,
    ) -> Result<TickOutcome>
    where
        Sa: StickSampler + ?Sized,
        Si: OutputSink + ?Sized,
    {
        sampler.refresh()?;
        let raw = read_sticks(&*sampler);
        self.buttons.update(read_buttons(&*sampler), now);
        self.log_button_edges();

        let axes = self.calibration.normalize(&raw);

        if self.joystick_reports {
            let report = JoystickReport::from_axes(&axes, self.buttons.pressed());
            sink.send_joystick(&report).await?;
        }

        let outcome = self.arbiter.tick(&axes, sink).await?;

        if let Some(logger) = self.logger.as_mut() {
            let record = CalibrationRecord::new(&raw, &axes, self.arbiter.state());
            if let Err(e) = logger.log(&record, now) {
                warn!("Calibration log write failed: {}", e);
            }
        }

        Ok(outcome)
    }

    /// Ends any gesture in progress so no button or modifier stays held on the host.
    pub async fn shutdown<Si>(&mut self, sink: &mut Si) -> Result<()>
    where
        Si: OutputSink + ?Sized,
    {
        if let MotionState::Active(stick) = self.arbiter.state() {
            info!("Releasing {} gesture before exit", stick);
            self.arbiter.tick(&NormalizedAxes::centered(), sink).await?;
        }
        Ok(())
    }

    fn log_button_edges(&self) {
        for index in 0..NUM_BUTTONS {
            let Some(button) = self.buttons.button(index) else {
                continue;
            };
            if button.fell() {
                debug!("Stick button {} pressed", index);
            } else if button.rose() {
                debug!("Stick button {} released", index);
            }
        }
    }

    pub fn state(&self) -> MotionState {
        self.arbiter.state()
    }

    pub fn calibration(&self) -> &CalibrationStore {
        &self.calibration
    }

    pub fn buttons(&self) -> &ButtonBank {
        &self.buttons
    }
}
