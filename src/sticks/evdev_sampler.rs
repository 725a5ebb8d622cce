//! # Evdev Stick Sampler
//!
//! Reads the analog sticks and stick-press buttons through the Linux evdev
//! interface. Any driver that exposes the sticks as absolute axes works; on a
//! single-board computer this is typically the kernel `adc-joystick` driver, which
//! reports raw ADC counts as `ABS_*` values.
//!
//! ## Device Selection
//!
//! - `input.device_path` set: open exactly that node
//! - otherwise: scan `/dev/input/event*` in order and take the first device whose
//!   name equals `input.device_name`
//!
//! ## Wiring
//!
//! `input.axis_codes` lists the `ABS_*` code of each axis in the order pan
//! horizontal, pan vertical, orbit horizontal, orbit vertical. `input.button_codes`
//! lists the `KEY_*`/`BTN_*` codes of the two stick-press buttons.

use evdev::{Device, Key};
use std::path::Path;
use tracing::{debug, info};

use super::axis::{Axis, RawSample, NUM_AXES, NUM_BUTTONS};
use super::sampler::StickSampler;
use crate::config::InputConfig;
use crate::error::{Result, StickNavError};

/// Directory scanned for input devices.
const INPUT_DIR: &str = "/dev/input";

/// Stick sampler backed by an evdev device.
pub struct EvdevSampler {
    device: Device,
    device_path: String,
    axis_codes: [u16; NUM_AXES],
    button_codes: [u16; NUM_BUTTONS],
    raw: RawSample,
    buttons: [bool; NUM_BUTTONS],
}

impl std::fmt::Debug for EvdevSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevSampler")
            .field("device_path", &self.device_path)
            .field("axis_codes", &self.axis_codes)
            .field("button_codes", &self.button_codes)
            .finish_non_exhaustive()
    }
}

impl EvdevSampler {
    /// Opens the input device described by `config`.
    ///
    /// # Errors
    ///
    /// - `InputDevice`: the configured path cannot be opened, or `/dev/input`
    ///   cannot be read
    /// - `InputDeviceNotFound`: no device with the configured name exists
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use stick_nav::config::Config;
    /// use stick_nav::sticks::evdev_sampler::EvdevSampler;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// let sampler = EvdevSampler::open(&config.input)?;
    /// println!("Reading sticks from {}", sampler.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(config: &InputConfig) -> Result<Self> {
        let (device, device_path) = if config.device_path.is_empty() {
            Self::find_by_name(Path::new(INPUT_DIR), &config.device_name)?
        } else {
            let device = Device::open(&config.device_path).map_err(|e| {
                StickNavError::InputDevice(format!(
                    "Failed to open {}: {}",
                    config.device_path, e
                ))
            })?;
            (device, config.device_path.clone())
        };

        info!(
            "Opened stick input {} ({})",
            device_path,
            device.name().unwrap_or("unnamed")
        );

        Ok(Self {
            device,
            device_path,
            axis_codes: config.axis_codes,
            button_codes: config.button_codes,
            raw: RawSample::default(),
            buttons: [false; NUM_BUTTONS],
        })
    }

    /// Scans `dir` for an `event*` node whose device name is `name`.
    fn find_by_name(dir: &Path, name: &str) -> Result<(Device, String)> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| {
                StickNavError::InputDevice(format!("Failed to read {}: {}", dir.display(), e))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                StickNavError::InputDevice(format!("Failed to read directory entry: {}", e))
            })?;

        // Deterministic choice when several matching devices exist
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map(|f| f.to_string_lossy().starts_with("event"))
                .unwrap_or(false);
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );
                    if device.name() == Some(name) {
                        return Ok((device, path.to_string_lossy().to_string()));
                    }
                }
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(StickNavError::InputDeviceNotFound(format!(
            "no device named '{}' in {}",
            name,
            dir.display()
        )))
    }

    /// Path of the opened `/dev/input/eventX` node.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

impl StickSampler for EvdevSampler {
    fn refresh(&mut self) -> Result<()> {
        let abs = self.device.get_abs_state().map_err(|e| {
            StickNavError::InputDevice(format!("Failed to read axis state: {}", e))
        })?;
        for axis in Axis::ALL {
            let code = usize::from(self.axis_codes[axis.index()]);
            self.raw.0[axis.index()] = abs.get(code).map_or(0, |info| info.value);
        }

        let keys = self.device.get_key_state().map_err(|e| {
            StickNavError::InputDevice(format!("Failed to read key state: {}", e))
        })?;
        for (level, code) in self.buttons.iter_mut().zip(self.button_codes) {
            *level = keys.contains(Key::new(code));
        }

        Ok(())
    }

    fn sample_axis(&self, axis: Axis) -> i32 {
        self.raw.get(axis)
    }

    fn button_level(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }
}
