//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field has a default, so an empty file yields the stock
//! wiring: middle-drag pan on the left stick, shift + middle-drag orbit on the
//! right stick, recentering at startup and no joystick reports.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, StickNavError};
use crate::hid::report::{ModifierKey, MouseButton, POINTER_REPORT_LIMIT};
use crate::motion::arbiter::DEFAULT_MAX_UNWIND_STEP;
use crate::motion::deadzone::DEFAULT_DEADZONE;
use crate::sticks::axis::{NUM_AXES, NUM_BUTTONS};
use crate::sticks::calibration::{AxisCalibration, Polarity, DEFAULT_EXTENTS};

/// Highest valid `ABS_*` code (exclusive).
const ABS_CODE_LIMIT: u16 = 0x40;

/// Highest valid `KEY_*`/`BTN_*` code (exclusive).
const KEY_CODE_LIMIT: u16 = 0x300;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub sticks: SticksConfig,
    #[serde(default)]
    pub hid: HidConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Stick input device configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Explicit `/dev/input/eventX` path; empty to search by name
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// `ABS_*` codes for pan H, pan V, orbit H, orbit V
    #[serde(default = "default_axis_codes")]
    pub axis_codes: [u16; NUM_AXES],

    /// Key codes of the pan and orbit stick-press buttons
    #[serde(default = "default_button_codes")]
    pub button_codes: [u16; NUM_BUTTONS],

    #[serde(default = "default_button_debounce_ms")]
    pub button_debounce_ms: u64,
}

/// Axis calibration configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CalibrationConfig {
    #[serde(default = "default_calibrate_on_startup")]
    pub calibrate_on_startup: bool,

    #[serde(default)]
    pub polarity: Polarity,

    #[serde(default = "default_axes")]
    pub axes: [AxisCalibration; NUM_AXES],
}

/// Motion arbitration configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MotionConfig {
    #[serde(default = "default_deadzone")]
    pub deadzone: f32,

    #[serde(default = "default_max_unwind_step")]
    pub max_unwind_step: i32,

    #[serde(default = "default_settle_ms")]
    pub key_settle_ms: u64,

    #[serde(default = "default_settle_ms")]
    pub button_settle_ms: u64,

    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,
}

/// Per-stick bindings
#[derive(Debug, Deserialize, Clone)]
pub struct SticksConfig {
    #[serde(default = "default_pan")]
    pub pan: StickConfig,

    #[serde(default = "default_orbit")]
    pub orbit: StickConfig,
}

/// What a stick does while it drives motion
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StickConfig {
    /// Pointer counts per tick at full deflection (sign flips direction)
    pub speed: i32,

    #[serde(default = "default_stick_buttons")]
    pub buttons: Vec<MouseButton>,

    #[serde(default)]
    pub key: Option<ModifierKey>,
}

/// USB HID gadget endpoints
#[derive(Debug, Deserialize, Clone)]
pub struct HidConfig {
    #[serde(default = "default_mouse_device")]
    pub mouse_device: String,

    #[serde(default = "default_keyboard_device")]
    pub keyboard_device: String,

    #[serde(default = "default_joystick_device")]
    pub joystick_device: String,

    #[serde(default)]
    pub joystick_reports: bool,
}

/// Calibration log configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,
}

// Default value functions
fn default_device_name() -> String { "adc-joystick".to_string() }
fn default_axis_codes() -> [u16; NUM_AXES] { [0x00, 0x01, 0x03, 0x04] }
fn default_button_codes() -> [u16; NUM_BUTTONS] { [0x13d, 0x13e] }
fn default_button_debounce_ms() -> u64 { 100 }

fn default_calibrate_on_startup() -> bool { true }
fn default_axes() -> [AxisCalibration; NUM_AXES] { DEFAULT_EXTENTS }

fn default_deadzone() -> f32 { DEFAULT_DEADZONE }
fn default_max_unwind_step() -> i32 { DEFAULT_MAX_UNWIND_STEP }
fn default_settle_ms() -> u64 { 10 }
fn default_tick_rate_hz() -> u32 { 100 }

fn default_pan() -> StickConfig {
    StickConfig { speed: -25, buttons: default_stick_buttons(), key: None }
}
fn default_orbit() -> StickConfig {
    StickConfig { speed: -10, buttons: default_stick_buttons(), key: Some(ModifierKey::LeftShift) }
}
fn default_stick_buttons() -> Vec<MouseButton> { vec![MouseButton::Middle] }

fn default_mouse_device() -> String { "/dev/hidg0".to_string() }
fn default_keyboard_device() -> String { "/dev/hidg1".to_string() }
fn default_joystick_device() -> String { "/dev/hidg2".to_string() }

fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_interval_ms() -> u64 { 100 }

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            device_name: default_device_name(),
            axis_codes: default_axis_codes(),
            button_codes: default_button_codes(),
            button_debounce_ms: default_button_debounce_ms(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            calibrate_on_startup: default_calibrate_on_startup(),
            polarity: Polarity::default(),
            axes: default_axes(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            deadzone: default_deadzone(),
            max_unwind_step: default_max_unwind_step(),
            key_settle_ms: default_settle_ms(),
            button_settle_ms: default_settle_ms(),
            tick_rate_hz: default_tick_rate_hz(),
        }
    }
}

impl Default for SticksConfig {
    fn default() -> Self {
        Self { pan: default_pan(), orbit: default_orbit() }
    }
}

impl Default for HidConfig {
    fn default() -> Self {
        Self {
            mouse_device: default_mouse_device(),
            keyboard_device: default_keyboard_device(),
            joystick_device: default_joystick_device(),
            joystick_reports: false,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            log_interval_ms: default_log_interval_ms(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> StickNavError {
    StickNavError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use stick_nav::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Input wiring
        if self.input.device_path.is_empty() && self.input.device_name.is_empty() {
            return Err(invalid("input device_name cannot be empty when device_path is not set"));
        }

        for &code in &self.input.axis_codes {
            if code >= ABS_CODE_LIMIT {
                return Err(invalid(format!(
                    "axis code {:#x} is out of range (must be below {:#x})",
                    code, ABS_CODE_LIMIT
                )));
            }
        }

        for &code in &self.input.button_codes {
            if code >= KEY_CODE_LIMIT {
                return Err(invalid(format!(
                    "button code {:#x} is out of range (must be below {:#x})",
                    code, KEY_CODE_LIMIT
                )));
            }
        }

        if self.input.button_debounce_ms > 10000 {
            return Err(invalid("button_debounce_ms must be between 0 and 10000"));
        }

        // Calibration extents
        for (index, axis) in self.calibration.axes.iter().enumerate() {
            if !(axis.low.is_finite() && axis.center.is_finite() && axis.high.is_finite()) {
                return Err(invalid(format!(
                    "calibration axis {} must have finite low, center and high",
                    index
                )));
            }
        }

        // Motion
        if !(0.0..=0.5).contains(&self.motion.deadzone) {
            return Err(invalid("deadzone must be between 0.0 and 0.5"));
        }

        if !(1..=i32::from(POINTER_REPORT_LIMIT)).contains(&self.motion.max_unwind_step) {
            return Err(invalid("max_unwind_step must be between 1 and 127"));
        }

        if self.motion.key_settle_ms > 1000 {
            return Err(invalid("key_settle_ms must be between 0 and 1000"));
        }

        if self.motion.button_settle_ms > 1000 {
            return Err(invalid("button_settle_ms must be between 0 and 1000"));
        }

        if self.motion.tick_rate_hz == 0 || self.motion.tick_rate_hz > 1000 {
            return Err(invalid("tick_rate_hz must be between 1 and 1000"));
        }

        // HID endpoints
        if self.hid.mouse_device.is_empty() {
            return Err(invalid("hid mouse_device cannot be empty"));
        }

        if self.hid.keyboard_device.is_empty() {
            return Err(invalid("hid keyboard_device cannot be empty"));
        }

        if self.hid.joystick_reports && self.hid.joystick_device.is_empty() {
            return Err(invalid("hid joystick_device cannot be empty when joystick_reports is enabled"));
        }

        // Calibration log
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.log_interval_ms == 0 || self.telemetry.log_interval_ms > 60000 {
            return Err(invalid("log_interval_ms must be between 1 and 60000"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> Config {
        Config::default()
    }

    fn assert_invalid(config: &Config, expected: &str) {
        match config.validate() {
            Err(StickNavError::Config(e)) => {
                assert!(
                    e.to_string().contains(expected),
                    "error '{}' does not mention '{}'",
                    e,
                    expected
                );
            }
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    #[test]
    fn test_default_config() {
        let config = create_valid_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_device_name(), "adc-joystick");
        assert_eq!(default_axis_codes(), [0, 1, 3, 4]);
        assert_eq!(default_button_codes(), [0x13d, 0x13e]);
        assert_eq!(default_button_debounce_ms(), 100);
        assert!(default_calibrate_on_startup());
        assert_eq!(default_deadzone(), 0.02);
        assert_eq!(default_max_unwind_step(), 100);
        assert_eq!(default_settle_ms(), 10);
        assert_eq!(default_tick_rate_hz(), 100);
        assert_eq!(default_pan().speed, -25);
        assert_eq!(default_pan().key, None);
        assert_eq!(default_orbit().speed, -10);
        assert_eq!(default_orbit().key, Some(ModifierKey::LeftShift));
        assert_eq!(default_stick_buttons(), vec![MouseButton::Middle]);
        assert_eq!(default_mouse_device(), "/dev/hidg0");
        assert_eq!(default_keyboard_device(), "/dev/hidg1");
        assert_eq!(default_joystick_device(), "/dev/hidg2");
        assert_eq!(default_log_dir(), "./logs");
        assert_eq!(default_max_records_per_file(), 10000);
        assert_eq!(default_max_files_to_keep(), 10);
        assert_eq!(default_log_interval_ms(), 100);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config.input.device_name, "adc-joystick");
        assert!(config.calibration.calibrate_on_startup);
        assert_eq!(config.calibration.polarity, Polarity::Inverted);
        assert_eq!(config.calibration.axes, DEFAULT_EXTENTS);
        assert_eq!(config.sticks.pan, default_pan());
        assert_eq!(config.sticks.orbit, default_orbit());
        assert!(!config.hid.joystick_reports);
        assert!(!config.telemetry.enabled);
    }

    #[test]
    fn test_load_config_from_file() {
        let toml_content = r#"
[input]
device_path = "/dev/input/event3"
button_debounce_ms = 50

[calibration]
calibrate_on_startup = false
polarity = "normal"
axes = [
    { low = 0.0, center = 512.0, high = 1023.0 },
    { low = 0.0, center = 512.0, high = 1023.0 },
    { low = 10.0, center = 500.0, high = 1000.0 },
    { low = 10.0, center = 500.0, high = 1000.0 },
]

[motion]
deadzone = 0.05
max_unwind_step = 50
tick_rate_hz = 200

[sticks.pan]
speed = 20
buttons = ["left", "right"]

[sticks.orbit]
speed = -5
buttons = ["middle"]
key = "left_ctrl"

[hid]
joystick_reports = true

[telemetry]
enabled = true
log_dir = "/tmp/stick-nav"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.input.device_path, "/dev/input/event3");
        assert_eq!(config.input.device_name, "adc-joystick");
        assert_eq!(config.input.button_debounce_ms, 50);
        assert!(!config.calibration.calibrate_on_startup);
        assert_eq!(config.calibration.polarity, Polarity::Normal);
        assert_eq!(config.calibration.axes[2], AxisCalibration::new(10.0, 500.0, 1000.0));
        assert_eq!(config.motion.deadzone, 0.05);
        assert_eq!(config.motion.max_unwind_step, 50);
        assert_eq!(config.motion.key_settle_ms, 10);
        assert_eq!(config.motion.tick_rate_hz, 200);
        assert_eq!(config.sticks.pan.buttons, vec![MouseButton::Left, MouseButton::Right]);
        assert_eq!(config.sticks.pan.key, None);
        assert_eq!(config.sticks.orbit.key, Some(ModifierKey::LeftCtrl));
        assert!(config.hid.joystick_reports);
        assert_eq!(config.hid.joystick_device, "/dev/hidg2");
        assert!(config.telemetry.enabled);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/stick-nav.toml");
        assert!(matches!(result, Err(StickNavError::Io(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = Config::from_toml("[motion]\ndeadzone = \"wide\"\n");
        assert!(matches!(result, Err(StickNavError::Config(_))));
    }

    #[test]
    fn test_unknown_modifier_rejected() {
        let result = Config::from_toml("[sticks.orbit]\nspeed = -10\nkey = \"hyper\"\n");
        assert!(matches!(result, Err(StickNavError::Config(_))));
    }

    #[test]
    fn test_stick_without_speed_rejected() {
        let result = Config::from_toml("[sticks.pan]\nbuttons = [\"middle\"]\n");
        assert!(matches!(result, Err(StickNavError::Config(_))));
    }

    #[test]
    fn test_invalid_deadzone() {
        let mut config = create_valid_config();
        config.motion.deadzone = 0.6;
        assert_invalid(&config, "deadzone");

        config.motion.deadzone = -0.1;
        assert_invalid(&config, "deadzone");

        config.motion.deadzone = f32::NAN;
        assert_invalid(&config, "deadzone");
    }

    #[test]
    fn test_deadzone_boundaries_valid() {
        let mut config = create_valid_config();
        config.motion.deadzone = 0.0;
        assert!(config.validate().is_ok());

        config.motion.deadzone = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_max_unwind_step() {
        let mut config = create_valid_config();
        config.motion.max_unwind_step = 0;
        assert_invalid(&config, "max_unwind_step");

        config.motion.max_unwind_step = 128;
        assert_invalid(&config, "max_unwind_step");

        config.motion.max_unwind_step = 127;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_settle_delays() {
        let mut config = create_valid_config();
        config.motion.key_settle_ms = 1001;
        assert_invalid(&config, "key_settle_ms");

        let mut config = create_valid_config();
        config.motion.button_settle_ms = 1001;
        assert_invalid(&config, "button_settle_ms");
    }

    #[test]
    fn test_invalid_tick_rate() {
        let mut config = create_valid_config();
        config.motion.tick_rate_hz = 0;
        assert_invalid(&config, "tick_rate_hz");

        config.motion.tick_rate_hz = 1001;
        assert_invalid(&config, "tick_rate_hz");
    }

    #[test]
    fn test_invalid_debounce() {
        let mut config = create_valid_config();
        config.input.button_debounce_ms = 10001;
        assert_invalid(&config, "button_debounce_ms");
    }

    #[test]
    fn test_invalid_axis_code() {
        let mut config = create_valid_config();
        config.input.axis_codes[3] = 0x40;
        assert_invalid(&config, "axis code");
    }

    #[test]
    fn test_invalid_button_code() {
        let mut config = create_valid_config();
        config.input.button_codes[0] = 0x300;
        assert_invalid(&config, "button code");
    }

    #[test]
    fn test_missing_device_name_without_path() {
        let mut config = create_valid_config();
        config.input.device_name = String::new();
        assert_invalid(&config, "device_name");

        config.input.device_path = "/dev/input/event0".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_finite_calibration() {
        let mut config = create_valid_config();
        config.calibration.axes[1].center = f32::INFINITY;
        assert_invalid(&config, "calibration axis 1");
    }

    #[test]
    fn test_degenerate_calibration_is_accepted() {
        // Degenerate extents normalize to zero at runtime; they are not a load error
        let mut config = create_valid_config();
        config.calibration.axes[0] = AxisCalibration::new(500.0, 500.0, 500.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_hid_paths() {
        let mut config = create_valid_config();
        config.hid.mouse_device = String::new();
        assert_invalid(&config, "mouse_device");

        let mut config = create_valid_config();
        config.hid.keyboard_device = String::new();
        assert_invalid(&config, "keyboard_device");
    }

    #[test]
    fn test_joystick_path_only_required_when_enabled() {
        let mut config = create_valid_config();
        config.hid.joystick_device = String::new();
        assert!(config.validate().is_ok());

        config.hid.joystick_reports = true;
        assert_invalid(&config, "joystick_device");
    }

    #[test]
    fn test_telemetry_limits() {
        let mut config = create_valid_config();
        config.telemetry.enabled = true;
        config.telemetry.log_dir = String::new();
        assert_invalid(&config, "log_dir");

        let mut config = create_valid_config();
        config.telemetry.log_interval_ms = 0;
        assert_invalid(&config, "log_interval_ms");

        let mut config = create_valid_config();
        config.telemetry.max_records_per_file = 0;
        assert_invalid(&config, "max_records_per_file");

        let mut config = create_valid_config();
        config.telemetry.max_files_to_keep = 0;
        assert_invalid(&config, "max_files_to_keep");
    }
}
