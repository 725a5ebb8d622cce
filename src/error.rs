//! # Error Types
//!
//! Custom error types for Stick Nav using `thiserror`.

use thiserror::Error;

/// Main error type for Stick Nav
#[derive(Debug, Error)]
pub enum StickNavError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input device errors (evdev reads, device scanning)
    #[error("Input device error: {0}")]
    InputDevice(String),

    /// No matching input device was found
    #[error("Input device not found: {0}")]
    InputDeviceNotFound(String),

    /// HID gadget output errors
    #[error("HID output error: {0}")]
    Hid(String),

    /// Calibration log errors
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

/// Result type alias for Stick Nav
pub type Result<T> = std::result::Result<T, StickNavError>;
