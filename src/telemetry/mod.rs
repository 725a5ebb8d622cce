//! # Telemetry Module
//!
//! Calibration logging to JSONL files with rotation.
//!
//! This module handles:
//! - Capturing raw and normalized axis values per tick
//! - Formatting as JSONL (JSON Lines)
//! - Writing to rotating log files (max N records per file)
//! - Retaining only the last M files

pub mod logger;

pub use logger::{CalibrationRecord, TelemetryLogger};
