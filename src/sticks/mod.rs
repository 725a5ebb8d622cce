//! # Stick Input Module
//!
//! Everything between the physical sticks and the motion core:
//! - Axis and stick identifiers, raw and normalized samples
//! - Per-axis calibration and startup recentering
//! - Stick-press button debouncing
//! - The sampler trait and its evdev implementation

pub mod axis;
pub mod calibration;
pub mod debounce;
pub mod evdev_sampler;
pub mod sampler;
