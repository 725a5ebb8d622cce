//! # Deadzone Gate
//!
//! Decides whether a stick is deflected enough to count as moving. Small readings
//! around center are sensor noise and must not start a gesture.
//!
//! A stick is active when either of its axes exceeds the threshold in magnitude;
//! it is quiet only when both axes are within it.
//!
//! ```
//! use stick_nav::motion::deadzone::DeadzoneGate;
//! use stick_nav::sticks::axis::StickPair;
//!
//! let gate = DeadzoneGate::new(0.02);
//! assert!(!gate.is_active(StickPair::new(0.01, -0.015)));
//! assert!(gate.is_active(StickPair::new(0.0, -0.3)));
//! ```

use crate::sticks::axis::StickPair;

/// Default deadzone threshold in normalized units.
pub const DEFAULT_DEADZONE: f32 = 0.02;

/// Threshold test for a stick pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadzoneGate {
    threshold: f32,
}

impl Default for DeadzoneGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEADZONE)
    }
}

impl DeadzoneGate {
    /// Creates a gate. Negative or NaN thresholds are treated as 0.0.
    #[must_use]
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.max(0.0),
        }
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Returns true if the stick is outside its deadzone.
    #[must_use]
    pub fn is_active(&self, pair: StickPair) -> bool {
        pair.horizontal.abs() > self.threshold || pair.vertical.abs() > self.threshold
    }
}
