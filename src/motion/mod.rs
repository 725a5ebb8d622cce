//! # Motion Module
//!
//! Turns normalized stick positions into emulated middle-drag gestures.
//!
//! This module handles:
//! - Deadzone gating per stick
//! - Arbitration of which stick drives the pointer
//! - Returning the pointer to its start position when a gesture ends

pub mod arbiter;
pub mod deadzone;
pub mod unwind;

pub use arbiter::{MotionArbiter, MotionSettings, MotionState, TickOutcome};
