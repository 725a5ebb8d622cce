//! # Stick Nav Library
//!
//! Drive CAD viewport navigation from two analog sticks.
//!
//! The left stick pans and the right stick orbits by emulating the mouse
//! middle-drag (and shift + middle-drag) gestures most CAD packages use, sent to
//! the host through a USB HID gadget. When a stick returns to rest the pointer is
//! moved back to where the gesture started.

pub mod config;
pub mod error;
pub mod hid;
pub mod motion;
pub mod pipeline;
pub mod sticks;
pub mod telemetry;
