//! # Stick and Axis Model
//!
//! Typed names for the four sampled axes and the two physical sticks they form.
//!
//! ## Axis Layout
//!
//! | Index | Axis | Stick |
//! |-------|------|-------|
//! | 0 | Pan horizontal | Pan |
//! | 1 | Pan vertical | Pan |
//! | 2 | Orbit horizontal | Orbit |
//! | 3 | Orbit vertical | Orbit |
//!
//! ## Usage
//!
//! ```
//! use stick_nav::sticks::axis::{NormalizedAxes, Stick};
//!
//! let axes = NormalizedAxes::new([0.5, 0.0, 0.0, -0.25]);
//! assert_eq!(axes.pair(Stick::Pan).horizontal, 0.5);
//! assert_eq!(axes.pair(Stick::Orbit).vertical, -0.25);
//! ```

use std::fmt;

/// Number of sampled analog axes.
pub const NUM_AXES: usize = 4;

/// Number of physical stick-press buttons.
pub const NUM_BUTTONS: usize = 2;

/// One sampled analog axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Pan stick, horizontal.
    PanHorizontal,
    /// Pan stick, vertical.
    PanVertical,
    /// Orbit stick, horizontal.
    OrbitHorizontal,
    /// Orbit stick, vertical.
    OrbitVertical,
}

impl Axis {
    /// All axes in sampling order.
    pub const ALL: [Axis; NUM_AXES] = [
        Axis::PanHorizontal,
        Axis::PanVertical,
        Axis::OrbitHorizontal,
        Axis::OrbitVertical,
    ];

    /// Position of this axis in per-axis tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Axis::PanHorizontal => 0,
            Axis::PanVertical => 1,
            Axis::OrbitHorizontal => 2,
            Axis::OrbitVertical => 3,
        }
    }
}

/// A physical 2-axis stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stick {
    /// First stick, drives pan.
    Pan,
    /// Second stick, drives orbit.
    Orbit,
}

impl Stick {
    /// Sticks in activation priority order. Pan wins a same-tick tie.
    pub const PRIORITY: [Stick; 2] = [Stick::Pan, Stick::Orbit];

    /// The (horizontal, vertical) axes of this stick.
    #[must_use]
    pub const fn axes(self) -> (Axis, Axis) {
        match self {
            Stick::Pan => (Axis::PanHorizontal, Axis::PanVertical),
            Stick::Orbit => (Axis::OrbitHorizontal, Axis::OrbitVertical),
        }
    }
}

impl fmt::Display for Stick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stick::Pan => f.write_str("pan"),
            Stick::Orbit => f.write_str("orbit"),
        }
    }
}

/// Raw integer readings for all axes from one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample(pub [i32; NUM_AXES]);

impl RawSample {
    /// Raw reading of one axis.
    #[must_use]
    pub fn get(&self, axis: Axis) -> i32 {
        self.0[axis.index()]
    }
}

/// Normalized horizontal/vertical values of one stick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickPair {
    pub horizontal: f32,
    pub vertical: f32,
}

impl StickPair {
    #[must_use]
    pub const fn new(horizontal: f32, vertical: f32) -> Self {
        Self { horizontal, vertical }
    }
}

/// Normalized values for all axes from one tick.
///
/// Values are nominally in -1.0..=1.0 but are not clamped: readings outside the
/// calibrated extents extrapolate past the ends.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedAxes([f32; NUM_AXES]);

impl NormalizedAxes {
    #[must_use]
    pub const fn new(values: [f32; NUM_AXES]) -> Self {
        Self(values)
    }

    /// All sticks centered.
    #[must_use]
    pub const fn centered() -> Self {
        Self([0.0; NUM_AXES])
    }

    #[must_use]
    pub fn get(&self, axis: Axis) -> f32 {
        self.0[axis.index()]
    }

    pub fn set(&mut self, axis: Axis, value: f32) {
        self.0[axis.index()] = value;
    }

    /// The pair of values belonging to `stick`.
    #[must_use]
    pub fn pair(&self, stick: Stick) -> StickPair {
        let (horizontal, vertical) = stick.axes();
        StickPair::new(self.get(horizontal), self.get(vertical))
    }

    #[must_use]
    pub fn values(&self) -> [f32; NUM_AXES] {
        self.0
    }
}
