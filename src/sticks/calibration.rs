//! # Calibration Module
//!
//! Converts raw analog readings into normalized axis values using per-axis
//! `(low, center, high)` extents.
//!
//! ## Piecewise Normalization
//!
//! Each side of center is scaled on its own, so a stick whose resting point is not
//! halfway between its end stops still reaches full deflection in both directions:
//!
//! - `raw < center`: `-(1 - (raw - low) / (center - low))`, so `low` maps to -1.0
//! - `raw >= center`: `(raw - center) / (high - center)`, so `high` maps to 1.0
//!
//! Readings beyond the extents extrapolate past ±1.0; nothing is clamped here.
//!
//! ## Polarity
//!
//! After the half-range step the configured [`Polarity`] is applied. The default is
//! [`Polarity::Inverted`], which flips every axis so that pushing a stick produces
//! the expected pointer direction with the stock wiring.
//!
//! ## Degenerate Extents
//!
//! A zero-width half range (`center == low` or `center == high`) would divide by
//! zero. The normalizer returns the neutral value 0.0 instead, so a bad calibration
//! can never inject NaN or infinity into motion.
//!
//! ## Usage
//!
//! ```
//! use stick_nav::sticks::calibration::{AxisCalibration, Polarity};
//!
//! let cal = AxisCalibration::new(0.0, 500.0, 1000.0);
//!
//! assert_eq!(cal.normalize(500), 0.0);
//! assert!((cal.normalize(0) - (-1.0)).abs() < 0.001);
//! assert!((Polarity::Inverted.apply(cal.normalize(1000)) - (-1.0)).abs() < 0.001);
//! ```

use serde::Deserialize;
use tracing::{info, warn};

use super::axis::{Axis, NormalizedAxes, RawSample, NUM_AXES};

/// Largest value of an absolute joystick report axis (10-bit).
pub const JOYSTICK_AXIS_MAX: u16 = 1023;

/// Extents of one analog axis.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AxisCalibration {
    /// Reading at full deflection towards the low end.
    pub low: f32,
    /// Reading at rest.
    pub center: f32,
    /// Reading at full deflection towards the high end.
    pub high: f32,
}

impl AxisCalibration {
    /// Creates a calibration from explicit extents.
    #[must_use]
    pub const fn new(low: f32, center: f32, high: f32) -> Self {
        Self { low, center, high }
    }

    /// Returns true if `low < center < high`.
    ///
    /// Misordered extents are tolerated (the normalizer never produces a
    /// non-finite value) but the resulting motion will be wrong.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.low < self.center && self.center < self.high
    }

    /// Normalizes a raw reading against these extents, before polarity.
    ///
    /// # Examples
    ///
    /// ```
    /// use stick_nav::sticks::calibration::AxisCalibration;
    ///
    /// let cal = AxisCalibration::new(100.0, 300.0, 1100.0);
    ///
    /// // Each half is scaled independently.
    /// assert!((cal.normalize(200) - (-0.5)).abs() < 0.001);
    /// assert!((cal.normalize(700) - 0.5).abs() < 0.001);
    ///
    /// // Zero-width half range falls back to neutral.
    /// let flat = AxisCalibration::new(500.0, 500.0, 1000.0);
    /// assert_eq!(flat.normalize(400), 0.0);
    /// ```
    #[must_use]
    pub fn normalize(&self, raw: i32) -> f32 {
        let raw = raw as f32;

        let value = if raw < self.center {
            half_range(self.low, raw, self.center).map(|fraction| -(1.0 - fraction))
        } else {
            half_range(self.center, raw, self.high)
        };

        value.filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}

/// Position of `val` within `low..high` as a fraction, or `None` for an empty range.
#[inline]
fn half_range(low: f32, val: f32, high: f32) -> Option<f32> {
    let range = high - low;
    if range == 0.0 || !range.is_finite() {
        None
    } else {
        Some((val - low) / range)
    }
}

/// Direction applied to every normalized axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Keep the half-range sign: `high` end is positive.
    Normal,
    /// Flip the half-range sign: `low` end is positive.
    #[default]
    Inverted,
}

impl Polarity {
    #[must_use]
    pub fn apply(self, value: f32) -> f32 {
        match self {
            Polarity::Normal => value,
            Polarity::Inverted => -value,
        }
    }
}

/// Factory extents of the stock sticks, in sampling order.
pub const DEFAULT_EXTENTS: [AxisCalibration; NUM_AXES] = [
    AxisCalibration::new(3.0, 520.0, 1021.0),
    AxisCalibration::new(6.0, 498.0, 1019.0),
    AxisCalibration::new(3.0, 530.0, 1021.0),
    AxisCalibration::new(2.0, 513.0, 1022.0),
];

/// Calibration for all four axes plus the shared polarity.
///
/// Extents are fixed for the life of the process except for one optional
/// recentering at startup via [`CalibrationStore::recenter`].
///
/// # Examples
///
/// ```
/// use stick_nav::sticks::axis::{Axis, RawSample};
/// use stick_nav::sticks::calibration::CalibrationStore;
///
/// let mut store = CalibrationStore::default();
/// store.recenter(&RawSample([500, 500, 500, 500]));
///
/// let axes = store.normalize(&RawSample([500, 500, 500, 500]));
/// assert_eq!(axes.get(Axis::PanHorizontal), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationStore {
    axes: [AxisCalibration; NUM_AXES],
    polarity: Polarity,
}

impl Default for CalibrationStore {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENTS, Polarity::default())
    }
}

impl CalibrationStore {
    #[must_use]
    pub fn new(axes: [AxisCalibration; NUM_AXES], polarity: Polarity) -> Self {
        Self { axes, polarity }
    }

    #[must_use]
    pub fn axis(&self, axis: Axis) -> AxisCalibration {
        self.axes[axis.index()]
    }

    #[must_use]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Normalizes one axis reading, polarity included.
    #[must_use]
    pub fn normalize_axis(&self, axis: Axis, raw: i32) -> f32 {
        self.polarity.apply(self.axis(axis).normalize(raw))
    }

    /// Normalizes a full tick's sample.
    #[must_use]
    pub fn normalize(&self, raw: &RawSample) -> NormalizedAxes {
        let mut axes = NormalizedAxes::centered();
        for axis in Axis::ALL {
            axes.set(axis, self.normalize_axis(axis, raw.get(axis)));
        }
        axes
    }

    /// Replaces every axis center with the current reading.
    ///
    /// Intended to run once at startup while the sticks are at rest.
    pub fn recenter(&mut self, raw: &RawSample) {
        for axis in Axis::ALL {
            let cal = &mut self.axes[axis.index()];
            let previous = cal.center;
            cal.center = raw.get(axis) as f32;
            info!(
                "Calibrated {:?} center: {} -> {} (low {}, high {})",
                axis, previous, cal.center, cal.low, cal.high
            );
        }
        self.warn_misordered();
    }

    /// Axes whose extents are not strictly `low < center < high`.
    #[must_use]
    pub fn misordered_axes(&self) -> Vec<Axis> {
        Axis::ALL
            .into_iter()
            .filter(|axis| !self.axis(*axis).is_ordered())
            .collect()
    }

    /// Logs a warning for every misordered axis.
    pub fn warn_misordered(&self) {
        for axis in self.misordered_axes() {
            let cal = self.axis(axis);
            warn!(
                "{:?} calibration is not ordered (low {}, center {}, high {}); \
                 zero-width halves will read as centered",
                axis, cal.low, cal.center, cal.high
            );
        }
    }
}

/// Converts a normalized value (-1.0 to 1.0) to an absolute joystick axis (0-1023).
///
/// # Examples
///
/// ```
/// use stick_nav::sticks::calibration::to_joystick_axis;
///
/// assert_eq!(to_joystick_axis(-1.0), 0);
/// assert_eq!(to_joystick_axis(0.0), 511);
/// assert_eq!(to_joystick_axis(1.0), 1023);
/// assert_eq!(to_joystick_axis(3.0), 1023);
/// ```
#[must_use]
pub fn to_joystick_axis(normalized: f32) -> u16 {
    let clamped = normalized.clamp(-1.0, 1.0);
    let scaled = (clamped + 1.0) / 2.0 * f32::from(JOYSTICK_AXIS_MAX);
    (scaled as u16).min(JOYSTICK_AXIS_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cal() -> AxisCalibration {
        AxisCalibration::new(3.0, 520.0, 1021.0)
    }

    // ==================== Half-range Tests ====================

    #[test]
    fn test_center_is_zero() {
        assert_eq!(cal().normalize(520), 0.0);
    }

    #[test]
    fn test_low_is_minus_one() {
        assert!((cal().normalize(3) - (-1.0)).abs() < 0.001);
    }

    #[test]
    fn test_high_is_plus_one() {
        assert!((cal().normalize(1021) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_halves_scale_independently() {
        let cal = AxisCalibration::new(0.0, 200.0, 1000.0);
        // 100 is halfway down the short half, 600 halfway up the long one
        assert!((cal.normalize(100) - (-0.5)).abs() < 0.001);
        assert!((cal.normalize(600) - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_out_of_range_extrapolates() {
        let cal = AxisCalibration::new(100.0, 500.0, 900.0);
        assert!((cal.normalize(1300) - 2.0).abs() < 0.001);
        assert!((cal.normalize(-300) - (-2.0)).abs() < 0.001);
    }

    // ==================== Degenerate Extents ====================

    #[test]
    fn test_zero_width_low_half_is_neutral() {
        let cal = AxisCalibration::new(500.0, 500.0, 1000.0);
        assert_eq!(cal.normalize(10), 0.0);
    }

    #[test]
    fn test_zero_width_high_half_is_neutral() {
        let cal = AxisCalibration::new(0.0, 500.0, 500.0);
        assert_eq!(cal.normalize(500), 0.0);
        assert_eq!(cal.normalize(900), 0.0);
        // the other half still works
        assert!((cal.normalize(250) - (-0.5)).abs() < 0.001);
    }

    #[test]
    fn test_non_finite_extents_are_neutral() {
        let cal = AxisCalibration::new(f32::NAN, 500.0, f32::INFINITY);
        assert_eq!(cal.normalize(100), 0.0);
        assert_eq!(cal.normalize(900), 0.0);
    }

    #[test]
    fn test_is_ordered() {
        assert!(cal().is_ordered());
        assert!(!AxisCalibration::new(500.0, 500.0, 1000.0).is_ordered());
        assert!(!AxisCalibration::new(900.0, 500.0, 100.0).is_ordered());
    }

    // ==================== Polarity Tests ====================

    #[test]
    fn test_polarity_default_is_inverted() {
        assert_eq!(Polarity::default(), Polarity::Inverted);
    }

    #[test]
    fn test_polarity_apply() {
        assert_eq!(Polarity::Normal.apply(0.25), 0.25);
        assert_eq!(Polarity::Inverted.apply(0.25), -0.25);
    }

    #[test]
    fn test_store_applies_polarity() {
        let store = CalibrationStore::default();
        // full low deflection reads positive after inversion
        let value = store.normalize_axis(Axis::PanHorizontal, 3);
        assert!((value - 1.0).abs() < 0.001);

        let normal = CalibrationStore::new(DEFAULT_EXTENTS, Polarity::Normal);
        let value = normal.normalize_axis(Axis::PanHorizontal, 3);
        assert!((value - (-1.0)).abs() < 0.001);
    }

    // ==================== Store Tests ====================

    #[test]
    fn test_default_store_uses_factory_extents() {
        let store = CalibrationStore::default();
        assert_eq!(store.axis(Axis::PanVertical), AxisCalibration::new(6.0, 498.0, 1019.0));
        assert_eq!(store.axis(Axis::OrbitVertical), AxisCalibration::new(2.0, 513.0, 1022.0));
        assert!(store.misordered_axes().is_empty());
    }

    #[test]
    fn test_normalize_full_sample_centered() {
        let store = CalibrationStore::default();
        let axes = store.normalize(&RawSample([520, 498, 530, 513]));
        assert_eq!(axes, NormalizedAxes::centered());
    }

    #[test]
    fn test_recenter_sets_centers_from_sample() {
        let mut store = CalibrationStore::default();
        store.recenter(&RawSample([500, 510, 490, 505]));

        assert_eq!(store.axis(Axis::PanHorizontal).center, 500.0);
        assert_eq!(store.axis(Axis::PanVertical).center, 510.0);
        assert_eq!(store.axis(Axis::OrbitHorizontal).center, 490.0);
        assert_eq!(store.axis(Axis::OrbitVertical).center, 505.0);
        // extents are untouched
        assert_eq!(store.axis(Axis::PanHorizontal).low, 3.0);
        assert_eq!(store.axis(Axis::PanHorizontal).high, 1021.0);
    }

    #[test]
    fn test_startup_calibration_scenario() {
        let mut store = CalibrationStore::default();
        store.recenter(&RawSample([500; NUM_AXES]));

        let axes = store.normalize(&RawSample([500; NUM_AXES]));
        for axis in Axis::ALL {
            assert_eq!(axes.get(axis), 0.0);
        }
    }

    #[test]
    fn test_recenter_onto_extent_is_reported() {
        let mut store = CalibrationStore::default();
        store.recenter(&RawSample([3, 498, 530, 513]));
        assert_eq!(store.misordered_axes(), vec![Axis::PanHorizontal]);
        // still finite and neutral on the collapsed half
        assert_eq!(store.normalize_axis(Axis::PanHorizontal, 0), 0.0);
    }

    // ==================== Joystick Conversion Tests ====================

    #[test]
    fn test_to_joystick_axis_endpoints() {
        assert_eq!(to_joystick_axis(-1.0), 0);
        assert_eq!(to_joystick_axis(1.0), JOYSTICK_AXIS_MAX);
    }

    #[test]
    fn test_to_joystick_axis_clamps() {
        assert_eq!(to_joystick_axis(-4.0), 0);
        assert_eq!(to_joystick_axis(4.0), JOYSTICK_AXIS_MAX);
        assert_eq!(to_joystick_axis(f32::NAN), 0);
    }

    #[test]
    fn test_to_joystick_axis_midpoints() {
        let quarter = to_joystick_axis(-0.5);
        assert!(quarter > 250 && quarter < 260);

        let three_quarter = to_joystick_axis(0.5);
        assert!(three_quarter > 762 && three_quarter < 772);
    }

    // ==================== Properties ====================

    proptest! {
        #[test]
        fn prop_low_half_is_increasing(a in 4i32..519, b in 4i32..519) {
            prop_assume!(a < b);
            let cal = cal();
            let (na, nb) = (cal.normalize(a), cal.normalize(b));
            prop_assert!(na < nb);
            prop_assert!(na >= -1.0 && nb < 0.0);
        }

        #[test]
        fn prop_high_half_is_increasing(a in 521i32..1021, b in 521i32..1021) {
            prop_assume!(a < b);
            let cal = cal();
            let (na, nb) = (cal.normalize(a), cal.normalize(b));
            prop_assert!(na < nb);
            prop_assert!(na > 0.0 && nb <= 1.0);
        }

        #[test]
        fn prop_normalize_is_always_finite(
            low in -2000.0f32..2000.0,
            center in -2000.0f32..2000.0,
            high in -2000.0f32..2000.0,
            raw in -5000i32..5000,
        ) {
            let cal = AxisCalibration::new(low, center, high);
            prop_assert!(cal.normalize(raw).is_finite());
        }
    }
}
