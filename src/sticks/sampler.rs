//! Input side of the pipeline: raw axis readings and raw button levels.

use super::axis::{Axis, RawSample, NUM_BUTTONS};
use crate::error::Result;

/// Source of raw stick and button readings.
///
/// [`refresh`](StickSampler::refresh) is called once per tick; the accessors then
/// return values from that refresh.
#[cfg_attr(test, mockall::automock)]
pub trait StickSampler {
    /// Reads the current hardware state.
    fn refresh(&mut self) -> Result<()>;

    /// Raw reading of one axis.
    fn sample_axis(&self, axis: Axis) -> i32;

    /// Raw (not debounced) level of a stick-press button. `true` is pressed.
    fn button_level(&self, index: usize) -> bool;
}

/// Collects all axis readings from the last refresh.
pub fn read_sticks<S: StickSampler + ?Sized>(sampler: &S) -> RawSample {
    RawSample(Axis::ALL.map(|axis| sampler.sample_axis(axis)))
}

/// Collects all button levels from the last refresh.
pub fn read_buttons<S: StickSampler + ?Sized>(sampler: &S) -> [bool; NUM_BUTTONS] {
    std::array::from_fn(|i| sampler.button_level(i))
}
