//! # Unwind Engine
//!
//! Relative pointer moves drift the host cursor away from where a gesture began.
//! The accumulator records the net displacement of the current gesture; when the
//! gesture ends, the unwind steps replay that displacement in reverse so the cursor
//! lands exactly where it started.
//!
//! A single HID mouse report can only move the pointer a bounded distance, so the
//! reverse displacement is split into steps of at most `max_step` per axis:
//!
//! ```text
//! step = -sign(remaining) * min(|remaining|, max_step)     (per axis)
//! ```
//!
//! Each step is clamped to the remaining distance, so the sequence never
//! overshoots and always ends at exactly (0, 0) after
//! `ceil(max(|x|, |y|) / max_step)` steps.
//!
//! ```
//! use stick_nav::motion::unwind::unwind_steps;
//!
//! let steps: Vec<_> = unwind_steps(253, -7, 100).collect();
//! assert_eq!(steps, vec![(-100, 7), (-100, 0), (-53, 0)]);
//! ```

/// Net pointer displacement since the current gesture started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnwindAccumulator {
    x: i32,
    y: i32,
}

impl UnwindAccumulator {
    #[must_use]
    pub const fn new() -> Self {
        Self { x: 0, y: 0 }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Records a pointer move that was sent to the host.
    pub fn add(&mut self, dx: i32, dy: i32) {
        self.x = self.x.saturating_add(dx);
        self.y = self.y.saturating_add(dy);
    }

    #[must_use]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> i32 {
        self.y
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Steps that cancel the current displacement.
    #[must_use]
    pub fn steps(&self, max_step: i32) -> UnwindSteps {
        unwind_steps(self.x, self.y, max_step)
    }
}

/// Largest move towards zero allowed for one axis in one report.
///
/// Returns 0 when nothing remains. `max_step` below 1 is treated as 1.
///
/// # Examples
///
/// ```
/// use stick_nav::motion::unwind::unwind_step;
///
/// assert_eq!(unwind_step(250, 100), -100);
/// assert_eq!(unwind_step(-7, 100), 7);
/// assert_eq!(unwind_step(0, 100), 0);
/// ```
#[must_use]
pub fn unwind_step(remaining: i32, max_step: i32) -> i32 {
    let max_step = max_step.max(1);
    let magnitude = i64::from(remaining).abs().min(i64::from(max_step)) as i32;
    let step = -remaining.signum() * magnitude;

    debug_assert!(i64::from(step).abs() <= i64::from(remaining).abs());
    debug_assert!(remaining == 0 || step.signum() == -remaining.signum());

    step
}

/// Number of steps [`unwind_steps`] will yield for a displacement.
#[must_use]
pub fn unwind_step_count(x: i32, y: i32, max_step: i32) -> usize {
    let max_step = u64::from(max_step.max(1).unsigned_abs());
    let largest = u64::from(x.unsigned_abs().max(y.unsigned_abs()));
    largest.div_ceil(max_step) as usize
}

/// Iterator over bounded moves that cancel a displacement of `(x, y)`.
#[must_use]
pub fn unwind_steps(x: i32, y: i32, max_step: i32) -> UnwindSteps {
    UnwindSteps {
        remaining_x: x,
        remaining_y: y,
        max_step: max_step.max(1),
    }
}

/// See [`unwind_steps`].
#[derive(Debug, Clone)]
pub struct UnwindSteps {
    remaining_x: i32,
    remaining_y: i32,
    max_step: i32,
}

impl Iterator for UnwindSteps {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining_x == 0 && self.remaining_y == 0 {
            return None;
        }

        let step_x = unwind_step(self.remaining_x, self.max_step);
        let step_y = unwind_step(self.remaining_y, self.max_step);
        self.remaining_x += step_x;
        self.remaining_y += step_y;

        Some((step_x, step_y))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = unwind_step_count(self.remaining_x, self.remaining_y, self.max_step);
        (count, Some(count))
    }
}

impl ExactSizeIterator for UnwindSteps {}
