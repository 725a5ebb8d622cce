//! # Button Debouncing
//!
//! Mechanical stick-press switches chatter for a few milliseconds on every press and
//! release. A [`Debouncer`] accepts a new level only after the raw input has held it
//! for the whole debounce interval.
//!
//! ```
//! use std::time::{Duration, Instant};
//! use stick_nav::sticks::debounce::Debouncer;
//!
//! let start = Instant::now();
//! let mut button = Debouncer::new(Duration::from_millis(100), start);
//!
//! button.update(true, start);
//! assert!(!button.pressed()); // not stable yet
//!
//! button.update(true, start + Duration::from_millis(100));
//! assert!(button.pressed());
//! assert!(button.fell());
//! ```

use std::time::{Duration, Instant};

use super::axis::NUM_BUTTONS;

/// Stable-interval debouncer for one button.
#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    stable: bool,
    last_raw: bool,
    last_change: Instant,
    fell: bool,
    rose: bool,
}

impl Debouncer {
    /// Creates a debouncer that starts released.
    #[must_use]
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            stable: false,
            last_raw: false,
            last_change: now,
            fell: false,
            rose: false,
        }
    }

    /// Feeds the current raw level. Returns true if the stable state changed.
    pub fn update(&mut self, raw: bool, now: Instant) -> bool {
        self.fell = false;
        self.rose = false;

        if raw != self.last_raw {
            self.last_raw = raw;
            self.last_change = now;
        }

        let settled = now.saturating_duration_since(self.last_change) >= self.interval;
        if settled && self.last_raw != self.stable {
            self.stable = self.last_raw;
            if self.stable {
                self.fell = true;
            } else {
                self.rose = true;
            }
            return true;
        }

        false
    }

    /// Debounced state.
    #[must_use]
    pub fn pressed(&self) -> bool {
        self.stable
    }

    /// The last update turned the button on.
    #[must_use]
    pub fn fell(&self) -> bool {
        self.fell
    }

    /// The last update turned the button off.
    #[must_use]
    pub fn rose(&self) -> bool {
        self.rose
    }
}

/// Debouncers for the stick-press buttons.
#[derive(Debug, Clone)]
pub struct ButtonBank {
    buttons: [Debouncer; NUM_BUTTONS],
}

impl ButtonBank {
    #[must_use]
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            buttons: std::array::from_fn(|_| Debouncer::new(interval, now)),
        }
    }

    /// Feeds raw levels for all buttons.
    pub fn update(&mut self, levels: [bool; NUM_BUTTONS], now: Instant) {
        for (button, level) in self.buttons.iter_mut().zip(levels) {
            button.update(level, now);
        }
    }

    #[must_use]
    pub fn pressed(&self) -> [bool; NUM_BUTTONS] {
        std::array::from_fn(|i| self.buttons[i].pressed())
    }

    #[must_use]
    pub fn button(&self, index: usize) -> Option<&Debouncer> {
        self.buttons.get(index)
    }
}
