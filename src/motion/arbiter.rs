//! # Motion Arbiter
//!
//! The state machine that turns normalized stick deflection into pointer gestures.
//!
//! ## States
//!
//! ```text
//!            pan or orbit leaves deadzone (pan wins ties)
//!   Idle ───────────────────────────────────────────────▶ Active(stick)
//!    ▲                                                      │  │
//!    │        driving stick back in deadzone:               │  │ driving stick still
//!    └───────── release buttons/key, settle, unwind ◀───────┘  │ deflected: move
//!                                                              ▼
//!                                                         Active(stick)
//! ```
//!
//! While a stick drives a gesture the other stick is not looked at, so the two
//! sticks can never fight over the pointer.
//!
//! ## Settle Delays
//!
//! Hosts process keyboard and mouse reports on separate paths. Without a pause
//! between pressing the modifier, pressing the buttons, and moving, applications
//! can see the motion before the buttons and treat it as a plain cursor move. The
//! same applies in reverse: the button release must be seen before the unwind,
//! otherwise the unwind drags the view back and undoes the gesture.
//! [`KEY_SETTLE_DELAY`] and [`BUTTON_SETTLE_DELAY`] are the defaults; both can be
//! configured.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, trace, warn};

use super::deadzone::{DeadzoneGate, DEFAULT_DEADZONE};
use super::unwind::UnwindAccumulator;
use crate::config::{Config, StickConfig};
use crate::error::Result;
use crate::hid::report::{clamp_pointer, ModifierKey, MouseButton, MouseButtons, POINTER_REPORT_LIMIT};
use crate::hid::sink::OutputSink;
use crate::sticks::axis::{NormalizedAxes, Stick};

/// Pause after pressing a stick's modifier key, before pressing its buttons.
pub const KEY_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Pause after changing mouse buttons, before the next pointer motion.
pub const BUTTON_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Default largest per-axis move of a single unwind report.
pub const DEFAULT_MAX_UNWIND_STEP: i32 = 100;

/// What a stick does while it drives a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StickBinding {
    /// Pointer units per tick at full deflection. Negative inverts motion.
    pub speed: i32,
    /// Mouse buttons held for the gesture.
    pub buttons: MouseButtons,
    /// Modifier key held for the gesture.
    pub key: Option<ModifierKey>,
}

impl StickBinding {
    #[must_use]
    pub const fn new(speed: i32, buttons: MouseButtons, key: Option<ModifierKey>) -> Self {
        Self { speed, buttons, key }
    }
}

impl From<&StickConfig> for StickBinding {
    fn from(config: &StickConfig) -> Self {
        Self::new(
            config.speed,
            config.buttons.iter().copied().collect(),
            config.key,
        )
    }
}

/// Static settings of the arbiter.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSettings {
    pub pan: StickBinding,
    pub orbit: StickBinding,
    pub deadzone: f32,
    pub max_unwind_step: i32,
    pub key_settle: Duration,
    pub button_settle: Duration,
}

impl Default for MotionSettings {
    /// Middle-drag pans; shift + middle-drag orbits.
    fn default() -> Self {
        let middle = MouseButtons::NONE.with(MouseButton::Middle);
        Self {
            pan: StickBinding::new(-25, middle, None),
            orbit: StickBinding::new(-10, middle, Some(ModifierKey::LeftShift)),
            deadzone: DEFAULT_DEADZONE,
            max_unwind_step: DEFAULT_MAX_UNWIND_STEP,
            key_settle: KEY_SETTLE_DELAY,
            button_settle: BUTTON_SETTLE_DELAY,
        }
    }
}

impl From<&Config> for MotionSettings {
    fn from(config: &Config) -> Self {
        Self {
            pan: StickBinding::from(&config.sticks.pan),
            orbit: StickBinding::from(&config.sticks.orbit),
            deadzone: config.motion.deadzone,
            max_unwind_step: config.motion.max_unwind_step,
            key_settle: Duration::from_millis(config.motion.key_settle_ms),
            button_settle: Duration::from_millis(config.motion.button_settle_ms),
        }
    }
}

impl MotionSettings {
    #[must_use]
    pub fn binding(&self, stick: Stick) -> &StickBinding {
        match stick {
            Stick::Pan => &self.pan,
            Stick::Orbit => &self.orbit,
        }
    }
}

/// Which stick, if any, currently drives the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Idle,
    Active(Stick),
}

impl std::fmt::Display for MotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MotionState::Idle => f.write_str("idle"),
            MotionState::Active(stick) => write!(f, "{}", stick),
        }
    }
}

/// What one call to [`MotionArbiter::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Both sticks quiet, nothing sent.
    Idle,
    /// A gesture began and its first move was sent.
    Started { stick: Stick, dx: i16, dy: i16 },
    /// An ongoing gesture moved the pointer.
    Moved { stick: Stick, dx: i16, dy: i16 },
    /// A gesture ended and the pointer was returned to its start.
    Stopped { stick: Stick, unwind_steps: usize },
}

/// Owns the motion state and unwind accumulator.
///
/// # Thread Safety
///
/// All state is mutated through `&mut self`; drive it from a single task.
#[derive(Debug)]
pub struct MotionArbiter {
    settings: MotionSettings,
    gate: DeadzoneGate,
    state: MotionState,
    accumulator: UnwindAccumulator,
}

impl MotionArbiter {
    #[must_use]
    pub fn new(settings: MotionSettings) -> Self {
        let gate = DeadzoneGate::new(settings.deadzone);
        Self {
            settings,
            gate,
            state: MotionState::Idle,
            accumulator: UnwindAccumulator::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> MotionState {
        self.state
    }

    #[must_use]
    pub fn accumulator(&self) -> UnwindAccumulator {
        self.accumulator
    }

    /// Advances the state machine by one tick.
    ///
    /// # Errors
    ///
    /// Returns the first sink error. State is left so that the next tick resumes
    /// the interrupted transition. A failed start releases whatever it pressed and
    /// stays `Idle`, so the next deflected tick starts over. A failed stop stays
    /// `Active` and the unwind continues from whatever displacement is still
    /// outstanding.
    pub async fn tick<S>(&mut self, axes: &NormalizedAxes, sink: &mut S) -> Result<TickOutcome>
    where
        S: OutputSink + ?Sized,
    {
        match self.state {
            MotionState::Active(stick) => {
                if self.gate.is_active(axes.pair(stick)) {
                    let (dx, dy) = self.emit_motion(stick, axes, sink).await?;
                    Ok(TickOutcome::Moved { stick, dx, dy })
                } else {
                    let unwind_steps = self.stop(stick, sink).await?;
                    Ok(TickOutcome::Stopped { stick, unwind_steps })
                }
            }
            MotionState::Idle => {
                let Some(stick) = Stick::PRIORITY
                    .into_iter()
                    .find(|stick| self.gate.is_active(axes.pair(*stick)))
                else {
                    return Ok(TickOutcome::Idle);
                };

                self.start(stick, sink).await?;
                let (dx, dy) = self.emit_motion(stick, axes, sink).await?;
                Ok(TickOutcome::Started { stick, dx, dy })
            }
        }
    }

    async fn start<S>(&mut self, stick: Stick, sink: &mut S) -> Result<()>
    where
        S: OutputSink + ?Sized,
    {
        let binding = *self.settings.binding(stick);
        debug!("Starting {} motion", stick);

        self.accumulator.reset();

        if let Err(e) = self.engage(&binding, sink).await {
            warn!("Failed to start {} motion: {}", stick, e);
            // Stay idle so the next deflected tick retries the whole start.
            let _ = sink.set_pointer_buttons(MouseButtons::NONE).await;
            if let Some(key) = binding.key {
                let _ = sink.release_key(key).await;
            }
            return Err(e);
        }

        self.state = MotionState::Active(stick);
        Ok(())
    }

    /// Presses the binding's key and buttons with their settle delays.
    async fn engage<S>(&self, binding: &StickBinding, sink: &mut S) -> Result<()>
    where
        S: OutputSink + ?Sized,
    {
        if let Some(key) = binding.key {
            sink.press_key(key).await?;
        }
        sleep(self.settings.key_settle).await;

        sink.set_pointer_buttons(binding.buttons).await?;
        sleep(self.settings.button_settle).await;

        Ok(())
    }

    async fn stop<S>(&mut self, stick: Stick, sink: &mut S) -> Result<usize>
    where
        S: OutputSink + ?Sized,
    {
        let binding = *self.settings.binding(stick);

        sink.set_pointer_buttons(MouseButtons::NONE).await?;
        if let Some(key) = binding.key {
            sink.release_key(key).await?;
        }
        sleep(self.settings.button_settle).await;

        let unwind_steps = self.unwind(sink).await?;
        self.state = MotionState::Idle;

        debug!("Stopped {} motion, unwound in {} steps", stick, unwind_steps);
        Ok(unwind_steps)
    }

    /// Sends the moves that return the pointer to where the gesture started.
    async fn unwind<S>(&mut self, sink: &mut S) -> Result<usize>
    where
        S: OutputSink + ?Sized,
    {
        let max_step = self
            .settings
            .max_unwind_step
            .clamp(1, i32::from(POINTER_REPORT_LIMIT));

        let mut count = 0;
        for (dx, dy) in self.accumulator.steps(max_step) {
            sink.move_pointer(dx as i16, dy as i16).await?;
            self.accumulator.add(dx, dy);
            count += 1;
        }

        debug_assert!(self.accumulator.is_zero());
        Ok(count)
    }

    async fn emit_motion<S>(
        &mut self,
        stick: Stick,
        axes: &NormalizedAxes,
        sink: &mut S,
    ) -> Result<(i16, i16)>
    where
        S: OutputSink + ?Sized,
    {
        let speed = self.settings.binding(stick).speed;
        let pair = axes.pair(stick);
        let dx = clamp_pointer(scale(speed, pair.horizontal));
        let dy = clamp_pointer(scale(speed, pair.vertical));

        sink.move_pointer(dx, dy).await?;
        self.accumulator.add(i32::from(dx), i32::from(dy));

        trace!(
            "{} move ({}, {}), accumulated ({}, {})",
            stick,
            dx,
            dy,
            self.accumulator.x(),
            self.accumulator.y()
        );
        Ok((dx, dy))
    }
}

/// Scales a normalized value by a speed, truncating toward zero.
#[inline]
fn scale(speed: i32, value: f32) -> i32 {
    (speed as f32 * value) as i32
}
