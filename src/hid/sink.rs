//! Output side of the motion core: everything the arbiter is allowed to do to the host.

use async_trait::async_trait;

use super::report::{JoystickReport, ModifierKey, MouseButtons};
use crate::error::Result;

/// Commands the motion core sends to the host.
///
/// Pointer moves are relative and expected to be within ±127 per axis; larger
/// values are clamped by implementations.
#[async_trait]
pub trait OutputSink: Send {
    /// Move the pointer by a relative amount.
    async fn move_pointer(&mut self, dx: i16, dy: i16) -> Result<()>;

    /// Replace the set of held mouse buttons.
    async fn set_pointer_buttons(&mut self, buttons: MouseButtons) -> Result<()>;

    /// Press and hold a modifier key.
    async fn press_key(&mut self, key: ModifierKey) -> Result<()>;

    /// Release a held modifier key.
    async fn release_key(&mut self, key: ModifierKey) -> Result<()>;

    /// Send an absolute joystick report.
    async fn send_joystick(&mut self, report: &JoystickReport) -> Result<()>;
}
