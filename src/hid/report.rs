//! # HID Report Types and Encoders
//!
//! Report layouts written to the USB HID gadget endpoints.
//!
//! ## Mouse (4 bytes)
//!
//! ```text
//! Byte 0: buttons (bit 0 left, bit 1 right, bit 2 middle)
//! Byte 1: relative X (i8, -127..=127)
//! Byte 2: relative Y (i8, -127..=127)
//! Byte 3: wheel (always 0)
//! ```
//!
//! ## Keyboard (8 bytes, boot protocol)
//!
//! ```text
//! Byte 0: modifier bits
//! Byte 1: reserved
//! Byte 2-7: key usage codes (unused, always 0)
//! ```
//!
//! ## Joystick (9 bytes)
//!
//! ```text
//! Byte 0-1: X      (pan horizontal,   u16 LE, 0..=1023)
//! Byte 2-3: Y      (pan vertical,     u16 LE, 0..=1023)
//! Byte 4-5: Rz     (orbit horizontal, u16 LE, 0..=1023)
//! Byte 6-7: Slider (orbit vertical,   u16 LE, 0..=1023)
//! Byte 8:   buttons (bit 0 pan stick press, bit 1 orbit stick press)
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use serde::Deserialize;

use crate::sticks::axis::{Axis, NormalizedAxes, NUM_AXES, NUM_BUTTONS};
use crate::sticks::calibration::{to_joystick_axis, JOYSTICK_AXIS_MAX};

/// Largest relative move one mouse report can carry per axis.
pub const POINTER_REPORT_LIMIT: i16 = 127;

/// Mouse report size in bytes.
pub const MOUSE_REPORT_SIZE: usize = 4;

/// Keyboard report size in bytes.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Joystick report size in bytes.
pub const JOYSTICK_REPORT_SIZE: usize = NUM_AXES * 2 + 1;

/// A single emulated mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            MouseButton::Left => 0x01,
            MouseButton::Right => 0x02,
            MouseButton::Middle => 0x04,
        }
    }
}

/// Set of held mouse buttons.
///
/// # Examples
///
/// ```
/// use stick_nav::hid::report::{MouseButton, MouseButtons};
///
/// let buttons: MouseButtons = [MouseButton::Middle].into_iter().collect();
/// assert!(buttons.contains(MouseButton::Middle));
/// assert_eq!(buttons.bits(), 0x04);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseButtons(u8);

impl MouseButtons {
    /// No buttons held.
    pub const NONE: MouseButtons = MouseButtons(0);

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, button: MouseButton) -> bool {
        self.0 & button.bit() != 0
    }

    #[must_use]
    pub const fn with(self, button: MouseButton) -> Self {
        Self(self.0 | button.bit())
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<MouseButton> for MouseButtons {
    fn from_iter<I: IntoIterator<Item = MouseButton>>(iter: I) -> Self {
        iter.into_iter().fold(MouseButtons::NONE, MouseButtons::with)
    }
}

/// Keyboard modifier held while a stick drives motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKey {
    LeftCtrl,
    LeftShift,
    LeftAlt,
    LeftGui,
    RightCtrl,
    RightShift,
    RightAlt,
    RightGui,
}

impl ModifierKey {
    /// Bit of this modifier in the keyboard report's first byte.
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            ModifierKey::LeftCtrl => 0x01,
            ModifierKey::LeftShift => 0x02,
            ModifierKey::LeftAlt => 0x04,
            ModifierKey::LeftGui => 0x08,
            ModifierKey::RightCtrl => 0x10,
            ModifierKey::RightShift => 0x20,
            ModifierKey::RightAlt => 0x40,
            ModifierKey::RightGui => 0x80,
        }
    }
}

/// Absolute joystick state sent alongside pointer emulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoystickReport {
    /// Axis values (0-1023) in report order: X, Y, Rz, Slider.
    pub axes: [u16; NUM_AXES],
    /// Stick-press buttons, bit per button.
    pub buttons: u8,
}

impl JoystickReport {
    /// Builds a report from normalized axes and debounced button states.
    ///
    /// # Examples
    ///
    /// ```
    /// use stick_nav::hid::report::JoystickReport;
    /// use stick_nav::sticks::axis::NormalizedAxes;
    ///
    /// let report = JoystickReport::from_axes(
    ///     &NormalizedAxes::new([-1.0, 1.0, 0.0, 0.0]),
    ///     [false, true],
    /// );
    /// assert_eq!(report.axes[0], 0);
    /// assert_eq!(report.axes[1], 1023);
    /// assert_eq!(report.buttons, 0b10);
    /// ```
    #[must_use]
    pub fn from_axes(axes: &NormalizedAxes, buttons: [bool; NUM_BUTTONS]) -> Self {
        let axes = [
            to_joystick_axis(axes.get(Axis::PanHorizontal)),
            to_joystick_axis(axes.get(Axis::PanVertical)),
            to_joystick_axis(axes.get(Axis::OrbitHorizontal)),
            to_joystick_axis(axes.get(Axis::OrbitVertical)),
        ];
        let buttons = buttons
            .iter()
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .fold(0u8, |bits, (i, _)| bits | (1 << i));

        Self { axes, buttons }
    }
}

/// Clamps a relative move to the mouse report range.
#[inline]
#[must_use]
pub fn clamp_pointer(value: i32) -> i16 {
    let limit = i32::from(POINTER_REPORT_LIMIT);
    value.clamp(-limit, limit) as i16
}

/// Encode a mouse report.
///
/// Motion outside ±127 is clamped.
///
/// # Examples
///
/// ```
/// use stick_nav::hid::report::{encode_mouse_report, MouseButtons};
///
/// let report = encode_mouse_report(MouseButtons::NONE, -12, 300);
/// assert_eq!(&report[..], &[0x00, (-12i8) as u8, 127, 0x00]);
/// ```
#[must_use]
pub fn encode_mouse_report(buttons: MouseButtons, dx: i16, dy: i16) -> Bytes {
    let mut report = BytesMut::with_capacity(MOUSE_REPORT_SIZE);
    report.put_u8(buttons.bits());
    report.put_i8(clamp_pointer(i32::from(dx)) as i8);
    report.put_i8(clamp_pointer(i32::from(dy)) as i8);
    report.put_i8(0);
    report.freeze()
}

/// Encode a boot keyboard report carrying only modifier bits.
#[must_use]
pub fn encode_keyboard_report(modifiers: u8) -> Bytes {
    let mut report = BytesMut::with_capacity(KEYBOARD_REPORT_SIZE);
    report.put_u8(modifiers);
    report.put_bytes(0, KEYBOARD_REPORT_SIZE - 1);
    report.freeze()
}

/// Encode a joystick report.
#[must_use]
pub fn encode_joystick_report(report: &JoystickReport) -> Bytes {
    let mut encoded = BytesMut::with_capacity(JOYSTICK_REPORT_SIZE);
    for &axis in &report.axes {
        encoded.put_u16_le(axis.min(JOYSTICK_AXIS_MAX));
    }
    encoded.put_u8(report.buttons);
    encoded.freeze()
}
