//! # USB HID Gadget Output
//!
//! Writes mouse, keyboard and joystick reports to the Linux USB gadget endpoints
//! (`/dev/hidgN`) configured through configfs. The host sees a composite device
//! and receives the emulated middle-drag and modifier presses from the arbiter.
//!
//! Each endpoint expects complete reports, so the gadget keeps the currently held
//! mouse buttons and modifiers and repeats them in every report it writes.

use async_trait::async_trait;
use tracing::{debug, info, trace};

use super::port_trait::{HidPortIO, TokioHidPort};
use super::report::{
    encode_joystick_report, encode_keyboard_report, encode_mouse_report, JoystickReport,
    ModifierKey, MouseButtons,
};
use super::sink::OutputSink;
use crate::config::HidConfig;
use crate::error::{Result, StickNavError};

/// Composite HID gadget: mouse, keyboard and optional joystick endpoint.
pub struct HidGadget<P: HidPortIO = TokioHidPort> {
    mouse: P,
    keyboard: P,
    joystick: Option<P>,
    buttons: MouseButtons,
    modifiers: u8,
}

impl<P: HidPortIO> std::fmt::Debug for HidGadget<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidGadget")
            .field("buttons", &self.buttons)
            .field("modifiers", &self.modifiers)
            .field("joystick", &self.joystick.is_some())
            .finish_non_exhaustive()
    }
}

impl HidGadget<TokioHidPort> {
    /// Open the gadget endpoints named in `config`.
    ///
    /// The joystick endpoint is only opened when `joystick_reports` is enabled.
    ///
    /// # Errors
    ///
    /// Returns `Hid` if any endpoint cannot be opened for writing.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use stick_nav::config::HidConfig;
    /// use stick_nav::hid::gadget::HidGadget;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let gadget = HidGadget::open(&HidConfig::default()).await?;
    ///     println!("{:?}", gadget);
    ///     Ok(())
    /// }
    /// ```
    pub async fn open(config: &HidConfig) -> Result<Self> {
        let mouse = open_endpoint(&config.mouse_device).await?;
        let keyboard = open_endpoint(&config.keyboard_device).await?;
        let joystick = if config.joystick_reports {
            Some(open_endpoint(&config.joystick_device).await?)
        } else {
            None
        };

        info!(
            "HID gadget ready (mouse {}, keyboard {}, joystick {})",
            config.mouse_device,
            config.keyboard_device,
            if config.joystick_reports {
                config.joystick_device.as_str()
            } else {
                "disabled"
            }
        );

        Ok(Self::with_ports(mouse, keyboard, joystick))
    }
}

async fn open_endpoint(path: &str) -> Result<TokioHidPort> {
    debug!("Opening HID endpoint: {}", path);
    TokioHidPort::open(path)
        .await
        .map_err(|e| StickNavError::Hid(format!("Failed to open {}: {}", path, e)))
}

impl<P: HidPortIO> HidGadget<P> {
    /// Build a gadget over already-open endpoints.
    pub fn with_ports(mouse: P, keyboard: P, joystick: Option<P>) -> Self {
        Self {
            mouse,
            keyboard,
            joystick,
            buttons: MouseButtons::NONE,
            modifiers: 0,
        }
    }

    /// Mouse buttons the host currently sees as held.
    pub fn buttons(&self) -> MouseButtons {
        self.buttons
    }

    /// Modifier bits the host currently sees as held.
    pub fn modifiers(&self) -> u8 {
        self.modifiers
    }
}

async fn write_report<P: HidPortIO>(port: &mut P, report: &[u8], endpoint: &str) -> Result<()> {
    port.write_all(report)
        .await
        .map_err(|e| StickNavError::Hid(format!("Failed to write {} report: {}", endpoint, e)))?;
    port.flush()
        .await
        .map_err(|e| StickNavError::Hid(format!("Failed to flush {} endpoint: {}", endpoint, e)))?;

    trace!("Sent {} report ({} bytes)", endpoint, report.len());
    Ok(())
}

#[async_trait]
impl<P: HidPortIO> OutputSink for HidGadget<P> {
    async fn move_pointer(&mut self, dx: i16, dy: i16) -> Result<()> {
        let report = encode_mouse_report(self.buttons, dx, dy);
        write_report(&mut self.mouse, &report, "mouse").await
    }

    async fn set_pointer_buttons(&mut self, buttons: MouseButtons) -> Result<()> {
        let report = encode_mouse_report(buttons, 0, 0);
        write_report(&mut self.mouse, &report, "mouse").await?;
        self.buttons = buttons;
        Ok(())
    }

    async fn press_key(&mut self, key: ModifierKey) -> Result<()> {
        let modifiers = self.modifiers | key.bit();
        write_report(&mut self.keyboard, &encode_keyboard_report(modifiers), "keyboard").await?;
        self.modifiers = modifiers;
        Ok(())
    }

    async fn release_key(&mut self, key: ModifierKey) -> Result<()> {
        let modifiers = self.modifiers & !key.bit();
        write_report(&mut self.keyboard, &encode_keyboard_report(modifiers), "keyboard").await?;
        self.modifiers = modifiers;
        Ok(())
    }

    async fn send_joystick(&mut self, report: &JoystickReport) -> Result<()> {
        let port = self
            .joystick
            .as_mut()
            .ok_or_else(|| StickNavError::Hid("joystick endpoint not open".to_string()))?;
        write_report(port, &encode_joystick_report(report), "joystick").await
    }
}
