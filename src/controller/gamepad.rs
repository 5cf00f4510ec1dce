//! # Gamepad Device Module
//!
//! Opens a Linux evdev gamepad node and reads its input events.
//!
//! The node is taken from configuration (`[input] device_path`); pairing
//! and discovery are left to the operating system's Bluetooth stack.

use std::path::Path;

use evdev::{Device, Key};
use tracing::{debug, info};

use crate::error::{RcCarError, Result};
use crate::feedback::{Capabilities, FeedbackDevice, Rgb, RumblePulse};

/// Open evdev gamepad.
pub struct GamepadDevice {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for GamepadDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamepadDevice")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl GamepadDevice {
    /// Opens the gamepad at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Controller` error if the node cannot be opened or does not
    /// report the buttons the drive policy needs.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let device_path = path.to_string_lossy().to_string();

        let device = Device::open(path)
            .map_err(|e| RcCarError::Controller(format!("Failed to open {}: {}", device_path, e)))?;

        let id = device.input_id();
        debug!(
            "Opened input device: {} (vendor: 0x{:04x}, product: 0x{:04x})",
            device_path,
            id.vendor(),
            id.product()
        );

        let has_triggers = device
            .supported_keys()
            .map_or(false, |keys| keys.contains(Key::BTN_TL2) && keys.contains(Key::BTN_TR2));
        if !has_triggers {
            return Err(RcCarError::Controller(format!(
                "{} is not a gamepad (no L2/R2 buttons)",
                device_path
            )));
        }

        info!(
            "Using gamepad \"{}\" at {}",
            device.name().unwrap_or("unknown"),
            device_path
        );

        Ok(Self { device, device_path })
    }

    /// Path of the opened node.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable name reported by the kernel.
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Fetches available input events. Blocks until at least one arrives.
    ///
    /// # Errors
    ///
    /// Returns `Controller` error if fetching fails (e.g. controller disconnected).
    pub fn fetch_events(&mut self) -> Result<impl Iterator<Item = evdev::InputEvent> + '_> {
        self.device
            .fetch_events()
            .map_err(|e| RcCarError::Controller(format!("Failed to fetch events: {}", e)))
    }
}

/// Feedback handle for an evdev gamepad.
///
/// The evdev input node exposes none of the seat outputs, so every output
/// is reported unsupported and seat changes are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvdevFeedback;

impl FeedbackDevice for EvdevFeedback {
    fn capabilities(&self) -> Capabilities {
        Capabilities::none()
    }

    fn play_dual_rumble(&mut self, _pulse: RumblePulse) {}

    fn set_player_leds(&mut self, _leds: u8) {}

    fn set_lightbar_color(&mut self, _color: Rgb) {}
}
