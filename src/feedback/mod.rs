//! # Feedback Module
//!
//! Player seat assignment and the rumble / LED feedback that announces it.
//!
//! A controller starts in seat A when it becomes ready. Each press of the
//! system button toggles between seat A and seat B. Every assignment,
//! including the first, plays a short dual rumble, updates the player LEDs
//! and recolors the lightbar, on whichever of those the controller supports.
//!
//! ## Lightbar Color
//!
//! The lightbar color comes from the low three bits of the seat value:
//!
//! | Bit | Channel |
//! |-----|---------|
//! | 0 | red |
//! | 1 | green |
//! | 2 | blue |
//!
//! ```
//! use rc_car_bridge::feedback::{Rgb, Seat};
//!
//! assert_eq!(Rgb::from_seat_bits(Seat::A.bits()), Rgb { red: 0xff, green: 0, blue: 0 });
//! assert_eq!(Rgb::from_seat_bits(Seat::B.bits()), Rgb { red: 0, green: 0xff, blue: 0 });
//! ```

use serde::Serialize;
use tracing::{debug, info};

/// Player seat of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Seat {
    #[default]
    A,
    B,
}

impl Seat {
    /// Seat value as a player-slot bit (A = 0b001, B = 0b010).
    #[must_use]
    pub fn bits(&self) -> u8 {
        match self {
            Seat::A => 0b001,
            Seat::B => 0b010,
        }
    }

    /// The other seat.
    #[must_use]
    pub fn toggled(&self) -> Seat {
        match self {
            Seat::A => Seat::B,
            Seat::B => Seat::A,
        }
    }
}

/// Lightbar color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    /// Full-intensity channels selected by bits 0..=2 of `bits`.
    #[must_use]
    pub fn from_seat_bits(bits: u8) -> Self {
        let channel = |mask: u8| if bits & mask != 0 { 0xff } else { 0 };
        Self {
            red: channel(0x01),
            green: channel(0x02),
            blue: channel(0x04),
        }
    }
}

/// Parameters of a dual-motor rumble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RumblePulse {
    /// Delay before the rumble starts.
    pub delay_ms: u16,
    /// Rumble length.
    pub duration_ms: u16,
    /// Weak (high frequency) motor magnitude.
    pub weak_magnitude: u8,
    /// Strong (low frequency) motor magnitude.
    pub strong_magnitude: u8,
}

impl Default for RumblePulse {
    fn default() -> Self {
        Self {
            delay_ms: 0,
            duration_ms: 150,
            weak_magnitude: 128,
            strong_magnitude: 40,
        }
    }
}

/// Feedback outputs a controller supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub rumble: bool,
    pub player_leds: bool,
    pub lightbar: bool,
}

impl Capabilities {
    /// Every output supported.
    #[must_use]
    pub fn all() -> Self {
        Self {
            rumble: true,
            player_leds: true,
            lightbar: true,
        }
    }

    /// No output supported.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// Feedback outputs of a connected controller.
///
/// Callers check [`FeedbackDevice::capabilities`] before each output call.
#[cfg_attr(test, mockall::automock)]
pub trait FeedbackDevice {
    /// Outputs this controller supports.
    fn capabilities(&self) -> Capabilities;

    /// Plays a dual rumble.
    fn play_dual_rumble(&mut self, pulse: RumblePulse);

    /// Lights the player LEDs for the given seat bits.
    fn set_player_leds(&mut self, leds: u8);

    /// Sets the lightbar color.
    fn set_lightbar_color(&mut self, color: Rgb);
}

/// Per-controller state owned by the host session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerInstance {
    seat: Seat,
}

impl ControllerInstance {
    /// Assigns seat A to a controller that just became ready and announces it.
    pub fn ready<F: FeedbackDevice + ?Sized>(rumble: &RumblePulse, device: &mut F) -> Self {
        let instance = Self { seat: Seat::A };
        info!("controller ready, seat {:?}", instance.seat);
        announce_seat(instance.seat, rumble, device);
        instance
    }

    #[must_use]
    pub fn seat(&self) -> Seat {
        self.seat
    }

    /// Handles a system button press: toggles the seat and announces it.
    pub fn toggle_seat<F: FeedbackDevice + ?Sized>(&mut self, rumble: &RumblePulse, device: &mut F) -> Seat {
        self.seat = self.seat.toggled();
        info!("seat changed to {:?}", self.seat);
        announce_seat(self.seat, rumble, device);
        self.seat
    }
}

/// Plays the seat feedback on every output the device supports.
pub fn announce_seat<F: FeedbackDevice + ?Sized>(seat: Seat, rumble: &RumblePulse, device: &mut F) {
    let caps = device.capabilities();

    if caps.rumble {
        device.play_dual_rumble(*rumble);
    } else {
        debug!("rumble not supported, skipping");
    }

    if caps.player_leds {
        device.set_player_leds(seat.bits());
    } else {
        debug!("player LEDs not supported, skipping");
    }

    if caps.lightbar {
        device.set_lightbar_color(Rgb::from_seat_bits(seat.bits()));
    } else {
        debug!("lightbar not supported, skipping");
    }
}
