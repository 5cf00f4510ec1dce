//! # Controller Snapshot
//!
//! One gamepad report as delivered by the host runtime.
//!
//! ## Value Ranges
//!
//! | Field | Range | Notes |
//! |-------|-------|-------|
//! | `axis_x` | -512..=512 | Left stick X, negative = left |
//! | `throttle` | 0..=1020 | Right trigger analog |
//! | `brake` | 0..=1020 | Left trigger analog |
//!
//! ## Button Bits
//!
//! | Button | Bit | Function |
//! |--------|-----|----------|
//! | A | 0 | Handbrake |
//! | B | 1 | Unused |
//! | X | 2 | Unused |
//! | Y | 3 | Unused |
//! | Shoulder L | 4 | Unused |
//! | Shoulder R | 5 | Unused |
//! | Trigger L | 6 | Reverse |
//! | Trigger R | 7 | Forward |
//! | System | 16 | Seat toggle (delivered out of band) |

use std::ops::{BitOr, BitOrAssign};

use serde::Serialize;

/// Maximum stick magnitude reported by the host.
pub const AXIS_MAX: i32 = 512;

/// Maximum trigger value reported by the host.
pub const TRIGGER_MAX: u32 = 1020;

/// Digital button bitmask.
///
/// # Examples
///
/// ```
/// use rc_car_bridge::controller::snapshot::Buttons;
///
/// let held = Buttons::TRIGGER_R | Buttons::A;
/// assert!(held.contains(Buttons::A));
/// assert!(!held.contains(Buttons::TRIGGER_L));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub struct Buttons(u32);

impl Buttons {
    /// No buttons held.
    pub const NONE: Buttons = Buttons(0);
    /// A / Cross, used as handbrake.
    pub const A: Buttons = Buttons(1 << 0);
    /// B / Circle.
    pub const B: Buttons = Buttons(1 << 1);
    /// X / Square.
    pub const X: Buttons = Buttons(1 << 2);
    /// Y / Triangle.
    pub const Y: Buttons = Buttons(1 << 3);
    /// Left shoulder (L1).
    pub const SHOULDER_L: Buttons = Buttons(1 << 4);
    /// Right shoulder (R1).
    pub const SHOULDER_R: Buttons = Buttons(1 << 5);
    /// Left trigger digital (L2), reverse.
    pub const TRIGGER_L: Buttons = Buttons(1 << 6);
    /// Right trigger digital (R2), forward.
    pub const TRIGGER_R: Buttons = Buttons(1 << 7);
    /// System / Home / PS button.
    pub const SYSTEM: Buttons = Buttons(1 << 16);

    /// Handbrake alias.
    pub const HANDBRAKE: Buttons = Buttons::A;

    /// Raw bits.
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// True if every bit of `other` is set.
    #[must_use]
    pub const fn contains(&self, other: Buttons) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets or clears the bits of `other`.
    pub fn set(&mut self, other: Buttons, pressed: bool) {
        if pressed {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl BitOr for Buttons {
    type Output = Buttons;

    fn bitor(self, rhs: Buttons) -> Buttons {
        Buttons(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    fn bitor_assign(&mut self, rhs: Buttons) {
        self.0 |= rhs.0;
    }
}

/// Kind of controller that produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerClass {
    #[default]
    Gamepad,
    Mouse,
    Keyboard,
    BalanceBoard,
}

/// Immutable gamepad state for one report.
///
/// # Examples
///
/// ```
/// use rc_car_bridge::controller::snapshot::{Buttons, ControllerSnapshot};
///
/// let snap = ControllerSnapshot::gamepad()
///     .with_throttle(510)
///     .with_buttons(Buttons::TRIGGER_R);
/// assert!(snap.is_pressed(Buttons::TRIGGER_R));
/// assert_eq!(snap.axis_x, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ControllerSnapshot {
    /// Controller class tag.
    pub class: ControllerClass,
    /// Steering axis, -512 (full left) to 512 (full right).
    pub axis_x: i32,
    /// Right trigger analog value.
    pub throttle: u32,
    /// Left trigger analog value.
    pub brake: u32,
    /// Held digital buttons.
    pub buttons: Buttons,
}

impl ControllerSnapshot {
    /// Neutral gamepad snapshot: stick centered, nothing held.
    #[must_use]
    pub fn gamepad() -> Self {
        Self::default()
    }

    /// Same snapshot with a different class.
    #[must_use]
    pub fn with_class(mut self, class: ControllerClass) -> Self {
        self.class = class;
        self
    }

    /// Same snapshot with a different steering axis.
    #[must_use]
    pub fn with_axis_x(mut self, axis_x: i32) -> Self {
        self.axis_x = axis_x;
        self
    }

    /// Same snapshot with a different throttle.
    #[must_use]
    pub fn with_throttle(mut self, throttle: u32) -> Self {
        self.throttle = throttle;
        self
    }

    /// Same snapshot with a different brake.
    #[must_use]
    pub fn with_brake(mut self, brake: u32) -> Self {
        self.brake = brake;
        self
    }

    /// Same snapshot with a different button mask.
    #[must_use]
    pub fn with_buttons(mut self, buttons: Buttons) -> Self {
        self.buttons = buttons;
        self
    }

    /// True if `button` is held.
    #[must_use]
    pub fn is_pressed(&self, button: Buttons) -> bool {
        self.buttons.contains(button)
    }
}
