//! # Motor Module
//!
//! Brushed DC motor abstraction used by the drive and steering policies.
//!
//! This module handles:
//! - The [`MotorActuator`] trait every PWM motor driver implements
//! - [`MotorCommand`] values issued to a single motor
//! - [`Actuation`], the per-tick outcome of a control policy
//! - PWM duty range derivation from timer resolution and frequency
//!
//! ## Duty Range
//!
//! A driver running a timer at `resolution_hz` ticks per second and a PWM
//! carrier at `frequency_hz` has `resolution_hz / frequency_hz` ticks per
//! period. That tick count is the maximum duty value:
//!
//! ```
//! use rc_car_bridge::motor::{PwmConfig, DUTY_MAX};
//!
//! assert_eq!(PwmConfig::default().duty_max(), 3200);
//! assert_eq!(DUTY_MAX, 3200);
//! ```

pub mod tracing_motor;

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::error::Result;

/// Default PWM carrier frequency for both motors (25 kHz).
pub const PWM_FREQUENCY_HZ: u32 = 25_000;

/// Default PWM timer resolution (80 MHz, 1 tick = 12.5 ns).
pub const PWM_TIMER_RESOLUTION_HZ: u32 = 80_000_000;

/// Maximum duty value in ticks for the default PWM configuration.
pub const DUTY_MAX: u32 = PWM_TIMER_RESOLUTION_HZ / PWM_FREQUENCY_HZ;

/// PWM timing of one motor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmConfig {
    /// PWM carrier frequency in Hz.
    pub frequency_hz: u32,
    /// Timer tick rate in Hz.
    pub resolution_hz: u32,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            frequency_hz: PWM_FREQUENCY_HZ,
            resolution_hz: PWM_TIMER_RESOLUTION_HZ,
        }
    }
}

impl PwmConfig {
    /// Ticks per PWM period, i.e. the largest duty `set_speed` accepts.
    ///
    /// Returns 0 for a zero frequency rather than dividing by it.
    #[must_use]
    pub fn duty_max(&self) -> u32 {
        self.resolution_hz.checked_div(self.frequency_hz).unwrap_or(0)
    }
}

/// Which motor of the vehicle a command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorId {
    /// Rear drive motor.
    Drive,
    /// Front steering motor.
    Steering,
}

impl MotorId {
    /// Short name used in logs and errors.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MotorId::Drive => "drive",
            MotorId::Steering => "steering",
        }
    }
}

impl fmt::Display for MotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PWM motor driver operations.
///
/// Implementations wrap an H-bridge driver. `set_speed` takes a duty in
/// `[0, duty_max]` ticks; direction is selected separately by `forward` /
/// `reverse`. Calls are fire-and-forget and must not block beyond the PWM
/// reconfiguration latency.
#[cfg_attr(test, mockall::automock)]
pub trait MotorActuator {
    /// Drive current through the bridge in the forward direction.
    fn forward(&mut self) -> Result<()>;

    /// Drive current through the bridge in the reverse direction.
    fn reverse(&mut self) -> Result<()>;

    /// Release both bridge outputs and let the motor spin down freely.
    fn coast(&mut self) -> Result<()>;

    /// Short the motor terminals for an active stop.
    fn brake(&mut self) -> Result<()>;

    /// Set the PWM compare value in ticks.
    fn set_speed(&mut self, duty: u32) -> Result<()>;
}

/// A single command to one motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "command", content = "duty", rename_all = "snake_case")]
pub enum MotorCommand {
    /// Forward direction at `duty` ticks.
    Forward(u32),
    /// Reverse direction at `duty` ticks.
    Reverse(u32),
    /// Free-wheel.
    Coast,
    /// Active brake.
    Brake,
}

impl MotorCommand {
    /// Issues the command to a driver.
    ///
    /// Directional commands select the direction first, then set the duty.
    pub fn apply<M: MotorActuator + ?Sized>(&self, motor: &mut M) -> Result<()> {
        match *self {
            MotorCommand::Forward(duty) => {
                motor.forward()?;
                motor.set_speed(duty)
            }
            MotorCommand::Reverse(duty) => {
                motor.reverse()?;
                motor.set_speed(duty)
            }
            MotorCommand::Coast => motor.coast(),
            MotorCommand::Brake => motor.brake(),
        }
    }
}

/// Outcome of one control policy for one tick.
///
/// `NoChange` is a real result: the motor keeps whatever it was last told.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Actuation {
    /// Leave the motor in its previous state.
    NoChange,
    /// Issue this command.
    Command(MotorCommand),
}

impl Actuation {
    /// Applies the actuation to a driver.
    ///
    /// Driver failures are logged and swallowed.
    pub fn issue<M: MotorActuator + ?Sized>(&self, id: MotorId, motor: &mut M) {
        if let Actuation::Command(cmd) = self {
            if let Err(e) = cmd.apply(motor) {
                warn!("{} motor rejected {:?}: {}", id, cmd, e);
            }
        }
    }
}
