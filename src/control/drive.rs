//! # Drive Policy
//!
//! Turns the trigger pair and the handbrake button into a drive motor
//! actuation, keeping a latch that records whether a trigger is currently
//! powering the motor.
//!
//! ## Rules
//!
//! Evaluated in order on every report:
//!
//! 1. Either trigger released while powered: coast, unlatch.
//! 2. Both triggers held while powered: coast, latch unchanged.
//! 3. Handbrake held: brake, unlatch, skip 4 and 5.
//! 4. Left trigger held while unlatched: reverse at brake value, latch, stop.
//! 5. Right trigger held while unlatched: forward at throttle value, latch, stop.
//!
//! Several rules can fire in one report (1 then 3, 1 then 4, ...). The
//! latch sees every rule in order, and the command of the last fired rule
//! is the single actuation issued for the report. That is the state the
//! motor would settle in had every fired rule been sent back to back.

use tracing::debug;

use super::scaling::trigger_duty;
use crate::controller::snapshot::{Buttons, ControllerSnapshot, TRIGGER_MAX};
use crate::motor::{Actuation, MotorCommand};

/// Whether a trigger is currently powering the drive motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveLatch {
    powered: bool,
}

impl DriveLatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_powered(&self) -> bool {
        self.powered
    }
}

/// Drive rule that fired during a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveRule {
    CoastOnRelease,
    BothHeld,
    Handbrake,
    ReverseTrigger,
    ForwardTrigger,
}

/// Result of one drive policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveOutcome {
    /// The command to issue this report.
    pub actuation: Actuation,
    /// Rules that fired, in evaluation order.
    pub fired: Vec<DriveRule>,
}

impl DriveOutcome {
    fn none() -> Self {
        Self {
            actuation: Actuation::NoChange,
            fired: Vec::new(),
        }
    }

    fn fire(&mut self, rule: DriveRule, command: MotorCommand) {
        self.fired.push(rule);
        self.actuation = Actuation::Command(command);
    }
}

/// Trigger / handbrake drive policy.
///
/// # Examples
///
/// ```
/// use rc_car_bridge::control::drive::{DriveLatch, DrivePolicy};
/// use rc_car_bridge::controller::snapshot::{Buttons, ControllerSnapshot};
/// use rc_car_bridge::motor::{Actuation, MotorCommand};
///
/// let policy = DrivePolicy::new(1020, 3200);
/// let mut latch = DriveLatch::new();
///
/// let snap = ControllerSnapshot::gamepad()
///     .with_throttle(510)
///     .with_buttons(Buttons::TRIGGER_R);
/// let outcome = policy.decide(&mut latch, &snap);
///
/// assert_eq!(outcome.actuation, Actuation::Command(MotorCommand::Forward(1600)));
/// assert!(latch.is_powered());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DrivePolicy {
    trigger_max: u32,
    duty_max: u32,
}

impl Default for DrivePolicy {
    fn default() -> Self {
        Self::new(TRIGGER_MAX, crate::motor::DUTY_MAX)
    }
}

impl DrivePolicy {
    #[must_use]
    pub fn new(trigger_max: u32, duty_max: u32) -> Self {
        Self { trigger_max, duty_max }
    }

    #[must_use]
    pub fn duty_max(&self) -> u32 {
        self.duty_max
    }

    /// Decides the drive actuation for one report, updating `latch`.
    pub fn decide(&self, latch: &mut DriveLatch, snapshot: &ControllerSnapshot) -> DriveOutcome {
        let left = snapshot.is_pressed(Buttons::TRIGGER_L);
        let right = snapshot.is_pressed(Buttons::TRIGGER_R);
        let mut outcome = DriveOutcome::none();

        if (!left || !right) && latch.powered {
            outcome.fire(DriveRule::CoastOnRelease, MotorCommand::Coast);
            latch.powered = false;
        }

        if left && right && latch.powered {
            outcome.fire(DriveRule::BothHeld, MotorCommand::Coast);
        }

        if snapshot.is_pressed(Buttons::HANDBRAKE) {
            outcome.fire(DriveRule::Handbrake, MotorCommand::Brake);
            latch.powered = false;
        } else if left && !latch.powered {
            let duty = trigger_duty(snapshot.brake, self.trigger_max, self.duty_max);
            debug!("reverse: {}", duty);
            outcome.fire(DriveRule::ReverseTrigger, MotorCommand::Reverse(duty));
            latch.powered = true;
        } else if right && !latch.powered {
            let duty = trigger_duty(snapshot.throttle, self.trigger_max, self.duty_max);
            debug!("forward: {}", duty);
            outcome.fire(DriveRule::ForwardTrigger, MotorCommand::Forward(duty));
            latch.powered = true;
        }

        outcome
    }
}
