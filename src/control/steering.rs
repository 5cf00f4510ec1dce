//! # Steering Policy
//!
//! Turns the horizontal stick axis into a steering motor actuation.
//!
//! ## Zones
//!
//! | `axis_x` | Actuation |
//! |----------|-----------|
//! | `-1..=1` | no change (noise) |
//! | `> 115` | reverse (right turn) |
//! | `< -115` | forward (left turn) |
//! | `-29..=29` | coast |
//! | `30..=115`, `-115..=-30` | no change (dead band) |
//!
//! The steering motor is wired so that reverse polarity turns the wheels
//! right.

use tracing::debug;

use super::scaling::steering_duty;
use crate::motor::{Actuation, MotorCommand};

/// Axis thresholds for the steering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteeringThresholds {
    /// Readings with magnitude at or below this are ignored outright.
    pub noise_guard: i32,
    /// Readings strictly inside `(-coast_band, coast_band)` coast the motor.
    pub coast_band: i32,
    /// Readings beyond this magnitude turn the wheels.
    pub turn_threshold: i32,
    /// Magnitude that maps to full duty.
    pub max_input: i32,
}

impl Default for SteeringThresholds {
    fn default() -> Self {
        Self {
            noise_guard: 1,
            coast_band: 30,
            turn_threshold: 115,
            max_input: 512,
        }
    }
}

/// Stateless steering policy.
///
/// # Examples
///
/// ```
/// use rc_car_bridge::control::steering::SteeringPolicy;
/// use rc_car_bridge::motor::{Actuation, MotorCommand};
///
/// let policy = SteeringPolicy::new(Default::default(), 3200);
/// assert_eq!(policy.decide(400), Actuation::Command(MotorCommand::Reverse(2297)));
/// assert_eq!(policy.decide(10), Actuation::Command(MotorCommand::Coast));
/// assert_eq!(policy.decide(60), Actuation::NoChange);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SteeringPolicy {
    thresholds: SteeringThresholds,
    duty_max: u32,
}

impl SteeringPolicy {
    #[must_use]
    pub fn new(thresholds: SteeringThresholds, duty_max: u32) -> Self {
        Self { thresholds, duty_max }
    }

    #[must_use]
    pub fn thresholds(&self) -> &SteeringThresholds {
        &self.thresholds
    }

    #[must_use]
    pub fn duty_max(&self) -> u32 {
        self.duty_max
    }

    /// Decides the steering actuation for one report.
    #[must_use]
    pub fn decide(&self, axis_x: i32) -> Actuation {
        let t = &self.thresholds;

        if axis_x.unsigned_abs() <= t.noise_guard.unsigned_abs() {
            return Actuation::NoChange;
        }

        if axis_x > t.turn_threshold {
            let duty = self.duty(axis_x);
            debug!("right turn: {}", duty);
            return Actuation::Command(MotorCommand::Reverse(duty));
        }

        if axis_x < -t.turn_threshold {
            let duty = self.duty(axis_x);
            debug!("left turn: {}", duty);
            return Actuation::Command(MotorCommand::Forward(duty));
        }

        if axis_x > -t.coast_band && axis_x < t.coast_band {
            return Actuation::Command(MotorCommand::Coast);
        }

        // Between the coast band and the turn threshold
        Actuation::NoChange
    }

    fn duty(&self, axis_x: i32) -> u32 {
        let t = &self.thresholds;
        steering_duty(axis_x, t.coast_band, t.turn_threshold, t.max_input, self.duty_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SteeringPolicy {
        SteeringPolicy::new(SteeringThresholds::default(), 3200)
    }

    #[test]
    fn test_right_turn_at_400() {
        assert_eq!(policy().decide(400), Actuation::Command(MotorCommand::Reverse(2297)));
    }

    #[test]
    fn test_left_turn_mirrors_right() {
        assert_eq!(policy().decide(-400), Actuation::Command(MotorCommand::Forward(2297)));
    }

    #[test]
    fn test_full_lock() {
        assert_eq!(policy().decide(512), Actuation::Command(MotorCommand::Reverse(3200)));
        assert_eq!(policy().decide(-512), Actuation::Command(MotorCommand::Forward(3200)));
    }

    #[test]
    fn test_beyond_range_clamps() {
        assert_eq!(policy().decide(900), Actuation::Command(MotorCommand::Reverse(3200)));
        assert_eq!(policy().decide(i32::MIN), Actuation::Command(MotorCommand::Forward(3200)));
    }

    #[test]
    fn test_noise_guard() {
        for axis in [-1, 0, 1] {
            assert_eq!(policy().decide(axis), Actuation::NoChange, "axis {}", axis);
        }
    }

    #[test]
    fn test_coast_band() {
        for axis in [2, -2, 15, -15, 29, -29] {
            assert_eq!(
                policy().decide(axis),
                Actuation::Command(MotorCommand::Coast),
                "axis {}",
                axis
            );
        }
    }

    #[test]
    fn test_dead_band_between_coast_and_turn() {
        for axis in [30, -30, 60, -60, 114, -114, 115, -115] {
            assert_eq!(policy().decide(axis), Actuation::NoChange, "axis {}", axis);
        }
    }

    #[test]
    fn test_turn_threshold_is_exclusive() {
        assert_eq!(policy().decide(115), Actuation::NoChange);
        assert_eq!(policy().decide(116), Actuation::Command(MotorCommand::Reverse(8)));
        assert_eq!(policy().decide(-116), Actuation::Command(MotorCommand::Forward(8)));
    }

    #[test]
    fn test_every_reading_yields_one_outcome() {
        // Each reading falls in exactly one zone
        let p = policy();
        for axis in -600..=600 {
            let outcome = p.decide(axis);
            let expected_zone = if axis.abs() <= 1 {
                Actuation::NoChange
            } else if axis > 115 || axis < -115 {
                outcome
            } else if axis.abs() < 30 {
                Actuation::Command(MotorCommand::Coast)
            } else {
                Actuation::NoChange
            };
            assert_eq!(outcome, expected_zone, "axis {}", axis);
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let p = SteeringPolicy::new(
            SteeringThresholds {
                noise_guard: 5,
                coast_band: 10,
                turn_threshold: 20,
                max_input: 120,
            },
            1000,
        );
        assert_eq!(p.decide(5), Actuation::NoChange);
        assert_eq!(p.decide(6), Actuation::Command(MotorCommand::Coast));
        assert_eq!(p.decide(15), Actuation::NoChange);
        // (70 - 20) * 1000 / 100 = 500
        assert_eq!(p.decide(70), Actuation::Command(MotorCommand::Reverse(500)));
    }
}
