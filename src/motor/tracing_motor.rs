//! Simulated motor driver that logs every call.
//!
//! Stands in for the PWM peripheral on hosts that only have a gamepad
//! attached, so the whole input-to-actuation path can be exercised on a
//! desktop.

use tracing::{debug, info};

use super::{MotorActuator, MotorId};
use crate::error::Result;

/// Direction currently selected on the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Outputs released.
    #[default]
    Coasting,
    Forward,
    Reverse,
    /// Terminals shorted.
    Braking,
}

/// Last known state of a [`TracingMotor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotorState {
    pub direction: Direction,
    pub duty: u32,
}

/// [`MotorActuator`] that keeps its state in memory and logs transitions.
#[derive(Debug)]
pub struct TracingMotor {
    id: MotorId,
    duty_max: u32,
    state: MotorState,
}

impl TracingMotor {
    /// Creates a coasting motor accepting duties up to `duty_max`.
    #[must_use]
    pub fn new(id: MotorId, duty_max: u32) -> Self {
        info!("{} motor enabled (duty_max = {})", id, duty_max);
        Self {
            id,
            duty_max,
            state: MotorState::default(),
        }
    }

    /// Current direction and duty.
    #[must_use]
    pub fn state(&self) -> MotorState {
        self.state
    }

    fn set_direction(&mut self, direction: Direction) {
        if self.state.direction != direction {
            debug!("{} motor: {:?} -> {:?}", self.id, self.state.direction, direction);
        }
        self.state.direction = direction;
    }
}

impl MotorActuator for TracingMotor {
    fn forward(&mut self) -> Result<()> {
        self.set_direction(Direction::Forward);
        Ok(())
    }

    fn reverse(&mut self) -> Result<()> {
        self.set_direction(Direction::Reverse);
        Ok(())
    }

    fn coast(&mut self) -> Result<()> {
        self.set_direction(Direction::Coasting);
        self.state.duty = 0;
        Ok(())
    }

    fn brake(&mut self) -> Result<()> {
        self.set_direction(Direction::Braking);
        self.state.duty = 0;
        Ok(())
    }

    fn set_speed(&mut self, duty: u32) -> Result<()> {
        // Compare register cannot exceed the period
        let duty = duty.min(self.duty_max);
        debug!("{} motor: duty {}/{}", self.id, duty, self.duty_max);
        self.state.duty = duty;
        Ok(())
    }
}
