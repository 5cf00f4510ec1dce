//! # Control Module
//!
//! Gamepad-to-motor translation policies.
//!
//! This module handles:
//! - Scaling stick and trigger readings to PWM duty values
//! - Steering decisions from the horizontal stick axis
//! - Drive decisions from the trigger pair and handbrake, with the
//!   powered latch

pub mod drive;
pub mod scaling;
pub mod steering;

pub use drive::{DriveLatch, DriveOutcome, DrivePolicy, DriveRule};
pub use steering::{SteeringPolicy, SteeringThresholds};
