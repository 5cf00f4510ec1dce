//! # Controller Module
//!
//! Gamepad input handling.
//!
//! This module handles:
//! - The per-report [`snapshot::ControllerSnapshot`] data model
//! - Opening an evdev gamepad node
//! - Mapping evdev events into snapshots and system-button presses

pub mod gamepad;
pub mod mapper;
pub mod snapshot;

pub use snapshot::{Buttons, ControllerClass, ControllerSnapshot};
