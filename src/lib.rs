//! # RC Car Bridge Library
//!
//! Drive a two-motor RC car (drive + steering) from a gamepad.
//!
//! This library turns controller reports into motor commands: deadzone
//! scaling, a steering policy, a latched drive policy, and per-controller
//! seat feedback.

pub mod config;
pub mod control;
pub mod controller;
pub mod error;
pub mod feedback;
pub mod host;
pub mod motor;
pub mod telemetry;
pub mod vehicle;
