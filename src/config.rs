//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::control::{DrivePolicy, SteeringPolicy, SteeringThresholds};
use crate::error::{RcCarError, Result};
use crate::feedback::RumblePulse;
use crate::motor::{PwmConfig, PWM_FREQUENCY_HZ, PWM_TIMER_RESOLUTION_HZ};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub drive_motor: MotorConfig,
    #[serde(default)]
    pub steering_motor: MotorConfig,
    #[serde(default)]
    pub steering: SteeringConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// PWM timing of one motor driver
#[derive(Debug, Deserialize, Clone)]
pub struct MotorConfig {
    #[serde(default = "default_pwm_frequency_hz")]
    pub pwm_frequency_hz: u32,

    #[serde(default = "default_timer_resolution_hz")]
    pub timer_resolution_hz: u32,
}

/// Steering axis thresholds
#[derive(Debug, Deserialize, Clone)]
pub struct SteeringConfig {
    #[serde(default = "default_noise_guard")]
    pub noise_guard: i32,

    #[serde(default = "default_coast_band")]
    pub coast_band: i32,

    #[serde(default = "default_turn_threshold")]
    pub turn_threshold: i32,

    #[serde(default = "default_axis_max")]
    pub max_input: i32,
}

/// Drive trigger configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DriveConfig {
    #[serde(default = "default_trigger_max")]
    pub trigger_max: u32,
}

/// Seat feedback configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FeedbackConfig {
    #[serde(default)]
    pub rumble_delay_ms: u16,

    #[serde(default = "default_rumble_duration_ms")]
    pub rumble_duration_ms: u16,

    #[serde(default = "default_rumble_weak")]
    pub rumble_weak: u8,

    #[serde(default = "default_rumble_strong")]
    pub rumble_strong: u8,
}

/// Controller input configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_device_path")]
    pub device_path: String,

    #[serde(default = "default_report_queue")]
    pub report_queue: usize,
}

/// Actuation telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

/// Diagnostic log configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Optional path of a log file written alongside stdout
    #[serde(default)]
    pub file: Option<String>,
}

// Default value functions
fn default_pwm_frequency_hz() -> u32 { PWM_FREQUENCY_HZ }
fn default_timer_resolution_hz() -> u32 { PWM_TIMER_RESOLUTION_HZ }

fn default_noise_guard() -> i32 { 1 }
fn default_coast_band() -> i32 { 30 }
fn default_turn_threshold() -> i32 { 115 }
fn default_axis_max() -> i32 { 512 }

fn default_trigger_max() -> u32 { 1020 }

fn default_rumble_duration_ms() -> u16 { 150 }
fn default_rumble_weak() -> u8 { 128 }
fn default_rumble_strong() -> u8 { 40 }

fn default_device_path() -> String { "/dev/input/event0".to_string() }
fn default_report_queue() -> usize { 64 }

fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

fn default_log_level() -> String { "info".to_string() }

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            pwm_frequency_hz: default_pwm_frequency_hz(),
            timer_resolution_hz: default_timer_resolution_hz(),
        }
    }
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            noise_guard: default_noise_guard(),
            coast_band: default_coast_band(),
            turn_threshold: default_turn_threshold(),
            max_input: default_axis_max(),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self { trigger_max: default_trigger_max() }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            rumble_delay_ms: 0,
            rumble_duration_ms: default_rumble_duration_ms(),
            rumble_weak: default_rumble_weak(),
            rumble_strong: default_rumble_strong(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_path: default_device_path(),
            report_queue: default_report_queue(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl MotorConfig {
    /// PWM timing for the motor driver
    #[must_use]
    pub fn pwm(&self) -> PwmConfig {
        PwmConfig {
            frequency_hz: self.pwm_frequency_hz,
            resolution_hz: self.timer_resolution_hz,
        }
    }
}

impl FeedbackConfig {
    /// Rumble played on every seat assignment
    #[must_use]
    pub fn rumble(&self) -> RumblePulse {
        RumblePulse {
            delay_ms: self.rumble_delay_ms,
            duration_ms: self.rumble_duration_ms,
            weak_magnitude: self.rumble_weak,
            strong_magnitude: self.rumble_strong,
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> RcCarError {
    RcCarError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rc_car_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Steering policy built from the steering section and motor
    #[must_use]
    pub fn steering_policy(&self) -> SteeringPolicy {
        SteeringPolicy::new(
            SteeringThresholds {
                noise_guard: self.steering.noise_guard,
                coast_band: self.steering.coast_band,
                turn_threshold: self.steering.turn_threshold,
                max_input: self.steering.max_input,
            },
            self.steering_motor.pwm().duty_max(),
        )
    }

    /// Drive policy built from the drive section and motor
    #[must_use]
    pub fn drive_policy(&self) -> DrivePolicy {
        DrivePolicy::new(self.drive.trigger_max, self.drive_motor.pwm().duty_max())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        // Validate motor PWM timing
        for (name, motor) in [("drive_motor", &self.drive_motor), ("steering_motor", &self.steering_motor)] {
            if motor.pwm_frequency_hz == 0 {
                return Err(invalid(format!("{}.pwm_frequency_hz must be greater than 0", name)));
            }
            if motor.timer_resolution_hz < motor.pwm_frequency_hz {
                return Err(invalid(format!(
                    "{}.timer_resolution_hz must be at least pwm_frequency_hz",
                    name
                )));
            }
        }

        // Validate steering thresholds: zones must not overlap
        let s = &self.steering;
        if s.noise_guard < 0 {
            return Err(invalid("steering.noise_guard must not be negative"));
        }
        if s.coast_band <= s.noise_guard {
            return Err(invalid("steering.coast_band must be greater than noise_guard"));
        }
        if s.turn_threshold < s.coast_band {
            return Err(invalid("steering.turn_threshold must be at least coast_band"));
        }
        if s.max_input <= s.turn_threshold {
            return Err(invalid("steering.max_input must be greater than turn_threshold"));
        }

        // Validate drive trigger range
        if self.drive.trigger_max == 0 {
            return Err(invalid("drive.trigger_max must be greater than 0"));
        }

        // Validate input
        if self.input.device_path.is_empty() {
            return Err(invalid("input.device_path cannot be empty"));
        }
        if self.input.report_queue == 0 {
            return Err(invalid("input.report_queue must be greater than 0"));
        }

        // Validate telemetry configuration
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }
        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }
        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        // Validate log level
        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("logging.level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }
}
