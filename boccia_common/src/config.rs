//! Rig configuration loading and validation.
//!
//! Every section has defaults matching the stock rig wiring, so an empty
//! file (or no file at all) describes the standard Boccia rig.
//!
//! # Usage
//!
//! ```rust,no_run
//! use boccia_common::config::{ConfigError, ConfigLoader, RigConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = RigConfig::load(Path::new("rig.toml"))?;
//!     config.validate()?;
//!     println!("Polling every {} ms", config.controller.poll_interval_ms);
//!     Ok(())
//! }
//! ```
//!
//! A section that is present replaces its defaults as a whole: wiring
//! fields must be given explicitly, tuning fields fall back to their
//! defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::consts::{DEFAULT_POLL_INTERVAL_MS, MAX_INTERRUPT_PINS};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Trait for loading configuration from TOML files.
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

/// Fields shared by every service section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedConfig {
    /// Logging verbosity when no CLI flag overrides it.
    pub log_level: LogLevel,
    /// Instance identifier used in log output.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            service_name: "boccia-rig".to_string(),
        }
    }
}

/// Main loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Delay between input polls.
    pub poll_interval_ms: u64,
    /// Print the "Select motor and movement..." prompt after each command.
    pub echo_prompt: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            echo_prompt: true,
        }
    }
}

fn default_steps_per_rev() -> u32 {
    800
}

fn default_speed() -> u32 {
    600
}

fn default_gear_ratio() -> u32 {
    1
}

/// Stepper actuator wiring and motion tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepperConfig {
    pub step_pin: u8,
    pub dir_pin: u8,
    /// Limit switch interrupt pins. For rotation: `[left, right]`.
    pub limit_pins: [u8; 2],
    #[serde(default = "default_steps_per_rev")]
    pub steps_per_rev: u32,
    /// Back-off distance after a limit switch stops the motor.
    pub return_steps: u32,
    /// Steps per second.
    #[serde(default = "default_speed")]
    pub speed: u32,
    pub acceleration: u32,
    /// Stop motion when a limit edge is latched.
    pub use_limits: bool,
    #[serde(default = "default_gear_ratio")]
    pub gear_ratio: u32,
}

impl StepperConfig {
    /// Stock release mechanism.
    pub fn release() -> Self {
        Self {
            step_pin: 5,
            dir_pin: 6,
            limit_pins: [0, 2],
            steps_per_rev: 800,
            return_steps: 30,
            speed: 600,
            acceleration: 20,
            use_limits: false,
            gear_ratio: 1,
        }
    }

    /// Stock base rotation.
    pub fn rotation() -> Self {
        Self {
            step_pin: 12,
            dir_pin: 11,
            limit_pins: [3, 19],
            steps_per_rev: 800,
            return_steps: 180,
            speed: 600,
            acceleration: 30,
            use_limits: true,
            gear_ratio: 3,
        }
    }

    /// Steps for one full output revolution.
    ///
    /// Saturates at `i32::MAX`; `validate` rejects configs that would.
    pub fn full_revolution(&self) -> i32 {
        self.checked_revolution().unwrap_or(i32::MAX)
    }

    fn checked_revolution(&self) -> Option<i32> {
        let steps = self.steps_per_rev.checked_mul(self.gear_ratio)?;
        i32::try_from(steps).ok()
    }

    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if self.steps_per_rev == 0 {
            return Err(ConfigError::ValidationError(format!(
                "[{section}] steps_per_rev must be > 0"
            )));
        }
        if self.gear_ratio == 0 {
            return Err(ConfigError::ValidationError(format!(
                "[{section}] gear_ratio must be > 0"
            )));
        }
        if self.speed == 0 {
            return Err(ConfigError::ValidationError(format!(
                "[{section}] speed must be > 0"
            )));
        }
        if self.checked_revolution().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "[{section}] steps_per_rev * gear_ratio exceeds {}",
                i32::MAX
            )));
        }
        if i32::try_from(self.return_steps).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "[{section}] return_steps exceeds {}",
                i32::MAX
            )));
        }
        for pin in self.limit_pins {
            if pin as usize >= MAX_INTERRUPT_PINS {
                return Err(ConfigError::ValidationError(format!(
                    "[{section}] limit pin {pin} exceeds maximum {}",
                    MAX_INTERRUPT_PINS - 1
                )));
            }
        }
        Ok(())
    }
}

fn default_speed_threshold() -> u32 {
    15
}

fn default_speed_factor() -> u32 {
    50
}

/// Linear actuator wiring and feedback tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearConfig {
    pub pin1: u8,
    pub pin2: u8,
    /// Analog channel of the position potentiometer.
    pub pot_channel: u8,
    #[serde(default = "default_speed_threshold")]
    pub speed_threshold: u32,
    #[serde(default = "default_speed_factor")]
    pub speed_factor: u32,
    /// Digital sensor consulted while finding range.
    #[serde(default)]
    pub sensor_pin: Option<u8>,
    #[serde(default)]
    pub sensor_threshold: Option<u32>,
    /// Fixed `[low, high]` bounds loaded by the preset-range calibration.
    #[serde(default)]
    pub manual_limits: Option<[i32; 2]>,
}

impl LinearConfig {
    /// Stock incline actuator.
    pub fn incline() -> Self {
        Self {
            pin1: 8,
            pin2: 7,
            pot_channel: 4,
            speed_threshold: 15,
            speed_factor: 50,
            sensor_pin: Some(7),
            sensor_threshold: Some(600),
            manual_limits: None,
        }
    }

    /// Stock elevation actuator.
    pub fn elevation() -> Self {
        Self {
            pin1: 9,
            pin2: 10,
            pot_channel: 3,
            speed_threshold: 15,
            speed_factor: 50,
            sensor_pin: None,
            sensor_threshold: None,
            manual_limits: Some([20, 360]),
        }
    }

    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if self.speed_factor == 0 {
            return Err(ConfigError::ValidationError(format!(
                "[{section}] speed_factor must be > 0"
            )));
        }
        if let Some([low, high]) = self.manual_limits {
            if low >= high {
                return Err(ConfigError::ValidationError(format!(
                    "[{section}] manual_limits must be ascending (got [{low}, {high}])"
                )));
            }
        }
        Ok(())
    }
}

/// Geometry of the simulated rig.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Pace simulated motion at the configured speeds.
    pub realtime: bool,
    /// Steps between the rotation left and right switches. The carriage
    /// starts centred between them.
    pub rotation_span_steps: u32,
    /// Full potentiometer stroke `[min, max]` of both linear actuators.
    pub linear_stroke: [i32; 2],
    /// Potentiometer reading at power-on.
    pub linear_start: i32,
    /// Potentiometer units travelled per second.
    pub linear_units_per_sec: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            realtime: false,
            rotation_span_steps: 2400,
            linear_stroke: [0, 1023],
            linear_start: 512,
            linear_units_per_sec: 200,
        }
    }
}

/// Complete rig configuration.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
///
/// [controller]
/// poll_interval_ms = 100
///
/// [elevation]
/// pin1 = 9
/// pin2 = 10
/// pot_channel = 3
/// manual_limits = [40, 300]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default = "StepperConfig::release")]
    pub release: StepperConfig,
    #[serde(default = "StepperConfig::rotation")]
    pub rotation: StepperConfig,
    #[serde(default = "LinearConfig::incline")]
    pub incline: LinearConfig,
    #[serde(default = "LinearConfig::elevation")]
    pub elevation: LinearConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            controller: ControllerConfig::default(),
            release: StepperConfig::release(),
            rotation: StepperConfig::rotation(),
            incline: LinearConfig::incline(),
            elevation: LinearConfig::elevation(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl RigConfig {
    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. `poll_interval_ms` > 0
    /// 2. Stepper step counts, gear ratios and speeds > 0, and one
    ///    geared revolution fits in `i32`
    /// 3. Limit pins below `MAX_INTERRUPT_PINS`
    /// 4. No interrupt pin attached twice
    /// 5. `manual_limits` ascending
    /// 6. Elevation has `manual_limits`
    /// 7. `rotation_span_steps` >= 2
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.controller.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_ms must be > 0".to_string(),
            ));
        }

        self.release.validate("release")?;
        self.rotation.validate("rotation")?;
        self.incline.validate("incline")?;
        self.elevation.validate("elevation")?;

        if self.elevation.manual_limits.is_none() {
            return Err(ConfigError::ValidationError(
                "[elevation] manual_limits required".to_string(),
            ));
        }

        let mut attached = HashSet::new();
        for pin in self.interrupt_pins() {
            if !attached.insert(pin) {
                return Err(ConfigError::ValidationError(format!(
                    "interrupt pin {pin} attached more than once"
                )));
            }
        }

        if self.simulation.rotation_span_steps < 2 {
            return Err(ConfigError::ValidationError(
                "[simulation] rotation_span_steps must be >= 2".to_string(),
            ));
        }

        let [min, max] = self.simulation.linear_stroke;
        if min >= max {
            return Err(ConfigError::ValidationError(
                "[simulation] linear_stroke must be ascending".to_string(),
            ));
        }

        Ok(())
    }

    /// Pins that receive a rising-edge handler at startup, in attach order.
    ///
    /// Only the second release pin is wired to a handler.
    pub fn interrupt_pins(&self) -> [u8; 3] {
        [
            self.release.limit_pins[1],
            self.rotation.limit_pins[0],
            self.rotation.limit_pins[1],
        ]
    }

    /// Elevation preset bounds `(low, high)`.
    pub fn elevation_preset(&self) -> (i32, i32) {
        let [low, high] = self
            .elevation
            .manual_limits
            .or(LinearConfig::elevation().manual_limits)
            .unwrap_or_default();
        (low, high)
    }
}
