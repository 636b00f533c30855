//! Prelude module for common re-exports.
//!
//! ```rust
//! use boccia_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, RigConfig, SharedConfig};

// ─── Protocol ───────────────────────────────────────────────────────
pub use crate::protocol::{CalibrationSelector, Command, DecodeError, Device};

// ─── Actuators ──────────────────────────────────────────────────────
pub use crate::actuator::{ActuatorError, LinearActuator, StepperActuator};
pub use crate::limit::{LimitLatch, LimitSide, PinId};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_POLL_INTERVAL_MS, READY_PROMPT};

/// Default main loop poll interval as Duration.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
