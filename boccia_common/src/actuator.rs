//! Actuator driver traits and error types.
//!
//! This module defines:
//! - `StepperActuator` trait - Interface for the release and rotation steppers
//! - `LinearActuator` trait - Interface for the incline and elevation actuators
//! - `ActuatorError` enum - Faults reported by actuator drivers
//!
//! The controller treats drivers as opaque, stateful collaborators. Every
//! motion operation is synchronous: it returns only once the motion has
//! completed, been cut short by a limit edge, or failed.

use std::sync::Arc;
use thiserror::Error;

use crate::limit::{LimitLatch, PinId};

/// Faults reported by actuator drivers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    /// Requested magnitude is outside what the operation accepts.
    #[error("value {value} out of range {min}..={max}")]
    OutOfRange { value: i32, min: i32, max: i32 },

    /// Motion stopped early on a limit switch.
    #[error("limit switch on {pin} reached during motion")]
    LimitReached { pin: PinId },

    /// Operation needs a learned travel range.
    #[error("travel range not calibrated")]
    NotCalibrated,

    /// Actuator stopped moving before reaching its target.
    #[error("actuator stalled at {position} before reaching {target}")]
    Stalled { position: i32, target: i32 },

    /// Driver-specific hardware fault.
    #[error("hardware fault: {0}")]
    Hardware(String),
}

/// Stepper-driven actuator (release mechanism, base rotation).
///
/// # Lifecycle
///
/// 1. Constructed once at startup.
/// 2. `clear_sensor_while_stopped()` for every limit pin before interrupts
///    are attached.
/// 3. Motion operations from the main loop; limit edges arrive through the
///    shared [`LimitLatch`] at any time.
pub trait StepperActuator: Send {
    /// Returns the driver's identifier for logging.
    fn name(&self) -> &'static str;

    /// Rotate the release mechanism by `angle` steps, then return to rest.
    fn release_ball(&mut self, angle: i32) -> Result<(), ActuatorError>;

    /// Rotate by `degrees`.
    fn move_degrees(&mut self, degrees: i32) -> Result<(), ActuatorError>;

    /// Drive to both end stops and learn the travel span.
    fn find_range(&mut self) -> Result<(), ActuatorError>;

    /// Move to the middle of the learned travel span.
    fn move_to_middle(&mut self) -> Result<(), ActuatorError>;

    /// Release a switch that is already active on `pin` while the motor is
    /// stationary, so no stale edge is latched once interrupts are attached.
    fn clear_sensor_while_stopped(&mut self, pin: PinId);

    /// Latch written by this actuator's interrupt handlers.
    fn limit_latch(&self) -> Arc<LimitLatch>;
}

/// Potentiometer-feedback linear actuator (incline, elevation).
pub trait LinearActuator: Send {
    /// Returns the driver's identifier for logging.
    fn name(&self) -> &'static str;

    /// Drive to `percent` of the range learned by `find_range`.
    fn move_by_percentage(&mut self, percent: i32) -> Result<(), ActuatorError>;

    /// Drive to `percent` of the current range (preset or learned).
    fn move_by_percentage_range(&mut self, percent: i32) -> Result<(), ActuatorError>;

    /// Drive to `percent` of the current range; used by calibration chains.
    fn move_to_percentage_range(&mut self, percent: i32) -> Result<(), ActuatorError>;

    /// Drive to both physical end stops and learn the travel span.
    fn find_range(&mut self) -> Result<(), ActuatorError>;

    /// Replace the current range with fixed bounds.
    fn preset_range(&mut self, low: i32, high: i32) -> Result<(), ActuatorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuator_error_display() {
        let err = ActuatorError::OutOfRange {
            value: 150,
            min: 0,
            max: 100,
        };
        assert_eq!(err.to_string(), "value 150 out of range 0..=100");

        let err = ActuatorError::LimitReached { pin: PinId(19) };
        assert!(err.to_string().contains("pin 19"));

        let err = ActuatorError::Hardware("driver fault".to_string());
        assert!(err.to_string().contains("driver fault"));
    }
}
