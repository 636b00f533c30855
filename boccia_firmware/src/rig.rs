//! Rig context: the four actuator handles and the constants the
//! calibration chains need.
//!
//! A [`Rig`] is built once at startup by a backend factory and then owned by
//! the dispatcher for the life of the process. Interrupt registration
//! borrows it once, before the first command, to quiesce sensors and take
//! the limit latches.

use boccia_common::actuator::{LinearActuator, StepperActuator};
use boccia_common::config::RigConfig;
use boccia_common::limit::PinId;

/// Fixed values used by the calibration chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationConstants {
    /// Step count of one release revolution.
    pub release_full_revolution: i32,
    /// Elevation bounds `(low, high)` loaded by the preset-range calibration.
    pub elevation_preset: (i32, i32),
}

impl CalibrationConstants {
    pub fn from_config(config: &RigConfig) -> Self {
        Self {
            release_full_revolution: config.release.full_revolution(),
            elevation_preset: config.elevation_preset(),
        }
    }
}

/// Interrupt pins wired to a limit handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitWiring {
    pub release: PinId,
    pub rotation_left: PinId,
    pub rotation_right: PinId,
}

impl LimitWiring {
    pub fn from_config(config: &RigConfig) -> Self {
        let [release, left, right] = config.interrupt_pins();
        Self {
            release: PinId(release),
            rotation_left: PinId(left),
            rotation_right: PinId(right),
        }
    }
}

/// Owned actuator handles of one rig.
pub struct Rig {
    pub release: Box<dyn StepperActuator>,
    pub rotation: Box<dyn StepperActuator>,
    pub incline: Box<dyn LinearActuator>,
    pub elevation: Box<dyn LinearActuator>,
    pub calibration: CalibrationConstants,
    pub wiring: LimitWiring,
}

impl Rig {
    /// Assemble a rig, taking constants and wiring from `config`.
    pub fn new(
        config: &RigConfig,
        release: Box<dyn StepperActuator>,
        rotation: Box<dyn StepperActuator>,
        incline: Box<dyn LinearActuator>,
        elevation: Box<dyn LinearActuator>,
    ) -> Self {
        Self {
            release,
            rotation,
            incline,
            elevation,
            calibration: CalibrationConstants::from_config(config),
            wiring: LimitWiring::from_config(config),
        }
    }
}

impl std::fmt::Debug for Rig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rig")
            .field("release", &self.release.name())
            .field("rotation", &self.rotation.name())
            .field("incline", &self.incline.name())
            .field("elevation", &self.elevation.name())
            .field("calibration", &self.calibration)
            .field("wiring", &self.wiring)
            .finish()
    }
}
