//! Dispatch table and calibration sequencer.
//!
//! A decoded [`Command`] is first turned into a [`Plan`]: the ordered list
//! of actuator [`Operation`]s it stands for. A direct actuator command is a
//! one-step plan; a calibration command expands to one to four steps. The
//! [`Dispatcher`] then runs the plan strictly in order, each operation
//! blocking until the driver reports completion. The first driver fault
//! aborts the rest of the plan; completed steps are neither retried nor
//! rolled back.
//!
//! # Dispatch table
//!
//! | Command                         | Plan                                                   |
//! |---------------------------------|--------------------------------------------------------|
//! | release `p`                     | `release.release_ball(p)`                              |
//! | rotation `p`                    | `rotation.move_degrees(p)`                             |
//! | incline `p`                     | `incline.move_by_percentage(p)`                        |
//! | elevation `p`                   | `elevation.move_by_percentage_range(p)`                |
//! | calibrate release               | `release.move_degrees(full revolution)`                |
//! | calibrate rotation/incline/elev | `<actuator>.find_range()`                              |
//! | preset elevation range          | `elevation.preset_range(low, high)`                    |
//! | full calibration                | release revolution, rotation range, elevation range, elevation to 50% |
//! | reset to defaults               | release revolution, rotation to middle, elevation to 50% |

use std::fmt;

use heapless::Vec;
use tracing::{debug, info, warn};

use boccia_common::actuator::ActuatorError;
use boccia_common::consts::ELEVATION_PARK_PERCENT;
use boccia_common::limit::PinId;
use boccia_common::protocol::{CalibrationSelector, Command, DecodeError, Device};

use crate::rig::{CalibrationConstants, Rig};

/// Longest calibration chain.
pub const MAX_PLAN_LEN: usize = 4;

/// One actuator operation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReleaseBall(i32),
    ReleaseMoveDegrees(i32),
    RotationMoveDegrees(i32),
    RotationFindRange,
    RotationMoveToMiddle,
    InclineMoveByPercentage(i32),
    InclineFindRange,
    ElevationMoveByPercentageRange(i32),
    ElevationFindRange,
    ElevationPresetRange { low: i32, high: i32 },
    ElevationMoveToPercentageRange(i32),
}

impl Operation {
    /// Actuator this operation drives.
    pub const fn device(&self) -> Device {
        match self {
            Self::ReleaseBall(_) | Self::ReleaseMoveDegrees(_) => Device::Release,
            Self::RotationMoveDegrees(_) | Self::RotationFindRange | Self::RotationMoveToMiddle => {
                Device::Rotation
            }
            Self::InclineMoveByPercentage(_) | Self::InclineFindRange => Device::Incline,
            Self::ElevationMoveByPercentageRange(_)
            | Self::ElevationFindRange
            | Self::ElevationPresetRange { .. }
            | Self::ElevationMoveToPercentageRange(_) => Device::Elevation,
        }
    }

    fn apply(self, rig: &mut Rig) -> Result<(), ActuatorError> {
        match self {
            Self::ReleaseBall(angle) => rig.release.release_ball(angle),
            Self::ReleaseMoveDegrees(degrees) => rig.release.move_degrees(degrees),
            Self::RotationMoveDegrees(degrees) => rig.rotation.move_degrees(degrees),
            Self::RotationFindRange => rig.rotation.find_range(),
            Self::RotationMoveToMiddle => rig.rotation.move_to_middle(),
            Self::InclineMoveByPercentage(pct) => rig.incline.move_by_percentage(pct),
            Self::InclineFindRange => rig.incline.find_range(),
            Self::ElevationMoveByPercentageRange(pct) => rig.elevation.move_by_percentage_range(pct),
            Self::ElevationFindRange => rig.elevation.find_range(),
            Self::ElevationPresetRange { low, high } => rig.elevation.preset_range(low, high),
            Self::ElevationMoveToPercentageRange(pct) => {
                rig.elevation.move_to_percentage_range(pct)
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReleaseBall(a) => write!(f, "release.release_ball({a})"),
            Self::ReleaseMoveDegrees(d) => write!(f, "release.move_degrees({d})"),
            Self::RotationMoveDegrees(d) => write!(f, "rotation.move_degrees({d})"),
            Self::RotationFindRange => f.write_str("rotation.find_range()"),
            Self::RotationMoveToMiddle => f.write_str("rotation.move_to_middle()"),
            Self::InclineMoveByPercentage(p) => write!(f, "incline.move_by_percentage({p})"),
            Self::InclineFindRange => f.write_str("incline.find_range()"),
            Self::ElevationMoveByPercentageRange(p) => {
                write!(f, "elevation.move_by_percentage_range({p})")
            }
            Self::ElevationFindRange => f.write_str("elevation.find_range()"),
            Self::ElevationPresetRange { low, high } => {
                write!(f, "elevation.preset_range({low}, {high})")
            }
            Self::ElevationMoveToPercentageRange(p) => {
                write!(f, "elevation.move_to_percentage_range({p})")
            }
        }
    }
}

/// Ordered operations of one command.
pub type Plan = Vec<Operation, MAX_PLAN_LEN>;

fn plan_of<const N: usize>(ops: [Operation; N]) -> Plan {
    const { assert!(N <= MAX_PLAN_LEN) };
    ops.into_iter().collect()
}

/// Expand a calibration selector into its chain.
pub fn calibration_plan(selector: CalibrationSelector, constants: &CalibrationConstants) -> Plan {
    let revolution = Operation::ReleaseMoveDegrees(constants.release_full_revolution);
    let park = Operation::ElevationMoveToPercentageRange(ELEVATION_PARK_PERCENT);
    match selector {
        CalibrationSelector::RecalibrateRelease => plan_of([revolution]),
        CalibrationSelector::RecalibrateRotation => plan_of([Operation::RotationFindRange]),
        CalibrationSelector::RecalibrateIncline => plan_of([Operation::InclineFindRange]),
        CalibrationSelector::RecalibrateElevation => plan_of([Operation::ElevationFindRange]),
        CalibrationSelector::PresetElevationRange => {
            let (low, high) = constants.elevation_preset;
            plan_of([Operation::ElevationPresetRange { low, high }])
        }
        CalibrationSelector::FullCalibration => plan_of([
            revolution,
            Operation::RotationFindRange,
            Operation::ElevationFindRange,
            park,
        ]),
        CalibrationSelector::ResetToDefaults => {
            plan_of([revolution, Operation::RotationMoveToMiddle, park])
        }
    }
}

/// Expand a decoded command into its operations.
pub fn plan(command: Command, constants: &CalibrationConstants) -> Plan {
    match command {
        Command::Primary { device, payload } => match device {
            Device::Release => plan_of([Operation::ReleaseBall(payload)]),
            Device::Rotation => plan_of([Operation::RotationMoveDegrees(payload)]),
            Device::Incline => plan_of([Operation::InclineMoveByPercentage(payload)]),
            Device::Elevation => plan_of([Operation::ElevationMoveByPercentageRange(payload)]),
            // `Command::from_parts` never builds a primary calibration command.
            Device::Calibration => Plan::new(),
        },
        Command::Calibration { selector, .. } => calibration_plan(selector, constants),
    }
}

/// Result of dispatching one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every operation of the plan completed.
    Completed {
        command: Command,
        operations: usize,
        /// Release limit edge consumed after the plan ran.
        release_edge: Option<PinId>,
    },
    /// A driver reported a fault; later operations were not started.
    Faulted {
        command: Command,
        completed: usize,
        operation: Operation,
        error: ActuatorError,
    },
    /// The command did not decode; no actuator was touched.
    Rejected(DecodeError),
}

impl DispatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Routes decoded commands to the rig's actuators.
pub struct Dispatcher {
    rig: Rig,
}

impl Dispatcher {
    pub fn new(rig: Rig) -> Self {
        Self { rig }
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut Rig {
        &mut self.rig
    }

    /// Dispatch a decoded primary level.
    ///
    /// A calibration device decodes its nested selector here; an unknown
    /// selector is rejected without touching any actuator.
    pub fn dispatch(&mut self, device: Device, payload: i32) -> DispatchOutcome {
        match Command::from_parts(device, payload) {
            Ok(command) => self.execute(command),
            Err(e) => {
                warn!("Rejected {device} payload {payload}: {e}");
                DispatchOutcome::Rejected(e)
            }
        }
    }

    /// Run a calibration chain.
    pub fn run_calibration(&mut self, selector: CalibrationSelector) -> DispatchOutcome {
        self.execute(Command::Calibration {
            selector,
            sub_payload: 0,
        })
    }

    /// Run the plan of `command` to completion or first fault.
    pub fn execute(&mut self, command: Command) -> DispatchOutcome {
        let plan = plan(command, &self.rig.calibration);
        debug!("Executing {:?} as {} operation(s)", command, plan.len());

        let mut completed = 0;
        for operation in plan {
            debug!("-> {operation}");
            if let Err(error) = operation.apply(&mut self.rig) {
                warn!("{operation} failed after {completed} completed step(s): {error}");
                self.observe_release_edge();
                return DispatchOutcome::Faulted {
                    command,
                    completed,
                    operation,
                    error,
                };
            }
            completed += 1;
        }

        let release_edge = self.observe_release_edge();
        info!("{:?} completed ({completed} operation(s))", command);
        DispatchOutcome::Completed {
            command,
            operations: completed,
            release_edge,
        }
    }

    /// Consume a pending release limit notification.
    fn observe_release_edge(&mut self) -> Option<PinId> {
        let edge = self.rig.release.limit_latch().take_limit();
        if let Some(pin) = edge {
            debug!("Release limit edge on {pin}");
        }
        edge
    }
}
