//! Integer command protocol for the Boccia rig.
//!
//! Every command is one signed decimal integer. It is read as a two-level
//! grammar:
//!
//! ```text
//! raw     = device_code * 1000 + payload          device_code ∈ {1, 2, 3, 4, 8}
//! payload = calibration_code * 100 + sub_payload  (device_code = 8 only)
//! ```
//!
//! Both levels split with truncating division: the selector is the absolute
//! value of the quotient and the remainder keeps the sign of the dividend, so
//! `-1500` selects the release actuator with payload `-500`.

use std::fmt;
use thiserror::Error;

use crate::consts::{CALIBRATION_SELECT_BASE, DEVICE_SELECT_BASE};

/// Errors raised while turning an input line into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Primary selector outside {1, 2, 3, 4, 8}.
    #[error("unknown device selector {0}")]
    UnknownDevice(u32),

    /// Calibration selector outside {1, 2, 3, 4, 5, 7, 8}.
    #[error("unknown calibration selector {0}")]
    UnknownCalibrationSelector(u32),

    /// Input line is not a decimal integer.
    #[error("malformed command line {0:?}")]
    Malformed(String),
}

/// Addressable device selected by the primary selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Device {
    /// Ball release stepper.
    Release = 1,
    /// Base rotation stepper.
    Rotation = 2,
    /// Ramp incline linear actuator.
    Incline = 3,
    /// Ramp elevation linear actuator.
    Elevation = 4,
    /// Calibration meta-device carrying a nested selector.
    Calibration = 8,
}

impl Device {
    /// The four physical actuators, in selector order.
    pub const ACTUATORS: [Device; 4] = [
        Device::Release,
        Device::Rotation,
        Device::Incline,
        Device::Elevation,
    ];

    #[inline]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Release),
            2 => Some(Self::Rotation),
            3 => Some(Self::Incline),
            4 => Some(Self::Elevation),
            8 => Some(Self::Calibration),
            _ => None,
        }
    }

    /// Primary selector value of this device.
    #[inline]
    pub const fn code(&self) -> u32 {
        *self as u32
    }

    /// Lowercase name used in operator echo lines.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Rotation => "rotation",
            Self::Incline => "incline",
            Self::Elevation => "elevation",
            Self::Calibration => "calibration",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Calibration path selected inside a calibration command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CalibrationSelector {
    /// One full revolution of the release mechanism.
    RecalibrateRelease = 1,
    /// Re-learn the rotation end stops.
    RecalibrateRotation = 2,
    /// Re-learn the incline travel range.
    RecalibrateIncline = 3,
    /// Re-learn the elevation travel range.
    RecalibrateElevation = 4,
    /// Load the configured manual elevation bounds.
    PresetElevationRange = 5,
    /// Release revolution, rotation and elevation ranges, then park elevation.
    FullCalibration = 7,
    /// Release revolution, centre rotation, park elevation.
    ResetToDefaults = 8,
}

impl CalibrationSelector {
    #[inline]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::RecalibrateRelease),
            2 => Some(Self::RecalibrateRotation),
            3 => Some(Self::RecalibrateIncline),
            4 => Some(Self::RecalibrateElevation),
            5 => Some(Self::PresetElevationRange),
            7 => Some(Self::FullCalibration),
            8 => Some(Self::ResetToDefaults),
            _ => None,
        }
    }

    #[inline]
    pub const fn code(&self) -> u32 {
        *self as u32
    }

    /// What is being recalibrated, for the "Recalibrating:" echo line.
    pub const fn subject(&self) -> &'static str {
        match self {
            Self::RecalibrateRelease => Device::Release.name(),
            Self::RecalibrateRotation => Device::Rotation.name(),
            Self::RecalibrateIncline => Device::Incline.name(),
            Self::RecalibrateElevation | Self::PresetElevationRange => Device::Elevation.name(),
            Self::FullCalibration | Self::ResetToDefaults => "system",
        }
    }

    /// Human-readable name of the calibration path.
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::RecalibrateRelease => "release full revolution",
            Self::RecalibrateRotation => "rotation find range",
            Self::RecalibrateIncline => "incline find range",
            Self::RecalibrateElevation => "elevation find range",
            Self::PresetElevationRange => "elevation preset range",
            Self::FullCalibration => "full calibration",
            Self::ResetToDefaults => "reset to defaults",
        }
    }
}

impl fmt::Display for CalibrationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Split `value` into `(|value / base|, value % base)` with truncating division.
#[inline]
const fn split(value: i32, base: i32) -> (u32, i32) {
    ((value / base).unsigned_abs(), value % base)
}

/// Decode the primary level of a raw command into its device and payload.
///
/// The payload is not range-checked here; actuator drivers reject
/// magnitudes they cannot honour.
pub fn decode(raw: i32) -> Result<(Device, i32), DecodeError> {
    let (code, payload) = split(raw, DEVICE_SELECT_BASE);
    let device = Device::from_code(code).ok_or(DecodeError::UnknownDevice(code))?;
    Ok((device, payload))
}

/// Decode the calibration level of a calibration payload.
pub fn decode_calibration(payload: i32) -> Result<(CalibrationSelector, i32), DecodeError> {
    let (code, sub_payload) = split(payload, CALIBRATION_SELECT_BASE);
    let selector = CalibrationSelector::from_code(code)
        .ok_or(DecodeError::UnknownCalibrationSelector(code))?;
    Ok((selector, sub_payload))
}

/// A fully decoded command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Direct actuator motion. `device` is never [`Device::Calibration`].
    Primary { device: Device, payload: i32 },
    /// Calibration sub-protocol command.
    Calibration {
        selector: CalibrationSelector,
        sub_payload: i32,
    },
}

impl Command {
    /// Decode both protocol levels of a raw command.
    pub fn decode(raw: i32) -> Result<Self, DecodeError> {
        let (device, payload) = decode(raw)?;
        Self::from_parts(device, payload)
    }

    /// Build a command from an already decoded primary level.
    pub fn from_parts(device: Device, payload: i32) -> Result<Self, DecodeError> {
        match device {
            Device::Calibration => {
                let (selector, sub_payload) = decode_calibration(payload)?;
                Ok(Self::Calibration {
                    selector,
                    sub_payload,
                })
            }
            device => Ok(Self::Primary { device, payload }),
        }
    }

    /// Parse one input line into a raw command value.
    ///
    /// Surrounding whitespace (including a trailing `\r`) is ignored.
    pub fn parse_line(line: &str) -> Result<i32, DecodeError> {
        let trimmed = line.trim();
        trimmed
            .parse::<i32>()
            .map_err(|_| DecodeError::Malformed(trimmed.to_string()))
    }

    /// Device addressed by this command.
    pub const fn device(&self) -> Device {
        match self {
            Self::Primary { device, .. } => *device,
            Self::Calibration { .. } => Device::Calibration,
        }
    }
}
