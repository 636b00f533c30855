//! Linear actuator simulator.
//!
//! Position is the potentiometer reading. Percentage moves resolve against
//! one of three spans: the range learned by `find_range`, a preset range,
//! or the full mechanical stroke when neither is known.

use std::time::Duration;

use tracing::debug;

use boccia_common::actuator::{ActuatorError, LinearActuator};

/// Simulated potentiometer-feedback linear actuator.
pub struct SimulatedLinear {
    name: &'static str,
    stroke: (i32, i32),
    position: i32,
    learned: Option<(i32, i32)>,
    preset: Option<(i32, i32)>,
    units_per_sec: Option<u32>,
}

impl SimulatedLinear {
    pub fn new(
        name: &'static str,
        stroke: [i32; 2],
        start: i32,
        units_per_sec: Option<u32>,
    ) -> Self {
        let [min, max] = stroke;
        Self {
            name,
            stroke: (min, max),
            position: start.clamp(min, max),
            learned: None,
            preset: None,
            units_per_sec,
        }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    /// Span used by `move_by_percentage_range`: preset, else learned, else stroke.
    pub fn current_range(&self) -> (i32, i32) {
        self.preset.or(self.learned).unwrap_or(self.stroke)
    }

    fn check_percent(percent: i32) -> Result<(), ActuatorError> {
        if (0..=100).contains(&percent) {
            Ok(())
        } else {
            Err(ActuatorError::OutOfRange {
                value: percent,
                min: 0,
                max: 100,
            })
        }
    }

    fn drive_to(&mut self, target: i32) {
        let distance = (target - self.position).unsigned_abs();
        if let Some(rate) = self.units_per_sec.filter(|&r| r > 0) {
            std::thread::sleep(Duration::from_secs_f64(f64::from(distance) / f64::from(rate)));
        }
        debug!("{}: {} -> {target}", self.name, self.position);
        self.position = target;
    }

    fn move_within(&mut self, (low, high): (i32, i32), percent: i32) -> Result<(), ActuatorError> {
        Self::check_percent(percent)?;
        let target = low + (high - low) * percent / 100;
        self.drive_to(target);
        Ok(())
    }
}

impl LinearActuator for SimulatedLinear {
    fn name(&self) -> &'static str {
        self.name
    }

    fn move_by_percentage(&mut self, percent: i32) -> Result<(), ActuatorError> {
        let range = self.learned.unwrap_or(self.stroke);
        self.move_within(range, percent)
    }

    fn move_by_percentage_range(&mut self, percent: i32) -> Result<(), ActuatorError> {
        self.move_within(self.current_range(), percent)
    }

    fn move_to_percentage_range(&mut self, percent: i32) -> Result<(), ActuatorError> {
        self.move_within(self.current_range(), percent)
    }

    fn find_range(&mut self) -> Result<(), ActuatorError> {
        let (min, max) = self.stroke;
        self.drive_to(min);
        self.drive_to(max);
        self.learned = Some((min, max));
        self.preset = None;
        debug!("{}: range learned ({min}, {max})", self.name);
        Ok(())
    }

    fn preset_range(&mut self, low: i32, high: i32) -> Result<(), ActuatorError> {
        let (min, max) = self.stroke;
        if low < min || low >= high {
            return Err(ActuatorError::OutOfRange {
                value: low,
                min,
                max: high - 1,
            });
        }
        if high > max {
            return Err(ActuatorError::OutOfRange {
                value: high,
                min: low + 1,
                max,
            });
        }
        self.preset = Some((low, high));
        debug!("{}: preset range ({low}, {high})", self.name);
        Ok(())
    }
}
