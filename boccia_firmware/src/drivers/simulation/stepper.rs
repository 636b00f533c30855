//! Stepper actuator simulator.
//!
//! The carriage moves one step at a time. Whenever it arrives on a switch
//! position the switch's interrupt line is raised, exactly as the hardware
//! would, so the attached handler writes the actuator's latch. With
//! `use_limits` set, a latched limit stops the motion and the carriage
//! backs off `return_steps` away from the switch.
//!
//! Magnitudes are motor steps before gearing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use boccia_common::actuator::{ActuatorError, StepperActuator};
use boccia_common::config::StepperConfig;
use boccia_common::limit::{LimitLatch, PinId};

use crate::interrupts::InterruptLines;

/// Where the limit switches of a stepper sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchLayout {
    /// One home switch passed once per revolution (release mechanism).
    Periodic { every: i32, pin: PinId },
    /// Two end stops bounding the travel (rotation).
    EndStops {
        left: i32,
        left_pin: PinId,
        right: i32,
        right_pin: PinId,
    },
}

impl SwitchLayout {
    fn switch_at(&self, position: i32) -> Option<PinId> {
        match *self {
            Self::Periodic { every, pin } => (position.rem_euclid(every) == 0).then_some(pin),
            Self::EndStops {
                left,
                left_pin,
                right,
                right_pin,
            } => {
                if position == left {
                    Some(left_pin)
                } else if position == right {
                    Some(right_pin)
                } else {
                    None
                }
            }
        }
    }
}

/// Simulated stepper actuator.
pub struct SimulatedStepper {
    name: &'static str,
    config: StepperConfig,
    layout: SwitchLayout,
    lines: Arc<InterruptLines>,
    latch: Arc<LimitLatch>,
    position: i32,
    range: Option<(i32, i32)>,
    step_delay: Option<Duration>,
}

impl SimulatedStepper {
    pub fn new(
        name: &'static str,
        config: StepperConfig,
        layout: SwitchLayout,
        lines: Arc<InterruptLines>,
        realtime: bool,
    ) -> Self {
        let step_delay =
            realtime.then(|| Duration::from_secs_f64(1.0 / f64::from(config.speed.max(1))));
        Self {
            name,
            config,
            layout,
            lines,
            latch: Arc::new(LimitLatch::new()),
            position: 0,
            range: None,
            step_delay,
        }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    /// Learned `(left, right)` travel span.
    pub fn range(&self) -> Option<(i32, i32)> {
        self.range
    }

    fn steps_for(&self, magnitude: i32) -> i32 {
        let ratio = i32::try_from(self.config.gear_ratio).unwrap_or(i32::MAX);
        magnitude.saturating_mul(ratio)
    }

    /// Upper bound on steps for one homing run before it counts as stalled.
    fn homing_budget(&self) -> i32 {
        let travel = match self.layout {
            SwitchLayout::Periodic { every, .. } => every,
            SwitchLayout::EndStops { left, right, .. } => right - left,
        };
        travel.saturating_mul(2).max(1)
    }

    /// Advance one step and raise the line of a switch arrived on.
    fn step(&mut self, dir: i32) {
        self.position += dir;
        if let Some(pin) = self.layout.switch_at(self.position) {
            trace!("{}: switch {pin} at {}", self.name, self.position);
            self.lines.raise(pin);
        }
        if let Some(delay) = self.step_delay {
            std::thread::sleep(delay);
        }
    }

    /// Move `return_steps` against `dir` without passing any switch.
    fn back_off(&mut self, dir: i32) {
        let steps = i32::try_from(self.config.return_steps).unwrap_or(i32::MAX);
        self.position = self.position.saturating_sub(dir.saturating_mul(steps));
        debug!("{}: backed off {steps} step(s) to {}", self.name, self.position);
    }

    /// Move by `steps`, stopping on a latched limit when limits are in use.
    fn travel(&mut self, steps: i32) -> Result<(), ActuatorError> {
        let dir = steps.signum();
        // A notification left over from an earlier motion must not stop this one.
        self.latch.take_limit();
        for _ in 0..steps.unsigned_abs() {
            self.step(dir);
            if self.config.use_limits {
                if let Some(pin) = self.latch.take_limit() {
                    self.back_off(dir);
                    return Err(ActuatorError::LimitReached { pin });
                }
            }
        }
        self.normalize();
        Ok(())
    }

    /// Drive in `dir` until a limit edge is latched; returns the edge position.
    fn home(&mut self, dir: i32) -> Result<i32, ActuatorError> {
        self.latch.take_limit();
        for _ in 0..self.homing_budget() {
            self.step(dir);
            if self.latch.take_limit().is_some() {
                let edge = self.position;
                self.back_off(dir);
                return Ok(edge);
            }
        }
        Err(ActuatorError::Stalled {
            position: self.position,
            target: self.position + dir,
        })
    }

    /// Keep a periodic carriage within one revolution.
    fn normalize(&mut self) {
        if let SwitchLayout::Periodic { every, .. } = self.layout {
            self.position = self.position.rem_euclid(every);
        }
    }
}

impl StepperActuator for SimulatedStepper {
    fn name(&self) -> &'static str {
        self.name
    }

    fn release_ball(&mut self, angle: i32) -> Result<(), ActuatorError> {
        let steps = self.steps_for(angle);
        debug!("{}: release_ball({angle}) -> {steps} step(s)", self.name);
        self.travel(steps)?;
        self.travel(-steps)
    }

    fn move_degrees(&mut self, degrees: i32) -> Result<(), ActuatorError> {
        let steps = self.steps_for(degrees);
        debug!("{}: move_degrees({degrees}) -> {steps} step(s)", self.name);
        self.travel(steps)
    }

    fn find_range(&mut self) -> Result<(), ActuatorError> {
        let range = match self.layout {
            SwitchLayout::Periodic { every, .. } => {
                let home = self.home(1)?;
                self.position = home;
                self.normalize();
                (0, every)
            }
            SwitchLayout::EndStops { .. } => {
                let left = self.home(-1)?;
                let right = self.home(1)?;
                (left, right)
            }
        };
        debug!("{}: range learned {:?}", self.name, range);
        self.range = Some(range);
        Ok(())
    }

    fn move_to_middle(&mut self) -> Result<(), ActuatorError> {
        let (left, right) = self.range.ok_or(ActuatorError::NotCalibrated)?;
        let middle = left + (right - left) / 2;
        self.travel(middle - self.position)
    }

    fn clear_sensor_while_stopped(&mut self, pin: PinId) {
        if self.layout.switch_at(self.position) == Some(pin) {
            let approach = match self.layout {
                SwitchLayout::EndStops { right, .. } if self.position == right => 1,
                SwitchLayout::EndStops { .. } | SwitchLayout::Periodic { .. } => -1,
            };
            self.back_off(approach);
            debug!("{}: moved off active sensor {pin}", self.name);
        }
        self.latch.clear();
    }

    fn limit_latch(&self) -> Arc<LimitLatch> {
        Arc::clone(&self.latch)
    }
}
