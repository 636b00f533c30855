//! Recording rig shared by the integration tests.
//!
//! Every actuator call is appended to one shared log, in call order, using
//! the same `actuator.operation(args)` text as `Operation`'s Display. The
//! fakes keep a coarse position model so end states can be compared, and
//! can be told to fail a call or to raise an interrupt line while a call
//! is in progress.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use boccia_common::actuator::{ActuatorError, LinearActuator, StepperActuator};
use boccia_common::config::RigConfig;
use boccia_common::limit::{LimitLatch, PinId};
use boccia_firmware::{InterruptLines, Rig};

pub const ROTATION_RANGE: (i32, i32) = (-1200, 1200);

#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<String>,
    pub positions: BTreeMap<&'static str, i32>,
    pub ranges: BTreeMap<&'static str, (i32, i32)>,
    /// `(pin, attached)` for every sensor clear, in call order.
    pub clears: Vec<(u8, bool)>,
    fail_on: HashSet<String>,
    edges_on: Vec<(String, PinId)>,
}

#[derive(Clone)]
pub struct Shared(Arc<Mutex<Recorder>>);

impl Shared {
    pub fn lock(&self) -> MutexGuard<'_, Recorder> {
        self.0.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make `call` report a hardware fault.
    pub fn fail_on(&self, call: &str) {
        self.lock().fail_on.insert(call.to_string());
    }

    /// Raise `pin` while `call` is executing.
    pub fn edge_during(&self, call: &str, pin: PinId) {
        self.lock().edges_on.push((call.to_string(), pin));
    }

    pub fn snapshot(&self) -> (BTreeMap<&'static str, i32>, BTreeMap<&'static str, (i32, i32)>) {
        let rec = self.lock();
        (rec.positions.clone(), rec.ranges.clone())
    }

    fn record(&self, lines: &InterruptLines, call: String) -> Result<(), ActuatorError> {
        let (fail, edges): (bool, Vec<PinId>) = {
            let mut rec = self.lock();
            let fail = rec.fail_on.contains(&call);
            let edges = rec
                .edges_on
                .iter()
                .filter(|(c, _)| *c == call)
                .map(|(_, pin)| *pin)
                .collect();
            rec.calls.push(call);
            (fail, edges)
        };
        for pin in edges {
            lines.raise(pin);
        }
        if fail {
            Err(ActuatorError::Hardware("injected fault".to_string()))
        } else {
            Ok(())
        }
    }

    fn set_position(&self, name: &'static str, position: i32) {
        self.lock().positions.insert(name, position);
    }

    fn position(&self, name: &'static str) -> i32 {
        self.lock().positions.get(name).copied().unwrap_or(0)
    }

    fn range(&self, name: &'static str) -> Option<(i32, i32)> {
        self.lock().ranges.get(name).copied()
    }

    fn set_range(&self, name: &'static str, range: (i32, i32)) {
        self.lock().ranges.insert(name, range);
    }
}

pub struct RecordingStepper {
    name: &'static str,
    shared: Shared,
    lines: Arc<InterruptLines>,
    latch: Arc<LimitLatch>,
    /// Positions wrap modulo this value (release revolutions).
    modulus: Option<i32>,
}

impl StepperActuator for RecordingStepper {
    fn name(&self) -> &'static str {
        self.name
    }

    fn release_ball(&mut self, angle: i32) -> Result<(), ActuatorError> {
        self.shared
            .record(&self.lines, format!("{}.release_ball({angle})", self.name))
    }

    fn move_degrees(&mut self, degrees: i32) -> Result<(), ActuatorError> {
        self.shared
            .record(&self.lines, format!("{}.move_degrees({degrees})", self.name))?;
        let mut position = self.shared.position(self.name) + degrees;
        if let Some(m) = self.modulus {
            position = position.rem_euclid(m);
        }
        self.shared.set_position(self.name, position);
        Ok(())
    }

    fn find_range(&mut self) -> Result<(), ActuatorError> {
        self.shared
            .record(&self.lines, format!("{}.find_range()", self.name))?;
        self.shared.set_range(self.name, ROTATION_RANGE);
        self.shared.set_position(self.name, ROTATION_RANGE.1);
        Ok(())
    }

    fn move_to_middle(&mut self) -> Result<(), ActuatorError> {
        self.shared
            .record(&self.lines, format!("{}.move_to_middle()", self.name))?;
        let (left, right) = self
            .shared
            .range(self.name)
            .ok_or(ActuatorError::NotCalibrated)?;
        self.shared.set_position(self.name, (left + right) / 2);
        Ok(())
    }

    fn clear_sensor_while_stopped(&mut self, pin: PinId) {
        let attached = self.lines.is_attached(pin);
        let _ = self.shared.record(
            &self.lines,
            format!("{}.clear_sensor_while_stopped({})", self.name, pin.0),
        );
        self.shared.lock().clears.push((pin.0, attached));
        self.latch.clear();
    }

    fn limit_latch(&self) -> Arc<LimitLatch> {
        Arc::clone(&self.latch)
    }
}

pub struct RecordingLinear {
    name: &'static str,
    shared: Shared,
    lines: Arc<InterruptLines>,
}

impl RecordingLinear {
    fn percent(&self, call: String, percent: i32) -> Result<(), ActuatorError> {
        self.shared.record(&self.lines, call)?;
        if !(0..=100).contains(&percent) {
            return Err(ActuatorError::OutOfRange {
                value: percent,
                min: 0,
                max: 100,
            });
        }
        self.shared.set_position(self.name, percent);
        Ok(())
    }
}

impl LinearActuator for RecordingLinear {
    fn name(&self) -> &'static str {
        self.name
    }

    fn move_by_percentage(&mut self, percent: i32) -> Result<(), ActuatorError> {
        self.percent(format!("{}.move_by_percentage({percent})", self.name), percent)
    }

    fn move_by_percentage_range(&mut self, percent: i32) -> Result<(), ActuatorError> {
        self.percent(
            format!("{}.move_by_percentage_range({percent})", self.name),
            percent,
        )
    }

    fn move_to_percentage_range(&mut self, percent: i32) -> Result<(), ActuatorError> {
        self.percent(
            format!("{}.move_to_percentage_range({percent})", self.name),
            percent,
        )
    }

    fn find_range(&mut self) -> Result<(), ActuatorError> {
        self.shared
            .record(&self.lines, format!("{}.find_range()", self.name))?;
        self.shared.set_range(self.name, (0, 1023));
        self.shared.set_position(self.name, 100);
        Ok(())
    }

    fn preset_range(&mut self, low: i32, high: i32) -> Result<(), ActuatorError> {
        self.shared
            .record(&self.lines, format!("{}.preset_range({low}, {high})", self.name))?;
        self.shared.set_range(self.name, (low, high));
        Ok(())
    }
}

/// Handles kept by a test after the rig moves into the dispatcher.
pub struct Probe {
    pub shared: Shared,
    pub lines: Arc<InterruptLines>,
    pub release_latch: Arc<LimitLatch>,
    pub rotation_latch: Arc<LimitLatch>,
}

/// Stock-wired rig of recording fakes.
pub fn recording_rig() -> (Rig, Probe) {
    recording_rig_with(&RigConfig::default())
}

pub fn recording_rig_with(config: &RigConfig) -> (Rig, Probe) {
    let shared = Shared(Arc::new(Mutex::new(Recorder::default())));
    let lines = Arc::new(InterruptLines::new());
    let release_latch = Arc::new(LimitLatch::new());
    let rotation_latch = Arc::new(LimitLatch::new());

    let stepper = |name, latch: &Arc<LimitLatch>, modulus| RecordingStepper {
        name,
        shared: shared.clone(),
        lines: Arc::clone(&lines),
        latch: Arc::clone(latch),
        modulus,
    };
    let linear = |name| RecordingLinear {
        name,
        shared: shared.clone(),
        lines: Arc::clone(&lines),
    };

    let rig = Rig::new(
        config,
        Box::new(stepper(
            "release",
            &release_latch,
            Some(config.release.full_revolution()),
        )),
        Box::new(stepper("rotation", &rotation_latch, None)),
        Box::new(linear("incline")),
        Box::new(linear("elevation")),
    );

    let probe = Probe {
        shared,
        lines,
        release_latch,
        rotation_latch,
    };
    (rig, probe)
}
