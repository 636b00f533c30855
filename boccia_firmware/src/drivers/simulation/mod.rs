//! Simulation rig backend.
//!
//! Models the four actuators in software so the controller can run without
//! hardware. End-stop switches raise edges through the shared
//! [`InterruptLines`], so limit handling runs through the same handlers as
//! on the real rig.

mod linear;
mod stepper;

pub use linear::SimulatedLinear;
pub use stepper::{SimulatedStepper, SwitchLayout};

use std::sync::Arc;

use boccia_common::config::RigConfig;
use boccia_common::limit::PinId;
use tracing::info;

use crate::error::RigError;
use crate::interrupts::InterruptLines;
use crate::rig::Rig;

/// Factory building a simulated rig from `config`.
pub fn create_rig(config: &RigConfig, lines: &Arc<InterruptLines>) -> Result<Rig, RigError> {
    config.validate()?;
    let sim = &config.simulation;

    let release_layout = SwitchLayout::Periodic {
        every: config.release.full_revolution(),
        pin: PinId(config.release.limit_pins[1]),
    };
    let half_span = (sim.rotation_span_steps / 2) as i32;
    let rotation_layout = SwitchLayout::EndStops {
        left: -half_span,
        left_pin: PinId(config.rotation.limit_pins[0]),
        right: half_span,
        right_pin: PinId(config.rotation.limit_pins[1]),
    };

    let release = SimulatedStepper::new(
        "release",
        config.release.clone(),
        release_layout,
        Arc::clone(lines),
        sim.realtime,
    );
    let rotation = SimulatedStepper::new(
        "rotation",
        config.rotation.clone(),
        rotation_layout,
        Arc::clone(lines),
        sim.realtime,
    );

    let rate = sim.realtime.then_some(sim.linear_units_per_sec);
    let incline = SimulatedLinear::new(
        "incline",
        sim.linear_stroke,
        sim.linear_start,
        rate,
    );
    let elevation = SimulatedLinear::new(
        "elevation",
        sim.linear_stroke,
        sim.linear_start,
        rate,
    );

    info!(
        "Simulated rig created (realtime={}, rotation span={} steps)",
        sim.realtime, sim.rotation_span_steps
    );

    Ok(Rig::new(
        config,
        Box::new(release),
        Box::new(rotation),
        Box::new(incline),
        Box::new(elevation),
    ))
}
