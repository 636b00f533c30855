//! Rig backend implementations.
//!
//! - [`simulation`] - Software rig for development and testing
//!
//! # Adding New Backends
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `StepperActuator` / `LinearActuator` for its actuators
//! 3. Expose a `create_rig` factory and register it in [`register_builtin`]

pub mod simulation;

use crate::driver_registry::RigRegistry;

/// Register every backend compiled into this binary.
pub fn register_builtin(registry: &mut RigRegistry) {
    registry.register("simulation", simulation::create_rig);
}
