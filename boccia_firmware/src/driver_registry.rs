//! Registry of rig backends.
//!
//! A backend is a factory that builds the four actuator handles from the
//! rig configuration. The registry is constructed at startup, populated via
//! `register()`, and consulted once to build the rig.

use std::collections::HashMap;
use std::sync::Arc;

use boccia_common::config::RigConfig;

use crate::error::RigError;
use crate::interrupts::InterruptLines;
use crate::rig::Rig;

/// Builds a rig whose actuators raise limit edges on `lines`.
pub type RigFactory = fn(&RigConfig, &Arc<InterruptLines>) -> Result<Rig, RigError>;

/// Registry of available rig backends.
pub struct RigRegistry {
    factories: HashMap<&'static str, RigFactory>,
}

impl RigRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory.
    ///
    /// # Panics
    /// Panics if a backend with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: RigFactory) {
        if self.factories.contains_key(name) {
            panic!("Rig backend '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Build the rig of backend `name`.
    ///
    /// # Errors
    /// Returns `RigError::BackendNotFound` if no backend with the given name is registered.
    pub fn build(
        &self,
        name: &str,
        config: &RigConfig,
        lines: &Arc<InterruptLines>,
    ) -> Result<Rig, RigError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RigError::BackendNotFound(name.to_string()))?;
        factory(config, lines)
    }

    /// Registered backend names, sorted.
    pub fn list_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for RigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{register_builtin, simulation};

    fn failing_backend(_: &RigConfig, _: &Arc<InterruptLines>) -> Result<Rig, RigError> {
        Err(RigError::BackendNotFound("hardware".to_string()))
    }

    #[test]
    fn builtin_simulation_builds_stock_rig() {
        let mut reg = RigRegistry::new();
        register_builtin(&mut reg);

        let lines = Arc::new(InterruptLines::new());
        let rig = reg
            .build("simulation", &RigConfig::default(), &lines)
            .expect("should build");
        assert_eq!(rig.release.name(), "release");
        assert_eq!(rig.elevation.name(), "elevation");
    }

    #[test]
    fn unknown_backend_is_an_error() {
        let reg = RigRegistry::new();
        let lines = Arc::new(InterruptLines::new());
        let result = reg.build("ethercat", &RigConfig::default(), &lines);
        assert!(matches!(result, Err(RigError::BackendNotFound(name)) if name == "ethercat"));
    }

    #[test]
    fn list_backends_is_sorted() {
        let mut reg = RigRegistry::new();
        reg.register("simulation", simulation::create_rig);
        reg.register("bench", failing_backend);
        assert_eq!(reg.list_backends(), vec!["bench", "simulation"]);
    }

    #[test]
    fn invalid_config_is_rejected_by_simulation() {
        let mut config = RigConfig::default();
        config.controller.poll_interval_ms = 0;
        let lines = Arc::new(InterruptLines::new());
        assert!(matches!(
            simulation::create_rig(&config, &lines),
            Err(RigError::Config(_))
        ));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_panics() {
        let mut reg = RigRegistry::new();
        reg.register("dup", failing_backend);
        reg.register("dup", failing_backend);
    }
}
