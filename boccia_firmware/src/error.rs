//! Startup and I/O errors of the rig controller.

use boccia_common::config::ConfigError;
use thiserror::Error;

use crate::interrupts::InterruptError;

/// Errors that stop the controller from starting or running.
///
/// Per-command decode and actuator errors never appear here; the main loop
/// reports them and keeps polling.
#[derive(Debug, Error)]
pub enum RigError {
    /// No rig backend registered under the requested name.
    #[error("Rig backend '{0}' not found")]
    BackendNotFound(String),

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An interrupt handler could not be attached.
    #[error(transparent)]
    Interrupt(#[from] InterruptError),

    /// Input port or echo output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
