//! Boccia Common Library
//!
//! This crate provides the types shared between the rig firmware and any
//! tooling that speaks its serial protocol.
//!
//! # Module Structure
//!
//! - [`protocol`] - Integer command grammar (device selector + payload, calibration sub-protocol)
//! - [`actuator`] - Actuator driver traits and the errors they report
//! - [`limit`] - Interrupt-safe limit-switch latch shared with interrupt handlers
//! - [`config`] - Rig configuration loading and validation
//! - [`consts`] - Protocol and hardware constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use boccia_common::protocol::{Command, Device};
//!
//! let cmd = Command::decode(2045).unwrap();
//! assert_eq!(cmd, Command::Primary { device: Device::Rotation, payload: 45 });
//! ```

pub mod actuator;
pub mod config;
pub mod consts;
pub mod limit;
pub mod prelude;
pub mod protocol;
