//! # Boccia Rig Firmware
//!
//! Command decoder, dispatch engine and limit-event synchronisation for the
//! ball-release / rotate / incline / elevate rig.
//!
//! # Module Structure
//!
//! - [`controller`] - Polling main loop and operator echo
//! - [`dispatch`] - Dispatch table and calibration sequencer
//! - [`interrupts`] - Interrupt line table and limit-switch handlers
//! - [`port`] - Non-blocking line input
//! - [`rig`] - Actuator handles owned for the process lifetime
//! - [`driver_registry`] - Rig backend factory registration
//! - [`drivers`] - Rig backend implementations
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  line   ┌──────────────┐ Command ┌──────────────┐
//! │ InputPort  │────────►│  Controller  │────────►│  Dispatcher  │
//! └────────────┘         └──────────────┘         └──────┬───────┘
//!                                                        │ Operation
//!                                                        ▼
//! ┌────────────┐  edge   ┌──────────────┐  latch  ┌──────────────┐
//! │  switches  │────────►│InterruptLines│────────►│  Rig (4×)    │
//! └────────────┘         └──────────────┘         └──────────────┘
//! ```

pub mod controller;
pub mod dispatch;
pub mod driver_registry;
pub mod drivers;
pub mod error;
pub mod interrupts;
pub mod port;
pub mod rig;

pub use crate::controller::{Controller, LoopStats, PollResult};
pub use crate::dispatch::{DispatchOutcome, Dispatcher, Operation};
pub use crate::driver_registry::RigRegistry;
pub use crate::error::RigError;
pub use crate::interrupts::{InterruptLines, arm_limit_interrupts};
pub use crate::rig::Rig;
