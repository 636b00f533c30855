//! Interrupt line table and limit-switch handler registration.
//!
//! Each external interrupt line carries at most one rising-edge handler,
//! attached once during startup and never replaced. A handler is the only
//! code that runs in interrupt context: it stores the pin that fired into
//! the owning actuator's [`LimitLatch`] and then raises the latch's
//! "limit reached" flag. It never blocks, allocates, logs or touches the
//! decoder and dispatcher.
//!
//! On the host, a hardware edge is modelled by [`InterruptLines::raise`],
//! which runs the handler synchronously on the calling thread. Callers on
//! other threads therefore preempt the main loop exactly like a real ISR.

use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, info};

use boccia_common::consts::MAX_INTERRUPT_PINS;
use boccia_common::limit::{LimitLatch, LimitSide, PinId};

use crate::rig::Rig;

/// Errors raised while attaching interrupt handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterruptError {
    #[error("{0} is not an interrupt-capable line (max {max})", max = MAX_INTERRUPT_PINS - 1)]
    PinOutOfRange(PinId),

    #[error("{0} already has a handler attached")]
    AlreadyAttached(PinId),
}

/// Rising-edge handler forwarding one limit switch to its actuator latch.
#[derive(Debug)]
pub struct LimitHandler {
    latch: Arc<LimitLatch>,
    pin: PinId,
    side: LimitSide,
}

impl LimitHandler {
    pub fn new(latch: Arc<LimitLatch>, pin: PinId, side: LimitSide) -> Self {
        Self { latch, pin, side }
    }

    pub fn side(&self) -> LimitSide {
        self.side
    }

    /// Interrupt context: record the pin, then notify.
    #[inline]
    fn on_rising_edge(&self) {
        self.latch.record_edge(self.pin);
        self.latch.limit_detected();
    }
}

/// Table of interrupt lines, indexed by pin number.
pub struct InterruptLines {
    handlers: Box<[OnceLock<LimitHandler>]>,
}

impl InterruptLines {
    pub fn new() -> Self {
        Self {
            handlers: (0..MAX_INTERRUPT_PINS).map(|_| OnceLock::new()).collect(),
        }
    }

    /// Attach the rising-edge handler of `pin`.
    ///
    /// # Errors
    /// - `PinOutOfRange` if `pin` is not below `MAX_INTERRUPT_PINS`
    /// - `AlreadyAttached` if the line already has a handler
    pub fn attach(&self, pin: PinId, handler: LimitHandler) -> Result<(), InterruptError> {
        let slot = self
            .handlers
            .get(pin.index())
            .ok_or(InterruptError::PinOutOfRange(pin))?;
        slot.set(handler)
            .map_err(|_| InterruptError::AlreadyAttached(pin))
    }

    /// Signal a rising edge on `pin`.
    ///
    /// Returns `false` when no handler is attached; the edge is lost, as it
    /// would be on hardware with the interrupt disabled.
    #[inline]
    pub fn raise(&self, pin: PinId) -> bool {
        match self.handlers.get(pin.index()).and_then(OnceLock::get) {
            Some(handler) => {
                handler.on_rising_edge();
                true
            }
            None => false,
        }
    }

    pub fn is_attached(&self, pin: PinId) -> bool {
        self.handlers
            .get(pin.index())
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Side of the switch wired to `pin`, if attached.
    pub fn side_of(&self, pin: PinId) -> Option<LimitSide> {
        self.handlers
            .get(pin.index())
            .and_then(OnceLock::get)
            .map(LimitHandler::side)
    }
}

impl Default for InterruptLines {
    fn default() -> Self {
        Self::new()
    }
}

/// Quiesce the limit sensors and attach the three limit-switch handlers.
///
/// Sensors are cleared while the motors are stationary before any handler
/// is attached, so no stale edge is latched at startup. The release
/// actuator attaches only its second configured pin; rotation attaches
/// left then right, both writing the rotation latch.
pub fn arm_limit_interrupts(rig: &mut Rig, lines: &InterruptLines) -> Result<(), InterruptError> {
    let wiring = rig.wiring;

    rig.release.clear_sensor_while_stopped(wiring.release);
    rig.rotation.clear_sensor_while_stopped(wiring.rotation_left);
    rig.rotation.clear_sensor_while_stopped(wiring.rotation_right);
    debug!("Limit sensors cleared");

    let release_latch = rig.release.limit_latch();
    let rotation_latch = rig.rotation.limit_latch();

    lines.attach(
        wiring.release,
        LimitHandler::new(release_latch, wiring.release, LimitSide::Single),
    )?;
    lines.attach(
        wiring.rotation_left,
        LimitHandler::new(
            Arc::clone(&rotation_latch),
            wiring.rotation_left,
            LimitSide::Left,
        ),
    )?;
    lines.attach(
        wiring.rotation_right,
        LimitHandler::new(rotation_latch, wiring.rotation_right, LimitSide::Right),
    )?;

    info!(
        "Limit interrupts attached: release={}, rotation left={}, right={}",
        wiring.release, wiring.rotation_left, wiring.rotation_right
    );
    Ok(())
}
