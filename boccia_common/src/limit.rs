//! Limit-switch state shared between interrupt handlers and the main loop.
//!
//! A [`LimitLatch`] is the only state an interrupt handler may touch. It
//! holds the identity of the most recently fired pin and a "limit reached"
//! flag, both as single-word atomics so neither side can observe a torn
//! value. It is state, not a queue: a later edge overwrites an earlier one.
//!
//! ## Write protocol
//!
//! The handler stores the pin first and raises the flag second (release
//! ordering). A reader that observes the flag with acquire ordering is
//! therefore guaranteed to see the pin of that edge or of a later one.
//!
//! ## Two writers, one field
//!
//! The rotation actuator has a left and a right switch whose handlers share
//! one latch. If both fire before the main loop reads it, the later store
//! wins and the identity of the earlier edge is lost. `edge_count` still
//! counts both edges so the loss is detectable.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crate::consts::NO_PIN;

/// External interrupt pin number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(pub u8);

impl PinId {
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pin {}", self.0)
    }
}

/// Which end stop of an actuator a switch guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitSide {
    /// Rotation left end stop.
    Left,
    /// Rotation right end stop.
    Right,
    /// The single release limit pin.
    Single,
}

/// Interrupt-safe latch of the last limit edge seen by one actuator.
#[derive(Debug)]
pub struct LimitLatch {
    active_pin: AtomicU8,
    limit_reached: AtomicBool,
    edge_count: AtomicU32,
}

impl LimitLatch {
    pub const fn new() -> Self {
        Self {
            active_pin: AtomicU8::new(NO_PIN),
            limit_reached: AtomicBool::new(false),
            edge_count: AtomicU32::new(0),
        }
    }

    /// Record the pin that fired. Interrupt context.
    #[inline]
    pub fn record_edge(&self, pin: PinId) {
        self.active_pin.store(pin.0, Ordering::Release);
        self.edge_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark the actuator's travel bound as reached. Interrupt context.
    #[inline]
    pub fn limit_detected(&self) {
        self.limit_reached.store(true, Ordering::Release);
    }

    /// Pin of the most recent edge, if any edge fired since the last clear.
    #[inline]
    pub fn active_pin(&self) -> Option<PinId> {
        match self.active_pin.load(Ordering::Acquire) {
            NO_PIN => None,
            pin => Some(PinId(pin)),
        }
    }

    #[inline]
    pub fn is_limit_reached(&self) -> bool {
        self.limit_reached.load(Ordering::Acquire)
    }

    /// Consume a pending limit notification.
    ///
    /// Returns the pin recorded with it; the pin itself stays latched.
    pub fn take_limit(&self) -> Option<PinId> {
        if self.limit_reached.swap(false, Ordering::AcqRel) {
            self.active_pin()
        } else {
            None
        }
    }

    /// Forget the recorded pin and any pending notification.
    ///
    /// Main loop only, while the actuator is stationary.
    pub fn clear(&self) {
        self.limit_reached.store(false, Ordering::Release);
        self.active_pin.store(NO_PIN, Ordering::Release);
    }

    /// Total edges recorded since construction.
    #[inline]
    pub fn edge_count(&self) -> u32 {
        self.edge_count.load(Ordering::Relaxed)
    }
}

impl Default for LimitLatch {
    fn default() -> Self {
        Self::new()
    }
}
