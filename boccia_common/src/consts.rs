//! Protocol and hardware constants for the Boccia rig.
//!
//! Single source of truth for the command encoding bases and the default
//! controller timing. Imported by all crates.

use static_assertions::const_assert;

/// Multiplier of the primary device selector: `raw = device_code * 1000 + payload`.
pub const DEVICE_SELECT_BASE: i32 = 1000;

/// Multiplier of the calibration selector inside a calibration payload:
/// `payload = calibration_code * 100 + sub_payload`.
pub const CALIBRATION_SELECT_BASE: i32 = 100;

/// Default polling period of the main loop in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Number of external interrupt lines the controller can attach handlers to.
pub const MAX_INTERRUPT_PINS: usize = 64;

/// Sentinel stored in a limit latch before any edge has fired.
pub const NO_PIN: u8 = u8::MAX;

/// Maximum accepted length of one command line in bytes (excluding terminator).
pub const MAX_LINE_LEN: usize = 32;

/// Midpoint used by the calibration chains when parking the elevation actuator.
pub const ELEVATION_PARK_PERCENT: i32 = 50;

/// Prompt printed whenever the controller is ready for the next command.
pub const READY_PROMPT: &str = "Select motor and movement...";

// Every attachable pin must be distinguishable from the "no edge yet" sentinel.
const_assert!(MAX_INTERRUPT_PINS <= NO_PIN as usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(DEVICE_SELECT_BASE > CALIBRATION_SELECT_BASE);
        assert_eq!(DEVICE_SELECT_BASE % CALIBRATION_SELECT_BASE, 0);
        assert!(DEFAULT_POLL_INTERVAL_MS > 0);
        assert!((0..=100).contains(&ELEVATION_PARK_PERCENT));
    }

    #[test]
    fn longest_command_fits_line_buffer() {
        // "-2147483648" is the longest decimal i32.
        assert!(i32::MIN.to_string().len() <= MAX_LINE_LEN);
    }
}
