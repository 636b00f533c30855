//! Dispatch and calibration behaviour against a recording rig.

mod common;

use boccia_common::actuator::ActuatorError;
use boccia_common::limit::PinId;
use boccia_common::protocol::{self, CalibrationSelector, Command, DecodeError, Device};
use boccia_firmware::interrupts::arm_limit_interrupts;
use boccia_firmware::{DispatchOutcome, Dispatcher, Operation};

use common::{Probe, recording_rig};

fn armed_dispatcher() -> (Dispatcher, Probe) {
    let (mut rig, probe) = recording_rig();
    arm_limit_interrupts(&mut rig, &probe.lines).unwrap();
    probe.shared.clear_calls();
    (Dispatcher::new(rig), probe)
}

fn run_raw(dispatcher: &mut Dispatcher, raw: i32) -> DispatchOutcome {
    match protocol::decode(raw) {
        Ok((device, payload)) => dispatcher.dispatch(device, payload),
        Err(e) => DispatchOutcome::Rejected(e),
    }
}

// ── Primary commands ──

#[test]
fn release_command_releases_once() {
    let (mut dispatcher, probe) = armed_dispatcher();
    let outcome = run_raw(&mut dispatcher, 1500);

    assert!(outcome.is_completed());
    assert_eq!(probe.shared.calls(), ["release.release_ball(500)"]);
}

#[test]
fn rotation_command_moves_degrees() {
    let (mut dispatcher, probe) = armed_dispatcher();
    run_raw(&mut dispatcher, 2045);
    assert_eq!(probe.shared.calls(), ["rotation.move_degrees(45)"]);
}

#[test]
fn incline_and_elevation_use_their_percentage_operations() {
    let (mut dispatcher, probe) = armed_dispatcher();
    run_raw(&mut dispatcher, 3075);
    run_raw(&mut dispatcher, 4030);
    assert_eq!(
        probe.shared.calls(),
        [
            "incline.move_by_percentage(75)",
            "elevation.move_by_percentage_range(30)"
        ]
    );
}

#[test]
fn negative_payload_reaches_the_driver_unchanged() {
    let (mut dispatcher, probe) = armed_dispatcher();
    run_raw(&mut dispatcher, -2045);
    assert_eq!(probe.shared.calls(), ["rotation.move_degrees(-45)"]);
}

#[test]
fn driver_range_rejection_is_surfaced_untranslated() {
    let (mut dispatcher, _probe) = armed_dispatcher();
    let outcome = run_raw(&mut dispatcher, 3150);
    assert_eq!(
        outcome,
        DispatchOutcome::Faulted {
            command: Command::Primary {
                device: Device::Incline,
                payload: 150
            },
            completed: 0,
            operation: Operation::InclineMoveByPercentage(150),
            error: ActuatorError::OutOfRange {
                value: 150,
                min: 0,
                max: 100
            },
        }
    );
}

// ── Calibration ──

#[test]
fn recalibrate_rotation_touches_rotation_only() {
    let (mut dispatcher, probe) = armed_dispatcher();
    let outcome = run_raw(&mut dispatcher, 8207);
    assert!(outcome.is_completed());
    assert_eq!(probe.shared.calls(), ["rotation.find_range()"]);
}

#[test]
fn single_step_calibrations() {
    let (mut dispatcher, probe) = armed_dispatcher();
    run_raw(&mut dispatcher, 8100);
    run_raw(&mut dispatcher, 8300);
    run_raw(&mut dispatcher, 8400);
    run_raw(&mut dispatcher, 8500);
    assert_eq!(
        probe.shared.calls(),
        [
            "release.move_degrees(800)",
            "incline.find_range()",
            "elevation.find_range()",
            "elevation.preset_range(20, 360)",
        ]
    );
}

#[test]
fn full_calibration_runs_chain_in_order() {
    let (mut dispatcher, probe) = armed_dispatcher();
    let outcome = run_raw(&mut dispatcher, 8700);

    assert!(matches!(
        outcome,
        DispatchOutcome::Completed { operations: 4, .. }
    ));
    assert_eq!(
        probe.shared.calls(),
        [
            "release.move_degrees(800)",
            "rotation.find_range()",
            "elevation.find_range()",
            "elevation.move_to_percentage_range(50)",
        ]
    );
}

#[test]
fn reset_to_defaults_runs_chain_in_order() {
    let (mut dispatcher, probe) = armed_dispatcher();
    dispatcher.run_calibration(CalibrationSelector::RecalibrateRotation);
    probe.shared.clear_calls();

    dispatcher.run_calibration(CalibrationSelector::ResetToDefaults);
    assert_eq!(
        probe.shared.calls(),
        [
            "release.move_degrees(800)",
            "rotation.move_to_middle()",
            "elevation.move_to_percentage_range(50)",
        ]
    );
}

#[test]
fn reset_to_defaults_is_idempotent() {
    let (mut dispatcher, probe) = armed_dispatcher();
    dispatcher.run_calibration(CalibrationSelector::FullCalibration);

    dispatcher.run_calibration(CalibrationSelector::ResetToDefaults);
    let first = probe.shared.snapshot();
    dispatcher.run_calibration(CalibrationSelector::ResetToDefaults);
    let second = probe.shared.snapshot();

    assert_eq!(first, second);
    assert_eq!(first.0.get("rotation"), Some(&0));
    assert_eq!(first.0.get("elevation"), Some(&50));
}

#[test]
fn reset_without_rotation_range_faults_the_same_way_twice() {
    let (mut dispatcher, probe) = armed_dispatcher();

    let first = dispatcher.run_calibration(CalibrationSelector::ResetToDefaults);
    let state = probe.shared.snapshot();
    let second = dispatcher.run_calibration(CalibrationSelector::ResetToDefaults);

    assert_eq!(first, second);
    assert_eq!(state, probe.shared.snapshot());
    assert!(matches!(
        first,
        DispatchOutcome::Faulted {
            completed: 1,
            operation: Operation::RotationMoveToMiddle,
            error: ActuatorError::NotCalibrated,
            ..
        }
    ));
}

#[test]
fn faulted_step_aborts_rest_of_chain() {
    let (mut dispatcher, probe) = armed_dispatcher();
    probe.shared.fail_on("rotation.find_range()");

    let outcome = run_raw(&mut dispatcher, 8700);

    assert!(matches!(
        outcome,
        DispatchOutcome::Faulted {
            completed: 1,
            operation: Operation::RotationFindRange,
            error: ActuatorError::Hardware(_),
            ..
        }
    ));
    // No retry, no rollback of the completed release move.
    assert_eq!(
        probe.shared.calls(),
        ["release.move_degrees(800)", "rotation.find_range()"]
    );
}

// ── Rejections ──

#[test]
fn unknown_device_touches_nothing() {
    let (mut dispatcher, probe) = armed_dispatcher();
    let outcome = run_raw(&mut dispatcher, 9999);
    assert_eq!(outcome, DispatchOutcome::Rejected(DecodeError::UnknownDevice(9)));
    assert!(probe.shared.calls().is_empty());
}

#[test]
fn unknown_calibration_selector_touches_nothing() {
    let (mut dispatcher, probe) = armed_dispatcher();
    for raw in [8000, 8600, 8900] {
        let outcome = run_raw(&mut dispatcher, raw);
        assert!(matches!(
            outcome,
            DispatchOutcome::Rejected(DecodeError::UnknownCalibrationSelector(_))
        ));
    }
    assert!(probe.shared.calls().is_empty());
}

// ── Limit events ──

#[test]
fn rotation_edge_during_incline_is_latched_without_affecting_incline() {
    let (mut dispatcher, probe) = armed_dispatcher();
    probe
        .shared
        .edge_during("incline.move_by_percentage(40)", PinId(3));

    let outcome = run_raw(&mut dispatcher, 3040);

    assert_eq!(
        outcome,
        DispatchOutcome::Completed {
            command: Command::Primary {
                device: Device::Incline,
                payload: 40
            },
            operations: 1,
            release_edge: None,
        }
    );
    assert_eq!(probe.rotation_latch.active_pin(), Some(PinId(3)));
    assert!(probe.rotation_latch.is_limit_reached());
    assert_eq!(probe.release_latch.active_pin(), None);
}

#[test]
fn later_rotation_edge_wins() {
    let (mut dispatcher, probe) = armed_dispatcher();
    probe
        .shared
        .edge_during("incline.move_by_percentage(10)", PinId(3));
    probe
        .shared
        .edge_during("incline.move_by_percentage(10)", PinId(19));

    run_raw(&mut dispatcher, 3010);

    assert_eq!(probe.rotation_latch.active_pin(), Some(PinId(19)));
    assert_eq!(probe.rotation_latch.edge_count(), 2);
}

#[test]
fn release_edge_is_reported_with_the_pin_that_fired() {
    let (mut dispatcher, probe) = armed_dispatcher();
    probe
        .shared
        .edge_during("release.release_ball(300)", PinId(2));

    let outcome = run_raw(&mut dispatcher, 1300);

    assert!(matches!(
        outcome,
        DispatchOutcome::Completed {
            release_edge: Some(PinId(2)),
            ..
        }
    ));
    // Consumed by the dispatch layer.
    assert!(!probe.release_latch.is_limit_reached());
}

#[test]
fn unattached_release_pin_edge_is_dropped() {
    let (mut dispatcher, probe) = armed_dispatcher();
    // Only the second release pin is wired to a handler.
    probe.shared.edge_during("release.release_ball(1)", PinId(0));

    let outcome = run_raw(&mut dispatcher, 1001);
    assert!(matches!(
        outcome,
        DispatchOutcome::Completed {
            release_edge: None,
            ..
        }
    ));
    assert_eq!(probe.release_latch.edge_count(), 0);
}
