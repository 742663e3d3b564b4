//! Clock state acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Counters return to their start after advancing and retreating equally
//! - Out-of-range assignments leave every counter untouched
//! - A tick carries seconds into minutes and minutes into hours like an odometer
//! - Hand angles move continuously with the smaller units
//! - The alarm matches only its own minute and can be disarmed repeatedly

use super::common::{assert_angle, clock_at, wall};
use clock_common::error::ClockError;
use clock_common::snapshot::Command;
use clock_core::{ClockState, CyclicCounter};

#[test]
fn counter_round_trip_law() {
    for modulus in [1, 12, 60, 1000] {
        let mut counter = CyclicCounter::new(modulus).unwrap();
        counter.set_value(modulus / 2).unwrap();
        let start = counter.value();
        for steps in [0, 1, 59, 60, 61, 719, 86_400, u32::MAX] {
            counter.advance(steps);
            counter.retreat(steps);
            assert_eq!(counter.value(), start, "modulus {modulus}, steps {steps}");
        }
    }
}

#[test]
fn counter_set_value_law() {
    let mut counter = CyclicCounter::new(60).unwrap();
    for v in 0..60 {
        counter.set_value(v).unwrap();
        assert_eq!(counter.value(), v);
    }
    for v in [60, 61, u32::MAX] {
        assert!(counter.set_value(v).is_err());
        assert_eq!(counter.value(), 59);
    }
    assert_eq!(CyclicCounter::new(0), Err(ClockError::ZeroModulus));
}

#[test]
fn full_cascade_at_midnight() {
    let mut clock = clock_at(11, 59, 59);
    clock.tick();
    assert_eq!(clock.time(), (0, 0, 0));
}

#[test]
fn partial_cascade_stops_at_minutes() {
    let mut clock = clock_at(3, 5, 59);
    clock.tick();
    assert_eq!(clock.time(), (3, 6, 0));
}

#[test]
fn twelve_hours_of_ticks_return_to_start() {
    let mut clock = clock_at(4, 17, 33);
    for _ in 0..12 * 60 * 60 {
        clock.tick();
    }
    assert_eq!(clock.time(), (4, 17, 33));
}

#[test]
fn angle_reference_points() {
    let angles = clock_at(0, 0, 0).derive_angles();
    assert_angle(angles.hour, 0.0);
    assert_angle(angles.minute, 0.0);
    assert_angle(angles.second, 0.0);

    assert_angle(clock_at(6, 0, 0).derive_angles().hour, 180.0);

    let angles = clock_at(0, 30, 0).derive_angles();
    assert_angle(angles.minute, 180.0);
    assert_angle(angles.hour, 15.0);
}

#[test]
fn angles_stay_in_range_over_a_day() {
    let mut clock = ClockState::new();
    for _ in 0..24 * 60 * 60 {
        clock.tick();
        let angles = clock.derive_angles();
        for angle in [angles.hour, angles.minute, angles.second] {
            assert!((0.0..360.0).contains(&angle), "angle {angle} out of range");
        }
    }
}

#[test]
fn alarm_matching_and_idempotent_deactivate() {
    let mut clock = ClockState::new();
    clock.set_alarm(9, 30).unwrap();
    assert!(clock.check_alarm(9, 30));
    assert!(!clock.check_alarm(9, 31));

    clock.deactivate_alarm();
    assert!(!clock.check_alarm(9, 30));
    clock.deactivate_alarm();
    assert!(!clock.is_alarm_active());
}

#[test]
fn invalid_alarm_leaves_state_unchanged() {
    let mut clock = ClockState::new();
    clock.set_alarm(7, 15).unwrap();
    let before = clock.clone();

    assert!(clock.set_alarm(24, 0).is_err());
    assert_eq!(clock, before);
    assert!(clock.check_alarm(7, 15));
}

#[test]
fn invalid_set_time_is_all_or_nothing() {
    let mut clock = clock_at(1, 2, 3);
    assert!(clock.set_time(4, 5, 60).is_err());
    assert_eq!(clock.time(), (1, 2, 3));
}

#[test]
fn set_time_command_folds_hour_onto_dial() {
    let mut clock = ClockState::new();
    clock
        .apply_command(
            &Command::SetTime {
                hour: 15,
                minute: 4,
                second: 5,
            },
            wall(0, 0, 0),
        )
        .unwrap();
    assert_eq!(clock.time(), (3, 4, 5));
}

#[test]
fn snapshot_reports_alarm_against_wall_clock() {
    let mut clock = clock_at(0, 0, 0);
    clock.set_alarm(21, 45).unwrap();

    assert!(clock.snapshot(wall(21, 45, 10)).alarm_active);
    assert!(!clock.snapshot(wall(9, 45, 10)).alarm_active);
}
