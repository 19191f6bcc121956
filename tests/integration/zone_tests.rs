//! Zone behaviour against mock sensors: fail-safe tracking, caching and
//! the fan fail-safe floor.

use std::time::Duration;

use zonectl::control::fan::FanController;
use zonectl::control::pid::{Limits, PidConfig};
use zonectl::control::stepwise::{StepwiseConfig, StepwiseInfo};
use zonectl::control::stepwise_controller::StepwiseController;
use zonectl::control::thermal::{ThermalController, ThermalType};
use zonectl::zone::{Zone, ZoneOptions};

use crate::mock_hw::MockBank;

/// PID that always commands `percent` (feed-forward free, zero gains,
/// output floor at `percent`).
fn constant_pid(percent: f64) -> PidConfig {
    PidConfig {
        ts: 0.1,
        out_lim: Limits::new(percent, 100.0),
        ..PidConfig::default()
    }
}

fn fan_zone(bank: &MockBank, fail_safe_percent: f64) -> Zone {
    let sensors = bank.manager(&[("fan0", 2), ("fan1", 2)]);
    let mut zone = Zone::new(1, 0.0, fail_safe_percent, sensors, ZoneOptions::default());
    let fans = FanController::new("fans", vec!["fan0".into(), "fan1".into()], constant_pid(20.0)).unwrap();
    zone.add_fan_input("fan0");
    zone.add_fan_input("fan1");
    zone.add_fan_pid(Box::new(fans));
    zone
}

#[test]
fn fan_zone_fail_safe_lifecycle() {
    let bank = MockBank::new();
    let mut zone = fan_zone(&bank, 75.0);

    zone.initialize_cache();
    assert!(zone.fail_safe_mode());
    assert!(zone.mode().fail_safe());

    bank.set("fan0", 4000.0);
    bank.set("fan1", 4100.0);
    zone.update_fan_telemetry();
    assert!(!zone.fail_safe_mode());
    assert!(!zone.mode().fail_safe());
    assert_eq!(zone.cached_value("fan1"), Some(4100.0));

    bank.set_aged("fan1", 4100.0, Duration::from_secs(5));
    zone.update_fan_telemetry();
    assert!(zone.fail_safe_mode());
    assert!(zone.is_stale("fan1"));
    assert!(!zone.is_stale("fan0"));

    bank.set("fan1", 4050.0);
    zone.update_fan_telemetry();
    assert!(!zone.fail_safe_mode());
}

#[test]
fn failed_sensor_enters_fail_safe_even_when_fresh() {
    let bank = MockBank::new();
    let mut zone = fan_zone(&bank, 75.0);
    zone.initialize_cache();

    bank.set("fan0", 4000.0);
    bank.set("fan1", 4000.0);
    bank.set_failed("fan0", true);
    zone.update_fan_telemetry();

    assert!(zone.is_stale("fan0"));
    assert!(zone.fail_safe_mode());
    // The value is still cached even though it is not trusted.
    assert_eq!(zone.cached_value("fan0"), Some(4000.0));
}

#[test]
fn zero_timeout_never_goes_stale() {
    let bank = MockBank::new();
    let sensors = bank.manager(&[("temp0", 0)]);
    let mut zone = Zone::new(2, 0.0, 100.0, sensors, ZoneOptions::default());
    zone.add_thermal_input("temp0");
    zone.initialize_cache();

    bank.set_aged("temp0", 40.0, Duration::from_secs(3600));
    zone.update_sensors();
    assert!(!zone.fail_safe_mode());
}

#[test]
fn fail_safe_floor_applies_to_every_fan() {
    let bank = MockBank::new();
    let mut zone = fan_zone(&bank, 75.0);
    zone.initialize_cache();

    // Still in fail-safe: 20 % is raised to 75 %.
    zone.process_fans();
    assert_eq!(bank.last_write("fan0"), Some(0.75));
    assert_eq!(bank.last_write("fan1"), Some(0.75));

    bank.set("fan0", 4000.0);
    bank.set("fan1", 4000.0);
    zone.update_fan_telemetry();
    zone.process_fans();
    assert_eq!(bank.last_write("fan0"), Some(0.2));
    assert_eq!(bank.last_write("fan1"), Some(0.2));
}

#[test]
fn timed_out_thermal_input_raises_fan_floor() {
    let bank = MockBank::new();
    let sensors = bank.manager(&[("fan0", 2), ("temp0", 2)]);
    let mut zone = Zone::new(4, 0.0, 75.0, sensors, ZoneOptions::default());
    let fans = FanController::new("fans", vec!["fan0".into()], constant_pid(20.0)).unwrap();
    zone.add_fan_input("fan0");
    zone.add_fan_pid(Box::new(fans));
    zone.add_thermal_input("temp0");
    zone.initialize_cache();

    bank.set("fan0", 4000.0);
    bank.set("temp0", 40.0);
    zone.update_fan_telemetry();
    zone.update_sensors();
    assert!(!zone.fail_safe_mode());
    zone.process_fans();
    assert_eq!(bank.last_write("fan0"), Some(0.2));

    // Thermal reading stops updating; fans keep reporting.
    bank.set_aged("temp0", 40.0, Duration::from_secs(5));
    zone.update_sensors();
    assert!(zone.is_stale("temp0"));
    assert!(!zone.is_stale("fan0"));
    assert!(zone.fail_safe_mode());
    assert!(zone.mode().fail_safe());

    zone.update_fan_telemetry();
    assert!(zone.mode().fail_safe());
    zone.process_fans();
    assert_eq!(bank.last_write("fan0"), Some(0.75));

    bank.set("temp0", 41.0);
    zone.update_sensors();
    assert!(!zone.fail_safe_mode());
    assert!(!zone.mode().fail_safe());
    zone.process_fans();
    assert_eq!(bank.last_write("fan0"), Some(0.2));
}

#[test]
fn fail_safe_floor_keeps_higher_commands() {
    let bank = MockBank::new();
    let mut zone = fan_zone(&bank, 10.0);
    zone.initialize_cache();
    zone.process_fans();
    assert_eq!(bank.writes("fan0"), vec![0.2]);
}

#[test]
fn thermal_pass_feeds_fan_setpoint() {
    let bank = MockBank::new();
    let sensors = bank.manager(&[("fan0", 2), ("temp0", 0), ("temp1", 0)]);
    let mut zone = Zone::new(3, 1000.0, 100.0, sensors, ZoneOptions::default());

    // setpoint = (input + 0) * 100 so a 45 degree reading asks for 4500.
    let thermal = ThermalController::new(
        "cpu",
        vec!["temp0".into()],
        0.0,
        PidConfig {
            ts: 1.0,
            proportional_coeff: -100.0,
            out_lim: Limits::new(0.0, 10_000.0),
            ..PidConfig::default()
        },
        ThermalType::Absolute,
    )
    .unwrap();
    let ceiling = StepwiseController::new(
        "ambient",
        vec!["temp1".into()],
        StepwiseInfo::from_config(
            "ambient",
            &StepwiseConfig {
                is_ceiling: true,
                reading: vec![0.0, 30.0],
                output: vec![8000.0, 4000.0],
                ..StepwiseConfig::default()
            },
        )
        .unwrap(),
    )
    .unwrap();
    zone.add_thermal_input("temp0");
    zone.add_thermal_input("temp1");
    zone.add_thermal_pid(Box::new(thermal));
    zone.add_thermal_pid(Box::new(ceiling));
    zone.initialize_cache();

    bank.set("temp0", 45.0);
    bank.set("temp1", 20.0);
    zone.update_sensors();
    zone.clear_set_points();
    zone.clear_rpm_ceilings();
    zone.process_thermals();
    zone.determine_max_set_point_request();
    assert_eq!(zone.set_points(), [4500.0]);
    assert_eq!(zone.rpm_ceilings(), [8000.0]);
    assert_eq!(zone.max_set_point_request(), 4500.0);

    // Hot ambient lowers the ceiling below the request.
    bank.set("temp1", 35.0);
    zone.update_sensors();
    zone.clear_set_points();
    zone.clear_rpm_ceilings();
    zone.process_thermals();
    zone.determine_max_set_point_request();
    assert_eq!(zone.max_set_point_request(), 4000.0);
}
