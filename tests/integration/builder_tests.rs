//! Building zones from JSON on top of mock sensors, then running them.

use zonectl::builder::build_zones;
use zonectl::config::DaemonConfig;
use zonectl::error::{BuildError, Error};
use zonectl::scheduler::ControlLoop;
use zonectl::zone::ZoneOptions;

use crate::mock_hw::MockBank;

const CONFIG: &str = r#"{
    "sensors": [
        { "name": "fan0", "type": "fan", "writePath": "/sys/pwm0", "max": 255 },
        { "name": "fan1", "type": "fan", "writePath": "/sys/pwm1", "max": 255 },
        { "name": "cpu0", "type": "temp", "timeout": 0,
          "thresholds": { "criticalHigh": 90.0 } },
        { "name": "cpu1", "type": "temp", "timeout": 0,
          "thresholds": { "criticalHigh": 85.0 } },
        { "name": "inlet", "type": "temp", "timeout": 0 }
    ],
    "zones": [
        { "id": 0, "minThermalOutput": 2000.0, "failsafePercent": 90.0,
          "pids": [
            { "name": "fans", "type": "fan", "inputs": ["fan0", "fan1"],
              "pid": { "ts": 0.1, "proportionalCoeff": 0.0, "integralCoeff": 0.0,
                       "feedFwdOffset": 0.0, "feedFwdGain": 0.01,
                       "integralLimit": { "min": 0.0, "max": 0.0 },
                       "outLim": { "min": 0.0, "max": 100.0 },
                       "slewNeg": 0.0, "slewPos": 0.0 } },
            { "name": "cpu", "type": "margin", "inputs": ["cpu0", "cpu1"],
              "setpoint": -10.0, "setpointOffset": "CriticalHigh",
              "pid": { "ts": 1.0, "proportionalCoeff": 0.0, "integralCoeff": 0.0,
                       "feedFwdOffset": 0.0, "feedFwdGain": 100.0,
                       "integralLimit": { "min": 0.0, "max": 0.0 },
                       "outLim": { "min": 0.0, "max": 20000.0 },
                       "slewNeg": 0.0, "slewPos": 0.0 } },
            { "name": "inlet-cap", "type": "stepwise", "inputs": ["inlet"],
              "stepwise": { "ts": 1.0, "isCeiling": true,
                            "reading": [20.0, 35.0], "output": [9000.0, 6000.0] } }
          ] }
    ]
}"#;

#[test]
fn builds_and_runs_from_json() {
    let config = DaemonConfig::from_json(CONFIG).unwrap();
    let bank = MockBank::new();
    bank.set("fan0", 5000.0);
    bank.set("fan1", 5100.0);
    bank.set("cpu0", 10.0);
    bank.set("cpu1", 12.0);
    bank.set("inlet", 25.0);

    let mut zones = build_zones(&config, &ZoneOptions::default(), bank.factory()).unwrap();
    assert_eq!(zones.len(), 1);
    let zone = &mut zones[0];

    // The offset controller is split per input and named after it.
    let ids: Vec<_> = zone.thermal_controllers().iter().map(|c| c.id().to_owned()).collect();
    assert_eq!(ids, vec!["cpu0", "cpu1", "inlet-cap"]);

    let mut control = ControlLoop::new();
    control.start(zone);

    // Pure feed-forward: setpoints (-10 + 90) * 100 and (-10 + 85) * 100,
    // capped by the 9000 inlet ceiling.
    assert_eq!(zone.set_points(), [8000.0, 7500.0]);
    assert_eq!(zone.rpm_ceilings(), [9000.0]);
    assert_eq!(zone.max_set_point_request(), 8000.0);

    control.tick(zone);
    // Fan feed-forward: 8000 * 0.01 = 80 %.
    assert_eq!(bank.last_write("fan0"), Some(0.8));
    assert_eq!(bank.last_write("fan1"), Some(0.8));
    assert!(!zone.fail_safe_mode());
}

#[test]
fn fan_timeout_defaults_to_two_seconds() {
    let config = DaemonConfig::from_json(CONFIG).unwrap();
    assert_eq!(config.sensor("fan0").unwrap().timeout_secs(), 2);
    assert_eq!(config.sensor("cpu0").unwrap().timeout_secs(), 0);
}

#[test]
fn controller_without_inputs_aborts_whole_build() {
    let mut config = DaemonConfig::from_json(CONFIG).unwrap();
    config.zones[0].pids[2].inputs.clear();
    let bank = MockBank::new();
    let result = build_zones(&config, &ZoneOptions::default(), bank.factory());
    assert!(matches!(result, Err(Error::Build(BuildError::NoInputs { .. }))));
}

#[test]
fn oversized_stepwise_table_rejected() {
    let mut config = DaemonConfig::from_json(CONFIG).unwrap();
    let table = config.zones[0].pids[2].stepwise.as_mut().unwrap();
    table.reading = (0..30).map(f64::from).collect();
    table.output = (0..30).map(f64::from).collect();

    let bank = MockBank::new();
    let result = build_zones(&config, &ZoneOptions::default(), bank.factory());
    assert!(matches!(
        result,
        Err(Error::Build(BuildError::TooManyStepwisePoints { count: 30, .. }))
    ));
}
