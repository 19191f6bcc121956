//! Fuzz target: configuration loading and zone building
//!
//! Feeds arbitrary text to the JSON loader and, when it parses, builds
//! zones on sensors that never touch the filesystem.  Building must either
//! succeed or return an error; it must never panic.
//!
//! cargo fuzz run fuzz_config

#![no_main]

use std::time::Instant;

use libfuzzer_sys::fuzz_target;
use zonectl::builder::build_zones;
use zonectl::config::DaemonConfig;
use zonectl::sensors::{ReadReturn, Sensor};
use zonectl::zone::ZoneOptions;

struct NullSensor(String);

impl Sensor for NullSensor {
    fn name(&self) -> &str {
        &self.0
    }
    fn read(&mut self) -> ReadReturn {
        ReadReturn {
            value: 0.0,
            updated: Instant::now(),
        }
    }
    fn write(&mut self, _fraction: f64) {}
    fn timeout(&self) -> i64 {
        0
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = DaemonConfig::from_json(text) else {
        return;
    };

    if let Ok(mut zones) = build_zones(&config, &ZoneOptions::default(), |cfg| {
        Ok(Box::new(NullSensor(cfg.name.clone())))
    }) {
        // A freshly built zone must survive a full thermal and fan pass.
        for zone in &mut zones {
            zone.initialize_cache();
            zone.update_sensors();
            zone.process_thermals();
            zone.determine_max_set_point_request();
            zone.update_fan_telemetry();
            zone.process_fans();
        }
    }
});
