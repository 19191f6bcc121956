//! Sensor layer: the boundary between the control core and hardware.
//!
//! ```text
//!   SysfsSensor / test mocks ──▶ Sensor trait ──▶ SensorManager ──▶ Zone
//! ```
//!
//! The zone only ever sees [`Sensor`] trait objects owned by its
//! [`SensorManager`].  Failures are reported through [`Sensor::failed`];
//! `read()` always returns the best value it has.

pub mod sysfs;

use std::collections::HashMap;
use std::time::Instant;

// ───────────────────────────────────────────────────────────────
// Sensor port
// ───────────────────────────────────────────────────────────────

/// A value together with the moment it was last refreshed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadReturn {
    pub value: f64,
    pub updated: Instant,
}

/// One readable (and for fans, writable) sensor.
pub trait Sensor {
    fn name(&self) -> &str;

    /// Latest value.  Must not block.
    fn read(&mut self) -> ReadReturn;

    /// Write a duty fraction in `0.0..=1.0`.  Input-only sensors ignore it.
    fn write(&mut self, fraction: f64);

    /// Whether the sensor itself reports a fault.
    fn failed(&self) -> bool {
        false
    }

    /// Staleness limit in seconds; 0 disables the check.
    fn timeout(&self) -> i64;
}

// ───────────────────────────────────────────────────────────────
// Per-zone sensor registry
// ───────────────────────────────────────────────────────────────

/// Name → sensor map owned by a single zone.
#[derive(Default)]
pub struct SensorManager {
    sensors: HashMap<String, Box<dyn Sensor>>,
}

impl SensorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sensor under its own name, replacing any previous entry.
    pub fn add(&mut self, sensor: Box<dyn Sensor>) {
        self.sensors.insert(sensor.name().to_owned(), sensor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sensors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Read a sensor along with its fault flag and timeout.
    pub fn read(&mut self, name: &str) -> Option<(ReadReturn, bool, i64)> {
        let sensor = self.sensors.get_mut(name)?;
        let r = sensor.read();
        Some((r, sensor.failed(), sensor.timeout()))
    }

    /// Write a duty fraction.  Unknown names are logged and skipped.
    pub fn write(&mut self, name: &str, fraction: f64) {
        match self.sensors.get_mut(name) {
            Some(sensor) => sensor.write(fraction),
            None => log::warn!("write to unknown sensor '{name}' dropped"),
        }
    }
}
