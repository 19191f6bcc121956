//! Mock sensor layer for integration tests.
//!
//! A [`MockBank`] hands out [`MockSensor`]s that share state with the
//! bank, so a test can change readings, age timestamps or flip fault flags
//! after the zone took ownership of the sensors, and inspect every write.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use zonectl::builder::SensorResult;
use zonectl::config::SensorConfig;
use zonectl::sensors::{ReadReturn, Sensor, SensorManager};

// ── Shared sensor state ───────────────────────────────────────

#[derive(Debug)]
pub struct MockState {
    pub value: f64,
    pub updated: Instant,
    pub failed: bool,
    pub timeout: i64,
    pub reads: usize,
    pub writes: Vec<f64>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            value: 0.0,
            updated: Instant::now(),
            failed: false,
            timeout: 0,
            reads: 0,
            writes: Vec::new(),
        }
    }
}

// ── MockSensor ────────────────────────────────────────────────

pub struct MockSensor {
    name: String,
    state: Rc<RefCell<MockState>>,
}

impl Sensor for MockSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self) -> ReadReturn {
        let mut s = self.state.borrow_mut();
        s.reads += 1;
        ReadReturn {
            value: s.value,
            updated: s.updated,
        }
    }

    fn write(&mut self, fraction: f64) {
        self.state.borrow_mut().writes.push(fraction);
    }

    fn failed(&self) -> bool {
        self.state.borrow().failed
    }

    fn timeout(&self) -> i64 {
        self.state.borrow().timeout
    }
}

// ── MockBank ──────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockBank {
    sensors: Rc<RefCell<HashMap<String, Rc<RefCell<MockState>>>>>,
}

#[allow(dead_code)]
impl MockBank {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self, name: &str) -> Rc<RefCell<MockState>> {
        Rc::clone(self.sensors.borrow_mut().entry(name.to_owned()).or_default())
    }

    /// Create a sensor sharing state with the bank.
    pub fn sensor(&self, name: &str, timeout: i64) -> Box<dyn Sensor> {
        let state = self.state(name);
        state.borrow_mut().timeout = timeout;
        Box::new(MockSensor {
            name: name.to_owned(),
            state,
        })
    }

    /// A manager holding one sensor per `(name, timeout)`.
    pub fn manager(&self, sensors: &[(&str, i64)]) -> SensorManager {
        let mut mgr = SensorManager::new();
        for (name, timeout) in sensors {
            mgr.add(self.sensor(name, *timeout));
        }
        mgr
    }

    /// Sensor factory for `builder::build_zones`.
    pub fn factory(&self) -> impl FnMut(&SensorConfig) -> SensorResult + '_ {
        move |cfg| Ok(self.sensor(&cfg.name, cfg.timeout_secs()))
    }

    /// Fresh reading stamped now.
    pub fn set(&self, name: &str, value: f64) {
        let state = self.state(name);
        let mut s = state.borrow_mut();
        s.value = value;
        s.updated = Instant::now();
    }

    /// Reading last updated `age` ago.
    pub fn set_aged(&self, name: &str, value: f64, age: Duration) {
        let state = self.state(name);
        let mut s = state.borrow_mut();
        s.value = value;
        s.updated = Instant::now().checked_sub(age).expect("host uptime shorter than test age");
    }

    pub fn set_failed(&self, name: &str, failed: bool) {
        self.state(name).borrow_mut().failed = failed;
    }

    pub fn writes(&self, name: &str) -> Vec<f64> {
        self.state(name).borrow().writes.clone()
    }

    pub fn last_write(&self, name: &str) -> Option<f64> {
        self.state(name).borrow().writes.last().copied()
    }

    pub fn reads(&self, name: &str) -> usize {
        self.state(name).borrow().reads
    }
}

// ── Log capture ───────────────────────────────────────────────

/// `Write` sink whose bytes stay readable after the zone took it.
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

#[allow(dead_code)]
impl SharedBuf {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
