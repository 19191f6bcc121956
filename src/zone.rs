//! A fan zone: controllers, their shared cache and the fail-safe state.
//!
//! ```text
//!  update_fan_telemetry ─┐          ┌─▶ process_fans ─▶ fan outputs
//!  update_sensors ───────┼─▶ cache ─┤
//!                        │          └─▶ process_thermals ─▶ setpoints / ceilings
//!                        ▼                                      │
//!                  fail-safe set          determine_max_set_point_request
//! ```
//!
//! The zone exclusively owns its controllers, its [`SensorManager`] and all
//! mutable control state.  Controllers reach back into the zone only through
//! a short-lived [`ZoneInterface`] borrow during `process()`.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use log::{debug, warn};

use crate::control::{Controller, ZoneInterface};
use crate::diagnostics::{self, ZoneLog};
use crate::mode::ZoneMode;
use crate::safety::{FailSafeTracker, StaleReason};
use crate::sensors::SensorManager;

/// Where tuning runs look for a fixed RPM setpoint.
pub const DEFAULT_SETPOINT_OVERRIDE: &str = "/etc/thermal.d/setpoint";

/// Process-level options handed to every zone at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneOptions {
    /// Skip the fail-safe floor and honour the setpoint override file.
    pub tuning: bool,
    /// Override file; `None` means [`DEFAULT_SETPOINT_OVERRIDE`].
    pub setpoint_override: Option<PathBuf>,
    /// Directory for per-zone CSV logs.
    pub log_dir: Option<PathBuf>,
}

// ── Zone state ────────────────────────────────────────────────

/// The aggregation and bookkeeping half of a zone.
#[derive(Debug)]
pub struct ZoneState {
    zone_id: i64,
    min_thermal_output: f64,
    fail_safe_percent: f64,
    maximum_set_point: f64,
    cached: HashMap<String, f64>,
    fail_safe: FailSafeTracker,
    set_points: Vec<f64>,
    rpm_ceilings: Vec<f64>,
}

impl ZoneState {
    fn new(zone_id: i64, min_thermal_output: f64, fail_safe_percent: f64) -> Self {
        Self {
            zone_id,
            min_thermal_output,
            fail_safe_percent,
            maximum_set_point: 0.0,
            cached: HashMap::new(),
            fail_safe: FailSafeTracker::new(zone_id),
            set_points: Vec::new(),
            rpm_ceilings: Vec::new(),
        }
    }

    /// Read `name`, cache its value and update its fail-safe membership.
    /// Returns the value read.
    fn refresh(&mut self, sensors: &mut SensorManager, name: &str, now: Instant) -> Option<f64> {
        let Some((r, failed, timeout)) = sensors.read(name) else {
            self.fail_safe.mark_stale(name, StaleReason::Missing);
            return None;
        };

        self.cached.insert(name.to_owned(), r.value);

        // Whole seconds, like the timeout itself.
        let staleness = now.saturating_duration_since(r.updated).as_secs() as i64;

        if failed {
            self.fail_safe.mark_stale(name, StaleReason::Failed);
        } else if timeout != 0 && staleness >= timeout {
            self.fail_safe.mark_stale(name, StaleReason::Timeout);
        } else {
            self.fail_safe.mark_fresh(name);
        }
        Some(r.value)
    }
}

/// Borrowed view a controller sees while it runs.
struct ZoneContext<'a> {
    state: &'a mut ZoneState,
    sensors: &'a mut SensorManager,
    tuning: bool,
}

impl ZoneInterface for ZoneContext<'_> {
    fn cached_value(&self, name: &str) -> Option<f64> {
        self.state.cached.get(name).copied()
    }

    fn add_set_point(&mut self, value: f64) {
        self.state.set_points.push(value);
    }

    fn add_rpm_ceiling(&mut self, value: f64) {
        self.state.rpm_ceilings.push(value);
    }

    fn max_set_point_request(&self) -> f64 {
        self.state.maximum_set_point
    }

    fn fail_safe_mode(&self) -> bool {
        self.state.fail_safe.is_active()
    }

    fn fail_safe_percent(&self) -> f64 {
        self.state.fail_safe_percent
    }

    fn tuning_enabled(&self) -> bool {
        self.tuning
    }

    fn write_output(&mut self, name: &str, fraction: f64) {
        self.sensors.write(name, fraction);
    }
}

// ── Zone ──────────────────────────────────────────────────────

pub struct Zone {
    state: ZoneState,
    sensors: SensorManager,
    mode: ZoneMode,
    options: ZoneOptions,
    fans: Vec<Box<dyn Controller>>,
    thermals: Vec<Box<dyn Controller>>,
    fan_inputs: Vec<String>,
    thermal_inputs: Vec<String>,
    log: Option<ZoneLog>,
}

impl Zone {
    pub fn new(
        zone_id: i64,
        min_thermal_output: f64,
        fail_safe_percent: f64,
        sensors: SensorManager,
        options: ZoneOptions,
    ) -> Self {
        Self {
            state: ZoneState::new(zone_id, min_thermal_output, fail_safe_percent),
            sensors,
            mode: ZoneMode::new(zone_id),
            options,
            fans: Vec::new(),
            thermals: Vec::new(),
            fan_inputs: Vec::new(),
            thermal_inputs: Vec::new(),
            log: None,
        }
    }

    // ── Construction ──────────────────────────────────────────

    pub fn add_fan_pid(&mut self, controller: Box<dyn Controller>) {
        self.fans.push(controller);
    }

    pub fn add_thermal_pid(&mut self, controller: Box<dyn Controller>) {
        self.thermals.push(controller);
    }

    /// Register a fan input for telemetry.  Duplicates are ignored.
    pub fn add_fan_input(&mut self, name: &str) {
        if !self.fan_inputs.iter().any(|n| n == name) {
            self.fan_inputs.push(name.to_owned());
        }
    }

    /// Register a thermal input for telemetry.  Duplicates are ignored.
    pub fn add_thermal_input(&mut self, name: &str) {
        if !self.thermal_inputs.iter().any(|n| n == name) {
            self.thermal_inputs.push(name.to_owned());
        }
    }

    pub fn attach_log(&mut self, log: ZoneLog) {
        self.log = Some(log);
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn zone_id(&self) -> i64 {
        self.state.zone_id
    }

    pub fn min_thermal_setpoint(&self) -> f64 {
        self.state.min_thermal_output
    }

    pub fn fail_safe_percent(&self) -> f64 {
        self.state.fail_safe_percent
    }

    pub fn max_set_point_request(&self) -> f64 {
        self.state.maximum_set_point
    }

    pub fn fail_safe_mode(&self) -> bool {
        self.state.fail_safe.is_active()
    }

    pub fn is_stale(&self, name: &str) -> bool {
        self.state.fail_safe.is_stale(name)
    }

    pub fn manual_mode(&self) -> bool {
        self.mode.manual()
    }

    pub fn set_manual_mode(&self, value: bool) {
        self.mode.set_manual(value);
    }

    /// Handle for an external control surface.
    pub fn mode(&self) -> &ZoneMode {
        &self.mode
    }

    pub fn options(&self) -> &ZoneOptions {
        &self.options
    }

    pub fn cached_value(&self, name: &str) -> Option<f64> {
        self.state.cached.get(name).copied()
    }

    pub fn cache(&self) -> &HashMap<String, f64> {
        &self.state.cached
    }

    pub fn set_points(&self) -> &[f64] {
        &self.state.set_points
    }

    pub fn rpm_ceilings(&self) -> &[f64] {
        &self.state.rpm_ceilings
    }

    pub fn fan_inputs(&self) -> &[String] {
        &self.fan_inputs
    }

    pub fn thermal_inputs(&self) -> &[String] {
        &self.thermal_inputs
    }

    pub fn fan_controllers(&self) -> &[Box<dyn Controller>] {
        &self.fans
    }

    pub fn thermal_controllers(&self) -> &[Box<dyn Controller>] {
        &self.thermals
    }

    // ── Accumulators ──────────────────────────────────────────

    pub fn add_set_point(&mut self, value: f64) {
        self.state.set_points.push(value);
    }

    pub fn add_rpm_ceiling(&mut self, value: f64) {
        self.state.rpm_ceilings.push(value);
    }

    pub fn clear_set_points(&mut self) {
        self.state.set_points.clear();
    }

    pub fn clear_rpm_ceilings(&mut self) {
        self.state.rpm_ceilings.clear();
    }

    /// Highest setpoint, capped by the lowest ceiling, floored at the
    /// minimum thermal output.  Tuning runs may replace it from a file.
    pub fn determine_max_set_point_request(&mut self) {
        let st = &self.state;

        let mut max = st.set_points.iter().copied().reduce(f64::max).unwrap_or(0.0);

        if let Some(ceiling) = st.rpm_ceilings.iter().copied().reduce(f64::min) {
            max = max.min(ceiling);
        }

        max = max.max(st.min_thermal_output);

        if self.options.tuning {
            if let Some(value) = self.read_setpoint_override() {
                max = value;
            }
        }

        self.state.maximum_set_point = max;
    }

    fn read_setpoint_override(&self) -> Option<f64> {
        let path = self
            .options
            .setpoint_override
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETPOINT_OVERRIDE));
        let text = fs::read_to_string(&path).ok()?;
        match text.trim().parse::<i64>() {
            Ok(rpm) => Some(rpm as f64),
            Err(_) => {
                warn!("unable to parse setpoint from '{}'", path.display());
                None
            }
        }
    }

    // ── Telemetry ─────────────────────────────────────────────

    /// Seed every input to 0 and start it in fail-safe.
    pub fn initialize_cache(&mut self) {
        for name in self.fan_inputs.iter().chain(&self.thermal_inputs) {
            self.state.cached.insert(name.clone(), 0.0);
        }
        self.state
            .fail_safe
            .seed(self.fan_inputs.iter().chain(&self.thermal_inputs));
        self.mode.publish_fail_safe(self.fail_safe_mode());
    }

    /// Refresh fan tachometers.  Also opens the tick's log row.
    pub fn update_fan_telemetry(&mut self) {
        let now = Instant::now();
        if let Some(log) = self.log.as_mut() {
            log.begin_row(self.state.maximum_set_point);
        }

        for name in &self.fan_inputs {
            let value = self.state.refresh(&mut self.sensors, name, now);
            if let Some(log) = self.log.as_mut() {
                log.push(value.unwrap_or(0.0));
            }
        }

        if let Some(log) = self.log.as_mut() {
            for name in &self.thermal_inputs {
                log.push(self.state.cached.get(name).copied().unwrap_or(0.0));
            }
        }

        self.mode.publish_fail_safe(self.fail_safe_mode());
    }

    /// Refresh thermal inputs.
    pub fn update_sensors(&mut self) {
        let now = Instant::now();
        for name in &self.thermal_inputs {
            self.state.refresh(&mut self.sensors, name, now);
        }
        self.mode.publish_fail_safe(self.fail_safe_mode());
    }

    pub fn dump_cache(&self) {
        diagnostics::dump_cache(self.state.zone_id, &self.state.cached);
    }

    // ── Log ───────────────────────────────────────────────────

    pub fn initialize_log(&mut self) {
        if let Some(log) = self.log.as_mut() {
            log.header(&self.fan_inputs, &self.thermal_inputs);
        }
    }

    /// Close the tick's log row.
    pub fn finish_log_row(&mut self) {
        let fail_safe = self.fail_safe_mode();
        if let Some(log) = self.log.as_mut() {
            log.end_row(fail_safe);
        }
    }

    // ── Processing ────────────────────────────────────────────

    pub fn process_fans(&mut self) {
        let mut ctx = ZoneContext {
            state: &mut self.state,
            sensors: &mut self.sensors,
            tuning: self.options.tuning,
        };
        for controller in &mut self.fans {
            controller.process(&mut ctx);
        }
    }

    pub fn process_thermals(&mut self) {
        let mut ctx = ZoneContext {
            state: &mut self.state,
            sensors: &mut self.sensors,
            tuning: self.options.tuning,
        };
        for controller in &mut self.thermals {
            controller.process(&mut ctx);
        }
        debug!(
            "zone {}: {} setpoints, {} ceilings",
            self.state.zone_id,
            self.state.set_points.len(),
            self.state.rpm_ceilings.len()
        );
    }
}
