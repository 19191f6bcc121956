//! Daemon configuration
//!
//! Sensors and zones as loaded from the JSON configuration file.  Parsing
//! only checks shape; [`DaemonConfig::validate`] checks structural sanity
//! and the builder checks everything that needs cross-references.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::control::pid::PidConfig;
use crate::control::stepwise::StepwiseConfig;
use crate::error::{BuildError, Error, Result};

/// Default staleness limit for fan tachometers, in seconds.
pub const DEFAULT_FAN_TIMEOUT_SECS: i64 = 2;

// --- Sensors ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Fan,
    Temp,
    Margin,
}

/// Threshold values a thermal controller may offset its setpoint by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorThresholds {
    #[serde(default)]
    pub warning_high: Option<f64>,
    #[serde(default)]
    pub warning_low: Option<f64>,
    #[serde(default)]
    pub critical_high: Option<f64>,
    #[serde(default)]
    pub critical_low: Option<f64>,
}

impl SensorThresholds {
    /// Look up a threshold by its configured name.
    ///
    /// `Err` for names that are not thresholds at all; `Ok(0.0)` for a
    /// known threshold this sensor does not define.
    pub fn by_name(&self, name: &str) -> core::result::Result<f64, BuildError> {
        let value = match name {
            "WarningHigh" => self.warning_high,
            "WarningLow" => self.warning_low,
            "CriticalHigh" => self.critical_high,
            "CriticalLow" => self.critical_low,
            other => return Err(BuildError::UnsupportedThreshold(other.to_owned())),
        };
        Ok(value.unwrap_or(0.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SensorKind,
    #[serde(default)]
    pub read_path: String,
    #[serde(default)]
    pub write_path: String,
    #[serde(default)]
    pub min: i64,
    #[serde(default)]
    pub max: i64,
    /// Seconds; `None` picks the per-kind default, 0 disables the check.
    #[serde(default)]
    pub timeout: Option<i64>,
    #[serde(default)]
    pub ignore_dbus_min_max: bool,
    #[serde(default)]
    pub thresholds: SensorThresholds,
}

impl SensorConfig {
    pub fn timeout_secs(&self) -> i64 {
        self.timeout.unwrap_or(match self.kind {
            SensorKind::Fan => DEFAULT_FAN_TIMEOUT_SECS,
            SensorKind::Temp | SensorKind::Margin => 0,
        })
    }
}

// --- Controllers and zones ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Fan,
    Margin,
    Temp,
    Stepwise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ControllerKind,
    pub inputs: Vec<String>,
    /// Ignored by fan controllers.
    #[serde(default)]
    pub setpoint: f64,
    /// Threshold name added to the setpoint, read from each input sensor.
    #[serde(default)]
    pub setpoint_offset: Option<String>,
    #[serde(default)]
    pub pid: Option<PidConfig>,
    #[serde(default)]
    pub stepwise: Option<StepwiseConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneConfig {
    pub id: i64,
    /// Floor for the zone's final fan setpoint.
    pub min_thermal_output: f64,
    /// Fan duty (0-100) while the zone is in fail-safe.
    pub failsafe_percent: f64,
    pub pids: Vec<ControllerConfig>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub sensors: Vec<SensorConfig>,
    pub zones: Vec<ZoneConfig>,
}

impl DaemonConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn sensor(&self, name: &str) -> Option<&SensorConfig> {
        self.sensors.iter().find(|s| s.name == name)
    }

    /// Structural checks that need no cross-referencing.
    pub fn validate(&self) -> Result<()> {
        if self.zones.is_empty() {
            return Err(BuildError::NoZones.into());
        }

        let mut seen = BTreeSet::new();
        for zone in &self.zones {
            if !seen.insert(zone.id) {
                return Err(BuildError::DuplicateZone(zone.id).into());
            }
            if !(0.0..=100.0).contains(&zone.failsafe_percent) {
                return Err(Error::Config(format!(
                    "zone {}: failsafePercent {} outside 0-100",
                    zone.id, zone.failsafe_percent
                )));
            }
        }

        let mut names = BTreeSet::new();
        for sensor in &self.sensors {
            if !names.insert(sensor.name.as_str()) {
                return Err(Error::Config(format!("sensor '{}' defined twice", sensor.name)));
            }
        }
        Ok(())
    }
}
