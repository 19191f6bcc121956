//! Thermal PID: turns temperature or margin readings into a zone setpoint.

use super::pid::PidConfig;
use super::{pid_process, Controller, PidController, PidCore, ZoneInterface};

/// How a thermal controller reads its sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermalType {
    /// Distance below a limit; the smallest input is the most urgent.
    Margin,
    /// Plain temperature; the hottest input dominates.
    Absolute,
}

impl ThermalType {
    /// Map a configured controller type. `temp` is absolute.
    pub fn from_config(kind: &str) -> Option<Self> {
        match kind {
            "margin" => Some(Self::Margin),
            "temp" | "absolute" => Some(Self::Absolute),
            _ => None,
        }
    }
}

pub struct ThermalController {
    id: String,
    inputs: Vec<String>,
    core: PidCore,
    kind: ThermalType,
}

impl ThermalController {
    /// Returns `None` when `inputs` is empty.
    pub fn new(
        id: impl Into<String>,
        inputs: Vec<String>,
        setpoint: f64,
        config: PidConfig,
        kind: ThermalType,
    ) -> Option<Self> {
        if inputs.is_empty() {
            return None;
        }
        Some(Self {
            id: id.into(),
            inputs,
            core: PidCore::new(setpoint, config),
            kind,
        })
    }

    pub fn kind(&self) -> ThermalType {
        self.kind
    }

    pub fn setpoint(&self) -> f64 {
        self.core.setpoint
    }
}

impl Controller for ThermalController {
    fn id(&self) -> &str {
        &self.id
    }

    fn inputs(&self) -> &[String] {
        &self.inputs
    }

    fn input_proc(&mut self, zone: &dyn ZoneInterface) -> f64 {
        let values = self.inputs.iter().filter_map(|name| zone.cached_value(name));
        let picked = match self.kind {
            ThermalType::Margin => values.reduce(f64::min),
            ThermalType::Absolute => values.reduce(f64::max),
        };
        picked.unwrap_or(0.0)
    }

    fn output_proc(&mut self, zone: &mut dyn ZoneInterface, value: f64) {
        zone.add_set_point(value);
    }

    fn process(&mut self, zone: &mut dyn ZoneInterface) {
        pid_process(self, zone);
    }
}

impl PidController for ThermalController {
    fn setpt_proc(&mut self, _zone: &dyn ZoneInterface) -> f64 {
        self.core.setpoint
    }

    fn core(&self) -> &PidCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PidCore {
        &mut self.core
    }
}
