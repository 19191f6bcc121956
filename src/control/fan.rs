//! Fan PID: drives tachometer readings toward the zone's setpoint.

use log::debug;

use super::pid::PidConfig;
use super::{pid_process, Controller, PidController, PidCore, ZoneInterface};

/// Which way the zone setpoint moved on the last cycle.  Telemetry only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanSpeedDirection {
    Up,
    Down,
    Neutral,
}

pub struct FanController {
    id: String,
    inputs: Vec<String>,
    core: PidCore,
    direction: FanSpeedDirection,
}

impl FanController {
    /// Returns `None` when `inputs` is empty.
    pub fn new(id: impl Into<String>, inputs: Vec<String>, config: PidConfig) -> Option<Self> {
        if inputs.is_empty() {
            return None;
        }
        Some(Self {
            id: id.into(),
            inputs,
            core: PidCore::new(0.0, config),
            direction: FanSpeedDirection::Neutral,
        })
    }

    pub fn direction(&self) -> FanSpeedDirection {
        self.direction
    }
}

impl Controller for FanController {
    fn id(&self) -> &str {
        &self.id
    }

    fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Slowest healthy fan.  Non-positive readings are faults, not stopped
    /// fans, and are left out; with nothing left the result is 0.
    fn input_proc(&mut self, zone: &dyn ZoneInterface) -> f64 {
        self.inputs
            .iter()
            .filter_map(|name| zone.cached_value(name))
            .filter(|&v| v > 0.0)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    fn output_proc(&mut self, zone: &mut dyn ZoneInterface, value: f64) {
        let mut percent = value;

        if !zone.tuning_enabled() && zone.fail_safe_mode() {
            let floor = zone.fail_safe_percent();
            if percent < floor {
                percent = floor;
            }
        }

        let fraction = percent / 100.0;
        for name in &self.inputs {
            zone.write_output(name, fraction);
        }
    }

    fn process(&mut self, zone: &mut dyn ZoneInterface) {
        pid_process(self, zone);
    }
}

impl PidController for FanController {
    fn setpt_proc(&mut self, zone: &dyn ZoneInterface) -> f64 {
        let setpt = zone.max_set_point_request();
        let previous = self.core.setpoint;

        self.direction = if setpt > previous {
            FanSpeedDirection::Up
        } else if setpt < previous {
            FanSpeedDirection::Down
        } else {
            FanSpeedDirection::Neutral
        };
        if self.direction != FanSpeedDirection::Neutral {
            debug!("{}: setpoint {previous} -> {setpt} ({:?})", self.id, self.direction);
        }

        self.core.setpoint = setpt;
        setpt
    }

    fn core(&self) -> &PidCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PidCore {
        &mut self.core
    }
}
