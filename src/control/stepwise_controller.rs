//! Stepwise controller: table lookup producing a setpoint or a ceiling.

use super::stepwise::{stepwise, StepwiseInfo};
use super::{hysteresis_gate, Controller, ZoneInterface};

pub struct StepwiseController {
    id: String,
    inputs: Vec<String>,
    info: StepwiseInfo,
    last_input: f64,
    last_output: f64,
}

impl StepwiseController {
    /// Returns `None` when `inputs` is empty.
    pub fn new(id: impl Into<String>, inputs: Vec<String>, info: StepwiseInfo) -> Option<Self> {
        if inputs.is_empty() {
            return None;
        }
        Some(Self {
            id: id.into(),
            inputs,
            info,
            last_input: f64::NAN,
            last_output: f64::NAN,
        })
    }

    pub fn info(&self) -> &StepwiseInfo {
        &self.info
    }

    pub fn last_output(&self) -> f64 {
        self.last_output
    }
}

impl Controller for StepwiseController {
    fn id(&self) -> &str {
        &self.id
    }

    fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Hottest input.
    fn input_proc(&mut self, zone: &dyn ZoneInterface) -> f64 {
        self.inputs
            .iter()
            .filter_map(|name| zone.cached_value(name))
            .fold(f64::MIN, f64::max)
    }

    fn output_proc(&mut self, zone: &mut dyn ZoneInterface, value: f64) {
        if self.info.is_ceiling {
            zone.add_rpm_ceiling(value);
        } else {
            zone.add_set_point(value);
        }
    }

    fn process(&mut self, zone: &mut dyn ZoneInterface) {
        let input = self.input_proc(zone);

        let output = if self.last_output.is_nan() {
            self.last_input = input;
            stepwise(&self.info, input)
        } else if hysteresis_gate(
            self.last_input,
            input,
            self.info.positive_hysteresis,
            self.info.negative_hysteresis,
        ) {
            self.last_input = input;
            stepwise(&self.info, input)
        } else {
            self.last_output
        };

        self.last_output = output;
        log::trace!("{}: in={input} out={output}", self.id);
        self.output_proc(zone, output);
    }
}
