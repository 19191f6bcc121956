//! Stepwise table lookup.
//!
//! A stepwise table maps a reading to an output by picking the last row
//! whose reading does not exceed the input.  There is no interpolation:
//! inputs below the first row take the first output and inputs past the
//! last row take the last output.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Maximum number of `(reading, output)` rows in one table.
pub const MAX_STEPWISE_POINTS: usize = 20;

/// Stepwise parameters as they appear in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepwiseConfig {
    #[serde(default)]
    pub ts: f64,
    #[serde(default)]
    pub is_ceiling: bool,
    pub reading: std::vec::Vec<f64>,
    pub output: std::vec::Vec<f64>,
    #[serde(default)]
    pub positive_hysteresis: f64,
    #[serde(default)]
    pub negative_hysteresis: f64,
}

/// One row of a stepwise table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepwisePoint {
    pub reading: f64,
    pub output: f64,
}

/// Validated, fixed-capacity stepwise table plus its behaviour flags.
#[derive(Debug, Clone, PartialEq)]
pub struct StepwiseInfo {
    pub ts: f64,
    pub is_ceiling: bool,
    pub positive_hysteresis: f64,
    pub negative_hysteresis: f64,
    points: Vec<StepwisePoint, MAX_STEPWISE_POINTS>,
}

impl StepwiseInfo {
    /// Build a table from its configuration form.
    ///
    /// Rows after the first NaN reading are dropped.
    pub fn from_config(name: &str, cfg: &StepwiseConfig) -> Result<Self, BuildError> {
        if cfg.reading.len() != cfg.output.len() {
            return Err(BuildError::StepwiseLengthMismatch {
                controller: name.to_owned(),
            });
        }

        let mut points = Vec::new();
        for (&reading, &output) in cfg.reading.iter().zip(&cfg.output) {
            if reading.is_nan() {
                break;
            }
            points
                .push(StepwisePoint { reading, output })
                .map_err(|_| BuildError::TooManyStepwisePoints {
                    controller: name.to_owned(),
                    count: cfg.reading.len(),
                })?;
        }

        if points.is_empty() {
            return Err(BuildError::EmptyStepwiseTable {
                controller: name.to_owned(),
            });
        }

        Ok(Self {
            ts: cfg.ts,
            is_ceiling: cfg.is_ceiling,
            positive_hysteresis: cfg.positive_hysteresis,
            negative_hysteresis: cfg.negative_hysteresis,
            points,
        })
    }

    pub fn points(&self) -> &[StepwisePoint] {
        &self.points
    }
}

/// Look `input` up in the table.
pub fn stepwise(info: &StepwiseInfo, input: f64) -> f64 {
    let Some(first) = info.points.first() else {
        return 0.0;
    };

    let mut value = first.output;
    for point in info.points.iter().skip(1) {
        if point.reading > input {
            break;
        }
        value = point.output;
    }
    value
}
