//! PID step for fan and thermal controllers
//!
//! Proportional + integral + feed-forward (no derivative term), with output
//! clamping, slew-rate limiting and integral back-calculation so the
//! integrator does not wind up while slewing holds the output back.

use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub min: f64,
    pub max: f64,
}

impl Limits {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the range without panicking on inverted limits.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// Tuning parameters of one PID loop, as they appear in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PidConfig {
    /// Sample period in seconds.
    pub ts: f64,
    pub proportional_coeff: f64,
    pub integral_coeff: f64,
    pub feed_fwd_offset: f64,
    pub feed_fwd_gain: f64,
    pub integral_limit: Limits,
    pub out_lim: Limits,
    /// Largest allowed decrease per second (normally negative).
    pub slew_neg: f64,
    /// Largest allowed increase per second.
    pub slew_pos: f64,
    #[serde(default)]
    pub positive_hysteresis: f64,
    #[serde(default)]
    pub negative_hysteresis: f64,
}

/// PID parameters plus the mutable integrator state.
///
/// `integral` always stays within `integral_limit`, and once `initialized`
/// is set `last_output` stays within `out_lim`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidState {
    pub config: PidConfig,
    pub integral: f64,
    pub last_output: f64,
    pub initialized: bool,
}

impl PidState {
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            integral: 0.0,
            last_output: 0.0,
            initialized: false,
        }
    }

    /// Forget the integrator history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_output = 0.0;
        self.initialized = false;
    }
}

/// Run one PID step and update `state` in place.
pub fn pid(state: &mut PidState, input: f64, setpoint: f64) -> f64 {
    let cfg = &state.config;
    let error = setpoint - input;

    let proportional = cfg.proportional_coeff * error;

    // A zero integral gain short-circuits the term instead of accumulating.
    let mut integral = 0.0;
    if cfg.integral_coeff != 0.0 {
        integral = state.integral + error * cfg.integral_coeff * cfg.ts;
        integral = cfg.integral_limit.clamp(integral);
    }

    let feed_forward = (setpoint + cfg.feed_fwd_offset) * cfg.feed_fwd_gain;

    let mut output = cfg.out_lim.clamp(proportional + integral + feed_forward);

    if state.initialized {
        if cfg.slew_neg != 0.0 {
            // Don't decrease too fast
            let min_out = state.last_output + cfg.slew_neg * cfg.ts;
            if output < min_out {
                output = min_out;
            }
        }
        if cfg.slew_pos != 0.0 {
            // Don't increase too fast
            let max_out = state.last_output + cfg.slew_pos * cfg.ts;
            if output > max_out {
                output = max_out;
            }
        }
        if cfg.slew_neg != 0.0 || cfg.slew_pos != 0.0 {
            // Back-calculate so the integrator tracks what was actually commanded.
            integral = output - proportional;
        }
    }

    state.integral = cfg.integral_limit.clamp(integral);
    state.last_output = output;
    state.initialized = true;

    output
}
