//! Controllers and the seam between them and their zone.
//!
//! ```text
//!   ┌──────────────────────── Zone ────────────────────────┐
//!   │  cache · fail-safe set · setpoints · rpm ceilings    │
//!   │                                                      │
//!   │       ▲ cached_value          │ add_set_point        │
//!   │       │ max_set_point_request ▼ add_rpm_ceiling      │
//!   │  ┌────┴──────────── ZoneInterface ─────────────┐     │
//!   │  │ FanController  ThermalController  Stepwise  │     │
//!   │  └─────────────────────────────────────────────┘     │
//!   └──────────────────────────────────────────────────────┘
//! ```
//!
//! A zone owns its controllers.  Instead of a stored back-reference, the
//! zone lends itself to each controller as `&mut dyn ZoneInterface` for the
//! duration of one `process()` call.

pub mod fan;
pub mod pid;
pub mod stepwise;
pub mod stepwise_controller;
pub mod thermal;

use pid::{PidConfig, PidState};

// ── Zone seam ─────────────────────────────────────────────────

/// What a controller may see and touch of its owning zone.
pub trait ZoneInterface {
    /// Last value cached for `name`, or `None` if the zone never saw it.
    fn cached_value(&self, name: &str) -> Option<f64>;

    /// Push a thermal setpoint contribution for this cycle.
    fn add_set_point(&mut self, value: f64);

    /// Push an upper bound on the fan setpoint for this cycle.
    fn add_rpm_ceiling(&mut self, value: f64);

    /// Aggregated setpoint computed on the last thermal pass.
    fn max_set_point_request(&self) -> f64;

    /// `true` while any monitored input is stale or failed.
    fn fail_safe_mode(&self) -> bool;

    /// Duty floor (0–100) applied while in fail-safe mode.
    fn fail_safe_percent(&self) -> f64;

    /// Tuning runs bypass the fail-safe floor.
    fn tuning_enabled(&self) -> bool {
        false
    }

    /// Write a duty fraction (0.0–1.0) to the named output sensor.
    fn write_output(&mut self, name: &str, fraction: f64);
}

// ── Controller capability ─────────────────────────────────────

/// Common shape of every controller a zone can run.
pub trait Controller {
    /// Configured controller name.
    fn id(&self) -> &str;

    /// Sensor names this controller reads.
    fn inputs(&self) -> &[String];

    /// Aggregate this controller's inputs from the zone cache.
    fn input_proc(&mut self, zone: &dyn ZoneInterface) -> f64;

    /// Deliver a computed value to the zone or the hardware.
    fn output_proc(&mut self, zone: &mut dyn ZoneInterface, value: f64);

    /// Run one full control cycle.
    fn process(&mut self, zone: &mut dyn ZoneInterface);
}

/// Extra hooks shared by the PID-based controllers.
pub trait PidController: Controller {
    /// Produce this cycle's setpoint.
    fn setpt_proc(&mut self, zone: &dyn ZoneInterface) -> f64;

    fn core(&self) -> &PidCore;
    fn core_mut(&mut self) -> &mut PidCore;
}

/// The `process()` body every PID controller shares.
pub fn pid_process<C: PidController + ?Sized>(controller: &mut C, zone: &mut dyn ZoneInterface) {
    let setpt = controller.setpt_proc(zone);
    let input = controller.input_proc(zone);
    let output = controller.core_mut().calc(input, setpt);
    log::trace!("{}: in={input} setpt={setpt} out={output}", controller.id());
    controller.output_proc(zone, output);
}

// ── PID core ──────────────────────────────────────────────────

/// State shared by every PID controller: the configured setpoint, the PID
/// state and the last sampled (hysteresis-gated) input.
#[derive(Debug, Clone)]
pub struct PidCore {
    pub setpoint: f64,
    pub state: PidState,
    /// NaN until the first sample is taken.
    pub last_input: f64,
}

impl PidCore {
    pub fn new(setpoint: f64, config: PidConfig) -> Self {
        Self {
            setpoint,
            state: PidState::new(config),
            last_input: f64::NAN,
        }
    }

    /// Pass `input` through the hysteresis gate and run one PID step.
    ///
    /// The PID step runs on every call, even when the gate held
    /// `last_input` back.
    pub fn calc(&mut self, input: f64, setpoint: f64) -> f64 {
        if hysteresis_gate(
            self.last_input,
            input,
            self.state.config.positive_hysteresis,
            self.state.config.negative_hysteresis,
        ) {
            self.last_input = input;
        }
        pid::pid(&mut self.state, self.last_input, setpoint)
    }
}

/// Whether a new reading should replace the last committed one.
///
/// An unsampled (`NaN`) last value always takes the new reading, and so
/// does a gate with both hystereses at zero.
pub fn hysteresis_gate(last: f64, input: f64, positive: f64, negative: f64) -> bool {
    if last.is_nan() || (positive == 0.0 && negative == 0.0) {
        return true;
    }
    input - last > positive || last - input > negative
}

// ── Test support ──────────────────────────────────────────────
