//! Fuzz target: PID step and stepwise lookup
//!
//! Interprets the input as a stream of f64 values: a PID configuration
//! followed by (input, setpoint) pairs.  With finite values and ordered
//! limits the output must stay inside `outLim`.
//!
//! cargo fuzz run fuzz_control_step

#![no_main]

use libfuzzer_sys::fuzz_target;
use zonectl::control::pid::{pid, Limits, PidConfig, PidState};
use zonectl::control::stepwise::{stepwise, StepwiseConfig, StepwiseInfo};

fn floats(data: &[u8]) -> Vec<f64> {
    data.chunks_exact(8)
        .map(|c| {
            let mut b = [0u8; 8];
            b.copy_from_slice(c);
            f64::from_le_bytes(b)
        })
        .filter(|v| v.is_finite() && v.abs() < 1e9)
        .collect()
}

fuzz_target!(|data: &[u8]| {
    let v = floats(data);
    if v.len() < 9 {
        return;
    }

    let (lo, hi) = if v[4] <= v[5] { (v[4], v[5]) } else { (v[5], v[4]) };
    let (ilo, ihi) = if v[6] <= v[7] { (v[6], v[7]) } else { (v[7], v[6]) };
    let cfg = PidConfig {
        ts: v[0].abs(),
        proportional_coeff: v[1],
        integral_coeff: v[2],
        feed_fwd_offset: 0.0,
        feed_fwd_gain: v[3],
        integral_limit: Limits::new(ilo, ihi),
        out_lim: Limits::new(lo, hi),
        slew_neg: -v[8].abs(),
        slew_pos: v[8].abs(),
        positive_hysteresis: 0.0,
        negative_hysteresis: 0.0,
    };

    let mut state = PidState::new(cfg);
    for pair in v[9..].chunks_exact(2) {
        let out = pid(&mut state, pair[0], pair[1]);
        assert!(out >= lo - 1e-6 && out <= hi + 1e-6, "{out} outside [{lo}, {hi}]");
        assert!(state.integral >= ilo && state.integral <= ihi);
    }

    let mut readings: Vec<f64> = v[9..].to_vec();
    readings.sort_by(f64::total_cmp);
    readings.truncate(20);
    let outputs = readings.iter().map(|r| r * 2.0).collect();
    let table = StepwiseConfig {
        reading: readings,
        output: outputs,
        ..StepwiseConfig::default()
    };
    if let Ok(info) = StepwiseInfo::from_config("fuzz", &table) {
        let out = stepwise(&info, v[0]);
        assert!(info.points().iter().any(|p| p.output == out));
    }
});
