//! Control loop scheduler.
//!
//! One [`ControlLoop`] drives one [`Zone`].  Fan telemetry and fan PIDs
//! run every tick; thermal inputs and thermal controllers run every tenth
//! tick, since temperatures move much more slowly than fan speed.
//!
//! ```text
//!  start ──▶ init log · seed cache · thermal pass
//!    │
//!    ▼  every 100 ms
//! ┌──────────────────────────────────────────────────────────┐
//! │ manual? ── yes ──▶ (skip everything)                     │
//! │   │ no                                                   │
//! │   ▼                                                      │
//! │ update_fan_telemetry                                     │
//! │ tick_count >= 10 ? ──▶ tick_count = 0 · thermal pass     │
//! │ process_fans · finish log row · tick_count += 1          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The tick body is synchronous.  The async side only waits on the timer,
//! so every zone is an independent timer chain on one single-threaded
//! executor and dropping a zone's task cancels its pending timer.

use core::future::Future;

use edge_executor::LocalExecutor;
use embassy_time::{Duration, Timer};
use futures_lite::future::block_on;
use log::{debug, info};

use crate::zone::Zone;

/// Nominal tick period.
pub const TICK_PERIOD: Duration = Duration::from_millis(100);

/// Fan ticks per thermal pass.
pub const THERMAL_TICKS: u32 = 10;

// ═══════════════════════════════════════════════════════════════
//  Tick engine
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct ControlLoop {
    tick_count: u32,
    started: bool,
}

impl ControlLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    pub fn started(&self) -> bool {
        self.started
    }

    /// First iteration: seed the cache and compute an initial setpoint so
    /// the first fan command is not based on zeros.
    pub fn start(&mut self, zone: &mut Zone) {
        zone.initialize_log();
        zone.initialize_cache();
        thermal_pass(zone);
        zone.dump_cache();
        self.started = true;
        info!(
            "zone {}: control loop started ({} fan, {} thermal controllers)",
            zone.zone_id(),
            zone.fan_controllers().len(),
            zone.thermal_controllers().len()
        );
    }

    /// One scheduler tick.  Runs `start` first if it never ran.
    pub fn tick(&mut self, zone: &mut Zone) {
        if !self.started {
            self.start(zone);
        }

        if zone.manual_mode() {
            return;
        }

        zone.update_fan_telemetry();

        if self.tick_count >= THERMAL_TICKS {
            self.tick_count = 0;
            thermal_pass(zone);
        }

        zone.process_fans();
        zone.finish_log_row();

        self.tick_count += 1;
    }
}

/// Refresh thermal inputs and recompute the zone setpoint.
fn thermal_pass(zone: &mut Zone) {
    zone.update_sensors();
    zone.clear_set_points();
    zone.clear_rpm_ceilings();
    zone.process_thermals();
    zone.determine_max_set_point_request();
    debug!("zone {}: max setpoint {}", zone.zone_id(), zone.max_set_point_request());
}

// ═══════════════════════════════════════════════════════════════
//  Async drivers
// ═══════════════════════════════════════════════════════════════

/// Drive `zone` forever, one tick per [`TICK_PERIOD`].
pub async fn run(mut zone: Zone) {
    let mut control = ControlLoop::new();
    control.start(&mut zone);
    loop {
        Timer::after(TICK_PERIOD).await;
        control.tick(&mut zone);
    }
}

/// Run every zone on one executor until `stop` resolves.
///
/// Pending zone timers are cancelled before this returns, which is how a
/// zone set is torn down for reconfiguration.
pub fn run_zones_until<F: Future>(zones: Vec<Zone>, stop: F) -> F::Output {
    let executor: LocalExecutor<'_> = LocalExecutor::new();

    let tasks: Vec<_> = zones
        .into_iter()
        .map(|zone| executor.spawn(run(zone)))
        .collect();
    info!("scheduler: running {} zones", tasks.len());

    let out = block_on(executor.run(stop));

    drop(tasks);
    info!("scheduler: zones stopped");
    out
}

/// Run every zone forever.
pub fn run_zones(zones: Vec<Zone>) {
    run_zones_until(zones, core::future::pending::<()>());
}
