//! zonectl daemon entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  CLI (clap) ──▶ DaemonConfig (serde_json)                │
//! │                      │                                   │
//! │                      ▼                                   │
//! │   builder::build_zones(.., sysfs_sensor)                 │
//! │                      │                                   │
//! │                      ▼                                   │
//! │   scheduler::run_zones  (one timer chain per zone)       │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use zonectl::builder::{build_zones, sysfs_sensor};
use zonectl::config::DaemonConfig;
use zonectl::scheduler;
use zonectl::zone::ZoneOptions;

#[derive(Debug, Parser)]
#[clap(name = "zonectl", version, about = "Fan zone PID control daemon")]
struct Args {
    /// JSON configuration file.
    #[clap(short, long = "conf", default_value = "/usr/share/zonectl/config.json")]
    conf: PathBuf,

    /// Tuning run: ignore the fail-safe floor and read a fixed setpoint
    /// from the setpoint file.
    #[clap(short, long)]
    tuning: bool,

    /// Write per-zone CSV logs into this directory.
    #[clap(short, long = "log")]
    log: Option<PathBuf>,

    /// Setpoint override file used in tuning runs.
    #[clap(long = "setpoint-file")]
    setpoint_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("zonectl v{}", env!("CARGO_PKG_VERSION"));

    let config = DaemonConfig::load(&args.conf)
        .with_context(|| format!("loading {}", args.conf.display()))?;

    let options = ZoneOptions {
        tuning: args.tuning,
        setpoint_override: args.setpoint_file,
        log_dir: args.log,
    };
    if options.tuning {
        info!("tuning mode enabled");
    }

    let zones = match build_zones(&config, &options, sysfs_sensor) {
        Ok(zones) => zones,
        Err(e) => {
            error!("failed to build zones: {e}");
            return Err(e.into());
        }
    };

    scheduler::run_zones(zones);
    Ok(())
}
