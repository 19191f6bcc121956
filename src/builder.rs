//! Zone construction from configuration.
//!
//! Building is all-or-nothing: the first problem aborts with a
//! [`BuildError`] and no zone from that configuration is returned.  The
//! sensor layer is injected as a factory closure, so tests can build real
//! zones on top of mock sensors.

use std::path::PathBuf;

use log::{info, warn};

use crate::config::{ControllerConfig, ControllerKind, DaemonConfig, SensorConfig};
use crate::control::fan::FanController;
use crate::control::pid::PidConfig;
use crate::control::stepwise::StepwiseInfo;
use crate::control::stepwise_controller::StepwiseController;
use crate::control::thermal::{ThermalController, ThermalType};
use crate::diagnostics::ZoneLog;
use crate::error::{BuildError, Result};
use crate::sensors::sysfs::SysfsSensor;
use crate::sensors::{Sensor, SensorManager};
use crate::zone::{Zone, ZoneOptions};

/// Result of asking the sensor layer for one sensor.
pub type SensorResult = core::result::Result<Box<dyn Sensor>, String>;

/// Build every configured zone.
pub fn build_zones<F>(config: &DaemonConfig, options: &ZoneOptions, mut make_sensor: F) -> Result<Vec<Zone>>
where
    F: FnMut(&SensorConfig) -> SensorResult,
{
    config.validate()?;

    let mut zones = Vec::with_capacity(config.zones.len());
    for zc in &config.zones {
        let mut sensors = SensorManager::new();
        for pc in &zc.pids {
            if pc.inputs.is_empty() {
                return Err(BuildError::NoInputs {
                    controller: pc.name.clone(),
                }
                .into());
            }
            for input in &pc.inputs {
                if sensors.contains(input) {
                    continue;
                }
                let sc = sensor_config(config, pc, input)?;
                let sensor = make_sensor(sc).map_err(|reason| BuildError::SensorInit {
                    sensor: input.clone(),
                    reason,
                })?;
                sensors.add(sensor);
            }
        }

        let mut zone = Zone::new(zc.id, zc.min_thermal_output, zc.failsafe_percent, sensors, options.clone());
        for pc in &zc.pids {
            add_controller(&mut zone, config, pc)?;
        }

        if let Some(dir) = options.log_dir.as_deref() {
            match ZoneLog::create(dir, zc.id) {
                Ok(log) => zone.attach_log(log),
                Err(e) => warn!("zone {}: logging disabled, cannot open log in {}: {}", zc.id, dir.display(), e),
            }
        }

        info!(
            "zone {}: built ({} fan, {} thermal controllers, {} inputs)",
            zc.id,
            zone.fan_controllers().len(),
            zone.thermal_controllers().len(),
            zone.fan_inputs().len() + zone.thermal_inputs().len()
        );
        zones.push(zone);
    }
    Ok(zones)
}

/// Sensor factory backed by sysfs files.
pub fn sysfs_sensor(cfg: &SensorConfig) -> SensorResult {
    let path = |p: &str| (!p.is_empty()).then(|| PathBuf::from(p));
    Ok(Box::new(SysfsSensor::new(
        cfg.name.clone(),
        path(&cfg.read_path),
        path(&cfg.write_path),
        cfg.min,
        cfg.max,
        cfg.timeout_secs(),
    )))
}

fn sensor_config<'a>(
    config: &'a DaemonConfig,
    pc: &ControllerConfig,
    name: &str,
) -> core::result::Result<&'a SensorConfig, BuildError> {
    config.sensor(name).ok_or_else(|| BuildError::UnknownSensor {
        controller: pc.name.clone(),
        sensor: name.to_owned(),
    })
}

fn pid_block(pc: &ControllerConfig) -> core::result::Result<PidConfig, BuildError> {
    pc.pid.ok_or_else(|| BuildError::MissingPidBlock {
        controller: pc.name.clone(),
    })
}

fn no_inputs(pc: &ControllerConfig) -> BuildError {
    BuildError::NoInputs {
        controller: pc.name.clone(),
    }
}

fn add_controller(zone: &mut Zone, config: &DaemonConfig, pc: &ControllerConfig) -> Result<()> {
    match pc.kind {
        ControllerKind::Fan => {
            let pid = pid_block(pc)?;
            let fan = FanController::new(pc.name.clone(), pc.inputs.clone(), pid).ok_or_else(|| no_inputs(pc))?;
            for input in &pc.inputs {
                zone.add_fan_input(input);
            }
            zone.add_fan_pid(Box::new(fan));
        }
        ControllerKind::Temp | ControllerKind::Margin => {
            let pid = pid_block(pc)?;
            let kind = if pc.kind == ControllerKind::Margin {
                ThermalType::Margin
            } else {
                ThermalType::Absolute
            };

            match pc.setpoint_offset.as_deref() {
                None => {
                    let t = ThermalController::new(pc.name.clone(), pc.inputs.clone(), pc.setpoint, pid, kind)
                        .ok_or_else(|| no_inputs(pc))?;
                    zone.add_thermal_pid(Box::new(t));
                }
                Some(threshold) => {
                    // Thresholds differ per sensor, so each input gets its
                    // own controller with its own offset setpoint.
                    for input in &pc.inputs {
                        let offset = sensor_config(config, pc, input)?.thresholds.by_name(threshold)?;
                        let t = ThermalController::new(
                            input.clone(),
                            vec![input.clone()],
                            pc.setpoint + offset,
                            pid,
                            kind,
                        )
                        .ok_or_else(|| no_inputs(pc))?;
                        zone.add_thermal_pid(Box::new(t));
                    }
                }
            }
            for input in &pc.inputs {
                zone.add_thermal_input(input);
            }
        }
        ControllerKind::Stepwise => {
            let block = pc.stepwise.as_ref().ok_or_else(|| BuildError::MissingStepwiseBlock {
                controller: pc.name.clone(),
            })?;
            let info = StepwiseInfo::from_config(&pc.name, block)?;
            let s = StepwiseController::new(pc.name.clone(), pc.inputs.clone(), info).ok_or_else(|| no_inputs(pc))?;
            for input in &pc.inputs {
                zone.add_thermal_input(input);
            }
            zone.add_thermal_pid(Box::new(s));
        }
    }
    Ok(())
}
