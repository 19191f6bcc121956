//! File-backed sensor (hwmon-style sysfs attributes).
//!
//! Reads parse the first number in `read_path`.  A read that fails keeps
//! the previous value and timestamp and flags the sensor as failed, so the
//! zone's staleness check and fail-safe tracking take over.
//!
//! Writes scale the duty fraction into `[min, max]` and store it as an
//! integer, the way PWM attributes expect.  Without a usable range the
//! fraction is written as a whole percent.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};

use super::{ReadReturn, Sensor};

pub struct SysfsSensor {
    name: String,
    read_path: Option<PathBuf>,
    write_path: Option<PathBuf>,
    min: i64,
    max: i64,
    timeout: i64,
    failed: bool,
    last: ReadReturn,
}

impl SysfsSensor {
    pub fn new(
        name: impl Into<String>,
        read_path: Option<PathBuf>,
        write_path: Option<PathBuf>,
        min: i64,
        max: i64,
        timeout: i64,
    ) -> Self {
        Self {
            name: name.into(),
            read_path,
            write_path,
            min,
            max,
            timeout,
            failed: false,
            last: ReadReturn {
                value: 0.0,
                updated: Instant::now(),
            },
        }
    }

    /// Raw value that `write(fraction)` puts on disk.
    pub fn scale(&self, fraction: f64) -> i64 {
        if self.max > self.min {
            let span = (self.max - self.min) as f64;
            (self.min as f64 + fraction * span).round() as i64
        } else {
            (fraction * 100.0).round() as i64
        }
    }
}

fn read_number(path: &Path) -> Option<f64> {
    let text = fs::read_to_string(path).ok()?;
    text.split_whitespace().next()?.parse().ok()
}

impl Sensor for SysfsSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self) -> ReadReturn {
        let Some(path) = self.read_path.as_ref() else {
            return self.last;
        };

        match read_number(path) {
            Some(value) => {
                if self.failed {
                    info!("{}: readable again", self.name);
                }
                self.failed = false;
                self.last = ReadReturn {
                    value,
                    updated: Instant::now(),
                };
            }
            None => {
                if !self.failed {
                    warn!("{}: failed to read {}", self.name, path.display());
                }
                self.failed = true;
            }
        }
        self.last
    }

    fn write(&mut self, fraction: f64) {
        let Some(path) = self.write_path.as_ref() else {
            return;
        };
        let raw = self.scale(fraction);
        if let Err(e) = fs::write(path, raw.to_string()) {
            warn!("{}: write {} to {} failed: {}", self.name, raw, path.display(), e);
        }
    }

    fn failed(&self) -> bool {
        self.failed
    }

    fn timeout(&self) -> i64 {
        self.timeout
    }
}
