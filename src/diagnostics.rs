//! Zone telemetry log and cache dump.
//!
//! Each zone can stream one CSV line per control tick:
//!
//! ```text
//! epoch_ms,setpt,fan0,fan1,temp0,failsafe
//! 1718000000123,3000,4100,4150,38.5,0
//! ```
//!
//! Fan columns hold the value read on that tick; thermal columns hold the
//! cached value (thermals refresh only every tenth tick).  A row is built
//! in memory and written in one go when the tick ends.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};

/// CSV sink for one zone.
pub struct ZoneLog {
    sink: Box<dyn Write>,
    row: String,
    broken: bool,
}

impl ZoneLog {
    pub fn new(sink: Box<dyn Write>) -> Self {
        Self {
            sink,
            row: String::new(),
            broken: false,
        }
    }

    /// Open (truncating) `<dir>/zone_<id>.log`.
    pub fn create(dir: &Path, zone_id: i64) -> io::Result<Self> {
        let file = File::create(dir.join(format!("zone_{zone_id}.log")))?;
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }

    /// Column header.
    pub fn header(&mut self, fans: &[String], thermals: &[String]) {
        self.row.clear();
        self.row.push_str("epoch_ms,setpt");
        for name in fans.iter().chain(thermals) {
            self.row.push(',');
            self.row.push_str(name);
        }
        self.row.push_str(",failsafe");
        self.flush_row();
    }

    /// Start a new row with the wall-clock time and current setpoint.
    pub fn begin_row(&mut self, setpt: f64) {
        self.begin_row_at(epoch_ms(), setpt);
    }

    pub fn begin_row_at(&mut self, epoch_ms: u128, setpt: f64) {
        self.row.clear();
        let _ = write!(self.row, "{epoch_ms},{setpt}");
    }

    pub fn push(&mut self, value: f64) {
        let _ = write!(self.row, ",{value}");
    }

    /// Close the row with the fail-safe flag and write it out.
    pub fn end_row(&mut self, fail_safe: bool) {
        let _ = write!(self.row, ",{}", u8::from(fail_safe));
        self.flush_row();
    }

    fn flush_row(&mut self) {
        let result = writeln!(self.sink, "{}", self.row).and_then(|()| self.sink.flush());
        match result {
            Ok(()) => self.broken = false,
            Err(e) => {
                if !self.broken {
                    warn!("zone log write failed: {e}");
                }
                self.broken = true;
            }
        }
        self.row.clear();
    }
}

fn epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Log every cached value at debug level, sorted by name.
pub fn dump_cache(zone_id: i64, cache: &HashMap<String, f64>) {
    debug!("zone {zone_id}: cache values now:");
    let mut names: Vec<_> = cache.keys().collect();
    names.sort();
    for name in names {
        debug!("  {name}: {}", cache[name]);
    }
}
