//! Externally visible zone mode: `Manual` (read-write) and `FailSafe`
//! (read-only).
//!
//! A [`ZoneMode`] is a cheap cloneable handle.  The zone keeps one copy;
//! whatever control surface the host process exposes keeps another and may
//! live on a different thread.  Both flags are single atomics, so a write
//! to `Manual` is seen by the next scheduler tick without locking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;

#[derive(Debug, Clone)]
pub struct ZoneMode {
    zone_id: i64,
    manual: Arc<AtomicBool>,
    fail_safe: Arc<AtomicBool>,
}

impl ZoneMode {
    pub fn new(zone_id: i64) -> Self {
        Self {
            zone_id,
            manual: Arc::new(AtomicBool::new(false)),
            fail_safe: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn zone_id(&self) -> i64 {
        self.zone_id
    }

    pub fn manual(&self) -> bool {
        self.manual.load(Ordering::Acquire)
    }

    /// Freeze (`true`) or resume (`false`) automatic control.
    pub fn set_manual(&self, value: bool) {
        let old = self.manual.swap(value, Ordering::AcqRel);
        if old != value {
            info!("zone {}: manual mode {}", self.zone_id, if value { "on" } else { "off" });
        }
    }

    pub fn fail_safe(&self) -> bool {
        self.fail_safe.load(Ordering::Acquire)
    }

    /// Mirror the zone's fail-safe state for outside readers.
    pub(crate) fn publish_fail_safe(&self, value: bool) {
        self.fail_safe.store(value, Ordering::Release);
    }
}
