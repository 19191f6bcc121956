//! Fail-safe tracking.
//!
//! Every monitored input of a zone is either `Fresh` or `Stale`.  The
//! tracker keeps the set of stale names; the zone is in fail-safe mode
//! while that set is non-empty.
//!
//! ## Lifecycle per input
//!
//! 1. `seed()` at cache initialisation puts every input in `Stale`.
//! 2. A telemetry read that succeeds, is not failed and is within its
//!    timeout moves the input to `Fresh`.
//! 3. A read that reports failure, or whose timestamp is too old, moves
//!    it back to `Stale`.
//!
//! There is no terminal state.  Edges are logged once, not every tick.

use std::collections::BTreeSet;
use std::fmt;

use log::{info, warn};

/// Why an input was put in fail-safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// Seeded at startup; no reading seen yet.
    Startup,
    /// The sensor reported a fault.
    Failed,
    /// The last update is older than the sensor timeout.
    Timeout,
    /// No sensor is registered under this name.
    Missing,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => write!(f, "awaiting first reading"),
            Self::Failed => write!(f, "sensor failed"),
            Self::Timeout => write!(f, "reading timed out"),
            Self::Missing => write!(f, "sensor missing"),
        }
    }
}

/// Set of inputs currently holding their zone in fail-safe.
#[derive(Debug, Default)]
pub struct FailSafeTracker {
    zone_id: i64,
    stale: BTreeSet<String>,
}

impl FailSafeTracker {
    pub fn new(zone_id: i64) -> Self {
        Self {
            zone_id,
            stale: BTreeSet::new(),
        }
    }

    /// Put every name in `Stale` without logging individual edges.
    pub fn seed<'a>(&mut self, names: impl IntoIterator<Item = &'a String>) {
        self.stale.extend(names.into_iter().cloned());
        if !self.stale.is_empty() {
            info!(
                "zone {}: fail-safe until {} inputs report ({})",
                self.zone_id,
                self.stale.len(),
                StaleReason::Startup
            );
        }
    }

    /// Move `name` to `Stale`.
    pub fn mark_stale(&mut self, name: &str, reason: StaleReason) {
        if self.stale.insert(name.to_owned()) {
            warn!("zone {}: {name} entered fail-safe: {reason}", self.zone_id);
        }
    }

    /// Move `name` to `Fresh`.
    pub fn mark_fresh(&mut self, name: &str) {
        if self.stale.remove(name) && self.stale.is_empty() {
            info!("zone {}: fail-safe cleared", self.zone_id);
        }
    }

    pub fn is_stale(&self, name: &str) -> bool {
        self.stale.contains(name)
    }

    /// True while any input is stale.
    pub fn is_active(&self) -> bool {
        !self.stale.is_empty()
    }

    pub fn stale_inputs(&self) -> impl Iterator<Item = &str> {
        self.stale.iter().map(String::as_str)
    }
}
