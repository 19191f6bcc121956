//! zonectl: fan zone control core.
//!
//! Turns temperature and margin readings into fan PWM commands using PID
//! and stepwise controllers grouped into independently scheduled zones.
//! The library holds all control logic and is host-testable; the binary
//! only wires sysfs sensors and the command line onto it.

#![deny(unused_must_use)]

pub mod builder;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod mode;
pub mod safety;
pub mod scheduler;
pub mod sensors;
pub mod zone;

pub use error::{BuildError, Error, Result};
