//! Unified error types for the zone control core.
//!
//! Only configuration and build-time problems are errors.  Everything that
//! goes wrong while the control loop is running (bad readings, stale
//! sensors) is absorbed by the fail-safe tracking in [`crate::zone`] and
//! never surfaces here.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A zone or controller could not be constructed from configuration.
    Build(BuildError),
    /// Configuration text could not be parsed or failed validation.
    Config(String),
    /// Reading the configuration file failed.
    Io(std::io::ErrorKind),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build(e) => write!(f, "build: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Io(kind) => write!(f, "io: {kind}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<BuildError> for Error {
    fn from(e: BuildError) -> Self {
        Self::Build(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.kind())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Build errors
// ---------------------------------------------------------------------------

/// Fatal problems found while turning configuration into zones.
///
/// The whole build is abandoned when one of these is returned; a zone is
/// never partially constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A controller was configured with an empty `inputs` list.
    NoInputs { controller: String },
    /// A fan/temp/margin controller has no PID parameter block.
    MissingPidBlock { controller: String },
    /// A stepwise controller has no stepwise parameter block.
    MissingStepwiseBlock { controller: String },
    /// A controller input names a sensor absent from the sensor list.
    UnknownSensor { controller: String, sensor: String },
    /// A stepwise table has no points.
    EmptyStepwiseTable { controller: String },
    /// A stepwise table exceeds the fixed point capacity.
    TooManyStepwisePoints { controller: String, count: usize },
    /// `reading` and `output` lists differ in length.
    StepwiseLengthMismatch { controller: String },
    /// The configuration contains no zones.
    NoZones,
    /// Two zones share the same id.
    DuplicateZone(i64),
    /// A `setpointOffset` names something other than a known threshold.
    UnsupportedThreshold(String),
    /// The sensor layer refused to create a sensor.
    SensorInit { sensor: String, reason: String },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInputs { controller } => {
                write!(f, "controller '{controller}' has no inputs")
            }
            Self::MissingPidBlock { controller } => {
                write!(f, "controller '{controller}' is missing its pid block")
            }
            Self::MissingStepwiseBlock { controller } => {
                write!(f, "controller '{controller}' is missing its stepwise block")
            }
            Self::UnknownSensor { controller, sensor } => {
                write!(f, "controller '{controller}' references unknown sensor '{sensor}'")
            }
            Self::EmptyStepwiseTable { controller } => {
                write!(f, "controller '{controller}' must have at least one stepwise point")
            }
            Self::TooManyStepwisePoints { controller, count } => write!(
                f,
                "controller '{controller}' has {count} stepwise points (max {})",
                crate::control::stepwise::MAX_STEPWISE_POINTS
            ),
            Self::StepwiseLengthMismatch { controller } => {
                write!(f, "controller '{controller}': outputs size must match readings")
            }
            Self::NoZones => write!(f, "no fan zones configured"),
            Self::DuplicateZone(id) => write!(f, "zone {id} is configured twice"),
            Self::UnsupportedThreshold(name) => write!(f, "unsupported threshold type: {name}"),
            Self::SensorInit { sensor, reason } => {
                write!(f, "sensor '{sensor}' could not be created: {reason}")
            }
        }
    }
}

impl std::error::Error for BuildError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
