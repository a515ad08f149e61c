use thiserror::Error;

use crate::ephemeris::EphemerisError;

/// Errors surfaced by the meters engine. Only hard failures live here;
/// out-of-range sensitivity is clamped and a meter with no active aspects
/// produces a normal quiet reading.
#[derive(Debug, Error)]
pub enum MetersError {
    #[error("unknown meter '{name}'")]
    UnknownMeter { name: String },

    #[error("calibration percentiles missing for meter '{meter}'")]
    CalibrationMissing { meter: String },

    #[error(
        "calibration table version '{table_version}' does not match meter config version '{configs_version}'"
    )]
    CalibrationStale {
        configs_version: String,
        table_version: String,
    },

    #[error("ephemeris unavailable: {0}")]
    Ephemeris(#[from] EphemerisError),

    #[error("invalid chart: {reason}")]
    InvalidChart { reason: String },

    #[error("invalid meter configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("calibration batch cancelled")]
    Cancelled,
}
