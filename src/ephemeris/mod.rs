//! Safe wrappers around the Swiss Ephemeris and chart construction
//!
//! The meters engine consumes immutable [`Chart`](crate::models::Chart)
//! values; everything that touches the external astronomy library lives
//! here. Failures never produce synthesized positions - they surface as
//! [`EphemerisError`] and propagate out of the engine entry points.

pub mod calculator;
pub mod chart;
pub mod houses;

pub use calculator::{
    calc_all_planets, calc_planet_position, date_to_julian_day, datetime_to_julian_day,
    init_ephemeris, local_datetime_to_utc, PlanetaryPosition,
};
pub use chart::{compute_birth_chart, compute_chart, compute_solar_chart, compute_transit_chart};
pub use houses::{calc_houses, house_system_name, HousePositions, HOUSE_PLACIDUS};

use thiserror::Error;

/// Failures from the external astronomy library or its inputs
#[derive(Debug, Clone, Error)]
pub enum EphemerisError {
    #[error("Swiss Ephemeris error: {0}")]
    Calculation(String),

    #[error("failed to calculate houses")]
    Houses,

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("ambiguous or invalid local time")]
    AmbiguousLocalTime,
}
