//! Swiss Ephemeris wrapper for planetary calculations
//!
//! This module provides safe Rust wrappers around the libswisseph-sys FFI
//! bindings.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::sync::Once;

use crate::models::Planet;

use super::EphemerisError;

// Swiss Ephemeris constants
const SE_GREG_CAL: i32 = 1;
const SEFLG_SPEED: i32 = 256; // Include speed in calculations
const SEFLG_SWIEPH: i32 = 2; // Use Swiss Ephemeris

static INIT: Once = Once::new();

/// Initialize Swiss Ephemeris (call once at startup)
pub fn init_ephemeris() {
    INIT.call_once(|| {
        unsafe {
            // Initialize without ephemeris files (uses Moshier analytical ephemeris)
            // This provides 0.1 arc seconds precision for planets, 3 arc seconds for Moon
            libswisseph_sys::swe_set_ephe_path(std::ptr::null_mut());
        }
    });
}

/// Result of a planetary calculation
#[derive(Debug, Clone)]
pub struct PlanetaryPosition {
    /// Ecliptic longitude (0-360 degrees)
    pub longitude: f64,
    /// Ecliptic latitude
    pub latitude: f64,
    /// Distance (AU for planets, Earth radii for Moon)
    pub distance: f64,
    /// Speed in longitude (degrees per day, negative = retrograde)
    pub speed_longitude: f64,
    /// Whether the planet is retrograde
    pub is_retrograde: bool,
}

/// Convert a date/time to Julian Day (UT)
pub fn datetime_to_julian_day(datetime: NaiveDateTime) -> f64 {
    let year = datetime.date().year();
    let month = datetime.date().month() as i32;
    let day = datetime.date().day() as i32;
    let hour = datetime.time().hour() as f64
        + datetime.time().minute() as f64 / 60.0
        + datetime.time().second() as f64 / 3600.0;

    unsafe { libswisseph_sys::swe_julday(year, month, day, hour, SE_GREG_CAL) }
}

/// Convert a date to Julian Day at noon UT, the reference instant for
/// daily transit charts and time-unknown birth charts
pub fn date_to_julian_day(date: NaiveDate) -> f64 {
    let datetime = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default());
    datetime_to_julian_day(datetime)
}

/// Convert a local date/time with timezone to naive UTC
pub fn local_datetime_to_utc(
    date: NaiveDate,
    time: NaiveTime,
    timezone: &str,
) -> Result<NaiveDateTime, EphemerisError> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| EphemerisError::InvalidTimezone(timezone.to_string()))?;

    let local_datetime = NaiveDateTime::new(date, time);

    let local_dt = tz
        .from_local_datetime(&local_datetime)
        .single()
        .ok_or(EphemerisError::AmbiguousLocalTime)?;

    Ok(local_dt.with_timezone(&Utc).naive_utc())
}

/// Calculate position of a planet at a given Julian Day
pub fn calc_planet_position(
    planet: Planet,
    julian_day: f64,
) -> Result<PlanetaryPosition, EphemerisError> {
    init_ephemeris();

    let mut xx: [f64; 6] = [0.0; 6];
    let mut serr: [i8; 256] = [0; 256];

    let iflg = SEFLG_SPEED | SEFLG_SWIEPH;

    let ret = unsafe {
        libswisseph_sys::swe_calc_ut(
            julian_day,
            planet.swe_id(),
            iflg,
            xx.as_mut_ptr(),
            serr.as_mut_ptr(),
        )
    };

    if ret < 0 {
        let error_msg = unsafe {
            let c_str = std::ffi::CStr::from_ptr(serr.as_ptr());
            c_str.to_string_lossy().to_string()
        };
        return Err(EphemerisError::Calculation(error_msg));
    }

    let speed_longitude = xx[3];
    let is_retrograde = planet.can_retrograde() && speed_longitude < 0.0;

    Ok(PlanetaryPosition {
        longitude: xx[0],
        latitude: xx[1],
        distance: xx[2],
        speed_longitude,
        is_retrograde,
    })
}

/// Calculate positions for all bodies at a given Julian Day, in
/// canonical planet order
pub fn calc_all_planets(
    julian_day: f64,
) -> Result<Vec<(Planet, PlanetaryPosition)>, EphemerisError> {
    let mut positions = Vec::new();

    for planet in Planet::all() {
        let position = calc_planet_position(*planet, julian_day)?;
        positions.push((*planet, position));
    }

    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn julian_day_conversion() {
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let jd = date_to_julian_day(date);
        // J2000.0 epoch is Julian Day 2451545.0 (2000-01-01 12:00 UT)
        assert!((jd - 2451545.0).abs() < 0.01);
    }

    #[test]
    fn planet_calculation() {
        init_ephemeris();
        let jd = date_to_julian_day(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        let sun = calc_planet_position(Planet::Sun, jd).unwrap();

        // Sun should be around 280° (Capricorn) on Jan 1, 2000
        assert!(sun.longitude > 270.0 && sun.longitude < 290.0);
        // and moving close to a degree per day
        assert!((sun.speed_longitude - 1.0).abs() < 0.1);
    }

    #[test]
    fn timezone_conversion() {
        let date = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();
        let time = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
        let utc = local_datetime_to_utc(date, time, "America/Panama").unwrap();
        // Panama is UTC-5, so this is 19:30 UT
        assert_eq!(
            utc,
            NaiveDateTime::new(date, NaiveTime::from_hms_opt(19, 30, 0).unwrap())
        );

        assert!(local_datetime_to_utc(date, time, "Not/AZone").is_err());
    }
}
