//! Chart construction: the adapter between the ephemeris and the engine

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{
    house_of_longitude, solar_house, Angles, BodyPlacement, Chart, Planet, ZodiacSign,
};

use chrono::NaiveTime;

use super::calculator::{
    calc_all_planets, calc_planet_position, date_to_julian_day, datetime_to_julian_day,
    local_datetime_to_utc,
};
use super::houses::{calc_houses, HOUSE_PLACIDUS};
use super::EphemerisError;

/// Days scanned on each side of the reference instant for a direction
/// change of daily motion
const STATION_WINDOW_DAYS: i64 = 5;

/// Compute a fully-timed chart: Placidus houses from the birth place,
/// placements with daily motion and station annotations, rulers, and
/// the chart ruler from the Ascendant sign.
pub fn compute_chart(
    utc: NaiveDateTime,
    latitude: f64,
    longitude: f64,
    house_system: i8,
) -> Result<Chart, EphemerisError> {
    let julian_day = datetime_to_julian_day(utc);
    let houses = calc_houses(julian_day, latitude, longitude, house_system)?;

    let mut bodies = Vec::with_capacity(Planet::all().len());
    for (planet, pos) in calc_all_planets(julian_day)? {
        let house = house_of_longitude(pos.longitude, &houses.cusps);
        bodies.push(BodyPlacement::new(
            planet,
            pos.longitude,
            house,
            pos.speed_longitude,
        ));
    }
    annotate_stations(&mut bodies, julian_day)?;

    let angles = Angles::from_asc_mc(houses.ascendant, houses.midheaven);
    let house_rulers = rulers_of_cusps(&houses.cusps);
    let chart_ruler = ZodiacSign::from_longitude(angles.ascendant).ruler();

    Ok(Chart {
        bodies,
        house_cusps: houses.cusps,
        house_rulers,
        angles,
        chart_ruler,
        exact: true,
    })
}

/// Compute a chart for an unknown birth time: noon UT at (0, 0),
/// whole-sign houses counted from the sun's sign, and the solar
/// ascendant at 0° of that sign. Marked `exact = false`.
pub fn compute_solar_chart(date: NaiveDate) -> Result<Chart, EphemerisError> {
    let julian_day = date_to_julian_day(date);

    let sun = calc_planet_position(Planet::Sun, julian_day)?;
    let sun_sign = ZodiacSign::from_longitude(sun.longitude);

    let mut bodies = Vec::with_capacity(Planet::all().len());
    for (planet, pos) in calc_all_planets(julian_day)? {
        let sign = ZodiacSign::from_longitude(pos.longitude);
        bodies.push(BodyPlacement::new(
            planet,
            pos.longitude,
            solar_house(sign, sun_sign),
            pos.speed_longitude,
        ));
    }
    annotate_stations(&mut bodies, julian_day)?;

    let ascendant = sun_sign.start_degree();
    let mut house_cusps = [0.0; 12];
    for (i, cusp) in house_cusps.iter_mut().enumerate() {
        *cusp = (ascendant + i as f64 * 30.0).rem_euclid(360.0);
    }
    let house_rulers = rulers_of_cusps(&house_cusps);

    Ok(Chart {
        bodies,
        house_cusps,
        house_rulers,
        angles: Angles::from_asc_mc(ascendant, (ascendant + 270.0).rem_euclid(360.0)),
        chart_ruler: sun_sign.ruler(),
        exact: false,
    })
}

/// Transit chart for a date: the sky at noon UT, solar houses. House
/// placement of transiting bodies never feeds meter filters, which look
/// at the natal side only.
pub fn compute_transit_chart(date: NaiveDate) -> Result<Chart, EphemerisError> {
    compute_solar_chart(date)
}

/// Birth-data entry point: a full chart when time and place are known,
/// the solar-house approximation otherwise. Times carrying a timezone
/// are converted to UT first; a bare time is taken as UT.
pub fn compute_birth_chart(
    date: NaiveDate,
    time: Option<NaiveTime>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<&str>,
) -> Result<Chart, EphemerisError> {
    match (time, latitude, longitude) {
        (Some(time), Some(lat), Some(lon)) => {
            let utc = match timezone {
                Some(tz) => local_datetime_to_utc(date, time, tz)?,
                None => date.and_time(time),
            };
            compute_chart(utc, lat, lon, HOUSE_PLACIDUS)
        }
        _ => compute_solar_chart(date),
    }
}

fn rulers_of_cusps(cusps: &[f64; 12]) -> [Planet; 12] {
    let mut rulers = [Planet::Sun; 12];
    for (i, cusp) in cusps.iter().enumerate() {
        rulers[i] = ZodiacSign::from_longitude(*cusp).ruler();
    }
    rulers
}

/// Near-zero motion threshold per planet; bodies that never station have
/// none. The node's apparent wobble makes station talk meaningless.
fn station_epsilon(planet: Planet) -> Option<f64> {
    match planet {
        Planet::Sun | Planet::Moon | Planet::NorthNode => None,
        Planet::Mercury | Planet::Venus => Some(0.1),
        Planet::Mars => Some(0.05),
        Planet::Jupiter | Planet::Saturn => Some(0.03),
        Planet::Uranus | Planet::Neptune | Planet::Pluto => Some(0.02),
    }
}

/// Mark bodies as stationary and measure the distance to the nearest
/// direction change. Samples daily motion on each day of a +-5 day
/// window and interpolates the zero crossing linearly, the day-scale
/// analogue of refining a station by bisection.
fn annotate_stations(bodies: &mut [BodyPlacement], julian_day: f64) -> Result<(), EphemerisError> {
    for body in bodies.iter_mut() {
        let Some(epsilon) = station_epsilon(body.planet) else {
            continue;
        };

        let mut motions = Vec::with_capacity((2 * STATION_WINDOW_DAYS + 1) as usize);
        for offset in -STATION_WINDOW_DAYS..=STATION_WINDOW_DAYS {
            let pos = calc_planet_position(body.planet, julian_day + offset as f64)?;
            motions.push(pos.speed_longitude);
        }

        let mut nearest: Option<f64> = None;
        for i in 0..motions.len() - 1 {
            let (a, b) = (motions[i], motions[i + 1]);
            if a == 0.0 || a * b < 0.0 {
                let day_a = i as f64 - STATION_WINDOW_DAYS as f64;
                let crossing = if a == 0.0 || a == b {
                    day_a
                } else {
                    day_a + a / (a - b)
                };
                let distance = crossing.abs();
                nearest = Some(nearest.map_or(distance, |n: f64| n.min(distance)));
            }
        }

        body.days_from_station = nearest;
        body.is_stationary = body.daily_motion.abs() < epsilon || nearest.is_some();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HouseClass;

    #[test]
    fn timed_chart_is_exact_and_valid() {
        let utc = NaiveDate::from_ymd_opt(1990, 6, 15)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap();
        let chart = compute_chart(utc, 8.98, -79.52, HOUSE_PLACIDUS).unwrap();

        assert!(chart.exact);
        assert_eq!(chart.bodies.len(), Planet::all().len());
        assert!(chart.validate().is_ok());
        assert_eq!(
            chart.chart_ruler,
            ZodiacSign::from_longitude(chart.angles.ascendant).ruler()
        );
    }

    #[test]
    fn solar_chart_puts_sun_in_first_house() {
        let chart = compute_solar_chart(NaiveDate::from_ymd_opt(2025, 3, 25).unwrap()).unwrap();

        assert!(!chart.exact);
        assert!(chart.validate().is_ok());
        let sun = chart.body(Planet::Sun).unwrap();
        assert_eq!(sun.house, 1);
        assert_eq!(HouseClass::of(sun.house), HouseClass::Angular);
        // late March sun sits in Aries, so the solar chart is Mars-ruled
        assert_eq!(sun.sign, ZodiacSign::Aries);
        assert_eq!(chart.chart_ruler, Planet::Mars);
    }

    #[test]
    fn transit_chart_carries_motion() {
        let chart = compute_transit_chart(NaiveDate::from_ymd_opt(2025, 3, 25).unwrap()).unwrap();
        let moon = chart.body(Planet::Moon).unwrap();
        // the Moon covers roughly 12-15 degrees a day
        assert!(moon.daily_motion > 10.0 && moon.daily_motion < 16.0);
    }
}
