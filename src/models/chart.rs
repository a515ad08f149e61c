use serde::{Deserialize, Serialize};

use super::{Planet, ZodiacPosition, ZodiacSign};
use crate::meters::MetersError;

/// Accidental strength class of a house
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HouseClass {
    Angular,
    Succedent,
    Cadent,
}

impl HouseClass {
    /// Class of a house number (1-12)
    pub fn of(house: u8) -> Self {
        match house {
            1 | 4 | 7 | 10 => HouseClass::Angular,
            2 | 5 | 8 | 11 => HouseClass::Succedent,
            _ => HouseClass::Cadent,
        }
    }

    /// Multiplier applied to natal weightage
    pub fn multiplier(&self) -> f64 {
        match self {
            HouseClass::Angular => 3.0,
            HouseClass::Succedent => 2.0,
            HouseClass::Cadent => 1.0,
        }
    }
}

/// A single body's placement in a chart, natal or transit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyPlacement {
    pub planet: Planet,
    /// Ecliptic longitude in [0, 360)
    pub longitude: f64,
    pub sign: ZodiacSign,
    /// Degree within the sign (0-29.999...)
    pub sign_degree: f64,
    /// House 1-12; solar-house derived when the birth time is unknown
    pub house: u8,
    /// Degrees per day; negative while retrograde
    pub daily_motion: f64,
    /// Near-zero apparent motion, or a direction change within the window
    #[serde(default)]
    pub is_stationary: bool,
    /// Days to the nearest direction change of daily motion, when one is
    /// close enough to matter
    #[serde(default)]
    pub days_from_station: Option<f64>,
}

impl BodyPlacement {
    /// Build a placement from a longitude, filling sign fields
    pub fn new(planet: Planet, longitude: f64, house: u8, daily_motion: f64) -> Self {
        let pos = ZodiacPosition::from_longitude(longitude);
        Self {
            planet,
            longitude: pos.longitude,
            sign: pos.sign,
            sign_degree: pos.degree,
            house,
            daily_motion,
            is_stationary: false,
            days_from_station: None,
        }
    }

    pub fn is_retrograde(&self) -> bool {
        self.planet.can_retrograde() && self.daily_motion < 0.0
    }

    /// Longitude projected one day ahead along the current daily motion
    pub fn longitude_tomorrow(&self) -> f64 {
        (self.longitude + self.daily_motion).rem_euclid(360.0)
    }
}

/// The four chart angles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Angles {
    pub ascendant: f64,
    pub ic: f64,
    pub descendant: f64,
    pub midheaven: f64,
}

impl Angles {
    /// Derive IC and Descendant from Ascendant and MC
    pub fn from_asc_mc(ascendant: f64, midheaven: f64) -> Self {
        Self {
            ascendant: ascendant.rem_euclid(360.0),
            ic: (midheaven + 180.0).rem_euclid(360.0),
            descendant: (ascendant + 180.0).rem_euclid(360.0),
            midheaven: midheaven.rem_euclid(360.0),
        }
    }
}

/// Immutable chart value: eleven body placements, houses with their
/// rulers, the four angles, and the chart ruler. `exact` is true only
/// when birth time and location were provided; solar-house approximations
/// carry `exact = false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
    pub bodies: Vec<BodyPlacement>,
    /// Cusp longitude per house (index 0 = 1st house)
    pub house_cusps: [f64; 12],
    /// Traditional ruler of the sign on each cusp
    pub house_rulers: [Planet; 12],
    pub angles: Angles,
    /// Planet ruling the Ascendant sign
    pub chart_ruler: Planet,
    pub exact: bool,
}

impl Chart {
    /// Look up the placement of a specific planet
    pub fn body(&self, planet: Planet) -> Option<&BodyPlacement> {
        self.bodies.iter().find(|b| b.planet == planet)
    }

    /// Reject charts with out-of-range longitudes or houses before they
    /// enter the engine.
    pub fn validate(&self) -> Result<(), MetersError> {
        for body in &self.bodies {
            if !(0.0..360.0).contains(&body.longitude) || !body.longitude.is_finite() {
                return Err(MetersError::InvalidChart {
                    reason: format!(
                        "{} longitude {} outside [0, 360)",
                        body.planet, body.longitude
                    ),
                });
            }
            if !(1..=12).contains(&body.house) {
                return Err(MetersError::InvalidChart {
                    reason: format!("{} house {} outside 1..12", body.planet, body.house),
                });
            }
        }
        for (i, cusp) in self.house_cusps.iter().enumerate() {
            if !(0.0..360.0).contains(cusp) || !cusp.is_finite() {
                return Err(MetersError::InvalidChart {
                    reason: format!("house {} cusp {} outside [0, 360)", i + 1, cusp),
                });
            }
        }
        Ok(())
    }
}

/// Solar house assignment: the sun's sign is house 1, the next sign
/// house 2, and so on around the wheel.
pub fn solar_house(sign: ZodiacSign, sun_sign: ZodiacSign) -> u8 {
    (((sign.index() + 12 - sun_sign.index()) % 12) + 1) as u8
}

/// House placement by cusp longitudes: a body belongs to the house whose
/// cusp is the last one at or behind it on the wheel.
pub fn house_of_longitude(longitude: f64, cusps: &[f64; 12]) -> u8 {
    let lon = longitude.rem_euclid(360.0);
    for house in 0..12 {
        let start = cusps[house];
        let end = cusps[(house + 1) % 12];
        let in_house = if start <= end {
            lon >= start && lon < end
        } else {
            // wraps past 0° Aries
            lon >= start || lon < end
        };
        if in_house {
            return (house + 1) as u8;
        }
    }
    // numerically possible only with degenerate cusps
    12
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn house_classes() {
        assert_eq!(HouseClass::of(1), HouseClass::Angular);
        assert_eq!(HouseClass::of(7), HouseClass::Angular);
        assert_eq!(HouseClass::of(2), HouseClass::Succedent);
        assert_eq!(HouseClass::of(11), HouseClass::Succedent);
        assert_eq!(HouseClass::of(3), HouseClass::Cadent);
        assert_eq!(HouseClass::of(12), HouseClass::Cadent);
    }

    #[test]
    fn house_multipliers() {
        assert_eq!(HouseClass::Angular.multiplier(), 3.0);
        assert_eq!(HouseClass::Succedent.multiplier(), 2.0);
        assert_eq!(HouseClass::Cadent.multiplier(), 1.0);
    }

    #[test]
    fn solar_houses_wrap() {
        // Sun in Leo: Leo = 1st, Virgo = 2nd, Cancer = 12th
        assert_eq!(solar_house(ZodiacSign::Leo, ZodiacSign::Leo), 1);
        assert_eq!(solar_house(ZodiacSign::Virgo, ZodiacSign::Leo), 2);
        assert_eq!(solar_house(ZodiacSign::Cancer, ZodiacSign::Leo), 12);
        assert_eq!(solar_house(ZodiacSign::Aries, ZodiacSign::Leo), 9);
    }

    #[test]
    fn longitude_house_lookup() {
        let mut cusps = [0.0; 12];
        for (i, cusp) in cusps.iter_mut().enumerate() {
            *cusp = i as f64 * 30.0;
        }
        assert_eq!(house_of_longitude(15.0, &cusps), 1);
        assert_eq!(house_of_longitude(45.0, &cusps), 2);
        assert_eq!(house_of_longitude(359.0, &cusps), 12);
    }

    #[test]
    fn longitude_house_lookup_wrapping_cusp() {
        let mut cusps = [0.0; 12];
        for (i, cusp) in cusps.iter_mut().enumerate() {
            *cusp = (340.0 + i as f64 * 30.0) % 360.0;
        }
        assert_eq!(house_of_longitude(350.0, &cusps), 1);
        assert_eq!(house_of_longitude(5.0, &cusps), 1);
        assert_eq!(house_of_longitude(15.0, &cusps), 2);
    }

    #[test]
    fn retrograde_flag_respects_planet() {
        let node = BodyPlacement::new(Planet::NorthNode, 10.0, 1, -0.05);
        assert!(node.is_retrograde());
        let sun = BodyPlacement::new(Planet::Sun, 10.0, 1, -0.05);
        assert!(!sun.is_retrograde());
    }

    #[test]
    fn tomorrow_wraps_longitude() {
        let body = BodyPlacement::new(Planet::Moon, 359.0, 1, 13.0);
        assert!((body.longitude_tomorrow() - 12.0).abs() < 1e-9);
    }

    fn minimal_chart() -> Chart {
        let mut cusps = [0.0; 12];
        for (i, cusp) in cusps.iter_mut().enumerate() {
            *cusp = i as f64 * 30.0;
        }
        Chart {
            bodies: vec![BodyPlacement::new(Planet::Sun, 15.0, 1, 1.0)],
            house_cusps: cusps,
            house_rulers: [Planet::Mars; 12],
            angles: Angles::from_asc_mc(0.0, 270.0),
            chart_ruler: Planet::Mars,
            exact: true,
        }
    }

    #[test]
    fn validate_accepts_well_formed() {
        assert!(minimal_chart().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_longitude() {
        let mut chart = minimal_chart();
        chart.bodies[0].longitude = 400.0;
        assert!(chart.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_house() {
        let mut chart = minimal_chart();
        chart.bodies[0].house = 13;
        assert!(chart.validate().is_err());
    }
}
