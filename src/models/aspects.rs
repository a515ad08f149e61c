use serde::{Deserialize, Serialize};
use std::fmt;

use super::Planet;

/// Major aspect types used by the meters
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AspectType {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Opposition,
}

impl AspectType {
    /// Get the exact angle for this aspect
    pub fn angle(&self) -> f64 {
        match self {
            AspectType::Conjunction => 0.0,
            AspectType::Sextile => 60.0,
            AspectType::Square => 90.0,
            AspectType::Trine => 120.0,
            AspectType::Opposition => 180.0,
        }
    }

    /// Base intensity fed into transit power
    pub fn base_intensity(&self) -> f64 {
        match self {
            AspectType::Conjunction => 10.0,
            AspectType::Opposition => 9.0,
            AspectType::Square => 8.0,
            AspectType::Trine => 6.0,
            AspectType::Sextile => 4.0,
        }
    }

    /// Get all aspect types
    pub fn all() -> &'static [AspectType] {
        &[
            AspectType::Conjunction,
            AspectType::Sextile,
            AspectType::Square,
            AspectType::Trine,
            AspectType::Opposition,
        ]
    }
}

impl fmt::Display for AspectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AspectType::Conjunction => "conjunction",
            AspectType::Sextile => "sextile",
            AspectType::Square => "square",
            AspectType::Trine => "trine",
            AspectType::Opposition => "opposition",
        };
        write!(f, "{}", name)
    }
}

/// Whether the transit is closing in on exactness, sitting on it, or
/// moving away. Exact means deviation within half a degree; an exact
/// aspect is still "applying" in the two-state sense but is reported as
/// its own state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AspectPhase {
    Applying,
    Exact,
    Separating,
}

impl fmt::Display for AspectPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AspectPhase::Applying => "applying",
            AspectPhase::Exact => "exact",
            AspectPhase::Separating => "separating",
        };
        write!(f, "{}", name)
    }
}

/// Shortest angular separation between two ecliptic longitudes
pub fn angular_separation(lon_a: f64, lon_b: f64) -> f64 {
    let diff = (lon_a - lon_b).abs() % 360.0;
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Maximum orb for an aspect between a transiting and a natal body.
/// A luminary on either end widens the orb; an outer transit planet
/// tightens it.
pub fn max_orb(aspect: AspectType, transit: Planet, natal: Planet) -> f64 {
    let luminary = transit.is_luminary() || natal.is_luminary();
    let outer_transit = transit.is_outer();

    match aspect {
        AspectType::Conjunction | AspectType::Opposition => {
            if luminary {
                10.0
            } else if outer_transit {
                6.0
            } else {
                8.0
            }
        }
        AspectType::Square | AspectType::Trine => {
            if luminary {
                8.0
            } else if outer_transit {
                5.0
            } else {
                7.0
            }
        }
        AspectType::Sextile => {
            if luminary {
                6.0
            } else if outer_transit {
                4.0
            } else {
                5.0
            }
        }
    }
}

/// A matched aspect between two longitudes, before any weighting
#[derive(Debug, Clone, Copy)]
pub struct AspectMatch {
    pub aspect: AspectType,
    /// Absolute deviation from the exact angle, in degrees
    pub deviation: f64,
    /// Orb limit that admitted the match
    pub max_orb: f64,
}

/// Check whether two positions form an aspect within orb.
///
/// When more than one aspect type is simultaneously in orb for the pair
/// (wide-orb edge cases around 60°/90°), the one closest to exact wins;
/// an exact tie goes to the aspect of higher base intensity.
pub fn find_aspect(
    transit_longitude: f64,
    natal_longitude: f64,
    transit_planet: Planet,
    natal_planet: Planet,
) -> Option<AspectMatch> {
    let separation = angular_separation(transit_longitude, natal_longitude);

    let mut best: Option<AspectMatch> = None;
    for aspect in AspectType::all() {
        let deviation = (separation - aspect.angle()).abs();
        let orb_limit = max_orb(*aspect, transit_planet, natal_planet);
        if deviation > orb_limit {
            continue;
        }
        let candidate = AspectMatch {
            aspect: *aspect,
            deviation,
            max_orb: orb_limit,
        };
        best = match best {
            None => Some(candidate),
            Some(current) => {
                if deviation < current.deviation
                    || (deviation == current.deviation
                        && aspect.base_intensity() > current.aspect.base_intensity())
                {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }

    best
}
