//! Essential dignities for natal weighting

use serde::{Deserialize, Serialize};

use super::{Planet, ZodiacSign};

/// Essential dignity of a planet in a sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Dignity {
    Domicile,
    Exaltation,
    Detriment,
    Fall,
    Neutral,
}

impl Dignity {
    /// Score added to the natal body's base weight
    pub fn score(&self) -> f64 {
        match self {
            Dignity::Domicile => 5.0,
            Dignity::Exaltation => 4.0,
            Dignity::Detriment => -5.0,
            Dignity::Fall => -4.0,
            Dignity::Neutral => 0.0,
        }
    }
}

/// Sign of exaltation, where tradition assigns one
fn exaltation_sign(planet: Planet) -> Option<ZodiacSign> {
    match planet {
        Planet::Sun => Some(ZodiacSign::Aries),
        Planet::Moon => Some(ZodiacSign::Taurus),
        Planet::Mercury => Some(ZodiacSign::Virgo),
        Planet::Venus => Some(ZodiacSign::Pisces),
        Planet::Mars => Some(ZodiacSign::Capricorn),
        Planet::Jupiter => Some(ZodiacSign::Cancer),
        Planet::Saturn => Some(ZodiacSign::Libra),
        _ => None,
    }
}

/// Dignity of a planet in a sign. Domicile follows the traditional
/// rulerships; detriment is the sign opposite a domicile, fall the sign
/// opposite the exaltation. The North Node and the modern outer planets
/// carry no traditional dignity and come back neutral except where they
/// oppose a rulership they hold.
pub fn dignity_of(planet: Planet, sign: ZodiacSign) -> Dignity {
    if sign.ruler() == planet {
        return Dignity::Domicile;
    }
    if exaltation_sign(planet) == Some(sign) {
        return Dignity::Exaltation;
    }
    if sign.opposite().ruler() == planet {
        return Dignity::Detriment;
    }
    if exaltation_sign(planet).map(|s| s.opposite()) == Some(sign) {
        return Dignity::Fall;
    }
    Dignity::Neutral
}

/// Convenience wrapper used by the weightage formula
pub fn dignity_score(planet: Planet, sign: ZodiacSign) -> f64 {
    dignity_of(planet, sign).score()
}
