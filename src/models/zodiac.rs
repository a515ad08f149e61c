use serde::{Deserialize, Serialize};
use std::fmt;

/// Zodiac signs in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

/// Classical element of a sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

/// Modality (quadruplicity) of a sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Cardinal,
    Fixed,
    Mutable,
}

impl ZodiacSign {
    /// Get sign from ecliptic longitude (0-360 degrees)
    pub fn from_longitude(longitude: f64) -> Self {
        let normalized = longitude.rem_euclid(360.0);
        let sign_index = (normalized / 30.0).floor() as usize;
        Self::from_index(sign_index)
    }

    /// Get sign from index (0 = Aries, 11 = Pisces)
    pub fn from_index(index: usize) -> Self {
        match index % 12 {
            0 => ZodiacSign::Aries,
            1 => ZodiacSign::Taurus,
            2 => ZodiacSign::Gemini,
            3 => ZodiacSign::Cancer,
            4 => ZodiacSign::Leo,
            5 => ZodiacSign::Virgo,
            6 => ZodiacSign::Libra,
            7 => ZodiacSign::Scorpio,
            8 => ZodiacSign::Sagittarius,
            9 => ZodiacSign::Capricorn,
            10 => ZodiacSign::Aquarius,
            11 => ZodiacSign::Pisces,
            _ => unreachable!(),
        }
    }

    /// Get the starting degree of this sign (0 = Aries start)
    pub fn start_degree(&self) -> f64 {
        self.index() as f64 * 30.0
    }

    /// Get sign index (0 = Aries, 11 = Pisces)
    pub fn index(&self) -> usize {
        match self {
            ZodiacSign::Aries => 0,
            ZodiacSign::Taurus => 1,
            ZodiacSign::Gemini => 2,
            ZodiacSign::Cancer => 3,
            ZodiacSign::Leo => 4,
            ZodiacSign::Virgo => 5,
            ZodiacSign::Libra => 6,
            ZodiacSign::Scorpio => 7,
            ZodiacSign::Sagittarius => 8,
            ZodiacSign::Capricorn => 9,
            ZodiacSign::Aquarius => 10,
            ZodiacSign::Pisces => 11,
        }
    }

    /// Get next sign
    pub fn next(&self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Sign directly opposite on the wheel
    pub fn opposite(&self) -> Self {
        Self::from_index(self.index() + 6)
    }

    pub fn element(&self) -> Element {
        match self.index() % 4 {
            0 => Element::Fire,
            1 => Element::Earth,
            2 => Element::Air,
            _ => Element::Water,
        }
    }

    pub fn modality(&self) -> Modality {
        match self.index() % 3 {
            0 => Modality::Cardinal,
            1 => Modality::Fixed,
            _ => Modality::Mutable,
        }
    }

    /// Traditional ruler of this sign
    pub fn ruler(&self) -> Planet {
        match self {
            ZodiacSign::Aries => Planet::Mars,
            ZodiacSign::Taurus => Planet::Venus,
            ZodiacSign::Gemini => Planet::Mercury,
            ZodiacSign::Cancer => Planet::Moon,
            ZodiacSign::Leo => Planet::Sun,
            ZodiacSign::Virgo => Planet::Mercury,
            ZodiacSign::Libra => Planet::Venus,
            ZodiacSign::Scorpio => Planet::Mars,
            ZodiacSign::Sagittarius => Planet::Jupiter,
            ZodiacSign::Capricorn => Planet::Saturn,
            ZodiacSign::Aquarius => Planet::Saturn,
            ZodiacSign::Pisces => Planet::Jupiter,
        }
    }

    /// Get all signs for iteration
    pub fn all() -> &'static [ZodiacSign] {
        &[
            ZodiacSign::Aries,
            ZodiacSign::Taurus,
            ZodiacSign::Gemini,
            ZodiacSign::Cancer,
            ZodiacSign::Leo,
            ZodiacSign::Virgo,
            ZodiacSign::Libra,
            ZodiacSign::Scorpio,
            ZodiacSign::Sagittarius,
            ZodiacSign::Capricorn,
            ZodiacSign::Aquarius,
            ZodiacSign::Pisces,
        ]
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        };
        write!(f, "{}", name)
    }
}

/// Celestial bodies used in meter calculations
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Planet {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    /// North Node (True Lunar Node) - the ascending lunar node
    NorthNode,
}

impl Planet {
    /// Get all bodies in canonical order. Aspect enumeration and summation
    /// follow this order, which keeps readings deterministic.
    pub fn all() -> &'static [Planet] {
        &[
            Planet::Sun,
            Planet::Moon,
            Planet::Mercury,
            Planet::Venus,
            Planet::Mars,
            Planet::Jupiter,
            Planet::Saturn,
            Planet::Uranus,
            Planet::Neptune,
            Planet::Pluto,
            Planet::NorthNode,
        ]
    }

    /// Get Swiss Ephemeris body ID
    pub fn swe_id(&self) -> i32 {
        match self {
            Planet::Sun => 0,        // SE_SUN
            Planet::Moon => 1,       // SE_MOON
            Planet::Mercury => 2,    // SE_MERCURY
            Planet::Venus => 3,      // SE_VENUS
            Planet::Mars => 4,       // SE_MARS
            Planet::Jupiter => 5,    // SE_JUPITER
            Planet::Saturn => 6,     // SE_SATURN
            Planet::Uranus => 7,     // SE_URANUS
            Planet::Neptune => 8,    // SE_NEPTUNE
            Planet::Pluto => 9,      // SE_PLUTO
            Planet::NorthNode => 11, // SE_TRUE_NODE (True Lunar Node)
        }
    }

    /// Whether this body can be retrograde
    /// Sun and Moon cannot retrograde; North Node is always retrograde (apparent motion)
    pub fn can_retrograde(&self) -> bool {
        !matches!(self, Planet::Sun | Planet::Moon)
    }

    /// Sun and Moon
    pub fn is_luminary(&self) -> bool {
        matches!(self, Planet::Sun | Planet::Moon)
    }

    /// Venus and Jupiter
    pub fn is_benefic(&self) -> bool {
        matches!(self, Planet::Venus | Planet::Jupiter)
    }

    /// Mars and Saturn
    pub fn is_malefic(&self) -> bool {
        matches!(self, Planet::Mars | Planet::Saturn)
    }

    /// Uranus, Neptune, Pluto
    pub fn is_transformational(&self) -> bool {
        matches!(self, Planet::Uranus | Planet::Neptune | Planet::Pluto)
    }

    /// The transformational trio, as it matters for orbs and transit weights
    pub fn is_outer(&self) -> bool {
        self.is_transformational()
    }

    /// Jupiter and Saturn
    pub fn is_social(&self) -> bool {
        matches!(self, Planet::Jupiter | Planet::Saturn)
    }

    /// Sun, Mercury, Venus, Mars
    pub fn is_inner(&self) -> bool {
        matches!(
            self,
            Planet::Sun | Planet::Mercury | Planet::Venus | Planet::Mars
        )
    }

    /// Base importance of a natal body in weightage
    pub fn base_weight(&self) -> f64 {
        match self {
            Planet::Sun | Planet::Moon => 10.0,
            Planet::Mercury | Planet::Venus | Planet::Mars => 7.0,
            Planet::Jupiter | Planet::Saturn => 5.0,
            Planet::Uranus | Planet::Neptune | Planet::Pluto => 3.0,
            Planet::NorthNode => 3.0,
        }
    }

    /// Rank used to break ties between contributions of equal magnitude:
    /// slower-moving transit planets sort first (outer > social > inner > Moon).
    pub fn speed_rank(&self) -> u8 {
        if self.is_outer() {
            0
        } else if self.is_social() {
            1
        } else if *self == Planet::NorthNode {
            2
        } else if self.is_inner() {
            3
        } else {
            // Moon
            4
        }
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Planet::Sun => "Sun",
            Planet::Moon => "Moon",
            Planet::Mercury => "Mercury",
            Planet::Venus => "Venus",
            Planet::Mars => "Mars",
            Planet::Jupiter => "Jupiter",
            Planet::Saturn => "Saturn",
            Planet::Uranus => "Uranus",
            Planet::Neptune => "Neptune",
            Planet::Pluto => "Pluto",
            Planet::NorthNode => "North Node",
        };
        write!(f, "{}", name)
    }
}

/// A position in the zodiac with sign and degree
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ZodiacPosition {
    pub sign: ZodiacSign,
    /// Degree within the sign (0-29.999...)
    pub degree: f64,
    /// Full ecliptic longitude (0-360)
    pub longitude: f64,
}

impl ZodiacPosition {
    pub fn from_longitude(longitude: f64) -> Self {
        let normalized = longitude.rem_euclid(360.0);
        let sign = ZodiacSign::from_longitude(normalized);
        let degree = normalized - sign.start_degree();
        Self {
            sign,
            degree,
            longitude: normalized,
        }
    }

    /// Format as "X° Sign" (e.g., "28° Scorpio")
    pub fn format_degree_sign(&self) -> String {
        format!("{}° {}", self.degree.round() as i32, self.sign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_from_longitude() {
        assert_eq!(ZodiacSign::from_longitude(280.0), ZodiacSign::Capricorn);
        assert_eq!(ZodiacSign::from_longitude(45.0), ZodiacSign::Taurus);
        assert_eq!(ZodiacSign::from_longitude(360.0), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(-10.0), ZodiacSign::Pisces);
    }

    #[test]
    fn sign_elements_and_modalities() {
        assert_eq!(ZodiacSign::Aries.element(), Element::Fire);
        assert_eq!(ZodiacSign::Taurus.element(), Element::Earth);
        assert_eq!(ZodiacSign::Libra.element(), Element::Air);
        assert_eq!(ZodiacSign::Pisces.element(), Element::Water);

        assert_eq!(ZodiacSign::Cancer.modality(), Modality::Cardinal);
        assert_eq!(ZodiacSign::Scorpio.modality(), Modality::Fixed);
        assert_eq!(ZodiacSign::Sagittarius.modality(), Modality::Mutable);
    }

    #[test]
    fn traditional_rulers() {
        assert_eq!(ZodiacSign::Leo.ruler(), Planet::Sun);
        assert_eq!(ZodiacSign::Cancer.ruler(), Planet::Moon);
        assert_eq!(ZodiacSign::Scorpio.ruler(), Planet::Mars);
        assert_eq!(ZodiacSign::Aquarius.ruler(), Planet::Saturn);
        assert_eq!(ZodiacSign::Pisces.ruler(), Planet::Jupiter);
    }

    #[test]
    fn planet_classes() {
        assert!(Planet::Sun.is_luminary());
        assert!(Planet::Venus.is_benefic());
        assert!(Planet::Saturn.is_malefic());
        assert!(Planet::Pluto.is_outer());
        assert!(Planet::Jupiter.is_social());
        assert!(!Planet::Moon.is_inner());
    }

    #[test]
    fn speed_rank_orders_slow_before_fast() {
        assert!(Planet::Pluto.speed_rank() < Planet::Saturn.speed_rank());
        assert!(Planet::Saturn.speed_rank() < Planet::Mars.speed_rank());
        assert!(Planet::Mars.speed_rank() < Planet::Moon.speed_rank());
    }

    #[test]
    fn zodiac_position_split() {
        let pos = ZodiacPosition::from_longitude(215.5);
        assert_eq!(pos.sign, ZodiacSign::Scorpio);
        assert!((pos.degree - 5.5).abs() < 1e-9);
    }
}
