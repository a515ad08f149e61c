//! Per-aspect scoring: natal weightage, transit power, and quality polarity

use crate::models::{dignity_score, AspectPhase, AspectType, BodyPlacement, HouseClass, Planet};

use super::detector::ActiveAspect;

/// Bonus for the planet ruling the Ascendant sign
const CHART_RULER_BONUS: f64 = 5.0;

/// Sensitivity multiplier bounds; values outside are clamped, never errors
pub const SENSITIVITY_MIN: f64 = 0.5;
pub const SENSITIVITY_MAX: f64 = 2.0;

/// Clamp a user sensitivity setting into its supported range
pub fn clamp_sensitivity(sensitivity: f64) -> f64 {
    sensitivity.clamp(SENSITIVITY_MIN, SENSITIVITY_MAX)
}

/// Weightage of a natal body: planetary importance plus dignity plus the
/// chart-ruler bonus, scaled by the accidental strength of its house and
/// the user's sensitivity.
pub fn weightage(natal: &BodyPlacement, chart_ruler: Planet, sensitivity: f64) -> f64 {
    let ruler_bonus = if natal.planet == chart_ruler {
        CHART_RULER_BONUS
    } else {
        0.0
    };
    let essential = natal.planet.base_weight() + dignity_score(natal.planet, natal.sign) + ruler_bonus;

    essential * HouseClass::of(natal.house).multiplier() * clamp_sensitivity(sensitivity)
}

/// Linear decay from 1 at exactness to 0 at the orb limit
pub fn orb_factor(deviation: f64, max_orb: f64) -> f64 {
    if max_orb <= 0.0 {
        return 0.0;
    }
    (1.0 - deviation / max_orb).max(0.0)
}

/// Exact aspects hit hardest, applying ones build, separating ones fade
pub fn direction_modifier(phase: AspectPhase) -> f64 {
    match phase {
        AspectPhase::Exact => 1.5,
        AspectPhase::Applying => 1.3,
        AspectPhase::Separating => 0.7,
    }
}

/// Station emphasis: 1.8 at the station itself, decaying linearly to 1.2
/// at five days out, flat 1.0 beyond.
pub fn station_modifier(is_stationary: bool, days_from_station: Option<f64>) -> f64 {
    match days_from_station {
        Some(days) => {
            let days = days.abs();
            if days <= 5.0 {
                1.8 - 0.12 * days
            } else {
                1.0
            }
        }
        None => {
            if is_stationary {
                1.8
            } else {
                1.0
            }
        }
    }
}

/// Slow movers carry more weight while transiting; the Moon flits past
pub fn transit_weight(planet: Planet) -> f64 {
    if planet.is_outer() {
        1.5
    } else if planet.is_social() {
        1.2
    } else if planet == Planet::Moon {
        0.8
    } else {
        1.0
    }
}

/// Transit power of an active aspect. `retrograde_modifier` is a
/// meter-config multiplier applied only while the transit planet is
/// actually retrograde; it scales power before the weightage product.
pub fn transit_power(aspect: &ActiveAspect, retrograde_modifier: Option<f64>) -> f64 {
    let mut power = aspect.aspect.base_intensity()
        * orb_factor(aspect.deviation, aspect.max_orb)
        * direction_modifier(aspect.phase)
        * station_modifier(
            aspect.transit.is_stationary,
            aspect.transit.days_from_station,
        )
        * transit_weight(aspect.transit.planet);

    if aspect.transit.is_retrograde() {
        if let Some(modifier) = retrograde_modifier {
            power *= modifier;
        }
    }

    power
}

/// Signed quality polarity of an aspect, in [-1, +1].
///
/// Trines and sextiles flow, squares and oppositions grind. Conjunctions
/// take their color from the two planets involved; the rules are checked
/// in order and the first match wins.
pub fn quality(aspect: AspectType, transit: Planet, natal: Planet) -> f64 {
    match aspect {
        AspectType::Trine | AspectType::Sextile => 1.0,
        AspectType::Square | AspectType::Opposition => -1.0,
        AspectType::Conjunction => conjunction_quality(transit, natal),
    }
}

fn conjunction_quality(a: Planet, b: Planet) -> f64 {
    if a.is_benefic() && b.is_benefic() {
        0.8
    } else if a.is_malefic() && b.is_malefic() {
        -0.8
    } else if (a.is_benefic() && b.is_malefic()) || (a.is_malefic() && b.is_benefic()) {
        0.2
    } else if a.is_transformational() || b.is_transformational() {
        -0.3
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AspectPhase, BodyPlacement, ZodiacSign};
    use approx::assert_relative_eq;

    fn placement(planet: Planet, longitude: f64, house: u8) -> BodyPlacement {
        BodyPlacement::new(planet, longitude, house, 0.5)
    }

    #[test]
    fn weightage_domicile_ruler_angular() {
        // Venus in Libra (domicile), chart ruler, 7th house (angular):
        // (7 + 5 + 5) * 3 * 1.0 = 51
        let venus = placement(Planet::Venus, 195.0, 7);
        assert_eq!(venus.sign, ZodiacSign::Libra);
        assert_relative_eq!(weightage(&venus, Planet::Venus, 1.0), 51.0);
    }

    #[test]
    fn weightage_succedent_house() {
        // Same Venus in a succedent house: (7 + 5 + 5) * 2 = 34
        let venus = placement(Planet::Venus, 195.0, 2);
        assert_relative_eq!(weightage(&venus, Planet::Venus, 1.0), 34.0);
    }

    #[test]
    fn weightage_malefic_domicile_angular() {
        // Mars in Aries (domicile), not chart ruler, 10th house:
        // (7 + 5) * 3 = 36
        let mars = placement(Planet::Mars, 15.0, 10);
        assert_relative_eq!(weightage(&mars, Planet::Sun, 1.0), 36.0);
    }

    #[test]
    fn weightage_detriment_can_reduce() {
        // Venus in Aries (detriment), cadent: (7 - 5) * 1 = 2
        let venus = placement(Planet::Venus, 10.0, 3);
        assert_relative_eq!(weightage(&venus, Planet::Sun, 1.0), 2.0);
    }

    #[test]
    fn sensitivity_is_clamped() {
        let sun = placement(Planet::Sun, 130.0, 1);
        let base = weightage(&sun, Planet::Mercury, 1.0);
        assert_relative_eq!(weightage(&sun, Planet::Mercury, 0.0), base * 0.5);
        assert_relative_eq!(weightage(&sun, Planet::Mercury, 3.0), base * 2.0);
    }

    #[test]
    fn orb_factor_decay() {
        assert_relative_eq!(orb_factor(0.0, 8.0), 1.0);
        assert_relative_eq!(orb_factor(4.0, 8.0), 0.5);
        assert_relative_eq!(orb_factor(8.0, 8.0), 0.0);
        assert_relative_eq!(orb_factor(9.0, 8.0), 0.0);
        assert_relative_eq!(orb_factor(1.0, 10.0), 0.9);
    }

    #[test]
    fn station_curve() {
        assert_relative_eq!(station_modifier(true, Some(0.0)), 1.8);
        assert_relative_eq!(station_modifier(true, Some(2.5)), 1.5);
        assert_relative_eq!(station_modifier(true, Some(5.0)), 1.2);
        assert_relative_eq!(station_modifier(false, Some(6.0)), 1.0);
        assert_relative_eq!(station_modifier(false, None), 1.0);
        assert_relative_eq!(station_modifier(true, None), 1.8);
    }

    #[test]
    fn transit_weights() {
        assert_relative_eq!(transit_weight(Planet::Pluto), 1.5);
        assert_relative_eq!(transit_weight(Planet::Jupiter), 1.2);
        assert_relative_eq!(transit_weight(Planet::Moon), 0.8);
        assert_relative_eq!(transit_weight(Planet::Mercury), 1.0);
        assert_relative_eq!(transit_weight(Planet::NorthNode), 1.0);
    }

    fn active(
        transit: BodyPlacement,
        natal: BodyPlacement,
        aspect: AspectType,
        deviation: f64,
        max_orb: f64,
        phase: AspectPhase,
    ) -> ActiveAspect {
        ActiveAspect {
            transit,
            natal,
            aspect,
            deviation,
            orb: aspect.angle() - deviation,
            max_orb,
            phase,
        }
    }

    #[test]
    fn power_exact_jupiter_trine() {
        // trine base 6, exact (1.5), no station, social weight 1.2 = 10.8
        let a = active(
            placement(Planet::Jupiter, 120.0, 1),
            placement(Planet::Venus, 0.0, 7),
            AspectType::Trine,
            0.0,
            7.0,
            AspectPhase::Exact,
        );
        assert_relative_eq!(transit_power(&a, None), 10.8);
    }

    #[test]
    fn power_stationary_pluto_conjunction() {
        // conjunction base 10, dev 1 of 10 (0.9), applying 1.3,
        // station 1.8, outer 1.5 = 31.59
        let mut pluto = placement(Planet::Pluto, 1.0, 1);
        pluto.daily_motion = 0.0;
        pluto.is_stationary = true;
        pluto.days_from_station = Some(0.0);
        let a = active(
            pluto,
            placement(Planet::Sun, 0.0, 1),
            AspectType::Conjunction,
            1.0,
            10.0,
            AspectPhase::Applying,
        );
        assert_relative_eq!(transit_power(&a, None), 31.59, epsilon = 1e-9);

        // same transit without the station is markedly weaker
        let mut direct = a.clone();
        direct.transit.is_stationary = false;
        direct.transit.days_from_station = None;
        direct.transit.daily_motion = 0.03;
        assert_relative_eq!(transit_power(&direct, None), 17.55, epsilon = 1e-9);
    }

    #[test]
    fn retrograde_modifier_only_applies_when_retrograde() {
        let direct = active(
            placement(Planet::Venus, 90.0, 1),
            placement(Planet::Sun, 0.0, 1),
            AspectType::Square,
            0.0,
            8.0,
            AspectPhase::Exact,
        );
        let with_modifier = transit_power(&direct, Some(0.7));
        assert_relative_eq!(with_modifier, transit_power(&direct, None));

        let mut retro = direct.clone();
        retro.transit.daily_motion = -0.3;
        assert_relative_eq!(
            transit_power(&retro, Some(0.7)),
            transit_power(&retro, None) * 0.7
        );
    }

    #[test]
    fn fixed_polarities() {
        assert_eq!(quality(AspectType::Trine, Planet::Mars, Planet::Saturn), 1.0);
        assert_eq!(quality(AspectType::Sextile, Planet::Pluto, Planet::Sun), 1.0);
        assert_eq!(quality(AspectType::Square, Planet::Venus, Planet::Jupiter), -1.0);
        assert_eq!(quality(AspectType::Opposition, Planet::Sun, Planet::Moon), -1.0);
    }

    #[test]
    fn conjunction_rules_in_order() {
        // benefic pair
        assert_eq!(
            quality(AspectType::Conjunction, Planet::Venus, Planet::Jupiter),
            0.8
        );
        // malefic pair
        assert_eq!(
            quality(AspectType::Conjunction, Planet::Saturn, Planet::Mars),
            -0.8
        );
        // benefic with malefic, either direction
        assert_eq!(
            quality(AspectType::Conjunction, Planet::Venus, Planet::Saturn),
            0.2
        );
        assert_eq!(
            quality(AspectType::Conjunction, Planet::Mars, Planet::Jupiter),
            0.2
        );
        // transformational involvement
        assert_eq!(
            quality(AspectType::Conjunction, Planet::Pluto, Planet::Sun),
            -0.3
        );
        assert_eq!(
            quality(AspectType::Conjunction, Planet::Venus, Planet::Neptune),
            -0.3
        );
        // neutral remainder
        assert_eq!(
            quality(AspectType::Conjunction, Planet::Sun, Planet::Moon),
            0.0
        );
        assert_eq!(
            quality(AspectType::Conjunction, Planet::Mercury, Planet::Sun),
            0.0
        );
    }
}
