//! Natal x transit aspect detection

use crate::models::{
    angular_separation, find_aspect, AspectPhase, AspectType, BodyPlacement, Chart,
};

/// Deviation at or under which an aspect is reported as exact
const EXACT_THRESHOLD: f64 = 0.5;

/// An aspect currently in orb between a transiting and a natal body,
/// before any meter-specific weighting.
#[derive(Debug, Clone)]
pub struct ActiveAspect {
    pub transit: BodyPlacement,
    pub natal: BodyPlacement,
    pub aspect: AspectType,
    /// Absolute deviation from the exact angle
    pub deviation: f64,
    /// Signed orb: exact angle minus actual separation
    pub orb: f64,
    pub max_orb: f64,
    pub phase: AspectPhase,
}

/// Find every natal-transit aspect currently within orb.
///
/// Pairs are enumerated in canonical planet order on both sides, so the
/// result order (and therefore all downstream summation order) is
/// deterministic. At most one aspect type survives per pair; overlap is
/// resolved inside [`find_aspect`].
pub fn detect_aspects(natal: &Chart, transit: &Chart) -> Vec<ActiveAspect> {
    let mut active = Vec::new();

    for t in &transit.bodies {
        for n in &natal.bodies {
            let Some(m) = find_aspect(t.longitude, n.longitude, t.planet, n.planet) else {
                continue;
            };

            let separation = angular_separation(t.longitude, n.longitude);
            let phase = classify_phase(t, n, m.aspect, m.deviation);

            active.push(ActiveAspect {
                transit: t.clone(),
                natal: n.clone(),
                aspect: m.aspect,
                deviation: m.deviation,
                orb: m.aspect.angle() - separation,
                max_orb: m.max_orb,
                phase,
            });
        }
    }

    active
}

/// Three-state phase: exact within half a degree, otherwise compare
/// today's deviation against tomorrow's (natal fixed, transit advanced
/// by one day of its current motion).
fn classify_phase(
    transit: &BodyPlacement,
    natal: &BodyPlacement,
    aspect: AspectType,
    deviation_today: f64,
) -> AspectPhase {
    if deviation_today <= EXACT_THRESHOLD {
        return AspectPhase::Exact;
    }

    let separation_tomorrow = angular_separation(transit.longitude_tomorrow(), natal.longitude);
    let deviation_tomorrow = (separation_tomorrow - aspect.angle()).abs();

    if deviation_tomorrow < deviation_today {
        AspectPhase::Applying
    } else {
        AspectPhase::Separating
    }
}
