//! Meter evaluation: filtering, contribution records, and raw totals

use crate::config::MeterConfig;
use crate::models::{AspectPhase, AspectType, Planet, TopAspect};

use super::detector::ActiveAspect;
use super::scoring::{quality, transit_power, weightage};

/// One aspect's fully scored share of a meter
#[derive(Debug, Clone)]
pub struct AspectContribution {
    pub transit: Planet,
    pub natal: Planet,
    pub aspect: AspectType,
    /// Signed orb: exact angle minus actual separation
    pub orb: f64,
    pub orb_abs: f64,
    pub max_orb: f64,
    pub phase: AspectPhase,
    pub is_stationary: bool,
    pub weight: f64,
    pub power: f64,
    pub quality: f64,
    /// weight * power
    pub dti: f64,
    /// weight * power * quality, before the harmonic boost
    pub hqs: f64,
}

impl AspectContribution {
    pub fn to_top_aspect(&self) -> TopAspect {
        TopAspect {
            transit: self.transit,
            natal: self.natal,
            aspect_type: self.aspect,
            orb_degrees: self.orb_abs,
            direction: self.phase,
            contribution_dti: self.dti,
        }
    }
}

/// Raw, uncalibrated evaluation of one meter (or of the unfiltered whole)
#[derive(Debug, Clone)]
pub struct RawEvaluation {
    /// Sum of weight * power; activity regardless of flavor
    pub dti: f64,
    /// Signed sum of weight * power * quality with the harmonic boost applied
    pub hqs: f64,
    pub contributions: Vec<AspectContribution>,
}

/// Harmonic boost: amplify supportive benefic transits, soften the bite
/// of malefic ones. Everything else passes through unchanged; DTI is
/// never boosted.
fn harmonic_boost(transit: Planet, q: f64) -> f64 {
    if transit.is_benefic() && q > 0.0 {
        2.0
    } else if transit.is_malefic() && q < 0.0 {
        0.5
    } else {
        1.0
    }
}

fn score_aspect(
    aspect: &ActiveAspect,
    retrograde_modifier: Option<f64>,
    chart_ruler: Planet,
    sensitivity: f64,
) -> AspectContribution {
    let w = weightage(&aspect.natal, chart_ruler, sensitivity);
    let p = transit_power(aspect, retrograde_modifier);
    let q = quality(aspect.aspect, aspect.transit.planet, aspect.natal.planet);

    AspectContribution {
        transit: aspect.transit.planet,
        natal: aspect.natal.planet,
        aspect: aspect.aspect,
        orb: aspect.orb,
        orb_abs: aspect.deviation,
        max_orb: aspect.max_orb,
        phase: aspect.phase,
        is_stationary: aspect.transit.is_stationary,
        weight: w,
        power: p,
        quality: q,
        dti: w * p,
        hqs: w * p * q,
    }
}

fn accumulate<'a, I>(
    aspects: I,
    modifiers: impl Fn(Planet) -> Option<f64>,
    chart_ruler: Planet,
    sensitivity: f64,
) -> RawEvaluation
where
    I: Iterator<Item = &'a ActiveAspect>,
{
    // Aspects arrive in canonical detector order, which fixes the
    // floating-point summation order and keeps totals bit-stable.
    let mut dti = 0.0;
    let mut hqs = 0.0;
    let mut contributions = Vec::new();

    for aspect in aspects {
        let c = score_aspect(
            aspect,
            modifiers(aspect.transit.planet),
            chart_ruler,
            sensitivity,
        );
        dti += c.dti;
        hqs += c.hqs * harmonic_boost(c.transit, c.quality);
        contributions.push(c);
    }

    RawEvaluation {
        dti,
        hqs,
        contributions,
    }
}

/// Evaluate one meter: keep the aspects whose natal body matches the
/// config's planet set or house set, score each, and total them.
pub fn evaluate_meter(
    aspects: &[ActiveAspect],
    config: &MeterConfig,
    chart_ruler: Planet,
    sensitivity: f64,
) -> RawEvaluation {
    accumulate(
        aspects.iter().filter(|a| config.includes(&a.natal)),
        |planet| config.retrograde_modifier(planet),
        chart_ruler,
        sensitivity,
    )
}

/// Evaluate the unfiltered whole sky, feeding the overall aggregates
pub fn evaluate_all(
    aspects: &[ActiveAspect],
    chart_ruler: Planet,
    sensitivity: f64,
) -> RawEvaluation {
    accumulate(aspects.iter(), |_| None, chart_ruler, sensitivity)
}

/// Pick the K strongest contributions by |dti|. Equal magnitudes fall
/// back to the slower transit planet, then transit and natal names, so
/// the selection is total and deterministic.
pub fn top_contributions(contributions: &[AspectContribution], k: usize) -> Vec<TopAspect> {
    let mut ranked: Vec<&AspectContribution> = contributions.iter().collect();
    ranked.sort_by(|a, b| {
        b.dti
            .abs()
            .partial_cmp(&a.dti.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.transit.speed_rank().cmp(&b.transit.speed_rank()))
            .then_with(|| a.transit.to_string().cmp(&b.transit.to_string()))
            .then_with(|| a.natal.to_string().cmp(&b.natal.to_string()))
    });
    ranked
        .into_iter()
        .take(k)
        .map(AspectContribution::to_top_aspect)
        .collect()
}
