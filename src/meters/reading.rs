//! Top-level reading assembly: single meter, full panel, and trends

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::config::{MeterConfig, MeterRegistry, OVERALL_HARMONY, OVERALL_INTENSITY};
use crate::models::{
    AllMetersReading, Chart, GroupReading, HarmonyBucket, IntensityBucket, MeterReading,
    OverallScalar, Planet, Quality, RawScores, Scores, State,
};

use super::aggregate::{group_scores, reading_trend, scalar_trend, unified_score, TrendKind};
use super::detector::{detect_aspects, ActiveAspect};
use super::error::MetersError;
use super::evaluator::{evaluate_all, evaluate_meter, top_contributions};
use super::normalize::normalize;

/// How many aspect contributions a reading reports
pub const TOP_ASPECT_COUNT: usize = 5;

/// Compute one meter's reading for a date.
pub fn compute_meter(
    name: &str,
    natal: &Chart,
    transit: &Chart,
    date: NaiveDate,
    registry: &MeterRegistry,
    sensitivity: f64,
) -> Result<MeterReading, MetersError> {
    natal.validate()?;
    transit.validate()?;

    let config = registry
        .meters
        .get(name)
        .ok_or_else(|| MetersError::UnknownMeter {
            name: name.to_string(),
        })?;

    let aspects = detect_aspects(natal, transit);
    meter_reading(&aspects, config, natal.chart_ruler, date, registry, sensitivity)
}

/// Compute the full panel: every configured meter once, the five groups,
/// and the two overall aggregates. All-or-nothing; a failing meter fails
/// the call.
pub fn compute_all_meters(
    natal: &Chart,
    transit: &Chart,
    date: NaiveDate,
    registry: &MeterRegistry,
    sensitivity: f64,
) -> Result<AllMetersReading, MetersError> {
    natal.validate()?;
    transit.validate()?;

    let aspects = detect_aspects(natal, transit);

    let mut meters: BTreeMap<String, MeterReading> = BTreeMap::new();
    for (name, config) in registry.meters.iter() {
        let reading = meter_reading(
            &aspects,
            config,
            natal.chart_ruler,
            date,
            registry,
            sensitivity,
        )?;
        meters.insert(name.clone(), reading);
    }

    let mut groups: BTreeMap<String, GroupReading> = BTreeMap::new();
    for (group_name, group_config) in registry.meters.groups() {
        let members = registry.meters.members_of(group_name);
        let scores = group_scores(members.iter().filter_map(|m| meters.get(m.as_str())));
        let quality = Quality::classify(scores.intensity, scores.harmony);
        let label = group_config
            .state_labels
            .get(
                IntensityBucket::of(scores.intensity),
                HarmonyBucket::of(scores.harmony),
            )
            .to_string();
        groups.insert(
            group_name.clone(),
            GroupReading {
                name: group_name.clone(),
                display_name: group_config.display_name.clone(),
                scores,
                state: State { label, quality },
                members,
                trend: None,
            },
        );
    }

    let overall = evaluate_all(&aspects, natal.chart_ruler, sensitivity);
    let intensity_pct =
        registry
            .calibration
            .get(OVERALL_INTENSITY)
            .ok_or_else(|| MetersError::CalibrationMissing {
                meter: OVERALL_INTENSITY.to_string(),
            })?;
    let harmony_pct =
        registry
            .calibration
            .get(OVERALL_HARMONY)
            .ok_or_else(|| MetersError::CalibrationMissing {
                meter: OVERALL_HARMONY.to_string(),
            })?;

    let overall_intensity = normalize(overall.dti, &intensity_pct.dti_percentiles);
    let overall_harmony = if overall.contributions.is_empty() {
        50.0
    } else {
        normalize(overall.hqs, &harmony_pct.hqs_percentiles)
    };

    Ok(AllMetersReading {
        date,
        meters,
        groups,
        overall_intensity: OverallScalar {
            value: overall_intensity,
            raw: overall.dti,
            trend: None,
        },
        overall_harmony: OverallScalar {
            value: overall_harmony,
            raw: overall.hqs,
            trend: None,
        },
        overall_quality: Quality::classify(overall_intensity, overall_harmony),
        aspect_count: overall.contributions.len(),
        key_aspects: top_contributions(&overall.contributions, TOP_ASPECT_COUNT),
    })
}

/// Attach day-over-day trends to a panel, given yesterday's panel. Pure
/// post-processing; meters or groups missing from yesterday simply keep
/// an empty trend. Group and overall trends are computed on the
/// aggregated scalars, not averaged from members.
pub fn compute_trends(
    today: &AllMetersReading,
    yesterday: &AllMetersReading,
) -> AllMetersReading {
    let mut out = today.clone();

    for (name, reading) in out.meters.iter_mut() {
        if let Some(prev) = yesterday.meters.get(name) {
            reading.trend = Some(reading_trend(&reading.scores, &prev.scores));
        }
    }
    for (name, group) in out.groups.iter_mut() {
        if let Some(prev) = yesterday.groups.get(name) {
            group.trend = Some(reading_trend(&group.scores, &prev.scores));
        }
    }

    out.overall_intensity.trend = Some(scalar_trend(
        TrendKind::Intensity,
        out.overall_intensity.value,
        yesterday.overall_intensity.value,
    ));
    out.overall_harmony.trend = Some(scalar_trend(
        TrendKind::Harmony,
        out.overall_harmony.value,
        yesterday.overall_harmony.value,
    ));

    out
}

fn meter_reading(
    aspects: &[ActiveAspect],
    config: &MeterConfig,
    chart_ruler: Planet,
    date: NaiveDate,
    registry: &MeterRegistry,
    sensitivity: f64,
) -> Result<MeterReading, MetersError> {
    let pct = registry
        .calibration
        .get(&config.name)
        .ok_or_else(|| MetersError::CalibrationMissing {
            meter: config.name.clone(),
        })?;

    let eval = evaluate_meter(aspects, config, chart_ruler, sensitivity);

    let (intensity, harmony) = if eval.contributions.is_empty() {
        // a quiet sky reads as neutral by convention
        (0.0, 50.0)
    } else {
        (
            normalize(eval.dti, &pct.dti_percentiles),
            normalize(eval.hqs, &pct.hqs_percentiles),
        )
    };
    let unified = unified_score(intensity, harmony);
    let quality = Quality::classify(intensity, harmony);
    let label = config
        .state_labels
        .get(IntensityBucket::of(intensity), HarmonyBucket::of(harmony))
        .to_string();

    Ok(MeterReading {
        name: config.name.clone(),
        group: config.group.clone(),
        date,
        scores: Scores {
            unified_score: unified,
            harmony,
            intensity,
        },
        state: State { label, quality },
        raw: RawScores {
            dti: eval.dti,
            hqs: eval.hqs,
        },
        top_aspects: top_contributions(&eval.contributions, TOP_ASPECT_COUNT),
        trend: None,
    })
}
