//! Offline calibration batch
//!
//! Replays the meter evaluator, unnormalized, over a population of
//! synthetic natal charts and a span of daily transits, then derives the
//! per-meter percentile tables the normalizer interpolates against. The
//! batch is embarrassingly parallel over charts: each worker fills its
//! own accumulator and a single merge runs at the end. Rerun it whenever
//! meter filters, orbs, weightage, power, quality factors, or the
//! harmonic boost change - the registry refuses mismatched versions.

use chrono::{Duration, NaiveDate, NaiveTime};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{
    CalibrationTable, MeterPercentiles, MeterSet, PercentileTable, OVERALL_HARMONY,
    OVERALL_INTENSITY,
};
use crate::ephemeris::chart::{compute_chart, compute_solar_chart, compute_transit_chart};
use crate::ephemeris::houses::HOUSE_PLACIDUS;
use crate::meters::{detect_aspects, evaluate_all, evaluate_meter, MetersError};
use crate::models::Chart;

/// Parameters of one calibration run
#[derive(Debug, Clone)]
pub struct CalibrationSpec {
    /// Synthetic natal charts to draw
    pub chart_count: usize,
    /// First transit day, inclusive
    pub start: NaiveDate,
    /// Last transit day, inclusive
    pub end: NaiveDate,
    /// RNG seed; identical specs reproduce identical tables
    pub seed: u64,
}

impl CalibrationSpec {
    /// The reference backtest: one thousand charts over five years
    pub fn reference(start: NaiveDate) -> Self {
        Self {
            chart_count: 1000,
            start,
            end: start + Duration::days(5 * 365),
            seed: 0x5eed,
        }
    }
}

/// Cooperative cancellation for the batch loop
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Raw sample series for one meter
#[derive(Debug, Clone, Default)]
struct SampleSeries {
    dti: Vec<f64>,
    hqs: Vec<f64>,
}

type Accumulator = BTreeMap<String, SampleSeries>;

/// One synthetic birth. A missing time means the chart falls back to the
/// solar-house scheme, mirroring real users without a birth time.
#[derive(Debug, Clone)]
struct BirthSample {
    date: NaiveDate,
    time: Option<NaiveTime>,
    latitude: f64,
    longitude: f64,
}

/// Run the batch and produce a table stamped with the meter set version.
pub fn run_calibration(
    spec: &CalibrationSpec,
    meters: &MeterSet,
    cancel: &CancelToken,
) -> Result<CalibrationTable, MetersError> {
    meters.validate()?;
    if spec.chart_count == 0 || spec.end < spec.start {
        return Err(MetersError::InvalidConfig {
            reason: "calibration needs at least one chart and a non-empty date range".to_string(),
        });
    }

    let started = Instant::now();
    let days = day_range(spec.start, spec.end);
    tracing::info!(
        charts = spec.chart_count,
        days = days.len(),
        meters = meters.len(),
        "starting calibration batch"
    );

    // Transit charts depend only on the date; compute each once and
    // share them read-only across every worker.
    let transits: Vec<Chart> = days
        .par_iter()
        .map(|day| compute_transit_chart(*day))
        .collect::<Result<_, _>>()?;

    // Draw birth parameters serially from the seeded generator so the
    // population does not depend on worker count, then build charts in
    // parallel.
    let births = sample_births(spec);
    let natal_charts: Vec<Chart> = births
        .par_iter()
        .map(|birth| match birth.time {
            Some(time) => compute_chart(
                birth.date.and_time(time),
                birth.latitude,
                birth.longitude,
                HOUSE_PLACIDUS,
            ),
            None => compute_solar_chart(birth.date),
        })
        .collect::<Result<_, _>>()?;

    // One chart per task: coarse enough to amortize setup, fine enough
    // to keep every core busy.
    let locals: Vec<Accumulator> = natal_charts
        .par_iter()
        .map(|natal| chart_samples(natal, &transits, meters, cancel))
        .collect::<Result<_, _>>()?;

    let mut merged = new_accumulator(meters);
    for local in locals {
        for (name, series) in local {
            let target = merged.entry(name).or_default();
            target.dti.extend(series.dti);
            target.hqs.extend(series.hqs);
        }
    }

    let mut table = BTreeMap::new();
    for (name, mut series) in merged {
        table.insert(
            name,
            MeterPercentiles {
                dti_percentiles: percentile_table(&mut series.dti),
                hqs_percentiles: percentile_table(&mut series.hqs),
            },
        );
    }

    tracing::info!(
        elapsed_secs = started.elapsed().as_secs(),
        samples_per_meter = spec.chart_count * days.len(),
        "calibration batch finished"
    );

    Ok(CalibrationTable {
        version: meters.version.clone(),
        generated_at: None,
        meters: table,
    })
}

/// Raw DTI/HQS of every meter and the overalls for one natal chart
/// across every transit day.
fn chart_samples(
    natal: &Chart,
    transits: &[Chart],
    meters: &MeterSet,
    cancel: &CancelToken,
) -> Result<Accumulator, MetersError> {
    let mut acc = new_accumulator(meters);

    for transit in transits {
        if cancel.is_cancelled() {
            return Err(MetersError::Cancelled);
        }

        let aspects = detect_aspects(natal, transit);
        for (name, config) in meters.iter() {
            let eval = evaluate_meter(&aspects, config, natal.chart_ruler, 1.0);
            let series = acc.entry(name.clone()).or_default();
            series.dti.push(eval.dti);
            series.hqs.push(eval.hqs);
        }

        let overall = evaluate_all(&aspects, natal.chart_ruler, 1.0);
        for overall_name in [OVERALL_INTENSITY, OVERALL_HARMONY] {
            let series = acc.entry(overall_name.to_string()).or_default();
            series.dti.push(overall.dti);
            series.hqs.push(overall.hqs);
        }
    }

    Ok(acc)
}

fn new_accumulator(meters: &MeterSet) -> Accumulator {
    let mut acc = Accumulator::new();
    for name in meters.meter_names() {
        acc.insert(name, SampleSeries::default());
    }
    acc.insert(OVERALL_INTENSITY.to_string(), SampleSeries::default());
    acc.insert(OVERALL_HARMONY.to_string(), SampleSeries::default());
    acc
}

fn day_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        days.push(day);
        day += Duration::days(1);
    }
    days
}

fn sample_births(spec: &CalibrationSpec) -> Vec<BirthSample> {
    let mut rng = ChaCha8Rng::seed_from_u64(spec.seed);
    (0..spec.chart_count)
        .map(|_| {
            let year = rng.gen_range(1950..=2005);
            let day_of_year = rng.gen_range(1..=365);
            let date = NaiveDate::from_yo_opt(year, day_of_year)
                .or_else(|| NaiveDate::from_yo_opt(year, 1))
                .unwrap_or_default();
            let time = if rng.gen_bool(0.7) {
                NaiveTime::from_hms_opt(rng.gen_range(0..24), rng.gen_range(0..60), 0)
            } else {
                None
            };
            BirthSample {
                date,
                time,
                latitude: rng.gen_range(-60.0..60.0),
                longitude: rng.gen_range(-180.0..180.0),
            }
        })
        .collect()
}

/// Exact percentiles by sorting and linearly interpolating between order
/// statistics. Monotonic by construction.
fn percentile_table(samples: &mut [f64]) -> PercentileTable {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let at = |q: f64| -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let rank = q / 100.0 * (samples.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        if lo == hi {
            samples[lo]
        } else {
            let frac = rank - lo as f64;
            samples[lo] * (1.0 - frac) + samples[hi] * frac
        }
    };

    PercentileTable {
        p01: at(1.0),
        p05: at(5.0),
        p10: at(10.0),
        p25: at(25.0),
        p50: at(50.0),
        p75: at(75.0),
        p90: at(90.0),
        p95: at(95.0),
        p99: at(99.0),
    }
}
