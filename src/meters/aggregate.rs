//! Group aggregation and day-over-day trends

use crate::models::{
    ChangeRate, MeterReading, ReadingTrend, ScalarTrend, Scores, TrendDirection,
};

/// Harmonic mean of intensity and harmony, the headline number of a
/// reading. Zero when both inputs vanish.
pub fn unified_score(intensity: f64, harmony: f64) -> f64 {
    let sum = intensity + harmony;
    if sum == 0.0 {
        0.0
    } else {
        2.0 * intensity * harmony / sum
    }
}

/// Arithmetic mean of the member meters' already-normalized scores.
/// Group scores are never re-normalized.
pub fn group_scores<'a, I>(members: I) -> Scores
where
    I: Iterator<Item = &'a MeterReading>,
{
    let mut count = 0.0;
    let mut intensity = 0.0;
    let mut harmony = 0.0;
    let mut unified = 0.0;
    for reading in members {
        count += 1.0;
        intensity += reading.scores.intensity;
        harmony += reading.scores.harmony;
        unified += reading.scores.unified_score;
    }
    if count == 0.0 {
        return Scores {
            unified_score: 0.0,
            harmony: 50.0,
            intensity: 0.0,
        };
    }
    Scores {
        unified_score: unified / count,
        harmony: harmony / count,
        intensity: intensity / count,
    }
}

/// What kind of scalar a trend describes; harmony-like scalars improve
/// or worsen, intensity rises or falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendKind {
    Intensity,
    Harmony,
}

/// Trend of one scalar between yesterday and today
pub fn scalar_trend(kind: TrendKind, today: f64, yesterday: f64) -> ScalarTrend {
    let delta = today - yesterday;
    let direction = if delta == 0.0 {
        TrendDirection::Stable
    } else {
        match kind {
            TrendKind::Intensity => {
                if delta > 0.0 {
                    TrendDirection::Increasing
                } else {
                    TrendDirection::Decreasing
                }
            }
            TrendKind::Harmony => {
                if delta > 0.0 {
                    TrendDirection::Improving
                } else {
                    TrendDirection::Worsening
                }
            }
        }
    };

    ScalarTrend {
        previous: yesterday,
        delta,
        direction,
        change_rate: ChangeRate::of(delta),
    }
}

/// Trend over a reading's three scalars
pub fn reading_trend(today: &Scores, yesterday: &Scores) -> ReadingTrend {
    ReadingTrend {
        intensity: scalar_trend(TrendKind::Intensity, today.intensity, yesterday.intensity),
        harmony: scalar_trend(TrendKind::Harmony, today.harmony, yesterday.harmony),
        unified: scalar_trend(
            TrendKind::Harmony,
            today.unified_score,
            yesterday.unified_score,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Quality, RawScores, State};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    #[test]
    fn harmonic_mean_basics() {
        assert_relative_eq!(unified_score(0.0, 0.0), 0.0);
        assert_relative_eq!(unified_score(50.0, 50.0), 50.0);
        assert_relative_eq!(
            unified_score(70.0, 60.0),
            2.0 * 70.0 * 60.0 / 130.0,
            epsilon = 1e-9
        );
        // skewed pairs pull toward the low side
        assert!(unified_score(90.0, 10.0) < 50.0);
    }

    fn reading(name: &str, intensity: f64, harmony: f64) -> MeterReading {
        MeterReading {
            name: name.to_string(),
            group: Some("mind".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            scores: Scores {
                unified_score: unified_score(intensity, harmony),
                harmony,
                intensity,
            },
            state: State {
                label: "Test".to_string(),
                quality: Quality::Mixed,
            },
            raw: RawScores { dti: 0.0, hqs: 0.0 },
            top_aspects: Vec::new(),
            trend: None,
        }
    }

    #[test]
    fn group_means_match_members() {
        let members = vec![
            reading("mental_clarity", 80.0, 70.0),
            reading("focus", 60.0, 50.0),
            reading("communication", 70.0, 60.0),
        ];
        let scores = group_scores(members.iter());
        assert_relative_eq!(scores.intensity, 70.0, epsilon = 1e-9);
        assert_relative_eq!(scores.harmony, 60.0, epsilon = 1e-9);

        let expected_unified: f64 = members
            .iter()
            .map(|m| m.scores.unified_score)
            .sum::<f64>()
            / 3.0;
        assert_relative_eq!(scores.unified_score, expected_unified, epsilon = 1e-9);
    }

    #[test]
    fn empty_group_is_quiet_neutral() {
        let scores = group_scores(std::iter::empty());
        assert_relative_eq!(scores.intensity, 0.0);
        assert_relative_eq!(scores.harmony, 50.0);
        assert_relative_eq!(scores.unified_score, 0.0);
    }

    #[test]
    fn harmony_trend_directions() {
        let t = scalar_trend(TrendKind::Harmony, 70.0, 58.0);
        assert_relative_eq!(t.delta, 12.0);
        assert_eq!(t.direction, TrendDirection::Improving);
        assert_eq!(t.change_rate, ChangeRate::Rapid);

        let t = scalar_trend(TrendKind::Harmony, 40.0, 44.0);
        assert_eq!(t.direction, TrendDirection::Worsening);
        assert_eq!(t.change_rate, ChangeRate::Slow);

        let t = scalar_trend(TrendKind::Harmony, 40.0, 40.0);
        assert_eq!(t.direction, TrendDirection::Stable);
    }

    #[test]
    fn intensity_trend_directions() {
        let t = scalar_trend(TrendKind::Intensity, 61.0, 60.0);
        assert_eq!(t.direction, TrendDirection::Increasing);
        assert_eq!(t.change_rate, ChangeRate::Stable);

        let t = scalar_trend(TrendKind::Intensity, 52.0, 60.0);
        assert_eq!(t.direction, TrendDirection::Decreasing);
        assert_eq!(t.change_rate, ChangeRate::Moderate);
    }
}
