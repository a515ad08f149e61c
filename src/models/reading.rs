//! Reading value types produced by the meters engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{AspectPhase, AspectType, Planet};

/// Unified quality class of a meter, group, or the whole day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Harmonious,
    Challenging,
    Mixed,
    Quiet,
}

impl Quality {
    /// Classification over normalized intensity and harmony:
    /// quiet days first, then harmony decides.
    pub fn classify(intensity: f64, harmony: f64) -> Self {
        if intensity < 40.0 {
            Quality::Quiet
        } else if harmony >= 70.0 {
            Quality::Harmonious
        } else if harmony < 30.0 {
            Quality::Challenging
        } else {
            Quality::Mixed
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quality::Harmonious => "harmonious",
            Quality::Challenging => "challenging",
            Quality::Mixed => "mixed",
            Quality::Quiet => "quiet",
        };
        write!(f, "{}", name)
    }
}

/// Five-step intensity bucket for state-label lookup
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum IntensityBucket {
    Quiet,
    Mild,
    Moderate,
    High,
    Extreme,
}

impl IntensityBucket {
    pub fn of(intensity: f64) -> Self {
        if intensity <= 30.0 {
            IntensityBucket::Quiet
        } else if intensity <= 50.0 {
            IntensityBucket::Mild
        } else if intensity <= 70.0 {
            IntensityBucket::Moderate
        } else if intensity <= 85.0 {
            IntensityBucket::High
        } else {
            IntensityBucket::Extreme
        }
    }

    pub fn all() -> &'static [IntensityBucket] {
        &[
            IntensityBucket::Quiet,
            IntensityBucket::Mild,
            IntensityBucket::Moderate,
            IntensityBucket::High,
            IntensityBucket::Extreme,
        ]
    }
}

/// Three-step harmony bucket for state-label lookup
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum HarmonyBucket {
    Challenging,
    Mixed,
    Harmonious,
}

impl HarmonyBucket {
    pub fn of(harmony: f64) -> Self {
        if harmony <= 30.0 {
            HarmonyBucket::Challenging
        } else if harmony < 70.0 {
            HarmonyBucket::Mixed
        } else {
            HarmonyBucket::Harmonious
        }
    }

    pub fn all() -> &'static [HarmonyBucket] {
        &[
            HarmonyBucket::Challenging,
            HarmonyBucket::Mixed,
            HarmonyBucket::Harmonious,
        ]
    }
}

/// Direction of a day-over-day change. Harmony and unified score move
/// between improving and worsening; intensity between increasing and
/// decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Worsening,
    Increasing,
    Decreasing,
    Stable,
}

/// How fast a scalar is moving day over day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRate {
    Stable,
    Slow,
    Moderate,
    Rapid,
}

impl ChangeRate {
    pub fn of(delta: f64) -> Self {
        let magnitude = delta.abs();
        if magnitude < 2.0 {
            ChangeRate::Stable
        } else if magnitude < 5.5 {
            ChangeRate::Slow
        } else if magnitude < 10.5 {
            ChangeRate::Moderate
        } else {
            ChangeRate::Rapid
        }
    }
}

/// Day-over-day movement of one scalar
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ScalarTrend {
    pub previous: f64,
    pub delta: f64,
    pub direction: TrendDirection,
    pub change_rate: ChangeRate,
}

/// Trend over the three scalars of a reading
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ReadingTrend {
    pub intensity: ScalarTrend,
    pub harmony: ScalarTrend,
    pub unified: ScalarTrend,
}

/// Normalized scores of a reading
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Scores {
    pub unified_score: f64,
    pub harmony: f64,
    pub intensity: f64,
}

/// State of a reading: the configured short phrase plus the quality class
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct State {
    pub label: String,
    pub quality: Quality,
}

/// Raw, uncalibrated totals behind a reading
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RawScores {
    pub dti: f64,
    /// Signed; negative days lean challenging
    pub hqs: f64,
}

/// One aspect's share of a meter, as reported at the boundary
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TopAspect {
    pub transit: Planet,
    pub natal: Planet,
    pub aspect_type: AspectType,
    pub orb_degrees: f64,
    pub direction: AspectPhase,
    pub contribution_dti: f64,
}

/// A single meter's reading for one date
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MeterReading {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub date: NaiveDate,
    pub scores: Scores,
    pub state: State,
    pub raw: RawScores,
    pub top_aspects: Vec<TopAspect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<ReadingTrend>,
}

/// Aggregated reading for a thematic group of meters
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GroupReading {
    pub name: String,
    pub display_name: String,
    pub scores: Scores,
    pub state: State,
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<ReadingTrend>,
}

/// Overall aggregate computed over the unfiltered aspect set. Each of
/// the two overalls is one normalized scalar with its own calibration
/// entry, not a mean of meters.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OverallScalar {
    /// Normalized 0-100
    pub value: f64,
    /// The raw total behind it (DTI for intensity, HQS for harmony)
    pub raw: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<ScalarTrend>,
}

/// The complete panel for one date
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AllMetersReading {
    pub date: NaiveDate,
    /// BTreeMap keeps serialization order stable across runs
    pub meters: BTreeMap<String, MeterReading>,
    pub groups: BTreeMap<String, GroupReading>,
    pub overall_intensity: OverallScalar,
    pub overall_harmony: OverallScalar,
    pub overall_quality: Quality,
    pub aspect_count: usize,
    pub key_aspects: Vec<TopAspect>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_grid() {
        assert_eq!(Quality::classify(80.0, 75.0), Quality::Harmonious);
        assert_eq!(Quality::classify(80.0, 20.0), Quality::Challenging);
        assert_eq!(Quality::classify(20.0, 80.0), Quality::Quiet);
        assert_eq!(Quality::classify(55.0, 50.0), Quality::Mixed);
        // boundaries
        assert_eq!(Quality::classify(40.0, 70.0), Quality::Harmonious);
        assert_eq!(Quality::classify(39.9, 70.0), Quality::Quiet);
        assert_eq!(Quality::classify(40.0, 29.9), Quality::Challenging);
        assert_eq!(Quality::classify(40.0, 30.0), Quality::Mixed);
    }

    #[test]
    fn intensity_bucket_edges() {
        assert_eq!(IntensityBucket::of(0.0), IntensityBucket::Quiet);
        assert_eq!(IntensityBucket::of(30.0), IntensityBucket::Quiet);
        assert_eq!(IntensityBucket::of(30.1), IntensityBucket::Mild);
        assert_eq!(IntensityBucket::of(50.0), IntensityBucket::Mild);
        assert_eq!(IntensityBucket::of(70.0), IntensityBucket::Moderate);
        assert_eq!(IntensityBucket::of(85.0), IntensityBucket::High);
        assert_eq!(IntensityBucket::of(85.1), IntensityBucket::Extreme);
        assert_eq!(IntensityBucket::of(100.0), IntensityBucket::Extreme);
    }

    #[test]
    fn harmony_bucket_edges() {
        assert_eq!(HarmonyBucket::of(0.0), HarmonyBucket::Challenging);
        assert_eq!(HarmonyBucket::of(30.0), HarmonyBucket::Challenging);
        assert_eq!(HarmonyBucket::of(30.1), HarmonyBucket::Mixed);
        assert_eq!(HarmonyBucket::of(69.9), HarmonyBucket::Mixed);
        assert_eq!(HarmonyBucket::of(70.0), HarmonyBucket::Harmonious);
        assert_eq!(HarmonyBucket::of(100.0), HarmonyBucket::Harmonious);
    }

    #[test]
    fn change_rate_buckets() {
        assert_eq!(ChangeRate::of(0.0), ChangeRate::Stable);
        assert_eq!(ChangeRate::of(-1.9), ChangeRate::Stable);
        assert_eq!(ChangeRate::of(2.0), ChangeRate::Slow);
        assert_eq!(ChangeRate::of(-5.4), ChangeRate::Slow);
        assert_eq!(ChangeRate::of(5.5), ChangeRate::Moderate);
        assert_eq!(ChangeRate::of(10.4), ChangeRate::Moderate);
        assert_eq!(ChangeRate::of(10.5), ChangeRate::Rapid);
        assert_eq!(ChangeRate::of(-12.0), ChangeRate::Rapid);
    }
}
