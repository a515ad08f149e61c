//! Meter configuration and calibration registry
//!
//! Meters are data, not code: each meter is described by one JSON
//! document declaring its aspect filter and state labels, and the
//! evaluator is a single function parameterized by the config. The
//! calibration table is a versioned document produced by the offline
//! batch. Both are loaded once at startup, validated, and shared
//! read-only for the life of the process.

mod defaults;

pub use defaults::{default_calibration, default_meter_set, default_registry};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::meters::MetersError;
use crate::models::{BodyPlacement, HarmonyBucket, IntensityBucket, Planet};

/// Calibration entry name for the unfiltered intensity aggregate
pub const OVERALL_INTENSITY: &str = "overall_intensity";
/// Calibration entry name for the unfiltered harmony aggregate
pub const OVERALL_HARMONY: &str = "overall_harmony";

/// The nine calibrated percentiles of one raw series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PercentileTable {
    pub p01: f64,
    pub p05: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl PercentileTable {
    /// Values in percentile order
    pub fn values(&self) -> [f64; 9] {
        [
            self.p01, self.p05, self.p10, self.p25, self.p50, self.p75, self.p90, self.p95,
            self.p99,
        ]
    }

    /// Non-decreasing across the percentile keys
    pub fn is_monotonic(&self) -> bool {
        self.values().windows(2).all(|w| w[0] <= w[1])
    }
}

/// Calibrated percentiles for one meter
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MeterPercentiles {
    pub dti_percentiles: PercentileTable,
    pub hqs_percentiles: PercentileTable,
}

/// Versioned calibration document covering every configured meter plus
/// the two overall aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CalibrationTable {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    pub meters: BTreeMap<String, MeterPercentiles>,
}

impl CalibrationTable {
    pub fn get(&self, meter: &str) -> Option<&MeterPercentiles> {
        self.meters.get(meter)
    }

    /// Reject tables whose percentile rows regress
    pub fn validate(&self) -> Result<(), MetersError> {
        for (name, pct) in &self.meters {
            if !pct.dti_percentiles.is_monotonic() {
                return Err(MetersError::InvalidConfig {
                    reason: format!("dti percentiles for '{}' are not monotonic", name),
                });
            }
            if !pct.hqs_percentiles.is_monotonic() {
                return Err(MetersError::InvalidConfig {
                    reason: format!("hqs percentiles for '{}' are not monotonic", name),
                });
            }
        }
        Ok(())
    }
}

/// The 5x3 grid of short state phrases, keyed by intensity and harmony
/// bucket.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(transparent)]
pub struct StateLabels {
    grid: BTreeMap<IntensityBucket, BTreeMap<HarmonyBucket, String>>,
}

impl StateLabels {
    pub fn from_grid(grid: BTreeMap<IntensityBucket, BTreeMap<HarmonyBucket, String>>) -> Self {
        Self { grid }
    }

    /// Look up a cell; falls back to the neutral center cell for a grid
    /// that passed validation this can never miss.
    pub fn get(&self, intensity: IntensityBucket, harmony: HarmonyBucket) -> &str {
        self.grid
            .get(&intensity)
            .and_then(|row| row.get(&harmony))
            .map(|s| s.as_str())
            .unwrap_or("Steady")
    }

    /// Every one of the fifteen cells must be present and non-empty
    pub fn validate(&self, owner: &str) -> Result<(), MetersError> {
        for intensity in IntensityBucket::all() {
            for harmony in HarmonyBucket::all() {
                match self.grid.get(intensity).and_then(|row| row.get(harmony)) {
                    Some(label) if !label.trim().is_empty() => {}
                    _ => {
                        return Err(MetersError::InvalidConfig {
                            reason: format!(
                                "state labels for '{}' missing cell ({:?}, {:?})",
                                owner, intensity, harmony
                            ),
                        })
                    }
                }
            }
        }
        Ok(())
    }
}

/// One meter's configuration document
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MeterConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Natal planets whose aspects count toward this meter
    #[serde(default)]
    pub natal_planets: BTreeSet<Planet>,
    /// Natal houses whose aspects count toward this meter
    #[serde(default)]
    pub natal_houses: BTreeSet<u8>,
    /// Per-transit-planet multipliers applied while that planet is
    /// retrograde
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub retrograde_modifiers: BTreeMap<Planet, f64>,
    pub state_labels: StateLabels,
}

impl MeterConfig {
    /// An aspect counts when its natal body matches the planet set or
    /// the house set.
    pub fn includes(&self, natal: &BodyPlacement) -> bool {
        self.natal_planets.contains(&natal.planet) || self.natal_houses.contains(&natal.house)
    }

    pub fn retrograde_modifier(&self, planet: Planet) -> Option<f64> {
        self.retrograde_modifiers.get(&planet).copied()
    }

    fn validate(&self, groups: &BTreeMap<String, GroupConfig>) -> Result<(), MetersError> {
        if self.name.trim().is_empty() {
            return Err(MetersError::InvalidConfig {
                reason: "meter with empty name".to_string(),
            });
        }
        if let Some(group) = &self.group {
            if !groups.contains_key(group) {
                return Err(MetersError::InvalidConfig {
                    reason: format!("meter '{}' references unknown group '{}'", self.name, group),
                });
            }
        }
        if self.natal_planets.is_empty() && self.natal_houses.is_empty() {
            return Err(MetersError::InvalidConfig {
                reason: format!("meter '{}' filters out every aspect", self.name),
            });
        }
        if let Some(house) = self.natal_houses.iter().find(|h| !(1..=12).contains(*h)) {
            return Err(MetersError::InvalidConfig {
                reason: format!("meter '{}' lists house {} outside 1..12", self.name, house),
            });
        }
        if let Some((planet, modifier)) = self
            .retrograde_modifiers
            .iter()
            .find(|(_, m)| !m.is_finite() || **m <= 0.0)
        {
            return Err(MetersError::InvalidConfig {
                reason: format!(
                    "meter '{}' has non-positive retrograde modifier {} for {}",
                    self.name, modifier, planet
                ),
            });
        }
        self.state_labels.validate(&self.name)
    }

    /// Minimal config for engine unit tests, with a uniform label grid
    #[cfg(test)]
    pub fn for_tests(
        name: &str,
        group: Option<&str>,
        planets: &[Planet],
        houses: &[u8],
    ) -> Self {
        let mut grid = BTreeMap::new();
        for intensity in IntensityBucket::all() {
            let mut row = BTreeMap::new();
            for harmony in HarmonyBucket::all() {
                row.insert(*harmony, format!("{:?} {:?}", intensity, harmony));
            }
            grid.insert(*intensity, row);
        }
        Self {
            name: name.to_string(),
            group: group.map(|g| g.to_string()),
            natal_planets: planets.iter().copied().collect(),
            natal_houses: houses.iter().copied().collect(),
            retrograde_modifiers: BTreeMap::new(),
            state_labels: StateLabels::from_grid(grid),
        }
    }
}

/// A group's display name and state label grid
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GroupConfig {
    pub display_name: String,
    pub state_labels: StateLabels,
}

/// The full, versioned meter set: configs keyed by name plus the group
/// table. Iteration order is name order, which downstream code relies on
/// for determinism.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MeterSet {
    pub version: String,
    meters: BTreeMap<String, MeterConfig>,
    groups: BTreeMap<String, GroupConfig>,
}

impl MeterSet {
    pub fn from_parts(
        version: &str,
        meters: Vec<MeterConfig>,
        groups: BTreeMap<String, GroupConfig>,
    ) -> Self {
        Self {
            version: version.to_string(),
            meters: meters.into_iter().map(|m| (m.name.clone(), m)).collect(),
            groups,
        }
    }

    pub fn get(&self, name: &str) -> Option<&MeterConfig> {
        self.meters.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MeterConfig)> {
        self.meters.iter()
    }

    pub fn groups(&self) -> impl Iterator<Item = (&String, &GroupConfig)> {
        self.groups.iter()
    }

    pub fn meter_names(&self) -> Vec<String> {
        self.meters.keys().cloned().collect()
    }

    /// Member meters of a group, in name order
    pub fn members_of(&self, group: &str) -> Vec<String> {
        self.meters
            .iter()
            .filter(|(_, config)| config.group.as_deref() == Some(group))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.meters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meters.is_empty()
    }

    pub fn validate(&self) -> Result<(), MetersError> {
        if self.meters.is_empty() {
            return Err(MetersError::InvalidConfig {
                reason: "meter set is empty".to_string(),
            });
        }
        for config in self.meters.values() {
            config.validate(&self.groups)?;
        }
        for (name, group) in &self.groups {
            group.state_labels.validate(name)?;
            if self.members_of(name).is_empty() {
                return Err(MetersError::InvalidConfig {
                    reason: format!("group '{}' has no member meters", name),
                });
            }
        }
        Ok(())
    }
}

/// The process-wide read-only registry: validated meter set plus a
/// calibration table that matches it by version and by name coverage.
#[derive(Debug, Clone)]
pub struct MeterRegistry {
    pub meters: MeterSet,
    pub calibration: CalibrationTable,
}

impl MeterRegistry {
    /// Validate the pair and bind it. Rejects mismatched versions
    /// (stale calibration), incomplete or excess coverage, and
    /// non-monotonic percentile rows.
    pub fn new(meters: MeterSet, calibration: CalibrationTable) -> Result<Self, MetersError> {
        meters.validate()?;
        calibration.validate()?;

        if meters.version != calibration.version {
            return Err(MetersError::CalibrationStale {
                configs_version: meters.version.clone(),
                table_version: calibration.version.clone(),
            });
        }

        let mut expected: BTreeSet<String> = meters.meter_names().into_iter().collect();
        expected.insert(OVERALL_INTENSITY.to_string());
        expected.insert(OVERALL_HARMONY.to_string());

        for name in &expected {
            if calibration.get(name).is_none() {
                return Err(MetersError::CalibrationMissing {
                    meter: name.clone(),
                });
            }
        }
        for name in calibration.meters.keys() {
            if !expected.contains(name) {
                return Err(MetersError::InvalidConfig {
                    reason: format!("calibration covers unconfigured meter '{}'", name),
                });
            }
        }

        Ok(Self {
            meters,
            calibration,
        })
    }
}
