//! Embedded default configuration documents
//!
//! The meter set ships as one JSON document per meter plus a manifest
//! carrying the set version, and the calibration table as a single
//! versioned document produced by the `calibrate` binary. All of them
//! are compiled in so a fresh install works without a data directory.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::meters::MetersError;

use super::{CalibrationTable, GroupConfig, MeterConfig, MeterRegistry, MeterSet};

static MANIFEST_DOC: &str = include_str!("../../data/meters.json");
static GROUPS_DOC: &str = include_str!("../../data/groups.json");
static CALIBRATION_DOC: &str = include_str!("../../data/calibration.json");

static METER_DOCS: &[(&str, &str)] = &[
    ("career", include_str!("../../data/meters/career.json")),
    (
        "communication",
        include_str!("../../data/meters/communication.json"),
    ),
    ("creativity", include_str!("../../data/meters/creativity.json")),
    ("drive", include_str!("../../data/meters/drive.json")),
    (
        "emotional_depth",
        include_str!("../../data/meters/emotional_depth.json"),
    ),
    ("energy", include_str!("../../data/meters/energy.json")),
    ("focus", include_str!("../../data/meters/focus.json")),
    ("intuition", include_str!("../../data/meters/intuition.json")),
    ("love", include_str!("../../data/meters/love.json")),
    ("luck", include_str!("../../data/meters/luck.json")),
    (
        "mental_clarity",
        include_str!("../../data/meters/mental_clarity.json"),
    ),
    ("mood", include_str!("../../data/meters/mood.json")),
    (
        "opportunity",
        include_str!("../../data/meters/opportunity.json"),
    ),
    (
        "sensitivity",
        include_str!("../../data/meters/sensitivity.json"),
    ),
    (
        "spiritual_growth",
        include_str!("../../data/meters/spiritual_growth.json"),
    ),
    (
        "transformation",
        include_str!("../../data/meters/transformation.json"),
    ),
    ("vitality", include_str!("../../data/meters/vitality.json")),
];

#[derive(Debug, Deserialize)]
struct Manifest {
    version: String,
    meters: Vec<String>,
}

fn parse_error(what: &str, err: serde_json::Error) -> MetersError {
    MetersError::InvalidConfig {
        reason: format!("failed to parse {}: {}", what, err),
    }
}

/// Parse the embedded meter set (manifest, groups, per-meter documents)
pub fn default_meter_set() -> Result<MeterSet, MetersError> {
    let manifest: Manifest =
        serde_json::from_str(MANIFEST_DOC).map_err(|e| parse_error("meter manifest", e))?;
    let groups: BTreeMap<String, GroupConfig> =
        serde_json::from_str(GROUPS_DOC).map_err(|e| parse_error("group config", e))?;

    let mut meters = Vec::with_capacity(METER_DOCS.len());
    for (name, doc) in METER_DOCS {
        let config: MeterConfig =
            serde_json::from_str(doc).map_err(|e| parse_error(name, e))?;
        if config.name != *name {
            return Err(MetersError::InvalidConfig {
                reason: format!("meter document '{}' declares name '{}'", name, config.name),
            });
        }
        if !manifest.meters.contains(&config.name) {
            return Err(MetersError::InvalidConfig {
                reason: format!("meter '{}' is not listed in the manifest", config.name),
            });
        }
        meters.push(config);
    }
    if manifest.meters.len() != meters.len() {
        return Err(MetersError::InvalidConfig {
            reason: format!(
                "manifest lists {} meters but {} documents are embedded",
                manifest.meters.len(),
                meters.len()
            ),
        });
    }

    Ok(MeterSet::from_parts(&manifest.version, meters, groups))
}

/// Parse the embedded calibration table
pub fn default_calibration() -> Result<CalibrationTable, MetersError> {
    serde_json::from_str(CALIBRATION_DOC).map_err(|e| parse_error("calibration table", e))
}

/// The registry built from the embedded defaults, fully validated
pub fn default_registry() -> Result<MeterRegistry, MetersError> {
    MeterRegistry::new(default_meter_set()?, default_calibration()?)
}
