//! Persistent storage for natal chart profiles

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CalibrationTable;
use crate::models::Chart;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access storage directory: {0}")]
    Directory(String),

    #[error("failed to read storage file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write storage file: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to parse storage file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// A stored natal chart with the birth data it was computed from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartProfile {
    pub name: String,
    /// YYYY-MM-DD
    pub birth_date: String,
    /// HH:MM:SS when the birth time is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Personal meter sensitivity; the engine clamps it to [0.5, 2.0]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<f64>,
    pub chart: Chart,
}

/// Storage backend for chart profiles, a JSON document in the platform
/// data directory fronted by an in-memory map.
pub struct Storage {
    charts: RwLock<HashMap<String, ChartProfile>>,
    data_dir: PathBuf,
}

impl Storage {
    /// Create a storage instance rooted in the platform data directory
    pub fn new() -> Result<Self, StorageError> {
        let data_dir = Self::default_data_dir()?;
        Self::with_data_dir(data_dir)
    }

    /// Create a storage instance rooted at an explicit directory
    pub fn with_data_dir(data_dir: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&data_dir)
            .map_err(|e| StorageError::Directory(e.to_string()))?;

        let charts_path = data_dir.join("charts.json");
        let charts = if charts_path.exists() {
            let data = fs::read_to_string(&charts_path).map_err(StorageError::Read)?;
            serde_json::from_str(&data)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            charts: RwLock::new(charts),
            data_dir,
        })
    }

    fn default_data_dir() -> Result<PathBuf, StorageError> {
        if let Some(proj_dirs) = ProjectDirs::from("com", "astrometers", "astrometers") {
            Ok(proj_dirs.data_dir().to_path_buf())
        } else {
            // Fallback to current directory
            Ok(PathBuf::from("."))
        }
    }

    fn charts_path(&self) -> PathBuf {
        self.data_dir.join("charts.json")
    }

    /// A locally installed calibration table, when one has been placed in
    /// the data directory; the embedded default applies otherwise. The
    /// registry still rejects a stale or incomplete table.
    pub fn read_calibration_override(&self) -> Result<Option<CalibrationTable>, StorageError> {
        let path = self.data_dir.join("calibration.json");
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path).map_err(StorageError::Read)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Save a chart profile
    pub fn save_chart(&self, profile: ChartProfile) -> Result<(), StorageError> {
        {
            let mut charts = self.charts.write().map_err(|_| StorageError::Poisoned)?;
            charts.insert(profile.name.clone(), profile);
        }
        self.persist()
    }

    /// Get a chart profile by name
    pub fn get_chart(&self, name: &str) -> Option<ChartProfile> {
        let charts = self.charts.read().ok()?;
        charts.get(name).cloned()
    }

    /// Get the default chart (the single stored one, or any one)
    pub fn get_default_chart(&self) -> Option<ChartProfile> {
        let charts = self.charts.read().ok()?;
        let mut names: Vec<&String> = charts.keys().collect();
        names.sort();
        names.first().and_then(|name| charts.get(*name)).cloned()
    }

    /// List all stored chart names
    pub fn list_charts(&self) -> Vec<String> {
        if let Ok(charts) = self.charts.read() {
            let mut names: Vec<String> = charts.keys().cloned().collect();
            names.sort();
            names
        } else {
            Vec::new()
        }
    }

    /// Delete a chart by name
    pub fn delete_chart(&self, name: &str) -> Result<bool, StorageError> {
        let removed = {
            let mut charts = self.charts.write().map_err(|_| StorageError::Poisoned)?;
            charts.remove(name).is_some()
        };
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Persist charts to disk
    fn persist(&self) -> Result<(), StorageError> {
        let charts = self.charts.read().map_err(|_| StorageError::Poisoned)?;
        let data = serde_json::to_string_pretty(&*charts)?;
        fs::write(self.charts_path(), data).map_err(StorageError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Angles, BodyPlacement, Planet};

    fn sample_profile(name: &str) -> ChartProfile {
        let mut cusps = [0.0; 12];
        for (i, cusp) in cusps.iter_mut().enumerate() {
            *cusp = i as f64 * 30.0;
        }
        ChartProfile {
            name: name.to_string(),
            birth_date: "1990-06-15".to_string(),
            birth_time: None,
            birth_location: None,
            latitude: None,
            longitude: None,
            timezone: None,
            sensitivity: Some(1.2),
            chart: Chart {
                bodies: vec![BodyPlacement::new(Planet::Sun, 84.0, 1, 0.95)],
                house_cusps: cusps,
                house_rulers: [Planet::Mars; 12],
                angles: Angles::from_asc_mc(60.0, 330.0),
                chart_ruler: Planet::Mercury,
                exact: false,
            },
        }
    }

    fn temp_storage(tag: &str) -> Storage {
        let dir = std::env::temp_dir()
            .join("astrometers-test")
            .join(format!("{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        Storage::with_data_dir(dir).unwrap()
    }

    #[test]
    fn save_get_delete_roundtrip() {
        let storage = temp_storage("roundtrip");
        storage.save_chart(sample_profile("alba")).unwrap();

        let loaded = storage.get_chart("alba").unwrap();
        assert_eq!(loaded.birth_date, "1990-06-15");
        assert_eq!(loaded.sensitivity, Some(1.2));
        assert_eq!(loaded.chart.bodies[0].planet, Planet::Sun);

        assert!(storage.delete_chart("alba").unwrap());
        assert!(storage.get_chart("alba").is_none());
        assert!(!storage.delete_chart("alba").unwrap());
    }

    #[test]
    fn default_chart_is_first_by_name() {
        let storage = temp_storage("default");
        storage.save_chart(sample_profile("zoe")).unwrap();
        storage.save_chart(sample_profile("ana")).unwrap();
        assert_eq!(storage.get_default_chart().unwrap().name, "ana");
        assert_eq!(storage.list_charts(), vec!["ana", "zoe"]);
    }

    #[test]
    fn persists_across_instances() {
        let dir = std::env::temp_dir()
            .join("astrometers-test")
            .join(format!("persist-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let storage = Storage::with_data_dir(dir.clone()).unwrap();
        storage.save_chart(sample_profile("alba")).unwrap();
        drop(storage);

        let reopened = Storage::with_data_dir(dir).unwrap();
        assert!(reopened.get_chart("alba").is_some());
    }

    #[test]
    fn missing_calibration_override_is_none() {
        let storage = temp_storage("override");
        assert!(storage.read_calibration_override().unwrap().is_none());
    }
}
