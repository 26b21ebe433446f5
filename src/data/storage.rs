//! Embedded payload store.
//!
//! The server renders the overview and model-performance payloads into its
//! pages; the terminal dashboard reads the same JSON blobs from a data
//! directory:
//! - `overview.json`: the dashboard [`OverviewPayload`]
//! - `model_performance.json`: an array of [`ModelPerformanceEntry`]

use std::io;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use super::models::{ModelPerformanceEntry, OverviewPayload};

pub const OVERVIEW_FILE: &str = "overview.json";
pub const MODEL_PERFORMANCE_FILE: &str = "model_performance.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("payload not found: {0:?}")]
    Missing(PathBuf),
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only access to the embedded payloads of a data directory
#[derive(Debug, Clone)]
pub struct EmbeddedStore {
    data_dir: PathBuf,
}

impl EmbeddedStore {
    pub fn new(data_dir: PathBuf) -> Self {
        EmbeddedStore { data_dir }
    }

    fn payload_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    fn read_json(&self, file: &str) -> Result<(PathBuf, Value), StoreError> {
        let path = self.payload_path(file);
        if !path.exists() {
            return Err(StoreError::Missing(path));
        }
        let text = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let value = serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        Ok((path, value))
    }

    /// Load the dashboard overview. Malformed sections are skipped inside
    /// [`OverviewPayload::from_value`]; only unreadable or non-JSON files fail.
    pub fn load_overview(&self) -> Result<OverviewPayload, StoreError> {
        let (path, value) = self.read_json(OVERVIEW_FILE)?;
        tracing::info!(?path, "loaded overview payload");
        Ok(OverviewPayload::from_value(&value))
    }

    /// Load the model comparison entries
    pub fn load_model_performance(&self) -> Result<Vec<ModelPerformanceEntry>, StoreError> {
        let (path, value) = self.read_json(MODEL_PERFORMANCE_FILE)?;
        let entries: Vec<ModelPerformanceEntry> = serde_json::from_value(value)
            .map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?;
        tracing::info!(?path, entries = entries.len(), "loaded model performance payload");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(files: &[(&str, &str)]) -> (tempfile::TempDir, EmbeddedStore) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let store = EmbeddedStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    #[test]
    fn test_missing_payload_is_reported() {
        let (_dir, store) = store_with(&[]);
        assert!(matches!(store.load_overview(), Err(StoreError::Missing(_))));
        assert!(matches!(
            store.load_model_performance(),
            Err(StoreError::Missing(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_an_error_not_a_panic() {
        let (_dir, store) = store_with(&[(OVERVIEW_FILE, "{ not json")]);
        assert!(matches!(store.load_overview(), Err(StoreError::Json { .. })));
    }

    #[test]
    fn test_load_overview() {
        let (_dir, store) = store_with(&[(
            OVERVIEW_FILE,
            r#"{"dataset_count": 3, "result_count": 2,
                "anomalies_by_hour": {"labels": [0, 1, 2], "values": [0, 4, 1]},
                "results_by_algorithm": {"labels": ["kmeans"], "values": [2]}}"#,
        )]);
        let overview = store.load_overview().unwrap();
        assert_eq!(overview.result_count, Some(2));
        assert_eq!(overview.anomalies_by_hour.unwrap().values, vec![0.0, 4.0, 1.0]);
        assert!(overview.datasets_over_time.is_none());
    }

    #[test]
    fn test_load_model_performance() {
        let (_dir, store) = store_with(&[(
            MODEL_PERFORMANCE_FILE,
            r#"[{"name": "Isolation Forest", "precision": 0.8, "recall": 0.7, "f1_score": 0.75,
                 "efficiency": 0.9, "interpretability": 0.6, "anomalies_detected": 14,
                 "execution_time": 1.2},
                {"name": "K-Means", "precision": 0.6}]"#,
        )]);
        let entries = store.load_model_performance().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].anomalies_detected, 14);
        assert_eq!(entries[1].execution_time, 0.0);
    }
}
