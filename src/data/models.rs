//! Payload models delivered by the anomaly detection server.
//!
//! Payloads are read-only snapshots: they are decoded once per page view and
//! only ever transformed into chart-ready shapes by the shaper.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::shaper::ShapeError;

/// Detection algorithms known to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    IsolationForest,
    Autoencoder,
    Kmeans,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::IsolationForest,
        Algorithm::Autoencoder,
        Algorithm::Kmeans,
    ];

    /// Raw key as used by the server (`isolation_forest`, ...)
    pub fn key(self) -> &'static str {
        match self {
            Algorithm::IsolationForest => "isolation_forest",
            Algorithm::Autoencoder => "autoencoder",
            Algorithm::Kmeans => "kmeans",
        }
    }

    /// Parse a raw algorithm key. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == key.trim())
    }
}

/// Time series of a detection result: three parallel sequences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeSeries {
    #[serde(default, deserialize_with = "labels_from_any")]
    pub timestamps: Vec<String>,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default, deserialize_with = "flags_from_any")]
    pub anomalies: Vec<bool>,
    #[serde(default)]
    pub anomaly_scores: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Number of points flagged as anomalous
    pub fn anomaly_count(&self) -> usize {
        self.anomalies.iter().filter(|&&a| a).count()
    }

    /// Check that timestamps, values and flags share one length.
    /// Scores are optional and only checked when present.
    pub fn validate(&self) -> Result<(), ShapeError> {
        let n = self.timestamps.len();
        if self.values.len() != n || self.anomalies.len() != n {
            return Err(ShapeError::LengthMismatch {
                timestamps: n,
                values: self.values.len(),
                anomalies: self.anomalies.len(),
            });
        }
        if !self.anomaly_scores.is_empty() && self.anomaly_scores.len() != n {
            return Err(ShapeError::ScoreLengthMismatch {
                expected: n,
                actual: self.anomaly_scores.len(),
            });
        }
        Ok(())
    }
}

/// Model metrics attached to a result. Any field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1_score: Option<f64>,
    pub anomaly_count: Option<u64>,
    pub total_points: Option<u64>,
    pub threshold: Option<f64>,
    pub clusters: Option<u64>,
}

impl Metrics {
    /// `(precision, recall, f1)` when all three scores are present
    pub fn scores(&self) -> Option<(f64, f64, f64)> {
        Some((self.precision?, self.recall?, self.f1_score?))
    }

    /// `(anomaly_count, total_points)` when both counts are present
    pub fn counts(&self) -> Option<(u64, u64)> {
        Some((self.anomaly_count?, self.total_points?))
    }

    pub fn validate(&self) -> Result<(), ShapeError> {
        if let Some((anomalies, total)) = self.counts() {
            if anomalies > total {
                return Err(ShapeError::CountExceedsTotal { anomalies, total });
            }
        }
        Ok(())
    }
}

/// Category/value pairs (histograms, per-key counts)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabeledValues {
    #[serde(default, deserialize_with = "labels_from_any")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub values: Vec<f64>,
}

impl LabeledValues {
    pub fn new(labels: Vec<String>, values: Vec<f64>) -> Self {
        LabeledValues { labels, values }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn validate(&self) -> Result<(), ShapeError> {
        if self.labels.len() != self.values.len() {
            return Err(ShapeError::LabelMismatch {
                labels: self.labels.len(),
                values: self.values.len(),
            });
        }
        Ok(())
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// Response of `GET /api/result/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultPayload {
    #[serde(default)]
    pub time_series: TimeSeries,
    #[serde(default)]
    pub metrics: Option<Metrics>,
    #[serde(default)]
    pub anomaly_count: Option<u64>,
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub anomalies_by_hour: Option<LabeledValues>,
    #[serde(default)]
    pub anomalies_by_dow: Option<LabeledValues>,
}

impl ResultPayload {
    /// Check every invariant the renderers depend on
    pub fn validate(&self) -> Result<(), ShapeError> {
        self.time_series.validate()?;
        if let Some(metrics) = &self.metrics {
            metrics.validate()?;
        }
        Ok(())
    }

    /// Anomaly/total counts: metrics first, then the top-level count with
    /// the series length as the total.
    pub fn counts(&self) -> Option<(u64, u64)> {
        if let Some(counts) = self.metrics.as_ref().and_then(Metrics::counts) {
            return Some(counts);
        }
        if self.time_series.is_empty() {
            return None;
        }
        let anomalies = self
            .anomaly_count
            .unwrap_or(self.time_series.anomaly_count() as u64);
        Some((anomalies, self.time_series.len() as u64))
    }

    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm.as_deref().and_then(Algorithm::from_key)
    }
}

/// Per-algorithm performance vectors, index-aligned across the three arrays
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceVectors {
    #[serde(default)]
    pub algorithms: Vec<String>,
    #[serde(default)]
    pub precision: Vec<f64>,
    #[serde(default)]
    pub recall: Vec<f64>,
    #[serde(default)]
    pub f1_score: Vec<f64>,
}

impl PerformanceVectors {
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }

    pub fn validate(&self) -> Result<(), ShapeError> {
        let n = self.algorithms.len();
        for (name, len) in [
            ("precision", self.precision.len()),
            ("recall", self.recall.len()),
            ("f1_score", self.f1_score.len()),
        ] {
            if len != n {
                return Err(ShapeError::VectorMismatch {
                    field: name,
                    expected: n,
                    actual: len,
                });
            }
        }
        Ok(())
    }
}

/// Aggregated dashboard payload. Each section decodes independently, a
/// malformed section is `None` and the rest still render.
#[derive(Debug, Clone, Default)]
pub struct OverviewPayload {
    pub dataset_count: Option<u64>,
    pub result_count: Option<u64>,
    pub anomalies_by_hour: Option<LabeledValues>,
    pub results_by_algorithm: Option<LabeledValues>,
    pub datasets_over_time: Option<LabeledValues>,
    pub model_performance: Option<PerformanceVectors>,
}

impl OverviewPayload {
    /// Decode an overview blob section by section.
    pub fn from_value(value: &Value) -> Self {
        OverviewPayload {
            dataset_count: section(value, "dataset_count"),
            result_count: section(value, "result_count"),
            anomalies_by_hour: section(value, "anomalies_by_hour"),
            results_by_algorithm: section(value, "results_by_algorithm"),
            datasets_over_time: section(value, "datasets_over_time"),
            model_performance: section(value, "model_performance"),
        }
    }
}

fn section<T: serde::de::DeserializeOwned>(value: &Value, key: &str) -> Option<T> {
    let raw = value.get(key)?;
    match serde_json::from_value(raw.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(section = key, error = %e, "skipping malformed overview section");
            None
        }
    }
}

/// Comparison entry for the model insights page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPerformanceEntry {
    pub name: String,
    #[serde(default)]
    pub precision: f64,
    #[serde(default)]
    pub recall: f64,
    #[serde(default)]
    pub f1_score: f64,
    #[serde(default)]
    pub efficiency: f64,
    #[serde(default)]
    pub interpretability: f64,
    #[serde(default)]
    pub anomalies_detected: u64,
    #[serde(default)]
    pub execution_time: f64,
}

impl ModelPerformanceEntry {
    /// Scores in radar axis order
    pub fn axes(&self) -> [f64; 5] {
        [
            self.precision,
            self.recall,
            self.f1_score,
            self.efficiency,
            self.interpretability,
        ]
    }
}

/// Accept strings or numbers as labels (hours come through as integers)
fn labels_from_any<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Value> = Vec::deserialize(deserializer)?;
    raw.into_iter()
        .map(|v| match v {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok(String::new()),
            other => Err(serde::de::Error::custom(format!(
                "unsupported label: {other}"
            ))),
        })
        .collect()
}

/// Accept `0/1` or booleans as anomaly flags; only `1`/`true` is anomalous
fn flags_from_any<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Value> = Vec::deserialize(deserializer)?;
    raw.into_iter()
        .map(|v| match v {
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n.as_f64() == Some(1.0)),
            Value::Null => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "unsupported anomaly flag: {other}"
            ))),
        })
        .collect()
}
