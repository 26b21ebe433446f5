//! Operational recommendations derived from a single result.

use super::models::{Algorithm, ResultPayload};
use super::shaper::{self, percentage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationKind {
    TimePattern,
    Intensity,
    Frequency,
    Algorithm,
    General,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub kind: RecommendationKind,
}

impl Recommendation {
    fn new(kind: RecommendationKind, title: &str, description: String) -> Self {
        Recommendation {
            title: title.to_string(),
            description,
            kind,
        }
    }
}

/// Anomaly rate above which the rate is reported as high
const HIGH_RATE_PCT: f64 = 10.0;
/// Anomaly rate above which the rate is reported as moderate
const MODERATE_RATE_PCT: f64 = 5.0;

pub fn recommendations(payload: &ResultPayload) -> Vec<Recommendation> {
    let series = &payload.time_series;
    let anomaly_count = series.anomaly_count();

    if anomaly_count == 0 {
        return vec![Recommendation::new(
            RecommendationKind::General,
            "No Anomalies Detected",
            "No anomalies were detected with the current algorithm and settings. \
             Consider adjusting sensitivity parameters or trying a different algorithm."
                .to_string(),
        )];
    }

    let mut out = Vec::new();

    let peaks = peak_hours(payload);
    if !peaks.is_empty() {
        let hours = peaks
            .iter()
            .map(|h| format!("{h}:00"))
            .collect::<Vec<_>>()
            .join(", ");
        out.push(Recommendation::new(
            RecommendationKind::TimePattern,
            "Time-based Anomaly Pattern Detected",
            format!(
                "Energy anomalies occur frequently during these hours: {hours}. \
                 Consider investigating equipment operation during these times."
            ),
        ));
    }

    let severe = high_severity_count(payload);
    if severe > 0 {
        out.push(Recommendation::new(
            RecommendationKind::Intensity,
            "High Severity Anomalies Detected",
            format!(
                "Found {severe} high-severity anomalies that significantly deviate from \
                 normal patterns. Prioritize investigation of these incidents."
            ),
        ));
    }

    let rate = percentage(anomaly_count as f64, series.len() as f64);
    if rate > HIGH_RATE_PCT {
        out.push(Recommendation::new(
            RecommendationKind::Frequency,
            "High Anomaly Rate Detected",
            format!(
                "Your system shows an unusually high anomaly rate ({rate:.1}%). \
                 Consider reviewing overall system operation and maintenance schedules."
            ),
        ));
    } else if rate > MODERATE_RATE_PCT {
        out.push(Recommendation::new(
            RecommendationKind::Frequency,
            "Moderate Anomaly Rate",
            format!(
                "Your system shows a moderate anomaly rate ({rate:.1}%). \
                 Regular monitoring and preventive maintenance is recommended."
            ),
        ));
    }

    if let Some(algorithm) = payload.algorithm() {
        let description = match algorithm {
            Algorithm::IsolationForest => {
                "Isolation Forest works well for identifying global anomalies. \
                 For more context-aware detection, consider trying the AutoEncoder model."
            }
            Algorithm::Autoencoder => {
                "AutoEncoder is effective for complex patterns. \
                 For faster detection on larger datasets, consider Isolation Forest."
            }
            Algorithm::Kmeans => {
                "K-Means clustering works well for separated patterns. \
                 For more robust detection of subtle anomalies, try AutoEncoder."
            }
        };
        out.push(Recommendation::new(
            RecommendationKind::Algorithm,
            "Algorithm Recommendation",
            description.to_string(),
        ));
    }

    out
}

/// Hours whose anomaly count is above the mean over hours with any anomaly
fn peak_hours(payload: &ResultPayload) -> Vec<usize> {
    let hours = match &payload.anomalies_by_hour {
        Some(h) if h.validate().is_ok() && !h.is_empty() => h.clone(),
        _ => match shaper::bucket_by_hour(&payload.time_series) {
            Some(h) => h,
            None => return Vec::new(),
        },
    };

    let active: Vec<(usize, f64)> = hours
        .labels
        .iter()
        .zip(&hours.values)
        .filter(|(_, &v)| v > 0.0)
        .filter_map(|(label, &v)| label.trim().parse::<usize>().ok().map(|h| (h, v)))
        .collect();
    if active.is_empty() {
        return Vec::new();
    }
    let mean = active.iter().map(|(_, v)| v).sum::<f64>() / active.len() as f64;

    let mut peaks: Vec<usize> = active
        .into_iter()
        .filter(|(_, v)| *v > mean)
        .map(|(h, _)| h)
        .collect();
    peaks.sort_unstable();
    peaks
}

/// Anomalies scoring above the upper quartile of anomaly scores
fn high_severity_count(payload: &ResultPayload) -> usize {
    let series = &payload.time_series;
    if series.anomaly_scores.len() != series.len() {
        return 0;
    }
    let mut scores: Vec<f64> = series
        .anomaly_scores
        .iter()
        .zip(&series.anomalies)
        .filter(|(_, &flag)| flag)
        .map(|(&s, _)| s)
        .filter(|s| s.is_finite())
        .collect();
    if scores.is_empty() {
        return 0;
    }
    scores.sort_by(|a, b| a.total_cmp(b));
    let cutoff = quantile(&scores, 0.75);
    scores.iter().filter(|&&s| s > cutoff).count()
}

/// Linear-interpolated quantile of sorted, non-empty data
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimeSeries;

    fn payload(flags: &[bool], scores: Vec<f64>, algorithm: Option<&str>) -> ResultPayload {
        let n = flags.len();
        ResultPayload {
            time_series: TimeSeries {
                timestamps: (0..n)
                    .map(|i| format!("2024-01-01 {:02}:00:00", i % 24))
                    .collect(),
                values: vec![1.0; n],
                anomalies: flags.to_vec(),
                anomaly_scores: scores,
            },
            algorithm: algorithm.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_anomalies_yields_single_general_notice() {
        let recs = recommendations(&payload(&[false; 10], Vec::new(), Some("kmeans")));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::General);
    }

    #[test]
    fn test_rate_tiers() {
        // 3 of 20 = 15% -> high
        let mut flags = vec![false; 20];
        flags[0] = true;
        flags[1] = true;
        flags[2] = true;
        let recs = recommendations(&payload(&flags, Vec::new(), None));
        assert!(recs.iter().any(|r| r.title == "High Anomaly Rate Detected"));

        // 3 of 40 = 7.5% -> moderate
        let mut flags = vec![false; 40];
        flags[0] = true;
        flags[1] = true;
        flags[2] = true;
        let recs = recommendations(&payload(&flags, Vec::new(), None));
        assert!(recs.iter().any(|r| r.title == "Moderate Anomaly Rate"));
    }

    #[test]
    fn test_peak_hours_above_mean() {
        let mut p = payload(&[true, false], Vec::new(), None);
        p.anomalies_by_hour = Some(crate::data::LabeledValues::new(
            vec!["1".into(), "2".into(), "3".into(), "4".into()],
            vec![1.0, 5.0, 0.0, 1.0],
        ));
        assert_eq!(peak_hours(&p), vec![2]);
    }

    #[test]
    fn test_high_severity_uses_upper_quartile() {
        let flags = [true, true, true, true, true, false];
        let scores = vec![0.1, 0.2, 0.3, 0.4, 0.9, 0.95];
        let p = payload(&flags, scores, Some("autoencoder"));
        assert_eq!(high_severity_count(&p), 1);
        let recs = recommendations(&p);
        assert!(recs.iter().any(|r| r.kind == RecommendationKind::Intensity));
        assert!(recs.iter().any(|r| {
            r.kind == RecommendationKind::Algorithm && r.description.contains("AutoEncoder")
        }));
    }

    #[test]
    fn test_quantile_interpolates() {
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.75), 4.0);
        assert_eq!(quantile(&[0.0, 1.0], 0.75), 0.75);
        assert_eq!(quantile(&[2.0], 0.75), 2.0);
    }
}
