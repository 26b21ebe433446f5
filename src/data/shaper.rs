//! Pure transforms from payloads into chart-ready shapes.
//!
//! Nothing in here touches the terminal or the registry; every function is
//! deterministic in its inputs.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use thiserror::Error;

use super::models::{LabeledValues, TimeSeries};

/// Payload shape violations found while shaping
#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error(
        "time series lengths differ \
         (timestamps {timestamps}, values {values}, anomalies {anomalies})"
    )]
    LengthMismatch {
        timestamps: usize,
        values: usize,
        anomalies: usize,
    },
    #[error("{values} values but {flags} anomaly flags")]
    FlagMismatch { values: usize, flags: usize },
    #[error("anomaly scores have {actual} entries, expected {expected}")]
    ScoreLengthMismatch { expected: usize, actual: usize },
    #[error("{labels} labels but {values} values")]
    LabelMismatch { labels: usize, values: usize },
    #[error("{field} has {actual} entries, expected {expected}")]
    VectorMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("anomaly count {anomalies} exceeds total points {total}")]
    CountExceedsTotal { anomalies: u64, total: u64 },
}

/// An RGB color with opacity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Rgba { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Rgba { a, ..self }
    }

    /// Same hue, ignoring opacity
    #[cfg(test)]
    pub fn same_hue(&self, other: &Rgba) -> bool {
        (self.r, self.g, self.b) == (other.r, other.g, other.b)
    }

    /// Composite over black, for terminals that only take opaque colors
    pub fn blended(&self) -> (u8, u8, u8) {
        let a = self.a.clamp(0.0, 1.0);
        let mix = |c: u8| (c as f64 * a).round() as u8;
        (mix(self.r), mix(self.g), mix(self.b))
    }

    /// Parse `#RRGGBB` (opacity 1)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgba::new(channel(0)?, channel(2)?, channel(4)?, 1.0))
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Base palette cycled by [`chart_colors`]
pub const BASE_PALETTE: [Rgba; 8] = [
    Rgba::new(26, 188, 156, 1.0),  // teal
    Rgba::new(231, 76, 60, 1.0),   // red
    Rgba::new(52, 152, 219, 1.0),  // blue
    Rgba::new(241, 196, 15, 1.0),  // yellow
    Rgba::new(155, 89, 182, 1.0),  // purple
    Rgba::new(46, 204, 113, 1.0),  // green
    Rgba::new(230, 126, 34, 1.0),  // orange
    Rgba::new(149, 165, 166, 1.0), // gray
];

/// Named roles used across pages
pub const NORMAL: Rgba = Rgba::new(46, 204, 113, 1.0);
pub const ANOMALY: Rgba = Rgba::new(231, 76, 60, 1.0);
pub const SERIES: Rgba = Rgba::new(26, 188, 156, 1.0);
pub const RECALL: Rgba = Rgba::new(52, 152, 219, 1.0);
pub const F1: Rgba = Rgba::new(155, 89, 182, 1.0);

/// Default fill opacity for bars and slices
pub const FILL_OPACITY: f64 = 0.7;

/// `count` colors cycling the base palette at `opacity`
pub fn chart_colors(count: usize, opacity: f64) -> Vec<Rgba> {
    cycle(&BASE_PALETTE, count, opacity)
}

/// `count` colors cycling `palette` (base palette when empty) at `opacity`
pub fn chart_colors_from(palette: &[Rgba], count: usize, opacity: f64) -> Vec<Rgba> {
    if palette.is_empty() {
        return chart_colors(count, opacity);
    }
    cycle(palette, count, opacity)
}

fn cycle(palette: &[Rgba], count: usize, opacity: f64) -> Vec<Rgba> {
    (0..count)
        .map(|i| palette[i % palette.len()].with_alpha(opacity))
        .collect()
}

/// Share of `part` in `whole` as a percentage rounded to one decimal.
/// A zero or non-finite whole yields 0.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 || !whole.is_finite() || !part.is_finite() {
        return 0.0;
    }
    (part / whole * 1000.0).round() / 10.0
}

/// [`percentage`] formatted as `"6.0%"`
pub fn format_percentage(part: f64, whole: f64) -> String {
    format!("{:.1}%", percentage(part, whole))
}

/// Turn an algorithm key into a display label: `isolation_forest` becomes
/// `Isolation forest`.
pub fn display_label(key: &str) -> String {
    let spaced: String = key
        .trim()
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Normal and anomaly streams over the same index space
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSeries {
    pub normal: Vec<Option<f64>>,
    pub anomaly: Vec<Option<f64>>,
}

impl SplitSeries {
    pub fn normal_count(&self) -> usize {
        populated(&self.normal)
    }

    pub fn anomaly_count(&self) -> usize {
        populated(&self.anomaly)
    }
}

/// Number of present values in a gapped series
pub fn populated(values: &[Option<f64>]) -> usize {
    values.iter().filter(|v| v.is_some()).count()
}

/// Split values into a normal stream (anomalous indices absent) and its
/// mirror anomaly stream. Both outputs keep the input length.
pub fn split_anomalies(values: &[f64], flags: &[bool]) -> Result<SplitSeries, ShapeError> {
    if values.len() != flags.len() {
        return Err(ShapeError::FlagMismatch {
            values: values.len(),
            flags: flags.len(),
        });
    }
    let (normal, anomaly) = values
        .iter()
        .zip(flags)
        .map(|(&v, &is_anomaly)| {
            if is_anomaly {
                (None, Some(v))
            } else {
                (Some(v), None)
            }
        })
        .unzip();
    Ok(SplitSeries { normal, anomaly })
}

/// Parse the timestamp formats the server emits
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// X coordinates for a labelled series
#[derive(Debug, Clone, PartialEq)]
pub enum TimeAxis {
    /// Seconds since the epoch, one per label
    Time(Vec<f64>),
    /// Labels were not all timestamps; positions are indices
    Index(Vec<f64>),
}

impl TimeAxis {
    pub fn xs(&self) -> &[f64] {
        match self {
            TimeAxis::Time(xs) | TimeAxis::Index(xs) => xs,
        }
    }

    pub fn is_time(&self) -> bool {
        matches!(self, TimeAxis::Time(_))
    }
}

/// Time axis when every label parses, index axis otherwise
pub fn time_axis(labels: &[String]) -> TimeAxis {
    let parsed: Option<Vec<f64>> = labels
        .iter()
        .map(|l| parse_timestamp(l).map(|t| t.and_utc().timestamp() as f64))
        .collect();
    match parsed {
        Some(xs) if !xs.is_empty() => TimeAxis::Time(xs),
        _ => TimeAxis::Index((0..labels.len()).map(|i| i as f64).collect()),
    }
}

/// `"13"` becomes `"13:00"`
pub fn hour_labels(labels: &[String]) -> Vec<String> {
    labels.iter().map(|h| format!("{h}:00")).collect()
}

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Anomalies per hour of day (24 buckets). `None` when no timestamp parses.
pub fn bucket_by_hour(series: &TimeSeries) -> Option<LabeledValues> {
    let buckets = bucket(series, 24, |t| t.hour() as usize)?;
    Some(LabeledValues::new(
        (0..24).map(|h| h.to_string()).collect(),
        buckets,
    ))
}

/// Anomalies per weekday, Monday first. `None` when no timestamp parses.
pub fn bucket_by_weekday(series: &TimeSeries) -> Option<LabeledValues> {
    let buckets = bucket(series, 7, |t| t.weekday().num_days_from_monday() as usize)?;
    Some(LabeledValues::new(
        WEEKDAYS.iter().map(|d| d.to_string()).collect(),
        buckets,
    ))
}

fn bucket(
    series: &TimeSeries,
    n: usize,
    key: impl Fn(&NaiveDateTime) -> usize,
) -> Option<Vec<f64>> {
    let mut counts = vec![0.0; n];
    let mut any_parsed = false;
    for (ts, &flag) in series.timestamps.iter().zip(&series.anomalies) {
        let Some(t) = parse_timestamp(ts) else { continue };
        any_parsed = true;
        if flag {
            counts[key(&t) % n] += 1.0;
        }
    }
    any_parsed.then_some(counts)
}

/// `[normal, anomalies]` for the summary doughnut
pub fn summary_counts(anomalies: u64, total: u64) -> [f64; 2] {
    [total.saturating_sub(anomalies) as f64, anomalies as f64]
}

pub const OVERVIEW_AXES: [&str; 3] = ["Precision", "Recall", "F1 Score"];
pub const INSIGHT_AXES: [&str; 5] = [
    "Precision",
    "Recall",
    "F1 Score",
    "Efficiency",
    "Interpretability",
];

/// Format a value for axis labels
pub fn format_value(value: f64) -> String {
    if value.abs() < 0.001 && value != 0.0 {
        format!("{:.2e}", value)
    } else if value.abs() >= 10000.0 {
        format!("{:.2e}", value)
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else if value.abs() >= 1.0 {
        format!("{:.2}", value)
    } else {
        format!("{:.3}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(bits: &[u8]) -> Vec<bool> {
        bits.iter().map(|&b| b == 1).collect()
    }

    #[test]
    fn test_split_marks_gaps_at_anomalies() {
        let values: Vec<f64> = (0..10).map(|i| i as f64 * 1.5).collect();
        let split = split_anomalies(&values, &flags(&[0, 0, 1, 0, 0, 0, 0, 1, 0, 0])).unwrap();

        assert_eq!(split.normal.len(), 10);
        assert_eq!(split.anomaly.len(), 10);
        for i in 0..10 {
            if i == 2 || i == 7 {
                assert_eq!(split.normal[i], None);
                assert_eq!(split.anomaly[i], Some(values[i]));
            } else {
                assert_eq!(split.normal[i], Some(values[i]));
                assert_eq!(split.anomaly[i], None);
            }
        }
    }

    #[test]
    fn test_split_streams_are_complementary() {
        let patterns: [&[u8]; 4] = [&[], &[1, 1, 1], &[0, 0, 0, 0], &[1, 0, 1, 0, 0, 1, 1]];
        for bits in patterns {
            let values: Vec<f64> = (0..bits.len()).map(|i| i as f64).collect();
            let k = bits.iter().filter(|&&b| b == 1).count();
            let split = split_anomalies(&values, &flags(bits)).unwrap();

            assert_eq!(split.normal.len(), bits.len());
            assert_eq!(split.anomaly.len(), bits.len());
            assert_eq!(split.normal_count(), bits.len() - k);
            assert_eq!(split.anomaly_count(), k);
            for (n, a) in split.normal.iter().zip(&split.anomaly) {
                assert!(n.is_some() != a.is_some(), "exactly one stream populated per index");
            }
        }
    }

    #[test]
    fn test_split_rejects_mismatched_lengths() {
        let err = split_anomalies(&[1.0, 2.0], &[false]).unwrap_err();
        assert_eq!(err, ShapeError::FlagMismatch { values: 2, flags: 1 });
        assert_eq!(err.to_string(), "2 values but 1 anomaly flags");
    }

    #[test]
    fn test_percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(12.0, 200.0), 6.0);
        assert_eq!(percentage(1.0, 3.0), 33.3);
        assert_eq!(format_percentage(12.0, 200.0), "6.0%");
        assert_eq!(format_percentage(2.0, 3.0), "66.7%");
    }

    #[test]
    fn test_percentage_of_zero_whole_is_zero() {
        for part in [0.0, 5.0, -3.0] {
            let p = percentage(part, 0.0);
            assert_eq!(p, 0.0);
            assert!(!p.is_nan());
        }
        assert_eq!(format_percentage(7.0, 0.0), "0.0%");
        assert_eq!(percentage(1.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_display_label() {
        assert_eq!(display_label("isolation_forest"), "Isolation forest");
        assert_eq!(display_label("kmeans"), "Kmeans");
        assert_eq!(display_label("auto_encoder_v2"), "Auto encoder v2");
        assert_eq!(display_label(""), "");
    }

    #[test]
    fn test_chart_colors_cycle_palette() {
        for n in [0, 1, 8, 9, 17] {
            let colors = chart_colors(n, FILL_OPACITY);
            assert_eq!(colors.len(), n);
            for (i, c) in colors.iter().enumerate() {
                assert!(c.same_hue(&BASE_PALETTE[i % 8]));
                assert!(c.to_string().starts_with("rgba("));
            }
        }
        let colors = chart_colors(9, FILL_OPACITY);
        assert_eq!(colors[8], colors[0]);
    }

    #[test]
    fn test_border_colors_differ_only_in_opacity() {
        let fill = chart_colors(5, 0.7);
        let border = chart_colors(5, 1.0);
        for (f, b) in fill.iter().zip(&border) {
            assert!(f.same_hue(b));
            assert_eq!(f.a, 0.7);
            assert_eq!(b.a, 1.0);
        }
        assert_eq!(border[0].to_string(), "rgba(26, 188, 156, 1)");
        assert_eq!(fill[1].to_string(), "rgba(231, 76, 60, 0.7)");
    }

    #[test]
    fn test_custom_palette_and_hex() {
        let palette = [Rgba::from_hex("#FF0000").unwrap(), Rgba::from_hex("#00ff00").unwrap()];
        let colors = chart_colors_from(&palette, 3, 1.0);
        assert_eq!(colors[2], palette[0]);
        assert_eq!(chart_colors_from(&[], 1, 1.0)[0], BASE_PALETTE[0]);
        assert!(Rgba::from_hex("red").is_none());
    }

    #[test]
    fn test_time_axis_falls_back_to_index() {
        let stamps = vec!["2024-01-01 00:00:00".to_string(), "2024-01-01 01:00:00".to_string()];
        let axis = time_axis(&stamps);
        assert!(axis.is_time());
        assert_eq!(axis.xs()[1] - axis.xs()[0], 3600.0);

        let mixed = vec!["2024-01-01".to_string(), "later".to_string()];
        assert_eq!(time_axis(&mixed), TimeAxis::Index(vec![0.0, 1.0]));
    }

    #[test]
    fn test_bucket_by_hour_counts_only_anomalies() {
        let series = TimeSeries {
            timestamps: vec![
                "2024-01-01 03:10:00".into(),
                "2024-01-01 03:40:00".into(),
                "2024-01-01T14:00:00".into(),
                "2024-01-02 03:00:00".into(),
            ],
            values: vec![1.0; 4],
            anomalies: vec![true, false, true, true],
            anomaly_scores: Vec::new(),
        };
        let hours = bucket_by_hour(&series).unwrap();
        assert_eq!(hours.labels.len(), 24);
        assert_eq!(hours.values[3], 2.0);
        assert_eq!(hours.values[14], 1.0);
        assert_eq!(hours.total(), 3.0);

        // 2024-01-01 is a Monday
        let days = bucket_by_weekday(&series).unwrap();
        assert_eq!(days.values[0], 2.0);
        assert_eq!(days.values[1], 1.0);
    }

    #[test]
    fn test_bucket_without_timestamps_is_none() {
        let series = TimeSeries {
            timestamps: vec!["t0".into()],
            values: vec![1.0],
            anomalies: vec![true],
            anomaly_scores: Vec::new(),
        };
        assert!(bucket_by_hour(&series).is_none());
    }

    #[test]
    fn test_summary_counts() {
        assert_eq!(summary_counts(12, 200), [188.0, 12.0]);
        assert_eq!(summary_counts(5, 0), [0.0, 5.0]);
    }

    #[test]
    fn test_hour_labels() {
        assert_eq!(hour_labels(&["0".into(), "13".into()]), vec!["0:00", "13:00"]);
    }
}
