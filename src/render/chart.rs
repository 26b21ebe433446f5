//! Chart families and the data/options they are built from.

use thiserror::Error;

use crate::data::shaper::{self, Rgba};
use crate::registry::Teardown;

/// Chart families the renderer knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Doughnut,
    Radar,
    /// Line series overlaid with point series on one x axis
    ScatterLine,
    /// Horizontal bars scaled to a fixed maximum
    Gauge,
}

impl ChartKind {
    pub fn name(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Doughnut => "doughnut",
            ChartKind::Radar => "radar",
            ChartKind::ScatterLine => "scatter",
            ChartKind::Gauge => "gauge",
        }
    }

    /// Next family in the view toggle (bar -> line -> pie -> bar).
    /// Families outside the toggle map to themselves.
    pub fn toggled(self) -> Self {
        match self {
            ChartKind::Bar => ChartKind::Line,
            ChartKind::Line => ChartKind::Pie,
            ChartKind::Pie => ChartKind::Bar,
            other => other,
        }
    }

    // Families drawn from labelled categories rather than x coordinates
}

/// How a dataset is drawn on an x/y chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStyle {
    /// Connected line. With `span_gaps` absent values are bridged.
    Line { span_gaps: bool },
    /// Unconnected markers
    Points,
}

/// One series of values
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<Option<f64>>,
    /// Per-dataset x coordinates; overrides the chart's shared axis
    pub xs: Option<Vec<f64>>,
    /// Fill colors, one per value or a single color for all
    pub fill: Vec<Rgba>,
    /// Border colors, same convention as `fill`
    pub border: Vec<Rgba>,
    pub draw: DrawStyle,
}

impl Dataset {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Dataset {
            label: label.into(),
            values: values.into_iter().map(Some).collect(),
            xs: None,
            fill: Vec::new(),
            border: Vec::new(),
            draw: DrawStyle::Line { span_gaps: false },
        }
    }

    pub fn gapped(label: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Dataset {
            values,
            ..Dataset::new(label, Vec::new())
        }
    }

    /// Single color: `color` at fill opacity, opaque border
    pub fn color(mut self, color: Rgba) -> Self {
        self.fill = vec![color.with_alpha(shaper::FILL_OPACITY)];
        self.border = vec![color.with_alpha(1.0)];
        self
    }

    pub fn colors(mut self, fill: Vec<Rgba>, border: Vec<Rgba>) -> Self {
        self.fill = fill;
        self.border = border;
        self
    }

    pub fn xs(mut self, xs: Vec<f64>) -> Self {
        self.xs = Some(xs);
        self
    }

    pub fn draw(mut self, draw: DrawStyle) -> Self {
        self.draw = draw;
        self
    }

    /// Border color of value `i`, cycling through the configured colors
    pub fn border_at(&self, i: usize) -> Option<Rgba> {
        color_at(&self.border, i).or_else(|| color_at(&self.fill, i))
    }

    pub fn fill_at(&self, i: usize) -> Option<Rgba> {
        color_at(&self.fill, i).or_else(|| color_at(&self.border, i))
    }

    /// Present `(x, y)` points, using `shared` or index positions for x
    pub fn points(&self, shared: Option<&[f64]>) -> Vec<(f64, f64)> {
        let xs = self.xs.as_deref().or(shared);
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| {
                let y = (*v)?;
                let x = match xs {
                    Some(xs) => *xs.get(i)?,
                    None => i as f64,
                };
                Some((x, y))
            })
            .collect()
    }
}

fn color_at(colors: &[Rgba], i: usize) -> Option<Rgba> {
    if colors.is_empty() {
        None
    } else {
        Some(colors[i % colors.len()])
    }
}

/// Labels, shared x axis and datasets of a chart
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub xs: Option<Vec<f64>>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    pub fn new(labels: Vec<String>, datasets: Vec<Dataset>) -> Self {
        ChartData {
            labels,
            xs: None,
            datasets,
        }
    }

    pub fn with_xs(mut self, xs: Vec<f64>) -> Self {
        self.xs = Some(xs);
        self
    }

    /// Check that every sequence lines up with the labels it annotates
    pub fn validate(&self) -> Result<(), RenderError> {
        if let Some(xs) = &self.xs {
            if !self.labels.is_empty() && xs.len() != self.labels.len() {
                return Err(RenderError::AxisMismatch {
                    labels: self.labels.len(),
                    xs: xs.len(),
                });
            }
        }
        for ds in &self.datasets {
            if !self.labels.is_empty() && ds.xs.is_none() && ds.values.len() != self.labels.len() {
                return Err(RenderError::DatasetMismatch {
                    dataset: ds.label.clone(),
                    expected: self.labels.len(),
                    actual: ds.values.len(),
                });
            }
            if let Some(xs) = &ds.xs {
                if xs.len() != ds.values.len() {
                    return Err(RenderError::DatasetMismatch {
                        dataset: ds.label.clone(),
                        expected: xs.len(),
                        actual: ds.values.len(),
                    });
                }
            }
            if ds.values.iter().flatten().any(|v| !v.is_finite()) {
                return Err(RenderError::NonFinite(ds.label.clone()));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.iter().all(|d| d.values.is_empty())
    }
}

/// How values are printed on axes and labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueFormat {
    #[default]
    Number,
    /// Integer counts
    Count,
    /// Ratios in [0, 1] printed as percentages
    Ratio,
    Seconds,
}

impl ValueFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            ValueFormat::Number => shaper::format_value(value),
            ValueFormat::Count => format!("{:.0}", value),
            ValueFormat::Ratio => format!("{:.1}%", value * 100.0),
            ValueFormat::Seconds => format!("{:.2}s", value),
        }
    }
}

/// Display options of a chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub title: String,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub begin_at_zero: bool,
    /// Fixed upper bound of the value axis
    pub max: Option<f64>,
    /// Value range that the axis covers at least
    pub suggested: Option<(f64, f64)>,
    pub format: ValueFormat,
    pub legend: bool,
    /// X coordinates are epoch seconds
    pub time_axis: bool,
}

impl ChartOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        ChartOptions {
            title: title.into(),
            x_title: None,
            y_title: None,
            begin_at_zero: false,
            max: None,
            suggested: None,
            format: ValueFormat::Number,
            legend: true,
            time_axis: false,
        }
    }

    pub fn axes(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_title = Some(x.into());
        self.y_title = Some(y.into());
        self
    }

    pub fn begin_at_zero(mut self) -> Self {
        self.begin_at_zero = true;
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn suggested(mut self, min: f64, max: f64) -> Self {
        self.suggested = Some((min, max));
        self
    }

    pub fn format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self
    }

    pub fn no_legend(mut self) -> Self {
        self.legend = false;
        self
    }

    pub fn time_axis(mut self, on: bool) -> Self {
        self.time_axis = on;
        self
    }

    /// Title without any period suffix
    pub fn base_title(&self) -> &str {
        self.title.split(" - ").next().unwrap_or(&self.title)
    }
}

/// Time windows offered by the period selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl Period {
    pub fn label(self) -> &'static str {
        match self {
            Period::Day => "Last 24 Hours",
            Period::Week => "Last 7 Days",
            Period::Month => "Last 30 Days",
            Period::Year => "Last 12 Months",
            Period::All => "All Time",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Period::Day => Period::Week,
            Period::Week => Period::Month,
            Period::Month => Period::Year,
            Period::Year => Period::All,
            Period::All => Period::Day,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("dataset '{dataset}' has {actual} values for {expected} positions")]
    DatasetMismatch {
        dataset: String,
        expected: usize,
        actual: usize,
    },
    #[error("{xs} x coordinates for {labels} labels")]
    AxisMismatch { labels: usize, xs: usize },
    #[error("dataset '{0}' contains non-finite values")]
    NonFinite(String),
}

/// A chart bound to a surface
#[derive(Debug, Clone)]
pub struct ChartInstance {
    pub id: u64,
    pub kind: ChartKind,
    pub data: ChartData,
    pub options: ChartOptions,
    /// Bumped on every in-place update
    pub revision: u32,
}

impl ChartInstance {
    pub fn new(id: u64, kind: ChartKind, data: ChartData, options: ChartOptions) -> Self {
        ChartInstance {
            id,
            kind,
            data,
            options,
            revision: 0,
        }
    }
}

impl Teardown for ChartInstance {
    fn teardown(&mut self) {
        tracing::trace!(id = self.id, kind = self.kind.name(), "releasing chart");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_skip_absent_values() {
        let ds = Dataset::gapped("normal", vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(ds.points(None), vec![(0.0, 1.0), (2.0, 3.0)]);
        assert_eq!(
            ds.points(Some(&[10.0, 20.0, 30.0])),
            vec![(10.0, 1.0), (30.0, 3.0)]
        );
    }

    #[test]
    fn test_all_absent_dataset_is_valid() {
        let ds = Dataset::gapped("anomalies", vec![None, None]);
        assert!(ds.values.iter().all(Option::is_none));
        assert!(ds.points(None).is_empty());
        let data = ChartData::new(vec!["a".into(), "b".into()], vec![ds]);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_validate_catches_misaligned_dataset() {
        let data = ChartData::new(
            vec!["a".into(), "b".into()],
            vec![Dataset::new("x", vec![1.0])],
        );
        assert!(matches!(
            data.validate(),
            Err(RenderError::DatasetMismatch { expected: 2, actual: 1, .. })
        ));

        let data = ChartData::new(Vec::new(), vec![Dataset::new("x", vec![f64::NAN])]);
        assert!(matches!(data.validate(), Err(RenderError::NonFinite(_))));
    }

    #[test]
    fn test_colors_cycle_per_value() {
        let ds = Dataset::new("x", vec![1.0, 2.0, 3.0])
            .colors(shaper::chart_colors(2, 0.7), shaper::chart_colors(2, 1.0));
        assert_eq!(ds.border_at(2), ds.border_at(0));
        assert_eq!(ds.fill_at(1).unwrap().a, 0.7);
        assert!(Dataset::new("y", vec![1.0]).border_at(0).is_none());
    }

    #[test]
    fn test_kind_toggle_cycle() {
        assert_eq!(ChartKind::Bar.toggled(), ChartKind::Line);
        assert_eq!(ChartKind::Line.toggled(), ChartKind::Pie);
        assert_eq!(ChartKind::Pie.toggled(), ChartKind::Bar);
        assert_eq!(ChartKind::Radar.toggled(), ChartKind::Radar);
    }

    #[test]
    fn test_base_title_strips_period() {
        let options = ChartOptions::titled("Anomalies by Hour of Day - Last 7 Days");
        assert_eq!(options.base_title(), "Anomalies by Hour of Day");
    }

    #[test]
    fn test_value_formats() {
        assert_eq!(ValueFormat::Ratio.format(0.8), "80.0%");
        assert_eq!(ValueFormat::Count.format(12.0), "12");
        assert_eq!(ValueFormat::Seconds.format(1.234), "1.23s");
    }
}
