//! Dashboard overview page: four independent charts from the overview
//! payload.

use std::collections::HashMap;

use crate::data::shaper::{self, Rgba, ANOMALY, F1, NORMAL, RECALL, SERIES};
use crate::data::{EmbeddedStore, LabeledValues, OverviewPayload, PerformanceVectors};
use crate::render::{Board, ChartData, ChartOptions, Dataset, DrawStyle, Period, ValueFormat};

use super::{focused_surface, mount, next_focus, prev_focus};

pub const ANOMALIES_BY_HOUR: &str = "anomalies-by-hour-chart";
pub const RESULTS_BY_ALGORITHM: &str = "results-by-algorithm-chart";
pub const DATASETS_OVER_TIME: &str = "datasets-over-time-chart";
pub const MODEL_PERFORMANCE: &str = "model-performance-dashboard-chart";

pub const SURFACES: [&str; 4] = [
    ANOMALIES_BY_HOUR,
    RESULTS_BY_ALGORITHM,
    DATASETS_OVER_TIME,
    MODEL_PERFORMANCE,
];

const RADAR_COLORS: [Rgba; 3] = [NORMAL, RECALL, F1];

pub struct DashboardPage {
    board: Board,
    store: EmbeddedStore,
    palette: Vec<Rgba>,
    dataset_count: Option<u64>,
    result_count: Option<u64>,
    periods: HashMap<String, Period>,
    focus: usize,
}

impl DashboardPage {
    pub fn new(store: EmbeddedStore, palette: Vec<Rgba>) -> Self {
        DashboardPage {
            board: Board::new(&SURFACES),
            store,
            palette,
            dataset_count: None,
            result_count: None,
            periods: HashMap::new(),
            focus: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// `(datasets, results)` totals from the last overview
    pub fn totals(&self) -> (Option<u64>, Option<u64>) {
        (self.dataset_count, self.result_count)
    }

    /// Read the overview payload and render every section
    pub fn load(&mut self) {
        match self.store.load_overview() {
            Ok(overview) => self.render_overview(&overview),
            Err(e) => {
                tracing::error!(error = %e, "overview payload unavailable");
                let text = format!("Overview data unavailable: {e}");
                for surface in SURFACES {
                    self.board.error(surface, &text);
                }
            }
        }
    }

    pub fn render_overview(&mut self, overview: &OverviewPayload) {
        self.dataset_count = overview.dataset_count;
        self.result_count = overview.result_count;
        self.periods.clear();

        self.render_hourly(overview.anomalies_by_hour.as_ref());
        self.render_by_algorithm(overview.results_by_algorithm.as_ref());
        self.render_uploads(overview.datasets_over_time.as_ref());
        self.render_performance(overview.model_performance.as_ref());
    }

    fn render_hourly(&mut self, hours: Option<&LabeledValues>) {
        let empty = "No anomaly data available yet";
        let Some(hours) = section(&mut self.board, ANOMALIES_BY_HOUR, hours, empty) else {
            return;
        };
        let data = ChartData::new(
            shaper::hour_labels(&hours.labels),
            vec![Dataset::new("Anomalies", hours.values.clone()).color(ANOMALY)],
        );
        let options = ChartOptions::titled("Anomalies by Hour of Day")
            .axes("Hour of Day", "Number of Anomalies")
            .begin_at_zero()
            .format(ValueFormat::Count)
            .no_legend();
        mount(&mut self.board, ANOMALIES_BY_HOUR, Board::bar, data, options);
    }

    fn render_by_algorithm(&mut self, results: Option<&LabeledValues>) {
        let empty = "No algorithm results available yet";
        let Some(results) = section(&mut self.board, RESULTS_BY_ALGORITHM, results, empty) else {
            return;
        };
        let n = results.values.len();
        let data = ChartData::new(
            results.labels.iter().map(|l| shaper::display_label(l)).collect(),
            vec![Dataset::new("Results", results.values.clone()).colors(
                shaper::chart_colors_from(&self.palette, n, shaper::FILL_OPACITY),
                shaper::chart_colors_from(&self.palette, n, 1.0),
            )],
        );
        let options =
            ChartOptions::titled("Anomaly Detection by Algorithm").format(ValueFormat::Count);
        mount(&mut self.board, RESULTS_BY_ALGORITHM, Board::pie, data, options);
    }

    fn render_uploads(&mut self, uploads: Option<&LabeledValues>) {
        let empty = "No dataset history available yet";
        let Some(uploads) = section(&mut self.board, DATASETS_OVER_TIME, uploads, empty) else {
            return;
        };
        let data = ChartData::new(
            uploads.labels.clone(),
            vec![Dataset::new("Datasets Uploaded", uploads.values.clone())
                .color(SERIES)
                .draw(DrawStyle::Line { span_gaps: false })],
        );
        let options = ChartOptions::titled("Dataset Uploads Over Time")
            .axes("Date", "Number of Datasets")
            .begin_at_zero()
            .format(ValueFormat::Count)
            .no_legend();
        mount(&mut self.board, DATASETS_OVER_TIME, Board::line, data, options);
    }

    fn render_performance(&mut self, perf: Option<&PerformanceVectors>) {
        let perf = match perf {
            Some(p) if !p.is_empty() => p,
            _ => {
                self.board
                    .placeholder(MODEL_PERFORMANCE, "No model performance data available yet");
                return;
            }
        };
        if let Err(e) = perf.validate() {
            tracing::warn!(error = %e, "model performance vectors misaligned");
            self.board
                .error(MODEL_PERFORMANCE, &format!("Invalid model performance data: {e}"));
            return;
        }

        let datasets = perf
            .algorithms
            .iter()
            .enumerate()
            .map(|(i, algo)| {
                Dataset::new(
                    shaper::display_label(algo),
                    vec![perf.precision[i], perf.recall[i], perf.f1_score[i]],
                )
                .colors(
                    vec![RADAR_COLORS[i % RADAR_COLORS.len()].with_alpha(0.2)],
                    vec![RADAR_COLORS[i % RADAR_COLORS.len()]],
                )
            })
            .collect();
        let data = ChartData::new(
            shaper::OVERVIEW_AXES.iter().map(|s| s.to_string()).collect(),
            datasets,
        );
        let options = ChartOptions::titled("Model Performance Comparison")
            .suggested(0.0, 1.0)
            .format(ValueFormat::Ratio);
        mount(&mut self.board, MODEL_PERFORMANCE, Board::radar, data, options);
    }

    pub fn focused(&self) -> Option<String> {
        focused_surface(&self.board, self.focus)
    }

    pub fn focus_next(&mut self) {
        self.focus = next_focus(self.focus, SURFACES.len());
    }

    pub fn focus_prev(&mut self) {
        self.focus = prev_focus(self.focus, SURFACES.len());
    }

    pub fn focus_index(&self) -> usize {
        self.focus
    }

    /// Switch the focused chart to the next family in the view toggle
    pub fn toggle_kind(&mut self) {
        let Some(surface) = self.focused() else { return };
        let Some(kind) = self.board.chart(&surface).map(|c| c.kind) else {
            return;
        };
        let next = kind.toggled();
        if next == kind {
            return;
        }
        if let Err(e) = self.board.change_kind(&surface, next) {
            tracing::error!(surface = %surface, error = %e, "chart type change failed");
            self.board
                .error(&surface, &format!("Unable to draw chart: {e}"));
        }
    }

    /// Advance the focused chart's time period
    pub fn cycle_period(&mut self) {
        let Some(surface) = self.focused() else { return };
        if self.board.chart(&surface).is_none() {
            return;
        }
        let period = self.period(&surface).next();
        if self.board.set_period(&surface, period) {
            self.periods.insert(surface, period);
        }
    }

    pub fn period(&self, surface: &str) -> Period {
        self.periods.get(surface).copied().unwrap_or_default()
    }

    pub fn teardown(&mut self) {
        self.board.teardown();
    }
}

/// The section when it can be drawn. Otherwise the surface says why: an
/// absent or empty section gets the `empty` placeholder, misaligned data an
/// error.
fn section<'a>(
    board: &mut Board,
    surface: &str,
    data: Option<&'a LabeledValues>,
    empty: &str,
) -> Option<&'a LabeledValues> {
    let Some(section) = data.filter(|s| !s.is_empty()) else {
        board.placeholder(surface, empty);
        return None;
    };
    if let Err(e) = section.validate() {
        tracing::warn!(surface, error = %e, "overview section misaligned");
        board.error(surface, &format!("Invalid chart data: {e}"));
        return None;
    }
    Some(section)
}
