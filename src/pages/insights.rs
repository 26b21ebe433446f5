//! Model insights page: compares the detection models side by side.

use crate::data::shaper::{self, Rgba};
use crate::data::{EmbeddedStore, ModelPerformanceEntry};
use crate::render::{Board, ChartData, ChartOptions, Dataset, ValueFormat};

use super::{focused_surface, mount, next_focus, prev_focus};

pub const MODEL_PERFORMANCE: &str = "model-performance-chart";
pub const ANOMALY_COMPARISON: &str = "anomaly-comparison-chart";
pub const EXECUTION_TIME: &str = "execution-time-chart";

pub const SURFACES: [&str; 3] = [MODEL_PERFORMANCE, ANOMALY_COMPARISON, EXECUTION_TIME];

pub struct InsightsPage {
    board: Board,
    store: EmbeddedStore,
    palette: Vec<Rgba>,
    entries: Vec<ModelPerformanceEntry>,
    focus: usize,
}

impl InsightsPage {
    pub fn new(store: EmbeddedStore, palette: Vec<Rgba>) -> Self {
        Self::with_surfaces(store, palette, &SURFACES)
    }

    /// Page declaring only `surfaces`; the comparison charts are optional
    pub fn with_surfaces(store: EmbeddedStore, palette: Vec<Rgba>, surfaces: &[&str]) -> Self {
        InsightsPage {
            board: Board::new(surfaces),
            store,
            palette,
            entries: Vec::new(),
            focus: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn entries(&self) -> &[ModelPerformanceEntry] {
        &self.entries
    }

    pub fn load(&mut self) {
        match self.store.load_model_performance() {
            Ok(entries) => self.render_entries(entries),
            Err(e) => {
                tracing::error!(error = %e, "model performance payload unavailable");
                self.entries.clear();
                self.board.teardown();
                self.board.error(
                    MODEL_PERFORMANCE,
                    &format!("Model performance data unavailable: {e}"),
                );
            }
        }
    }

    pub fn render_entries(&mut self, entries: Vec<ModelPerformanceEntry>) {
        self.entries = entries;
        if self.entries.is_empty() {
            for surface in SURFACES {
                self.board
                    .placeholder(surface, "No model performance data available yet");
            }
            return;
        }

        self.render_comparison();
        if self.board.has_mount(ANOMALY_COMPARISON) {
            self.render_anomaly_counts();
        }
        if self.board.has_mount(EXECUTION_TIME) {
            self.render_execution_times();
        }
    }

    fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    fn render_comparison(&mut self) {
        let n = self.entries.len();
        let borders = shaper::chart_colors_from(&self.palette, n, 1.0);
        let datasets = self
            .entries
            .iter()
            .zip(&borders)
            .map(|(entry, &border)| {
                Dataset::new(entry.name.clone(), entry.axes().to_vec())
                    .colors(vec![border.with_alpha(0.2)], vec![border])
            })
            .collect();
        let data = ChartData::new(
            shaper::INSIGHT_AXES.iter().map(|s| s.to_string()).collect(),
            datasets,
        );
        let options = ChartOptions::titled("Model Performance Comparison")
            .suggested(0.0, 1.0)
            .format(ValueFormat::Ratio);
        mount(&mut self.board, MODEL_PERFORMANCE, Board::radar, data, options);
    }

    fn render_anomaly_counts(&mut self) {
        let values = self
            .entries
            .iter()
            .map(|e| e.anomalies_detected as f64)
            .collect();
        let dataset = self.palette_dataset("Anomalies Detected", values);
        let data = ChartData::new(self.names(), vec![dataset]);
        let options = ChartOptions::titled("Anomalies Detected by Model")
            .axes("Model", "Anomalies Detected")
            .begin_at_zero()
            .format(ValueFormat::Count)
            .no_legend();
        mount(&mut self.board, ANOMALY_COMPARISON, Board::bar, data, options);
    }

    fn render_execution_times(&mut self) {
        let values = self.entries.iter().map(|e| e.execution_time).collect();
        let data = ChartData::new(
            self.names(),
            vec![self.palette_dataset("Execution Time (seconds)", values)],
        );
        let options = ChartOptions::titled("Model Execution Time Comparison")
            .axes("Model", "Execution Time (seconds)")
            .begin_at_zero()
            .format(ValueFormat::Seconds)
            .no_legend();
        mount(&mut self.board, EXECUTION_TIME, Board::bar, data, options);
    }

    /// One color per bar, cycling the palette
    fn palette_dataset(&self, label: &str, values: Vec<f64>) -> Dataset {
        let n = values.len();
        Dataset::new(label, values).colors(
            shaper::chart_colors_from(&self.palette, n, shaper::FILL_OPACITY),
            shaper::chart_colors_from(&self.palette, n, 1.0),
        )
    }

    pub fn focused(&self) -> Option<String> {
        focused_surface(&self.board, self.focus)
    }

    pub fn focus_next(&mut self) {
        self.focus = next_focus(self.focus, self.board.surfaces().count());
    }

    pub fn focus_prev(&mut self) {
        self.focus = prev_focus(self.focus, self.board.surfaces().count());
    }

    pub fn teardown(&mut self) {
        self.board.teardown();
    }
}
