//! Result detail page: one detection result fetched from the server.

use std::sync::Arc;

use crate::data::shaper::{self, ANOMALY, F1, NORMAL, RECALL, SERIES};
use crate::data::{
    recommendations, FetchResponse, LabeledValues, Recommendation, ResultFetcher, ResultPayload,
    ResultSource,
};
use crate::render::{Board, ChartData, ChartOptions, Dataset, DrawStyle, Notice, ValueFormat};

use super::{focused_surface, mount, next_focus, prev_focus};

pub const TIME_SERIES: &str = "time-series-chart";
pub const METRICS: &str = "metrics-chart";
pub const SUMMARY: &str = "anomaly-summary-chart";
pub const DISTRIBUTION: &str = "anomalies-distribution-chart";
pub const WEEKDAY: &str = "anomalies-by-dow-chart";

pub const SURFACES: [&str; 5] = [TIME_SERIES, METRICS, SUMMARY, DISTRIBUTION, WEEKDAY];

pub struct ResultPage {
    board: Board,
    fetcher: ResultFetcher,
    result_id: Option<u64>,
    payload: Option<ResultPayload>,
    recommendations: Vec<Recommendation>,
    /// Message of the last failed fetch
    failure: Option<String>,
    /// Digits typed towards a result id
    id_input: String,
    focus: usize,
    /// On screen; a hidden page keeps fetched results without mounting them
    active: bool,
}

impl ResultPage {
    pub fn new(source: Arc<dyn ResultSource>) -> Self {
        ResultPage {
            board: Board::new(&SURFACES),
            fetcher: ResultFetcher::new(source),
            result_id: None,
            payload: None,
            recommendations: Vec::new(),
            failure: None,
            id_input: String::new(),
            focus: 0,
            active: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn result_id(&self) -> Option<u64> {
        self.result_id
    }

    pub fn payload(&self) -> Option<&ResultPayload> {
        self.payload.as_ref()
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    pub fn id_input(&self) -> &str {
        &self.id_input
    }

    /// True while the latest request has not been answered
    pub fn is_loading(&self) -> bool {
        self.result_id.is_some() && self.payload.is_none() && self.failure.is_none()
    }

    /// Start loading `result_id`. A response to an earlier request that
    /// arrives afterwards is discarded.
    pub fn select(&mut self, result_id: u64) {
        self.result_id = Some(result_id);
        self.payload = None;
        self.failure = None;
        self.recommendations.clear();
        let seq = self.fetcher.request(result_id);
        tracing::info!(result_id, seq, "loading result");

        if self.active {
            self.show_current();
        }
    }

    pub fn reload(&mut self) {
        if let Some(id) = self.result_id {
            self.select(id);
        }
    }

    pub fn select_next(&mut self) {
        let next = self.result_id.map_or(1, |id| id.saturating_add(1));
        self.select(next);
    }

    pub fn select_prev(&mut self) {
        let prev = self.result_id.map_or(1, |id| id.saturating_sub(1).max(1));
        self.select(prev);
    }

    pub fn push_digit(&mut self, c: char) {
        if c.is_ascii_digit() && self.id_input.len() < 19 {
            self.id_input.push(c);
        }
    }

    pub fn pop_digit(&mut self) {
        self.id_input.pop();
    }

    pub fn clear_input(&mut self) {
        self.id_input.clear();
    }

    /// Load the typed id, or reload the current result when nothing is typed
    pub fn submit(&mut self) {
        let typed = std::mem::take(&mut self.id_input);
        match typed.parse::<u64>() {
            Ok(id) if id > 0 => self.select(id),
            _ => self.reload(),
        }
    }

    /// Apply a finished fetch if there is one. Returns true when the page
    /// changed.
    pub fn poll(&mut self) -> bool {
        match self.fetcher.poll() {
            Some(response) => {
                self.apply(response);
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, response: FetchResponse) {
        if !self.fetcher.is_current(response.seq) {
            tracing::debug!(seq = response.seq, "ignoring superseded response");
            return;
        }
        match response.outcome {
            Ok(payload) => {
                tracing::info!(
                    result_id = response.result_id,
                    points = payload.time_series.len(),
                    "result loaded"
                );
                self.payload = Some(payload);
            }
            Err(e) => {
                tracing::error!(result_id = response.result_id, error = %e, "result fetch failed");
                self.failure = Some(format!("Error loading chart data: {e}"));
            }
        }
        if self.active {
            self.show_current();
        } else {
            tracing::debug!(seq = response.seq, "result page hidden, charts deferred");
        }
    }

    fn render_payload(&mut self, payload: ResultPayload) {
        self.board.teardown();
        if let Err(e) = payload.validate() {
            tracing::error!(error = %e, "result payload rejected");
            let text = format!("Error loading chart data: {e}");
            self.board.error(TIME_SERIES, &text);
            self.failure = Some(text);
            return;
        }

        self.render_time_series(&payload);
        self.render_metrics(&payload);
        self.render_summary(&payload);

        let by_hour = payload
            .anomalies_by_hour
            .clone()
            .filter(|h| !h.is_empty())
            .or_else(|| shaper::bucket_by_hour(&payload.time_series));
        self.render_hourly(by_hour);

        let by_weekday = payload
            .anomalies_by_dow
            .clone()
            .filter(|d| !d.is_empty())
            .or_else(|| shaper::bucket_by_weekday(&payload.time_series));
        self.render_weekday(by_weekday);

        self.recommendations = recommendations(&payload);
        self.payload = Some(payload);
    }

    /// Put the page on screen and draw whatever it last received
    pub fn activate(&mut self) {
        self.active = true;
        self.show_current();
    }

    fn show_current(&mut self) {
        self.board.teardown();
        if let Some(payload) = self.payload.take() {
            self.render_payload(payload);
        } else if let Some(text) = &self.failure {
            self.board.error(TIME_SERIES, text);
        } else if let Some(id) = self.result_id {
            self.board
                .show(TIME_SERIES, Notice::loading(format!("Loading result {id}...")));
        } else {
            self.board
                .placeholder(TIME_SERIES, "Type a result id and press Enter");
        }
    }

    fn render_time_series(&mut self, payload: &ResultPayload) {
        let series = &payload.time_series;
        if series.is_empty() {
            self.board
                .placeholder(TIME_SERIES, "No time series data in this result");
            return;
        }
        let split = match shaper::split_anomalies(&series.values, &series.anomalies) {
            Ok(split) => split,
            Err(e) => {
                self.board
                    .error(TIME_SERIES, &format!("Error loading chart data: {e}"));
                return;
            }
        };
        tracing::debug!(
            normal = split.normal_count(),
            anomalies = split.anomaly_count(),
            "time series split"
        );
        let axis = shaper::time_axis(&series.timestamps);
        let data = ChartData::new(
            series.timestamps.clone(),
            vec![
                Dataset::gapped("Energy Consumption", split.normal)
                    .color(SERIES)
                    .draw(DrawStyle::Line { span_gaps: true }),
                Dataset::gapped("Anomalies", split.anomaly)
                    .color(ANOMALY)
                    .draw(DrawStyle::Points),
            ],
        )
        .with_xs(axis.xs().to_vec());
        let options = ChartOptions::titled("Energy Consumption Time Series with Anomalies")
            .axes("Time", "Energy Consumption")
            .time_axis(axis.is_time());
        mount(&mut self.board, TIME_SERIES, Board::scatter_line, data, options);
    }

    fn render_metrics(&mut self, payload: &ResultPayload) {
        let Some((precision, recall, f1)) = payload.metrics.as_ref().and_then(|m| m.scores())
        else {
            self.board
                .placeholder(METRICS, "No performance metrics for this result");
            return;
        };
        let colors = [NORMAL, RECALL, F1];
        let data = ChartData::new(
            shaper::OVERVIEW_AXES.iter().map(|s| s.to_string()).collect(),
            vec![Dataset::new("Score", vec![precision, recall, f1]).colors(
                colors.iter().map(|c| c.with_alpha(shaper::FILL_OPACITY)).collect(),
                colors.to_vec(),
            )],
        );
        let options = ChartOptions::titled("Model Performance Metrics")
            .begin_at_zero()
            .max(1.0)
            .format(ValueFormat::Ratio)
            .no_legend();
        mount(&mut self.board, METRICS, Board::gauge, data, options);
    }

    fn render_summary(&mut self, payload: &ResultPayload) {
        let Some((anomalies, total)) = payload.counts() else {
            self.board
                .placeholder(SUMMARY, "No anomaly counts for this result");
            return;
        };
        let data = ChartData::new(
            vec!["Normal Points".into(), "Anomalies".into()],
            vec![Dataset::new("Points", shaper::summary_counts(anomalies, total).to_vec())
                .colors(
                    vec![
                        NORMAL.with_alpha(shaper::FILL_OPACITY),
                        ANOMALY.with_alpha(shaper::FILL_OPACITY),
                    ],
                    vec![NORMAL, ANOMALY],
                )],
        );
        let options = ChartOptions::titled(format!(
            "Anomaly Distribution ({} anomalous)",
            shaper::format_percentage(anomalies as f64, total as f64)
        ))
        .format(ValueFormat::Count);
        mount(&mut self.board, SUMMARY, Board::doughnut, data, options);
    }

    fn render_hourly(&mut self, hours: Option<LabeledValues>) {
        match hours {
            Some(hours) => self.render_buckets(
                DISTRIBUTION,
                shaper::hour_labels(&hours.labels),
                hours,
                "Anomalies by Hour of Day",
                "Hour of Day",
            ),
            None => {
                self.board
                    .placeholder(DISTRIBUTION, "No hourly breakdown available");
            }
        }
    }

    fn render_weekday(&mut self, days: Option<LabeledValues>) {
        match days {
            Some(days) => {
                let labels = days.labels.clone();
                let title = "Anomalies by Day of Week";
                self.render_buckets(WEEKDAY, labels, days, title, "Day of Week")
            }
            None => {
                self.board
                    .placeholder(WEEKDAY, "No weekday breakdown available");
            }
        }
    }

    fn render_buckets(
        &mut self,
        surface: &str,
        labels: Vec<String>,
        buckets: LabeledValues,
        title: &str,
        x_title: &str,
    ) {
        if let Err(e) = buckets.validate() {
            tracing::warn!(surface, error = %e, "bucket data misaligned");
            self.board
                .error(surface, &format!("Invalid chart data: {e}"));
            return;
        }
        let data = ChartData::new(
            labels,
            vec![Dataset::new("Anomalies", buckets.values).color(ANOMALY)],
        );
        let options = ChartOptions::titled(title)
            .axes(x_title, "Number of Anomalies")
            .begin_at_zero()
            .format(ValueFormat::Count)
            .no_legend();
        mount(&mut self.board, surface, Board::bar, data, options);
    }

    pub fn focused(&self) -> Option<String> {
        focused_surface(&self.board, self.focus)
    }

    pub fn focus_index(&self) -> usize {
        self.focus
    }

    pub fn focus_next(&mut self) {
        self.focus = next_focus(self.focus, SURFACES.len());
    }

    pub fn focus_prev(&mut self) {
        self.focus = prev_focus(self.focus, SURFACES.len());
    }

    /// Take the page off screen and release its charts
    pub fn teardown(&mut self) {
        self.active = false;
        self.board.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Metrics, StubSource, TimeSeries};
    use crate::render::{ChartKind, NoticeKind, SurfaceView};
    use std::time::Duration;

    fn sample_payload() -> ResultPayload {
        let flags = [0, 0, 1, 0, 0, 0, 0, 1, 0, 0];
        ResultPayload {
            time_series: TimeSeries {
                timestamps: (0..10)
                    .map(|i| format!("2024-03-04 {:02}:00:00", i + 8))
                    .collect(),
                values: (0..10).map(|i| 10.0 + i as f64).collect(),
                anomalies: flags.iter().map(|&f| f == 1).collect(),
                anomaly_scores: Vec::new(),
            },
            metrics: Some(Metrics {
                precision: Some(0.8),
                recall: Some(0.6),
                f1_score: Some(0.69),
                anomaly_count: Some(6),
                total_points: Some(100),
                ..Metrics::default()
            }),
            anomaly_count: Some(2),
            algorithm: Some("isolation_forest".into()),
            anomalies_by_hour: None,
            anomalies_by_dow: None,
        }
    }

    /// An on-screen page answering from canned responses
    fn page_with(responses: Vec<(u64, Duration, Result<ResultPayload, u16>)>) -> ResultPage {
        let mut page = ResultPage::new(Arc::new(StubSource::new(responses)));
        page.activate();
        page
    }

    fn wait_for(page: &mut ResultPage) {
        let response = page.fetcher.wait(Duration::from_secs(5)).expect("fetch timed out");
        page.apply(response);
    }

    #[test]
    fn test_loaded_result_mounts_every_chart() {
        let mut page = page_with(vec![(7, Duration::ZERO, Ok(sample_payload()))]);
        page.select(7);
        assert!(page.is_loading());
        wait_for(&mut page);

        assert!(!page.is_loading());
        assert_eq!(page.board().live_charts(), 5);

        let series = page.board().chart(TIME_SERIES).unwrap();
        assert_eq!(series.kind, ChartKind::ScatterLine);
        let normal = &series.data.datasets[0];
        let anomalies = &series.data.datasets[1];
        assert_eq!(normal.values.iter().flatten().count(), 8);
        assert_eq!(anomalies.values.iter().flatten().count(), 2);
        assert_eq!(anomalies.values[2], Some(12.0));
        assert!(series.options.time_axis);

        let summary = page.board().chart(SUMMARY).unwrap();
        assert_eq!(summary.data.datasets[0].values, vec![Some(94.0), Some(6.0)]);
        assert!(summary.options.title.contains("6.0%"));

        let hourly = page.board().chart(DISTRIBUTION).unwrap();
        assert_eq!(hourly.data.labels.len(), 24);
        assert_eq!(hourly.data.datasets[0].values[10], Some(1.0));

        assert!(!page.recommendations().is_empty());
    }

    #[test]
    fn test_http_error_shows_status_on_time_series() {
        let mut page = page_with(vec![(3, Duration::ZERO, Err(500))]);
        page.select(3);
        wait_for(&mut page);

        let notice = page.board().notice(TIME_SERIES).unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.text, "Error loading chart data: HTTP error 500");
        assert_eq!(page.board().live_charts(), 0);

        page.teardown();
        page.activate();
        assert_eq!(page.board().notice(TIME_SERIES).unwrap().kind, NoticeKind::Error);
    }

    #[test]
    fn test_activate_restores_charts() {
        let mut page = page_with(Vec::new());
        assert_eq!(page.board().notice(TIME_SERIES).unwrap().kind, NoticeKind::Placeholder);

        page.render_payload(sample_payload());
        page.teardown();
        assert_eq!(page.board().live_charts(), 0);
        page.activate();
        assert_eq!(page.board().live_charts(), 5);
    }

    #[test]
    fn test_hidden_page_defers_charts_until_activated() {
        let mut page = page_with(vec![(5, Duration::from_millis(50), Ok(sample_payload()))]);
        page.select(5);
        page.teardown();
        wait_for(&mut page);

        assert_eq!(page.board().live_charts(), 0);
        assert!(page.board().notice(TIME_SERIES).is_none());
        assert_eq!(page.result_id(), Some(5));

        page.activate();
        assert_eq!(page.board().live_charts(), 5);
    }

    #[test]
    fn test_hidden_page_keeps_failure_for_later() {
        let mut page = page_with(vec![(9, Duration::ZERO, Err(404))]);
        page.teardown();
        page.select(9);
        assert!(page.board().notice(TIME_SERIES).is_none());
        wait_for(&mut page);
        assert!(page.board().notice(TIME_SERIES).is_none());

        page.activate();
        let notice = page.board().notice(TIME_SERIES).unwrap();
        assert_eq!(notice.text, "Error loading chart data: HTTP error 404");
    }

    #[test]
    fn test_latest_selection_wins() {
        let mut slow = sample_payload();
        slow.algorithm = Some("kmeans".into());
        let mut page = page_with(vec![
            (1, Duration::from_millis(200), Ok(slow)),
            (2, Duration::ZERO, Ok(sample_payload())),
        ]);
        page.select(1);
        page.select(2);
        wait_for(&mut page);
        std::thread::sleep(Duration::from_millis(300));
        assert!(!page.poll());

        assert_eq!(page.result_id(), Some(2));
        assert_eq!(
            page.payload().unwrap().algorithm.as_deref(),
            Some("isolation_forest")
        );
    }

    #[test]
    fn test_sparse_payload_uses_placeholders() {
        let mut page = page_with(Vec::new());
        page.render_payload(ResultPayload::default());

        for surface in [TIME_SERIES, METRICS, SUMMARY, DISTRIBUTION, WEEKDAY] {
            assert!(
                matches!(
                    page.board().view(surface),
                    Some(SurfaceView::Notice(n)) if n.kind == NoticeKind::Placeholder
                ),
                "{surface} should show a placeholder"
            );
        }
    }

    #[test]
    fn test_misaligned_payload_is_rejected() {
        let mut page = page_with(Vec::new());
        let mut payload = sample_payload();
        payload.time_series.anomalies.pop();
        page.render_payload(payload);

        assert_eq!(page.board().notice(TIME_SERIES).unwrap().kind, NoticeKind::Error);
        assert_eq!(page.board().live_charts(), 0);
    }

    #[test]
    fn test_typed_id_and_navigation() {
        let mut page = page_with(Vec::new());
        page.push_digit('4');
        page.push_digit('x');
        page.push_digit('2');
        assert_eq!(page.id_input(), "42");
        page.submit();
        assert_eq!(page.result_id(), Some(42));
        assert!(page.id_input().is_empty());

        page.select_next();
        assert_eq!(page.result_id(), Some(43));
        page.select(1);
        page.select_prev();
        assert_eq!(page.result_id(), Some(1));
    }
}
