//! Surface widget: draws whatever a surface currently holds.

use std::f64::consts::{FRAC_PI_2, TAU};

use chrono::DateTime;
use ratatui::{
    layout::{Alignment, Direction, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset as ChartDataset, GraphType,
        LegendPosition, Paragraph, Wrap,
    },
    Frame,
};

use crate::data::shaper;
use crate::render::{
    ChartInstance, ChartKind, ChartOptions, Dataset, DrawStyle, Notice, SurfaceView,
};

use super::theme::Theme;

/// Widget for one surface of a page
pub struct SurfaceWidget<'a> {
    view: SurfaceView<'a>,
    /// Title used when no chart is mounted
    name: &'a str,
    theme: &'a Theme,
}

impl<'a> SurfaceWidget<'a> {
    pub fn new(view: SurfaceView<'a>, name: &'a str, theme: &'a Theme) -> Self {
        SurfaceWidget { view, name, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        match self.view {
            SurfaceView::Empty => self.render_message(frame, area, focused, None),
            SurfaceView::Notice(notice) => self.render_message(frame, area, focused, Some(notice)),
            SurfaceView::Chart(chart) => {
                let block = self.block(&chart.options.title, focused);
                match chart.kind {
                    ChartKind::Line | ChartKind::ScatterLine => {
                        self.render_xy(frame, area, chart, block)
                    }
                    ChartKind::Bar => {
                        self.render_bars(frame, area, chart, block, Direction::Vertical)
                    }
                    ChartKind::Gauge => {
                        self.render_bars(frame, area, chart, block, Direction::Horizontal)
                    }
                    ChartKind::Pie | ChartKind::Doughnut => {
                        self.render_slices(frame, area, chart, block)
                    }
                    ChartKind::Radar if chart.data.labels.len() >= 3 => {
                        self.render_radar(frame, area, chart, block)
                    }
                    // Fewer than three axes do not make a polygon
                    ChartKind::Radar => {
                        self.render_bars(frame, area, chart, block, Direction::Vertical)
                    }
                }
            }
        }
    }

    fn block(&self, title: &str, focused: bool) -> Block<'static> {
        let (border_style, title_style) = self.theme.panel_styles(focused);
        Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(border_style)
            .title_style(title_style)
    }

    fn render_message(
        &self,
        frame: &mut Frame,
        area: Rect,
        focused: bool,
        notice: Option<&Notice>,
    ) {
        let block = self.block(self.name, focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let (text, style) = match notice {
            Some(notice) => (notice.text.as_str(), self.theme.notice_style(notice.kind)),
            None => ("No data available", self.theme.dimmed_style()),
        };
        // Vertically centre short messages
        let pad = inner.height.saturating_sub(1) / 2;
        let mut lines: Vec<Line> = (0..pad).map(|_| Line::default()).collect();
        lines.push(Line::styled(text.to_string(), style));
        let message = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(message, inner);
    }

    fn color(&self, dataset: &Dataset, index: usize, fallback: usize) -> Color {
        dataset
            .border_at(index)
            .map(|c| self.theme.rgba(c))
            .unwrap_or_else(|| self.theme.chart_color(fallback))
    }

    /// Area color: the translucent fill when the dataset has one
    fn fill(&self, dataset: &Dataset, index: usize) -> Color {
        dataset
            .fill_at(index)
            .map(|c| self.theme.rgba(c))
            .unwrap_or_else(|| self.theme.chart_color(index))
    }

    fn render_xy(&self, frame: &mut Frame, area: Rect, chart: &ChartInstance, block: Block) {
        let shared = chart.data.xs.as_deref();
        let series: Vec<(usize, Vec<Vec<(f64, f64)>>)> = chart
            .data
            .datasets
            .iter()
            .enumerate()
            .map(|(i, ds)| (i, segments(ds, shared)))
            .collect();

        let (x_bounds, y_bounds) = bounds(
            series.iter().flat_map(|(_, runs)| runs.iter().flatten()),
            &chart.options,
        );

        let mut datasets = Vec::new();
        for (i, runs) in &series {
            let ds = &chart.data.datasets[*i];
            let style = Style::default().fg(self.color(ds, 0, *i));
            let (marker, graph_type) = match ds.draw {
                DrawStyle::Points => (Marker::Dot, GraphType::Scatter),
                DrawStyle::Line { .. } => (Marker::Braille, GraphType::Line),
            };
            for (r, run) in runs.iter().enumerate() {
                let mut dataset = ChartDataset::default()
                    .marker(marker)
                    .graph_type(graph_type)
                    .style(style)
                    .data(run);
                // One legend entry per dataset
                if r == 0 {
                    dataset = dataset.name(ds.label.clone());
                }
                datasets.push(dataset);
            }
        }

        let x_labels = self.x_labels(chart, x_bounds);
        let format = chart.options.format;
        let y_labels = vec![
            Span::raw(format.format(y_bounds[0])),
            Span::raw(format.format((y_bounds[0] + y_bounds[1]) / 2.0)),
            Span::raw(format.format(y_bounds[1])),
        ];

        let legend = (chart.options.legend && chart.data.datasets.len() > 1)
            .then_some(LegendPosition::TopLeft);
        let dim = Style::default().add_modifier(Modifier::DIM);

        let widget = Chart::new(datasets)
            .block(block)
            .legend_position(legend)
            .x_axis(
                Axis::default()
                    .title(Span::styled(chart.options.x_title.clone().unwrap_or_default(), dim))
                    .style(self.theme.normal_style())
                    .bounds(x_bounds)
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title(Span::styled(chart.options.y_title.clone().unwrap_or_default(), dim))
                    .style(self.theme.normal_style())
                    .bounds(y_bounds)
                    .labels(y_labels),
            );

        frame.render_widget(widget, area);
    }

    /// First, middle and last x positions as dates, category labels or
    /// plain numbers.
    fn x_labels(&self, chart: &ChartInstance, [lo, hi]: [f64; 2]) -> Vec<Span<'static>> {
        let mid = (lo + hi) / 2.0;
        let label = |x: f64| -> String {
            if chart.options.time_axis {
                return DateTime::from_timestamp(x as i64, 0)
                    .map(|t| t.format("%b %-d %H:%M").to_string())
                    .unwrap_or_default();
            }
            let indexed = chart.data.xs.is_none()
                && chart.data.datasets.iter().all(|d| d.xs.is_none());
            if indexed && !chart.data.labels.is_empty() {
                let i = (x.round().max(0.0) as usize).min(chart.data.labels.len() - 1);
                return chart.data.labels[i].clone();
            }
            shaper::format_value(x)
        };
        vec![Span::raw(label(lo)), Span::raw(label(mid)), Span::raw(label(hi))]
    }

    fn render_bars(
        &self,
        frame: &mut Frame,
        area: Rect,
        chart: &ChartInstance,
        block: Block,
        direction: Direction,
    ) {
        let labels = &chart.data.labels;
        let datasets = &chart.data.datasets;
        if labels.is_empty() || datasets.is_empty() {
            self.render_message(frame, area, false, None);
            return;
        }

        let format = chart.options.format;
        let integral = datasets
            .iter()
            .flat_map(|d| d.values.iter().flatten())
            .all(|v| v.fract() == 0.0);
        // BarChart only takes integers; fractional data is scaled up
        let scale = if integral { 1.0 } else { 1000.0 };

        let single = datasets.len() == 1;
        let groups: Vec<BarGroup> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let bars: Vec<Bar> = datasets
                    .iter()
                    .enumerate()
                    .filter_map(|(d, ds)| {
                        let value = ds.values.get(i).copied().flatten()?;
                        let color = if single {
                            self.color(ds, i, i)
                        } else {
                            self.color(ds, 0, d)
                        };
                        Some(
                            Bar::default()
                                .value((value.max(0.0) * scale).round() as u64)
                                .text_value(format.format(value))
                                .style(Style::default().fg(color))
                                .value_style(Style::default().fg(Color::Black).bg(color)),
                        )
                    })
                    .collect();
                BarGroup::default()
                    .label(Line::from(label.clone()))
                    .bars(&bars)
            })
            .collect();

        let per_group = datasets.len().max(1) as u16;
        let bar_width = match direction {
            Direction::Horizontal => 1,
            Direction::Vertical => {
                let inner = area.width.saturating_sub(2);
                let slot = inner / (labels.len() as u16).max(1);
                (slot.saturating_sub(1) / per_group).clamp(1, 9)
            }
        };

        let block = match &chart.options.x_title {
            Some(x_title) => block.title_bottom(Line::styled(
                format!(" {x_title} "),
                Style::default().add_modifier(Modifier::DIM),
            )),
            None => block,
        };

        let mut widget = BarChart::default()
            .block(block)
            .direction(direction)
            .bar_width(bar_width)
            .bar_gap(0)
            .group_gap(1)
            .label_style(self.theme.normal_style());
        if let Some(max) = chart.options.max {
            widget = widget.max((max * scale).round() as u64);
        }
        for group in groups {
            widget = widget.data(group);
        }
        frame.render_widget(widget, area);
    }

    /// Pie and doughnut: one legend row per slice and a proportional strip
    fn render_slices(&self, frame: &mut Frame, area: Rect, chart: &ChartInstance, block: Block) {
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(ds) = chart.data.datasets.first() else {
            return;
        };
        let values: Vec<f64> = ds
            .values
            .iter()
            .map(|v| v.unwrap_or(0.0).max(0.0))
            .collect();
        let total: f64 = values.iter().sum();
        let format = chart.options.format;

        let mut lines = Vec::new();
        if chart.kind == ChartKind::Doughnut {
            lines.push(Line::styled(
                format!("{} total", format.format(total)),
                self.theme.title_style(),
            ));
        }

        let width = inner.width as f64;
        let mut strip = Vec::new();
        let mut used = 0usize;
        for (i, &value) in values.iter().enumerate() {
            let cells = if total > 0.0 {
                (value / total * width).round() as usize
            } else {
                0
            };
            let cells = cells.min((inner.width as usize).saturating_sub(used));
            used += cells;
            let style = Style::default().fg(self.fill(ds, i));
            strip.push(Span::styled("█".repeat(cells), style));
        }
        lines.push(Line::from(strip));
        lines.push(Line::default());

        for (i, label) in chart.data.labels.iter().enumerate() {
            let value = values.get(i).copied().unwrap_or(0.0);
            lines.push(Line::from(vec![
                Span::styled("██ ", Style::default().fg(self.color(ds, i, i))),
                Span::styled(label.clone(), self.theme.normal_style()),
                Span::raw(format!("  {}  ", format.format(value))),
                Span::styled(shaper::format_percentage(value, total), self.theme.dimmed_style()),
            ]));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_radar(&self, frame: &mut Frame, area: Rect, chart: &ChartInstance, block: Block) {
        let labels = &chart.data.labels;
        let n = labels.len();
        let data_max = chart
            .data
            .datasets
            .iter()
            .flat_map(|d| d.values.iter().flatten())
            .fold(0.0_f64, |acc, &v| acc.max(v));
        let scale_max = chart
            .options
            .suggested
            .map_or(data_max, |(_, hi)| hi.max(data_max));
        let scale_max = if scale_max > 0.0 { scale_max } else { 1.0 };

        let vertex = |i: usize, r: f64| -> (f64, f64) {
            let angle = FRAC_PI_2 - TAU * i as f64 / n as f64;
            (r * angle.cos(), r * angle.sin())
        };

        let grid = self.theme.border;
        let polygons: Vec<(Color, Vec<(f64, f64)>)> = chart
            .data
            .datasets
            .iter()
            .enumerate()
            .map(|(d, ds)| {
                let points = (0..n)
                    .map(|i| {
                        let v = ds.values.get(i).copied().flatten().unwrap_or(0.0).max(0.0);
                        vertex(i, (v / scale_max).min(1.0))
                    })
                    .collect();
                (self.color(ds, 0, d), points)
            })
            .collect();
        let legend: Vec<(Color, String)> = polygons
            .iter()
            .zip(&chart.data.datasets)
            .map(|((color, _), ds)| (*color, ds.label.clone()))
            .collect();
        let show_legend = chart.options.legend;

        let canvas = Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds([-1.6, 1.6])
            .y_bounds([-1.4, 1.4])
            .paint(move |ctx| {
                for ring in [0.5, 1.0] {
                    for i in 0..n {
                        let (x1, y1) = vertex(i, ring);
                        let (x2, y2) = vertex((i + 1) % n, ring);
                        ctx.draw(&CanvasLine::new(x1, y1, x2, y2, grid));
                    }
                }
                for i in 0..n {
                    let (x, y) = vertex(i, 1.0);
                    ctx.draw(&CanvasLine::new(0.0, 0.0, x, y, grid));
                }
                ctx.layer();
                for (color, points) in &polygons {
                    for i in 0..points.len() {
                        let (x1, y1) = points[i];
                        let (x2, y2) = points[(i + 1) % points.len()];
                        ctx.draw(&CanvasLine::new(x1, y1, x2, y2, *color));
                    }
                }
                for (i, label) in labels.iter().enumerate() {
                    let (x, y) = vertex(i, 1.15);
                    ctx.print(x, y, Line::raw(label.clone()));
                }
                if show_legend {
                    for (row, (color, label)) in legend.iter().enumerate() {
                        ctx.print(
                            -1.6,
                            -1.35 + 0.2 * row as f64,
                            Line::styled(format!("■ {label}"), Style::default().fg(*color)),
                        );
                    }
                }
            });
        frame.render_widget(canvas, area);
    }
}

/// Drawable runs of a dataset. Unbridged lines break at absent values.
fn segments(ds: &Dataset, shared: Option<&[f64]>) -> Vec<Vec<(f64, f64)>> {
    match ds.draw {
        DrawStyle::Line { span_gaps: false } => {
            let xs = ds.xs.as_deref().or(shared);
            let mut runs = Vec::new();
            let mut current = Vec::new();
            for (i, value) in ds.values.iter().enumerate() {
                match value {
                    Some(y) => {
                        let x = xs.and_then(|xs| xs.get(i).copied()).unwrap_or(i as f64);
                        current.push((x, *y));
                    }
                    None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
                    None => {}
                }
            }
            if !current.is_empty() {
                runs.push(current);
            }
            runs
        }
        _ => vec![ds.points(shared)],
    }
}

/// Axis bounds over `points`, honouring the chart's axis options
fn bounds<'p>(
    points: impl Iterator<Item = &'p (f64, f64)>,
    options: &ChartOptions,
) -> ([f64; 2], [f64; 2]) {
    let mut x = [f64::MAX, f64::MIN];
    let mut y = [f64::MAX, f64::MIN];
    let mut any = false;
    for &(px, py) in points {
        any = true;
        x = [x[0].min(px), x[1].max(px)];
        y = [y[0].min(py), y[1].max(py)];
    }
    if !any {
        x = [0.0, 1.0];
        y = [0.0, 1.0];
    }

    if let Some((lo, hi)) = options.suggested {
        y = [y[0].min(lo), y[1].max(hi)];
    } else if any {
        let pad = (y[1] - y[0]) * 0.05;
        y = [y[0] - pad, y[1] + pad];
    }
    if options.begin_at_zero {
        y[0] = y[0].min(0.0);
    }
    if let Some(max) = options.max {
        y[1] = max;
    }

    if x[0] >= x[1] {
        x[1] = x[0] + 1.0;
    }
    if y[0] >= y[1] {
        y[1] = y[0] + 1.0;
    }
    (x, y)
}
