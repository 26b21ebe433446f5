//! UI widgets for the energy dashboard.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use crate::data::{ModelPerformanceEntry, Recommendation, RecommendationKind, ResultPayload};

use super::theme::Theme;

/// Page selector along the top of the screen
pub struct PageTabs<'a> {
    titles: &'a [&'a str],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> PageTabs<'a> {
    pub fn new(titles: &'a [&'a str], selected: usize, theme: &'a Theme) -> Self {
        PageTabs {
            titles,
            selected,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let titles = self
            .titles
            .iter()
            .enumerate()
            .map(|(i, t)| format!("[{}] {}", i + 1, t));
        let tabs = Tabs::new(titles)
            .select(self.selected)
            .style(self.theme.normal_style())
            .highlight_style(self.theme.highlight_style())
            .block(
                Block::default()
                    .borders(Borders::BOTTOM)
                    .border_style(self.theme.border_style()),
            );
        frame.render_widget(tabs, area);
    }
}

/// Result id prompt and headline numbers of the loaded result
pub struct ResultHeader<'a> {
    result_id: Option<u64>,
    input: &'a str,
    payload: Option<&'a ResultPayload>,
    theme: &'a Theme,
}

impl<'a> ResultHeader<'a> {
    pub fn new(
        result_id: Option<u64>,
        input: &'a str,
        payload: Option<&'a ResultPayload>,
        theme: &'a Theme,
    ) -> Self {
        ResultHeader {
            result_id,
            input,
            payload,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" Result ", self.theme.title_style()),
            Span::raw(
                self.result_id
                    .map_or_else(|| "-".to_string(), |id| format!("#{id}")),
            ),
        ];
        if !self.input.is_empty() {
            spans.push(Span::styled(
                format!("  go to #{}_", self.input),
                Style::default().fg(Color::Yellow),
            ));
        }
        if let Some(payload) = self.payload {
            if let Some(algorithm) = &payload.algorithm {
                spans.push(Span::styled("  algorithm: ", self.theme.dimmed_style()));
                spans.push(Span::raw(crate::data::shaper::display_label(algorithm)));
            }
            if let Some((anomalies, total)) = payload.counts() {
                spans.push(Span::styled("  anomalies: ", self.theme.dimmed_style()));
                spans.push(Span::raw(format!(
                    "{anomalies}/{total} ({})",
                    crate::data::shaper::format_percentage(anomalies as f64, total as f64)
                )));
            }
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Recommendations derived from the loaded result
pub struct RecommendationList<'a> {
    items: &'a [Recommendation],
    theme: &'a Theme,
}

impl<'a> RecommendationList<'a> {
    pub fn new(items: &'a [Recommendation], theme: &'a Theme) -> Self {
        RecommendationList { items, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Recommendations ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style());

        if self.items.is_empty() {
            let empty = Paragraph::new("Load a result to see recommendations")
                .style(self.theme.dimmed_style())
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|r| {
                let color = match r.kind {
                    RecommendationKind::TimePattern => Color::Cyan,
                    RecommendationKind::Intensity => self.theme.error,
                    RecommendationKind::Frequency => Color::Yellow,
                    RecommendationKind::Algorithm => Color::Blue,
                    RecommendationKind::General => Color::Green,
                };
                ListItem::new(vec![
                    Line::styled(
                        r.title.clone(),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Line::raw(r.description.clone()),
                    Line::default(),
                ])
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}

/// Table of the compared models
pub struct ModelTable<'a> {
    entries: &'a [ModelPerformanceEntry],
    theme: &'a Theme,
}

impl<'a> ModelTable<'a> {
    pub fn new(entries: &'a [ModelPerformanceEntry], theme: &'a Theme) -> Self {
        ModelTable { entries, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(["Model", "Precision", "Recall", "F1", "Anomalies", "Time (s)"])
            .style(self.theme.title_style());
        let rows = self.entries.iter().enumerate().map(|(i, e)| {
            Row::new(vec![
                e.name.clone(),
                format!("{:.2}", e.precision),
                format!("{:.2}", e.recall),
                format!("{:.2}", e.f1_score),
                e.anomalies_detected.to_string(),
                format!("{:.2}", e.execution_time),
            ])
            .style(Style::default().fg(self.theme.chart_color(i)))
        });
        let table = Table::new(
            rows,
            [
                Constraint::Min(16),
                Constraint::Length(10),
                Constraint::Length(8),
                Constraint::Length(6),
                Constraint::Length(10),
                Constraint::Length(9),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(" Models ")
                .borders(Borders::ALL)
                .border_style(self.theme.border_style()),
        );
        frame.render_widget(table, area);
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    context: Option<&'a str>,
    error: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(context: Option<&'a str>, error: Option<&'a str>, theme: &'a Theme) -> Self {
        StatusBar {
            context,
            error,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = if let Some(e) = self.error {
            (format!("Error: {e}"), Style::default().fg(self.theme.error))
        } else {
            let text = match self.context {
                Some(c) => format!("energy-dash: {c} | [?] Help [q] Quit"),
                None => "energy-dash | [?] Help [q] Quit".to_string(),
            };
            (text, self.theme.normal_style())
        };

        let paragraph = Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::TOP));

        frame.render_widget(paragraph, area);
    }
}
