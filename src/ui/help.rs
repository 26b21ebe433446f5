//! Key binding overlay.

use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::theme::Theme;

const ABOUT: &str = "Charts for the energy anomaly detection service. \
Charts load from the data directory and the result endpoint; \
a chart that cannot load shows why in its place.";

type Section = (&'static str, &'static [(&'static str, &'static str)]);

const SECTIONS: &[Section] = &[
    (
        "Pages",
        &[
            ("1 2 3 4", "Dashboard, Result, Models, Detection"),
            ("Tab / Shift+Tab", "Move chart focus"),
            ("r", "Reload the page"),
        ],
    ),
    (
        "Dashboard",
        &[
            ("t", "Bar, line or pie for the focused chart"),
            ("p", "Next time period for the focused chart"),
        ],
    ),
    (
        "Result",
        &[
            ("i or /", "Enter a result id, Enter loads it"),
            ("j k / Down Up", "Next or previous result id"),
            ("Enter", "Fetch the result again"),
        ],
    ),
    (
        "Detection",
        &[
            ("Left / Right l", "Previous or next algorithm"),
            ("g", "Draw a fresh sample"),
        ],
    ),
    (
        "Anywhere",
        &[
            ("? h F1", "Show or hide this help"),
            ("Esc", "Close help, clear the status error"),
            ("q / Ctrl+C", "Quit"),
        ],
    ),
];

/// Help popup drawn over the current page
pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        HelpOverlay { theme }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let key_style = Style::default()
            .fg(self.theme.title)
            .add_modifier(Modifier::BOLD);
        let heading = Style::default().add_modifier(Modifier::UNDERLINED);

        let mut lines = vec![
            Line::styled(ABOUT, self.theme.dimmed_style()),
            Line::default(),
        ];
        for (title, bindings) in SECTIONS {
            lines.push(Line::styled(*title, heading));
            lines.extend(bindings.iter().map(|(keys, action)| {
                Line::from(vec![
                    Span::styled(format!("  {keys:<16}"), key_style),
                    Span::raw(*action),
                ])
            }));
            lines.push(Line::default());
        }
        lines.push(Line::styled(
            format!("Logs: <data-dir>/{}", crate::logging::LOG_FILE),
            self.theme.dimmed_style(),
        ));
        lines
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(65, 80, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" energy-dash Help ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(self.theme.border_style())
            .title_style(self.theme.title_style());

        let help = Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .style(self.theme.normal_style());
        frame.render_widget(help, popup);
    }
}

/// `percent_x` by `percent_y` of `area`, centered
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_centered_rect_is_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 80, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 40);
        assert_eq!(popup.x, 20);
        assert_eq!(popup.y, 5);
    }

    #[test]
    fn test_every_section_is_listed() {
        let theme = Theme::default();
        let mut terminal = Terminal::new(TestBackend::new(120, 60)).unwrap();
        terminal
            .draw(|frame| HelpOverlay::new(&theme).render(frame, frame.area()))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        for (title, _) in SECTIONS {
            assert!(text.contains(title), "missing section {title}");
        }
        assert!(text.contains("energy-dash Help"));
    }
}
