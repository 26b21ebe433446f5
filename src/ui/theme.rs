//! Theme configuration for the TUI.

use ratatui::style::{Color, Modifier, Style};

use crate::data::shaper::{self, Rgba};
use crate::render::NoticeKind;

/// Color theme for the application
#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub border: Color,
    pub title: Color,
    pub error: Color,
    pub loading: Color,
    /// Colors cycled over datasets and slices
    pub palette: Vec<Rgba>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            bg: Color::Reset,
            fg: Color::White,
            highlight_bg: Color::Rgb(60, 60, 80),
            highlight_fg: Color::White,
            border: Color::Rgb(100, 100, 120),
            title: Color::Cyan,
            error: Color::Rgb(231, 76, 60),
            loading: Color::Yellow,
            palette: shaper::BASE_PALETTE.to_vec(),
        }
    }
}

impl Theme {
    /// Default theme with a custom chart palette (ignored when empty)
    pub fn with_palette(palette: Vec<Rgba>) -> Self {
        let mut theme = Theme::default();
        if !palette.is_empty() {
            theme.palette = palette;
        }
        theme
    }

    /// Convenience helper returning (border_style, title_style) for focus state
    pub fn panel_styles(&self, focused: bool) -> (Style, Style) {
        if focused {
            (self.focused_border_style(), self.focused_border_style())
        } else {
            (self.border_style(), self.title_style())
        }
    }

    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn highlight_style(&self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Focused panel borders (distinct from normal borders)
    pub fn focused_border_style(&self) -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.title)
            .add_modifier(Modifier::BOLD)
    }

    pub fn dimmed_style(&self) -> Style {
        Style::default()
            .fg(self.border)
            .add_modifier(Modifier::DIM)
    }

    /// Style of a message shown in place of a chart
    pub fn notice_style(&self, kind: NoticeKind) -> Style {
        match kind {
            NoticeKind::Placeholder => self.dimmed_style(),
            NoticeKind::Loading => Style::default().fg(self.loading),
            NoticeKind::Error => Style::default()
                .fg(self.error)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Terminal color of a chart color, translucency blended onto black
    pub fn rgba(&self, color: Rgba) -> Color {
        let (r, g, b) = color.blended();
        Color::Rgb(r, g, b)
    }

    /// Palette color by index (cycles through the palette)
    pub fn chart_color(&self, index: usize) -> Color {
        match self.palette.len() {
            0 => self.fg,
            n => self.rgba(self.palette[index % n]),
        }
    }
}
