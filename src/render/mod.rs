//! Chart renderer: one create-or-replace entry point per chart family.
//!
//! Every call goes through [`Board::render`], so rendering a surface twice
//! leaves exactly one live chart and rendering an undeclared surface does
//! nothing.

mod board;
mod chart;

pub use board::{Board, Notice, NoticeKind, SurfaceView};
pub use chart::{
    ChartData, ChartInstance, ChartKind, ChartOptions, Dataset, DrawStyle, Period, RenderError,
    ValueFormat,
};

/// Outcome of a render: the new instance, or `None` for a missing surface
pub type Rendered<'a> = Result<Option<&'a ChartInstance>, RenderError>;

/// A family entry point such as [`Board::bar`]
pub type Family = for<'a> fn(&'a mut Board, &str, ChartData, ChartOptions) -> Rendered<'a>;

impl Board {
    pub fn line(&mut self, surface: &str, data: ChartData, options: ChartOptions) -> Rendered<'_> {
        self.render(surface, ChartKind::Line, data, options)
    }

    pub fn bar(&mut self, surface: &str, data: ChartData, options: ChartOptions) -> Rendered<'_> {
        self.render(surface, ChartKind::Bar, data, options)
    }

    pub fn pie(&mut self, surface: &str, data: ChartData, options: ChartOptions) -> Rendered<'_> {
        self.render(surface, ChartKind::Pie, data, options)
    }

    pub fn doughnut(
        &mut self,
        surface: &str,
        data: ChartData,
        options: ChartOptions,
    ) -> Rendered<'_> {
        self.render(surface, ChartKind::Doughnut, data, options)
    }

    pub fn radar(&mut self, surface: &str, data: ChartData, options: ChartOptions) -> Rendered<'_> {
        self.render(surface, ChartKind::Radar, data, options)
    }

    /// Line series with a point overlay on one x axis
    pub fn scatter_line(
        &mut self,
        surface: &str,
        data: ChartData,
        options: ChartOptions,
    ) -> Rendered<'_> {
        self.render(surface, ChartKind::ScatterLine, data, options)
    }

    pub fn gauge(
        &mut self,
        surface: &str,
        data: ChartData,
        options: ChartOptions,
    ) -> Rendered<'_> {
        self.render(surface, ChartKind::Gauge, data, options)
    }
}
