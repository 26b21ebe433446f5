//! Terminal User Interface components for energy-dash.

mod chart;
mod help;
mod theme;
pub mod widgets;

pub use chart::SurfaceWidget;
pub use help::HelpOverlay;
pub use theme::Theme;
