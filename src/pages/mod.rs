//! Page controllers: read a payload, shape it and mount the charts.
//!
//! Each page owns its [`Board`]; failures are contained to the surface they
//! belong to.

pub mod algorithm;
pub mod dashboard;
pub mod insights;
pub mod result;

pub use algorithm::AlgorithmPage;
pub use dashboard::DashboardPage;
pub use insights::InsightsPage;
pub use result::ResultPage;

use crate::render::{Board, ChartData, ChartOptions, Family};

/// Render a chart through `family`; a render failure becomes an error
/// notice on the surface. Returns true when a chart was mounted.
pub(crate) fn mount(
    board: &mut Board,
    surface: &str,
    family: Family,
    data: ChartData,
    options: ChartOptions,
) -> bool {
    match family(board, surface, data, options) {
        Ok(rendered) => rendered.is_some(),
        Err(e) => {
            tracing::error!(surface, error = %e, "chart render failed");
            board.error(surface, &format!("Unable to draw chart: {e}"));
            false
        }
    }
}

/// Focus index moved forward over `len` surfaces
pub(crate) fn next_focus(focus: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (focus + 1) % len
    }
}

/// Focus index moved backward over `len` surfaces
pub(crate) fn prev_focus(focus: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        focus.checked_sub(1).unwrap_or(len - 1)
    }
}

/// Surface at `focus` in layout order
pub(crate) fn focused_surface(board: &Board, focus: usize) -> Option<String> {
    board.surfaces().nth(focus).map(str::to_string)
}
