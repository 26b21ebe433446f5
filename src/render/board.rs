//! Surfaces of a page and the charts mounted on them.

use crate::registry::ChartRegistry;

use super::chart::{ChartData, ChartInstance, ChartKind, ChartOptions, Period, RenderError};

/// Severity of a message shown in place of a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Nothing to chart yet
    Placeholder,
    Loading,
    Error,
}

/// A message block occupying a surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn placeholder(text: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Placeholder,
            text: text.into(),
        }
    }

    pub fn loading(text: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Loading,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    Empty,
    Chart,
    Notice(Notice),
}

#[derive(Debug)]
struct MountPoint {
    surface: String,
    content: Content,
}

/// What a surface currently shows
#[derive(Debug, Clone, Copy)]
pub enum SurfaceView<'a> {
    Empty,
    Chart(&'a ChartInstance),
    Notice(&'a Notice),
}

/// The mount points a page declares, plus the registry of charts bound to
/// them. Operations on an undeclared surface are no-ops.
#[derive(Debug, Default)]
pub struct Board {
    mounts: Vec<MountPoint>,
    registry: ChartRegistry<ChartInstance>,
    next_id: u64,
}

impl Board {
    pub fn new(surfaces: &[&str]) -> Self {
        Board {
            mounts: surfaces
                .iter()
                .map(|s| MountPoint {
                    surface: s.to_string(),
                    content: Content::Empty,
                })
                .collect(),
            registry: ChartRegistry::new(),
            next_id: 0,
        }
    }

    pub fn has_mount(&self, surface: &str) -> bool {
        self.mount(surface).is_some()
    }

    /// Declared surfaces in layout order
    pub fn surfaces(&self) -> impl Iterator<Item = &str> {
        self.mounts.iter().map(|m| m.surface.as_str())
    }

    fn mount(&self, surface: &str) -> Option<&MountPoint> {
        self.mounts.iter().find(|m| m.surface == surface)
    }

    fn mount_mut(&mut self, surface: &str) -> Option<&mut MountPoint> {
        self.mounts.iter_mut().find(|m| m.surface == surface)
    }

    /// Create or replace the chart on `surface`.
    ///
    /// Returns `Ok(None)` when the page has no such surface. Invalid data is
    /// an error and leaves the surface untouched.
    pub fn render(
        &mut self,
        surface: &str,
        kind: ChartKind,
        data: ChartData,
        options: ChartOptions,
    ) -> Result<Option<&ChartInstance>, RenderError> {
        if !self.has_mount(surface) {
            tracing::debug!(surface, kind = kind.name(), "no mount point, skipping render");
            return Ok(None);
        }
        data.validate()?;

        self.next_id += 1;
        let instance = ChartInstance::new(self.next_id, kind, data, options);
        tracing::debug!(surface, kind = kind.name(), id = instance.id, "mounting chart");

        if let Some(mount) = self.mount_mut(surface) {
            mount.content = Content::Chart;
        }
        Ok(Some(&*self.registry.bind(surface, instance)))
    }

    /// Replace the surface's content with a message, releasing any chart
    pub fn show(&mut self, surface: &str, notice: Notice) -> bool {
        let Some(mount) = self.mount_mut(surface) else {
            return false;
        };
        mount.content = Content::Notice(notice);
        self.registry.release(surface);
        true
    }

    pub fn placeholder(&mut self, surface: &str, text: &str) -> bool {
        self.show(surface, Notice::placeholder(text))
    }

    pub fn error(&mut self, surface: &str, text: &str) -> bool {
        self.show(surface, Notice::error(text))
    }

    /// Mutate the mounted chart in place (same family). Returns false if no
    /// chart is mounted there.
    pub fn update(&mut self, surface: &str, f: impl FnOnce(&mut ChartInstance)) -> bool {
        match self.registry.get_mut(surface) {
            Some(instance) => {
                f(instance);
                instance.revision += 1;
                true
            }
            None => {
                tracing::warn!(surface, "no chart mounted, nothing to update");
                false
            }
        }
    }

    /// Retitle the mounted chart for a time period
    pub fn set_period(&mut self, surface: &str, period: Period) -> bool {
        self.update(surface, |chart| {
            let base = chart.options.base_title().to_string();
            chart.options.title = format!("{base} - {}", period.label());
        })
    }

    /// Rebuild the mounted chart as another family with the same data and
    /// options.
    pub fn change_kind(
        &mut self,
        surface: &str,
        kind: ChartKind,
    ) -> Result<Option<&ChartInstance>, RenderError> {
        let Some(current) = self.registry.get(surface) else {
            tracing::warn!(surface, "no chart mounted, cannot change type");
            return Ok(None);
        };
        let data = current.data.clone();
        let options = current.options.clone();
        self.render(surface, kind, data, options)
    }

    /// Release the chart on `surface` and leave the mount empty
    pub fn unmount(&mut self, surface: &str) -> bool {
        let released = self.registry.release(surface);
        if let Some(mount) = self.mount_mut(surface) {
            mount.content = Content::Empty;
        }
        released
    }

    /// Unmount every surface, e.g. when leaving the page
    pub fn teardown(&mut self) {
        let surfaces: Vec<String> = self.surfaces().map(str::to_string).collect();
        for surface in &surfaces {
            self.unmount(surface);
        }
    }

    pub fn chart(&self, surface: &str) -> Option<&ChartInstance> {
        self.registry.get(surface)
    }

    #[cfg(test)]
    pub fn notice(&self, surface: &str) -> Option<&Notice> {
        match &self.mount(surface)?.content {
            Content::Notice(notice) => Some(notice),
            _ => None,
        }
    }

    /// Current content of a declared surface
    pub fn view(&self, surface: &str) -> Option<SurfaceView<'_>> {
        let mount = self.mount(surface)?;
        Some(match &mount.content {
            Content::Empty => SurfaceView::Empty,
            Content::Notice(notice) => SurfaceView::Notice(notice),
            Content::Chart => match self.registry.get(surface) {
                Some(chart) => SurfaceView::Chart(chart),
                None => SurfaceView::Empty,
            },
        })
    }

    #[cfg(test)]
    pub fn live_charts(&self) -> usize {
        self.registry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::chart::Dataset;

    fn bar_data() -> ChartData {
        ChartData::new(
            vec!["0:00".into(), "1:00".into()],
            vec![Dataset::new("Anomalies", vec![3.0, 1.0])],
        )
    }

    #[test]
    fn test_render_twice_keeps_one_live_chart() {
        let mut board = Board::new(&["chart"]);
        let first = board
            .render("chart", ChartKind::Bar, bar_data(), ChartOptions::titled("A"))
            .unwrap()
            .unwrap()
            .id;
        let second = board
            .render("chart", ChartKind::Bar, bar_data(), ChartOptions::titled("B"))
            .unwrap()
            .unwrap()
            .id;

        assert_ne!(first, second);
        assert_eq!(board.live_charts(), 1);
        assert_eq!(board.chart("chart").unwrap().options.title, "B");
    }

    #[test]
    fn test_render_without_mount_is_noop() {
        let mut board = Board::new(&["chart"]);
        let options = ChartOptions::titled("x");
        let result = board.render("missing", ChartKind::Line, bar_data(), options);
        assert!(matches!(result, Ok(None)));
        assert_eq!(board.live_charts(), 0);
        assert!(!board.placeholder("missing", "nothing"));
        assert!(board.view("missing").is_none());
    }

    #[test]
    fn test_invalid_data_leaves_surface_untouched() {
        let mut board = Board::new(&["chart"]);
        board.placeholder("chart", "waiting");
        let bad = ChartData::new(vec!["a".into()], vec![Dataset::new("x", vec![1.0, 2.0])]);
        assert!(board
            .render("chart", ChartKind::Bar, bad, ChartOptions::titled("x"))
            .is_err());
        assert_eq!(board.notice("chart").unwrap().text, "waiting");
    }

    #[test]
    fn test_notice_replaces_chart() {
        let mut board = Board::new(&["chart"]);
        board
            .render("chart", ChartKind::Bar, bar_data(), ChartOptions::titled("A"))
            .unwrap();
        assert!(board.error("chart", "Error loading chart data: HTTP error 500"));

        assert_eq!(board.live_charts(), 0);
        assert!(matches!(
            board.view("chart"),
            Some(SurfaceView::Notice(Notice { kind: NoticeKind::Error, .. }))
        ));
    }

    #[test]
    fn test_set_period_updates_in_place() {
        let mut board = Board::new(&["chart"]);
        let id = board
            .render("chart", ChartKind::Bar, bar_data(), ChartOptions::titled("Anomalies by Hour"))
            .unwrap()
            .unwrap()
            .id;

        assert!(board.set_period("chart", Period::Week));
        assert!(board.set_period("chart", Period::Day));

        let chart = board.chart("chart").unwrap();
        assert_eq!(chart.id, id);
        assert_eq!(chart.revision, 2);
        assert_eq!(chart.options.title, "Anomalies by Hour - Last 24 Hours");
        assert!(!board.set_period("other", Period::Day));
    }

    #[test]
    fn test_change_kind_replaces_instance() {
        let mut board = Board::new(&["chart"]);
        let id = board
            .render("chart", ChartKind::Bar, bar_data(), ChartOptions::titled("A"))
            .unwrap()
            .unwrap()
            .id;

        let replaced = board.change_kind("chart", ChartKind::Line).unwrap().unwrap();
        assert_ne!(replaced.id, id);
        assert_eq!(replaced.kind, ChartKind::Line);
        assert_eq!(replaced.data, bar_data());
        assert_eq!(board.live_charts(), 1);

        let mut empty = Board::new(&["chart"]);
        assert!(matches!(empty.change_kind("chart", ChartKind::Pie), Ok(None)));
    }

    #[test]
    fn test_unmount_and_teardown() {
        let mut board = Board::new(&["a", "b"]);
        board.render("a", ChartKind::Bar, bar_data(), ChartOptions::titled("A")).unwrap();
        board.render("b", ChartKind::Pie, bar_data(), ChartOptions::titled("B")).unwrap();

        assert!(board.unmount("a"));
        assert!(!board.unmount("a"));
        assert!(matches!(board.view("a"), Some(SurfaceView::Empty)));
        assert_eq!(board.live_charts(), 1);

        board.teardown();
        assert_eq!(board.live_charts(), 0);
        assert!(matches!(board.view("b"), Some(SurfaceView::Empty)));
    }

    #[test]
    fn test_surfaces_keep_layout_order() {
        let board = Board::new(&["z", "a", "m"]);
        assert_eq!(board.surfaces().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }
}
