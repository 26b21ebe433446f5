//! Main application logic and TUI event loop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::Paragraph,
    Frame, Terminal,
};

use crate::cli::{AppConfig, StartPage};
use crate::data::shaper;
use crate::data::{EmbeddedStore, HttpResultClient, ResultSource};
use crate::pages::{
    dashboard, insights, result, AlgorithmPage, DashboardPage, InsightsPage, ResultPage,
};
use crate::render::Board;
use crate::ui::{
    widgets::{ModelTable, PageTabs, RecommendationList, ResultHeader, StatusBar},
    HelpOverlay, SurfaceWidget, Theme,
};

const TICK: Duration = Duration::from_millis(100);

/// Which page is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageId {
    Dashboard,
    Result,
    Models,
    Detection,
}

impl PageId {
    const ALL: [PageId; 4] = [
        PageId::Dashboard,
        PageId::Result,
        PageId::Models,
        PageId::Detection,
    ];

    const TITLES: [&'static str; 4] = ["Dashboard", "Result", "Models", "Detection"];

    fn index(self) -> usize {
        match self {
            PageId::Dashboard => 0,
            PageId::Result => 1,
            PageId::Models => 2,
            PageId::Detection => 3,
        }
    }

    fn title(self) -> &'static str {
        Self::TITLES[self.index()]
    }
}

impl From<StartPage> for PageId {
    fn from(page: StartPage) -> Self {
        match page {
            StartPage::Dashboard => PageId::Dashboard,
            StartPage::Result => PageId::Result,
            StartPage::Models => PageId::Models,
            StartPage::Detection => PageId::Detection,
        }
    }
}

/// Application state
pub struct App {
    theme: Theme,

    // Pages
    page: PageId,
    dashboard: DashboardPage,
    results: ResultPage,
    insights: InsightsPage,
    detection: AlgorithmPage,

    // UI State
    show_help: bool,
    /// Typing a result id
    editing_id: bool,

    // Exit flag
    should_quit: bool,

    // Error message to display (non-fatal)
    error_message: Option<String>,
}

impl App {
    /// Create a new App talking to the configured server
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = HttpResultClient::new(&config.server_url, config.session.clone())
            .context("Failed to create HTTP client")?;
        Ok(Self::with_source(config, Arc::new(client)))
    }

    /// Create an App reading results from `source`
    pub fn with_source(config: AppConfig, source: Arc<dyn ResultSource>) -> Self {
        let store = EmbeddedStore::new(config.data_dir.clone());
        let palette = config.color_palette.clone();

        let mut app = App {
            theme: Theme::with_palette(palette.clone()),
            page: config.start_page.into(),
            dashboard: DashboardPage::new(store.clone(), palette.clone()),
            results: ResultPage::new(source),
            insights: InsightsPage::new(store, palette),
            detection: AlgorithmPage::new(config.algorithm, config.seed),
            show_help: false,
            editing_id: false,
            should_quit: false,
            error_message: None,
        };

        tracing::info!(
            page = app.page.title(),
            server = %config.server_url,
            data_dir = ?config.data_dir,
            "starting dashboard"
        );
        app.activate(app.page);
        if let Some(id) = config.result_id {
            app.results.select(id);
        }
        app
    }

    /// Render the charts of `page`
    fn activate(&mut self, page: PageId) {
        match page {
            PageId::Dashboard => self.dashboard.load(),
            PageId::Result => self.results.activate(),
            PageId::Models => self.insights.load(),
            PageId::Detection => self.detection.render(),
        }
    }

    /// Release every chart of `page`
    fn teardown(&mut self, page: PageId) {
        match page {
            PageId::Dashboard => self.dashboard.teardown(),
            PageId::Result => self.results.teardown(),
            PageId::Models => self.insights.teardown(),
            PageId::Detection => self.detection.teardown(),
        }
    }

    fn switch_page(&mut self, page: PageId) {
        if page == self.page {
            return;
        }
        tracing::debug!(from = self.page.title(), to = page.title(), "switching page");
        self.teardown(self.page);
        self.page = page;
        self.editing_id = false;
        self.activate(page);
    }

    /// Reload the current page's data
    fn refresh(&mut self) {
        self.error_message = None;
        match self.page {
            PageId::Dashboard => self.dashboard.load(),
            PageId::Result => {
                if self.results.result_id().is_some() {
                    self.results.reload();
                } else {
                    self.set_error("No result selected, press i to enter an id".to_string());
                }
            }
            PageId::Models => self.insights.load(),
            PageId::Detection => self.detection.regenerate(),
        }
    }

    /// Set an error message to display (non-fatal)
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    /// Apply finished background work. Returns true when something changed.
    fn tick(&mut self) -> bool {
        self.results.poll()
    }

    /// Handle keyboard input
    fn handle_input(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.editing_id {
            self.handle_id_input(key);
            return;
        }

        // Global shortcuts
        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
                return;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return;
            }
            _ => {}
        }

        // If help is shown, don't process other keys
        if self.show_help {
            return;
        }

        match key {
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                self.switch_page(PageId::ALL[index]);
                return;
            }
            KeyCode::Char('r') => {
                self.refresh();
                return;
            }
            KeyCode::Esc => {
                self.error_message = None;
                return;
            }
            _ => {}
        }

        match self.page {
            PageId::Dashboard => self.handle_dashboard(key),
            PageId::Result => self.handle_result(key),
            PageId::Models => match key {
                KeyCode::Tab => self.insights.focus_next(),
                KeyCode::BackTab => self.insights.focus_prev(),
                _ => {}
            },
            PageId::Detection => self.handle_detection(key),
        }
    }

    fn handle_dashboard(&mut self, key: KeyCode) {
        match key {
            KeyCode::Tab => self.dashboard.focus_next(),
            KeyCode::BackTab => self.dashboard.focus_prev(),
            KeyCode::Char('t') => self.dashboard.toggle_kind(),
            KeyCode::Char('p') => self.dashboard.cycle_period(),
            _ => {}
        }
    }

    fn handle_result(&mut self, key: KeyCode) {
        match key {
            KeyCode::Tab => self.results.focus_next(),
            KeyCode::BackTab => self.results.focus_prev(),
            KeyCode::Char('i') | KeyCode::Char('/') => self.editing_id = true,
            KeyCode::Down | KeyCode::Char('j') => self.results.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.results.select_prev(),
            KeyCode::Enter => self.results.reload(),
            _ => {}
        }
    }

    fn handle_id_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => self.results.push_digit(c),
            KeyCode::Backspace => self.results.pop_digit(),
            KeyCode::Enter => {
                self.editing_id = false;
                self.results.submit();
            }
            KeyCode::Esc => {
                self.editing_id = false;
                self.results.clear_input();
            }
            _ => {}
        }
    }

    fn handle_detection(&mut self, key: KeyCode) {
        match key {
            KeyCode::Right | KeyCode::Char('l') => self.detection.select_next(),
            KeyCode::Left => self.detection.select_prev(),
            KeyCode::Char('g') => self.detection.regenerate(),
            _ => {}
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let size = frame.area();

        // Main layout: tabs, body, status bar
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Tabs
                Constraint::Min(6),    // Body
                Constraint::Length(2), // Status bar
            ])
            .split(size);

        PageTabs::new(&PageId::TITLES, self.page.index(), &self.theme)
            .render(frame, main_chunks[0]);

        match self.page {
            PageId::Dashboard => self.render_dashboard(frame, main_chunks[1]),
            PageId::Result => self.render_result(frame, main_chunks[1]),
            PageId::Models => self.render_models(frame, main_chunks[1]),
            PageId::Detection => self.render_detection(frame, main_chunks[1]),
        }

        let context = self.status_context();
        StatusBar::new(Some(context.as_str()), self.error_message.as_deref(), &self.theme)
            .render(frame, main_chunks[2]);

        // Render help overlay if active
        if self.show_help {
            HelpOverlay::new(&self.theme).render(frame, size);
        }
    }

    fn status_context(&self) -> String {
        let focused = match self.page {
            PageId::Dashboard => self.dashboard.focused(),
            PageId::Result => self.results.focused(),
            PageId::Models => self.insights.focused(),
            PageId::Detection => None,
        };
        let mut context = match focused {
            Some(surface) => format!("{} | {}", self.page.title(), surface_name(&surface)),
            None => self.page.title().to_string(),
        };
        if self.page == PageId::Result && self.results.is_loading() {
            context.push_str(" | loading");
        }
        context
    }

    /// Draw one surface of `board`; undeclared surfaces draw nothing
    fn draw_surface(
        &self,
        frame: &mut Frame,
        area: Rect,
        board: &Board,
        surface: &str,
        focused: bool,
    ) {
        if let Some(view) = board.view(surface) {
            let name = surface_name(surface);
            SurfaceWidget::new(view, &name, &self.theme).render(frame, area, focused);
        }
    }

    fn render_dashboard(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(4)])
            .split(area);

        let (datasets, results) = self.dashboard.totals();
        let count = |n: Option<u64>| n.map_or_else(|| "-".to_string(), |n| n.to_string());
        let summary = format!(" Datasets: {}   Results: {}", count(datasets), count(results));
        frame.render_widget(
            Paragraph::new(Line::styled(summary, self.theme.title_style())),
            chunks[0],
        );

        let cells = grid(chunks[1], 2, 2);
        let board = self.dashboard.board();
        for (i, surface) in dashboard::SURFACES.iter().enumerate() {
            let focused = self.dashboard.focus_index() == i;
            self.draw_surface(frame, cells[i], board, surface, focused);
        }
    }

    fn render_result(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Percentage(45),
                Constraint::Percentage(30),
                Constraint::Min(5),
            ])
            .split(area);

        let input = if self.editing_id {
            self.results.id_input()
        } else {
            ""
        };
        ResultHeader::new(self.results.result_id(), input, self.results.payload(), &self.theme)
            .render(frame, rows[0]);

        let board = self.results.board();
        let focus = self.results.focus_index();
        self.draw_surface(frame, rows[1], board, result::TIME_SERIES, focus == 0);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(rows[2]);
        for (i, surface) in [result::METRICS, result::SUMMARY, result::DISTRIBUTION]
            .iter()
            .enumerate()
        {
            self.draw_surface(frame, middle[i], board, surface, focus == i + 1);
        }

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[3]);
        self.draw_surface(frame, bottom[0], board, result::WEEKDAY, focus == 4);
        RecommendationList::new(self.results.recommendations(), &self.theme)
            .render(frame, bottom[1]);
    }

    fn render_models(&self, frame: &mut Frame, area: Rect) {
        let table_height = (self.insights.entries().len() as u16 + 3).min(area.height / 3);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(table_height)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        let board = self.insights.board();
        let focused = self.insights.focused();
        let cells = [
            (columns[0], insights::MODEL_PERFORMANCE),
            (right[0], insights::ANOMALY_COMPARISON),
            (right[1], insights::EXECUTION_TIME),
        ];
        for (area, surface) in cells {
            let is_focused = focused.as_deref() == Some(surface);
            self.draw_surface(frame, area, board, surface, is_focused);
        }

        if !self.insights.entries().is_empty() {
            ModelTable::new(self.insights.entries(), &self.theme).render(frame, rows[1]);
        }
    }

    fn render_detection(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(4)])
            .split(area);

        let selected = self
            .detection
            .selected()
            .map_or("none", |a| a.key());
        let line = format!(
            " Algorithm: {}   [←/→] switch  [g] new sample   (illustrative data)",
            shaper::display_label(selected)
        );
        let header = Paragraph::new(Line::styled(line, self.theme.dimmed_style()));
        frame.render_widget(header, chunks[0]);

        self.draw_surface(
            frame,
            chunks[1],
            self.detection.board(),
            crate::pages::algorithm::VISUALIZATION,
            true,
        );
    }
}

/// `time-series-chart` becomes `Time series`
fn surface_name(surface: &str) -> String {
    shaper::display_label(surface.trim_end_matches("-chart"))
}

/// `rows` x `cols` equal cells, row-major
fn grid(area: Rect, rows: u32, cols: u32) -> Vec<Rect> {
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows); rows as usize])
        .split(area);
    row_areas
        .iter()
        .flat_map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, cols); cols as usize])
                .split(*row)
                .to_vec()
        })
        .collect()
}

/// Restore terminal to normal state
fn restore_terminal() {
    // Best effort cleanup - ignore errors since we may be in a panic
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

/// Run the TUI application
pub fn run(config: AppConfig) -> Result<()> {
    // Build the app before touching the terminal so errors print normally
    let mut app = App::new(config).context("Failed to initialize application")?;

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        restore_terminal();
        return Err(e).context("Failed to setup terminal");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to create terminal");
        }
    };

    let result = run_main_loop(&mut terminal, &mut app);

    // Always restore terminal, regardless of result
    restore_terminal();
    terminal.show_cursor().ok();

    result
}

/// Main application loop
fn run_main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        app.tick();

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_input(key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            tracing::info!("quitting");
            return Ok(());
        }
    }
}
