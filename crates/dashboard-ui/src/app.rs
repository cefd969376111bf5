//! Main application state and TUI event loop for the case dashboard.
//!
//! [`App`] owns the theme, the export target, the filter panel and the last
//! status message.
//! The loop is synchronous: each key that changes state triggers exactly one
//! [`DashboardSession::run`] before the next frame is drawn.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

use dashboard_runtime::session::DashboardSession;

use crate::dashboard_view;
use crate::filter_panel::{self, FilterPanel};
use crate::table_view;
use crate::themes::Theme;

// ── Action ────────────────────────────────────────────────────────────────────

/// What a key press asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ToggleFilters,
    CyclePep,
    ToggleTotals,
    Reload,
    Export,
    Quit,
}

impl Action {
    /// Map a key event to an action; unbound keys yield `None`.
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char('f') | KeyCode::Char('F') => Some(Action::ToggleFilters),
            KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::CyclePep),
            KeyCode::Char('t') | KeyCode::Char('T') => Some(Action::ToggleTotals),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Reload),
            KeyCode::Char('e') | KeyCode::Char('E') => Some(Action::Export),
            _ => None,
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the dashboard TUI.
pub struct App {
    pub theme: Theme,
    /// Where `e` writes the filtered subset.
    pub export_path: PathBuf,
    /// One-line feedback from the last action.
    pub status: Option<String>,
    pub filters: FilterPanel,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
}

impl App {
    pub fn new(theme_name: &str, export_path: PathBuf) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            export_path,
            status: None,
            filters: FilterPanel::default(),
            should_quit: false,
        }
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the interactive dashboard until the user quits.
    ///
    /// The session must already hold a snapshot (one successful
    /// [`DashboardSession::run`]); the terminal is restored on every exit
    /// path.
    pub fn run(mut self, session: &mut DashboardSession) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame, session)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        self.handle_key(&key, session);
                    }
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// Route a key to the filter panel while it is open, otherwise to the
    /// global bindings.
    pub fn handle_key(&mut self, key: &KeyEvent, session: &mut DashboardSession) {
        if self.filters.open {
            if let Some(outcome) = self.filters.handle_key(key, session) {
                self.report(outcome);
            }
        } else if let Some(action) = Action::from_key(key) {
            self.apply(action, session);
        }
    }

    /// Apply `action` to the session and re-run the pipeline when state
    /// changed. Failures become the status message.
    pub fn apply(&mut self, action: Action, session: &mut DashboardSession) {
        let outcome: Result<String, String> = match action {
            Action::Quit => {
                self.should_quit = true;
                return;
            }
            Action::ToggleFilters => {
                if let Some(msg) = self.filters.open(session) {
                    self.report(Err(msg));
                }
                return;
            }
            Action::CyclePep => {
                let pep = session.cycle_pep();
                session
                    .run()
                    .map(|_| format!("PEP filter: {pep}"))
                    .map_err(|e| e.to_string())
            }
            Action::ToggleTotals => {
                let on = session.toggle_totals();
                session
                    .run()
                    .map(|_| format!("Grand totals {}", if on { "on" } else { "off" }))
                    .map_err(|e| e.to_string())
            }
            Action::Reload => session
                .reload()
                .map(|snap| format!("Reloaded {} rows", snap.report.metadata.source_rows))
                .map_err(|e| format!("Reload failed: {e}")),
            Action::Export => session
                .export(&self.export_path)
                .map(|n| format!("Exported {} rows to {}", n, self.export_path.display()))
                .map_err(|e| format!("Export failed: {e}")),
        };
        self.report(outcome);
    }

    fn report(&mut self, outcome: Result<String, String>) {
        match outcome {
            Ok(msg) => {
                tracing::info!("{}", msg);
                self.status = Some(msg);
            }
            Err(msg) => {
                tracing::warn!("{}", msg);
                self.status = Some(msg);
            }
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the current session state into `frame`.
    pub fn render(&self, frame: &mut Frame, session: &DashboardSession) {
        let area = frame.area();
        match session.snapshot() {
            Some(snapshot) => dashboard_view::render_dashboard(
                frame,
                area,
                snapshot,
                self.status.as_deref(),
                &self.theme,
            ),
            None => table_view::render_no_data(frame, area, &self.theme),
        }
        if self.filters.open {
            filter_panel::render_filter_panel(
                frame,
                area,
                &self.filters,
                session.filter(),
                &self.theme,
            );
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
