//! Interactive filter panel.
//!
//! A popup listing every filter row: the six multi-value fields, the country
//! search and the two date bounds. Each committed change replaces the
//! session's [`FilterSpec`] and re-runs the pipeline once.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use dashboard_core::filters::{FilterSpec, Selection};
use dashboard_core::models::Field;
use dashboard_core::time_utils::parse_date;
use dashboard_runtime::session::DashboardSession;

use crate::themes::Theme;

/// Values shown per row before the list scrolls.
const VISIBLE_OPTIONS: usize = 12;

/// Key reference shown at the bottom of the panel.
pub const PANEL_HELP: &str = "Tab: row  \u{2191}\u{2193}: move  Space: toggle/edit  a: all  Esc: close";

// ── FilterRow ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRow {
    Select(Field),
    CountrySearch,
    StartDate,
    EndDate,
}

impl FilterRow {
    pub const ALL: [FilterRow; 9] = [
        FilterRow::Select(Field::CasesStatus),
        FilterRow::Select(Field::CheckStatus),
        FilterRow::Select(Field::AssigneeName),
        FilterRow::Select(Field::CheckType),
        FilterRow::Select(Field::Country),
        FilterRow::CountrySearch,
        FilterRow::Select(Field::RiskLevel),
        FilterRow::StartDate,
        FilterRow::EndDate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilterRow::Select(field) => field.column_name(),
            FilterRow::CountrySearch => "country search",
            FilterRow::StartDate => "start date",
            FilterRow::EndDate => "end date",
        }
    }

    /// Current value of a text row, empty when unset.
    fn text_value(self, spec: &FilterSpec) -> String {
        match self {
            FilterRow::Select(_) => String::new(),
            FilterRow::CountrySearch => spec.country_search.clone().unwrap_or_default(),
            FilterRow::StartDate => spec.date_range.start.map(|d| d.to_string()).unwrap_or_default(),
            FilterRow::EndDate => spec.date_range.end.map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}

// ── FilterPanel ───────────────────────────────────────────────────────────────

/// Open/closed state, the focused row and the value cursor.
#[derive(Debug, Default)]
pub struct FilterPanel {
    pub open: bool,
    row: usize,
    cursor: usize,
    options: Vec<String>,
    /// Text being typed into a search or date row.
    editing: Option<String>,
}

impl FilterPanel {
    pub fn row(&self) -> FilterRow {
        FilterRow::ALL[self.row]
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Show the panel on the first row.
    pub fn open(&mut self, session: &mut DashboardSession) -> Option<String> {
        self.open = true;
        self.row = 0;
        self.editing = None;
        self.refresh_options(session)
    }

    pub fn close(&mut self) {
        self.open = false;
        self.editing = None;
    }

    /// Handle a key while the panel is open.
    ///
    /// Returns a status message when the key changed something worth
    /// reporting: `Ok` after a successful re-run, `Err` on failure.
    pub fn handle_key(
        &mut self,
        key: &KeyEvent,
        session: &mut DashboardSession,
    ) -> Option<Result<String, String>> {
        if self.editing.is_some() {
            return self.handle_edit_key(key, session);
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('f') | KeyCode::Char('F') => {
                self.close();
                None
            }
            KeyCode::Tab => self.move_row(1, session),
            KeyCode::BackTab => self.move_row(FilterRow::ALL.len() - 1, session),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < self.options.len() {
                    self.cursor += 1;
                }
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            KeyCode::Char(' ') | KeyCode::Enter => match self.row() {
                FilterRow::Select(field) => {
                    let value = self.options.get(self.cursor)?.clone();
                    let mut spec = session.filter().clone();
                    spec.selection_mut(field)?.toggle(&value);
                    Some(commit(session, spec))
                }
                row => {
                    self.editing = Some(row.text_value(session.filter()));
                    None
                }
            },
            KeyCode::Char('a') | KeyCode::Char('A') => {
                let mut spec = session.filter().clone();
                match self.row() {
                    FilterRow::Select(field) => *spec.selection_mut(field)? = Selection::All,
                    FilterRow::CountrySearch => spec.country_search = None,
                    FilterRow::StartDate => spec.date_range.start = None,
                    FilterRow::EndDate => spec.date_range.end = None,
                }
                if spec == *session.filter() {
                    return None;
                }
                let outcome = commit(session, spec);
                self.refresh_options(session);
                Some(outcome)
            }
            _ => None,
        }
    }

    fn handle_edit_key(
        &mut self,
        key: &KeyEvent,
        session: &mut DashboardSession,
    ) -> Option<Result<String, String>> {
        let text = self.editing.as_mut()?;
        match key.code {
            KeyCode::Char(c) => {
                text.push(c);
                None
            }
            KeyCode::Backspace => {
                text.pop();
                None
            }
            KeyCode::Esc => {
                self.editing = None;
                None
            }
            KeyCode::Enter => {
                let text = self.editing.take().unwrap_or_default();
                let text = text.trim();
                let mut spec = session.filter().clone();
                match self.row() {
                    FilterRow::Select(_) => return None,
                    FilterRow::CountrySearch => {
                        spec.country_search = (!text.is_empty()).then(|| text.to_string());
                    }
                    FilterRow::StartDate => match parse_bound(text) {
                        Ok(date) => spec.date_range.start = date,
                        Err(msg) => return Some(Err(msg)),
                    },
                    FilterRow::EndDate => match parse_bound(text) {
                        Ok(date) => spec.date_range.end = date,
                        Err(msg) => return Some(Err(msg)),
                    },
                }
                let outcome = commit(session, spec);
                self.refresh_options(session);
                Some(outcome)
            }
            _ => None,
        }
    }

    fn move_row(
        &mut self,
        step: usize,
        session: &mut DashboardSession,
    ) -> Option<Result<String, String>> {
        self.row = (self.row + step) % FilterRow::ALL.len();
        self.refresh_options(session).map(Err)
    }

    /// Reload the value list for the focused row. The country list follows
    /// the active search.
    fn refresh_options(&mut self, session: &mut DashboardSession) -> Option<String> {
        let loaded = match self.row() {
            FilterRow::Select(Field::Country) => match session.filter().country_search.clone() {
                Some(search) => session.country_candidates(&search),
                None => session.options(Field::Country),
            },
            FilterRow::Select(field) => session.options(field),
            _ => Ok(Vec::new()),
        };
        match loaded {
            Ok(options) => {
                self.options = options;
                self.cursor = self.cursor.min(self.options.len().saturating_sub(1));
                None
            }
            Err(e) => {
                self.options.clear();
                self.cursor = 0;
                Some(format!("Loading options failed: {e}"))
            }
        }
    }
}

/// Install `spec` and re-run the pipeline.
fn commit(session: &mut DashboardSession, spec: FilterSpec) -> Result<String, String> {
    session.set_filter(spec);
    session
        .run()
        .map(|snap| format!("Filters: {}", snap.filter.describe()))
        .map_err(|e| format!("Filter failed: {e}"))
}

/// An empty bound clears the date; anything else must parse.
fn parse_bound(text: &str) -> Result<Option<chrono::NaiveDate>, String> {
    if text.is_empty() {
        return Ok(None);
    }
    parse_date(text)
        .map(Some)
        .map_err(|_| format!("Invalid date: {text} (expected YYYY-MM-DD)"))
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Draw the panel centred over `area`.
pub fn render_filter_panel(
    frame: &mut Frame,
    area: Rect,
    panel: &FilterPanel,
    filter: &FilterSpec,
    theme: &Theme,
) {
    let popup = centered(area, 60, 28);
    let focused = panel.row();

    let mut lines = Vec::new();
    for row in FilterRow::ALL {
        let marker = if row == focused { "\u{25b8} " } else { "  " };
        let label_style = if row == focused { theme.header_accent } else { theme.label };
        let value = match row {
            FilterRow::Select(field) => match filter.selection(field) {
                Some(Selection::Only(values)) => {
                    values.iter().cloned().collect::<Vec<_>>().join(", ")
                }
                _ => "All".to_string(),
            },
            _ if row == focused && panel.editing.is_some() => {
                format!("{}_", panel.editing.as_deref().unwrap_or_default())
            }
            _ => {
                let text = row.text_value(filter);
                if text.is_empty() { "-".to_string() } else { text }
            }
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{:<16}", row.label()), label_style),
            Span::styled(value, theme.value),
        ]));
    }

    if let FilterRow::Select(field) = focused {
        lines.push(Line::from(""));
        let selection = filter.selection(field);
        let skip = panel.cursor.saturating_sub(VISIBLE_OPTIONS - 1);
        for (i, option) in panel.options.iter().enumerate().skip(skip).take(VISIBLE_OPTIONS) {
            let checked = selection.is_some_and(|s| s.contains(option));
            let mark = if checked { "[\u{2713}]" } else { "[ ]" };
            let style = if i == panel.cursor { theme.bold } else { theme.text };
            lines.push(Line::from(Span::styled(format!("  {mark} {option}"), style)));
        }
        if panel.options.is_empty() {
            lines.push(Line::from(Span::styled("  (no values)", theme.dim)));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(PANEL_HELP, theme.dim)));

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(" Filters "),
        ),
        popup,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dashboard_core::schema::SchemaConfig;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::fs;
    use tempfile::TempDir;

    const DATA: &str = "case_id,check_id,cases_status,check_status,assignee_name,check_type,country,created_at\n\
C1,K1,open,in_progress,Alice,kyc,Germany,2024-01-05 09:00:00\n\
C2,K2,rejected,rejected,Bob,kyc,France,2024-02-01 09:00:00\n\
C3,K3,approved,approved,Carol,aml,Georgia,2024-03-01 09:00:00\n";

    fn setup() -> (FilterPanel, DashboardSession, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Data.csv");
        fs::write(&path, DATA).unwrap();
        let mut session = DashboardSession::new(path, SchemaConfig::default(), FilterSpec::default());
        session.run().unwrap();
        let mut panel = FilterPanel::default();
        assert!(panel.open(&mut session).is_none());
        (panel, session, dir)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(panel: &mut FilterPanel, session: &mut DashboardSession, codes: &[KeyCode]) {
        for code in codes {
            panel.handle_key(&key(*code), session);
        }
    }

    fn type_text(panel: &mut FilterPanel, session: &mut DashboardSession, text: &str) {
        for c in text.chars() {
            assert!(panel.handle_key(&key(KeyCode::Char(c)), session).is_none());
        }
    }

    #[test]
    fn test_tab_walks_rows_and_loads_options() {
        let (mut panel, mut session, _dir) = setup();
        assert_eq!(panel.row(), FilterRow::Select(Field::CasesStatus));
        assert_eq!(panel.options(), ["open", "rejected", "approved"]);

        press(&mut panel, &mut session, &[KeyCode::Tab, KeyCode::Tab]);
        assert_eq!(panel.row(), FilterRow::Select(Field::AssigneeName));
        assert_eq!(panel.options(), ["Alice", "Bob", "Carol"]);

        press(&mut panel, &mut session, &[KeyCode::BackTab, KeyCode::BackTab, KeyCode::BackTab]);
        assert_eq!(panel.row(), FilterRow::EndDate);
        assert!(panel.options().is_empty());
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let (mut panel, mut session, _dir) = setup();
        press(&mut panel, &mut session, &[KeyCode::Up]);
        assert_eq!(panel.cursor(), 0);
        press(&mut panel, &mut session, &[KeyCode::Down, KeyCode::Down, KeyCode::Down]);
        assert_eq!(panel.cursor(), 2);
    }

    #[test]
    fn test_editing_swallows_command_keys() {
        let (mut panel, mut session, _dir) = setup();
        press(&mut panel, &mut session, &[KeyCode::BackTab, KeyCode::Enter]);
        assert_eq!(panel.editing(), Some(""));

        // 'f' and 'a' are text while editing, not close/reset.
        type_text(&mut panel, &mut session, "fa");
        press(&mut panel, &mut session, &[KeyCode::Backspace]);
        assert_eq!(panel.editing(), Some("f"));
        assert!(panel.open);

        press(&mut panel, &mut session, &[KeyCode::Esc]);
        assert!(panel.editing().is_none());
        assert!(panel.open);
        assert_eq!(session.filter().date_range.end, None);
    }

    #[test]
    fn test_country_search_narrows_country_options() {
        let (mut panel, mut session, _dir) = setup();
        for _ in 0..5 {
            press(&mut panel, &mut session, &[KeyCode::Tab]);
        }
        assert_eq!(panel.row(), FilterRow::CountrySearch);
        press(&mut panel, &mut session, &[KeyCode::Enter]);
        type_text(&mut panel, &mut session, "ge");
        let outcome = panel.handle_key(&key(KeyCode::Enter), &mut session);
        assert!(outcome.unwrap().is_ok());
        assert_eq!(session.filter().country_search.as_deref(), Some("ge"));

        press(&mut panel, &mut session, &[KeyCode::BackTab]);
        assert_eq!(panel.row(), FilterRow::Select(Field::Country));
        assert_eq!(panel.options(), ["Germany", "Georgia"]);
    }

    #[test]
    fn test_render_shows_marks_and_values() {
        let (mut panel, mut session, _dir) = setup();
        press(&mut panel, &mut session, &[KeyCode::Down, KeyCode::Char(' ')]);
        let mut spec = session.filter().clone();
        spec.date_range.start = NaiveDate::from_ymd_opt(2024, 1, 1);
        session.set_filter(spec);

        let theme = Theme::from_name("dark");
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal
            .draw(|frame| {
                render_filter_panel(frame, frame.area(), &panel, session.filter(), &theme)
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();

        assert!(text.contains("Filters"));
        assert!(text.contains("[\u{2713}] rejected"));
        assert!(text.contains("[ ] open"));
        assert!(text.contains("2024-01-01"));
        assert!(text.contains("country search"));
    }
}
