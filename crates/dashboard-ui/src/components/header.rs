use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Decoration placed either side of the application title.
pub const ACCENT: &str = "✦ ✧";

/// Dashboard header rendering four lines:
///
/// 1. Application title with accents (ALL CAPS).
/// 2. A 60-column `=` separator.
/// 3. Data file and active filters in `[ file | filters ]` format.
/// 4. An empty line.
pub struct Header<'a> {
    /// Display name of the loaded data file.
    pub data_file: &'a str,
    /// Short description of the active filters.
    pub filters: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(data_file: &'a str, filters: &'a str, theme: &'a Theme) -> Self {
        Self {
            data_file,
            filters,
            theme,
        }
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);

        vec![
            Line::from(vec![
                Span::styled(ACCENT, self.theme.header_accent),
                Span::styled(" CASE DASHBOARD ", self.theme.header),
                Span::styled(ACCENT, self.theme.header_accent),
            ]),
            Line::from(Span::styled(separator, self.theme.separator)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.data_file, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.filters, self.theme.info),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
