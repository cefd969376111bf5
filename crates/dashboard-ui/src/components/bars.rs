use crate::themes::Theme;
use dashboard_data::aggregator::PivotTable;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// Character used for filled bar cells.
pub const FILLED: char = '\u{2588}'; // █  FULL BLOCK
/// Character used for the unfilled remainder of a bar.
pub const EMPTY: char = '\u{2591}'; // ░  LIGHT SHADE

// ── StackedBars ──────────────────────────────────────────────────────────────

/// Horizontal stacked bar per pivot row, segments coloured per column.
///
/// Used for the monthly distribution: one bar per month, one segment per
/// assignee. Bar lengths are scaled so the largest row fills `width`.
pub struct StackedBars<'a> {
    pub table: &'a PivotTable,
    pub theme: &'a Theme,
    /// Width in terminal columns of the longest bar.
    pub width: u16,
}

impl<'a> StackedBars<'a> {
    pub fn new(table: &'a PivotTable, theme: &'a Theme) -> Self {
        Self {
            table,
            theme,
            width: 40,
        }
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    /// One line per row followed by a legend line. Empty table, no lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        if self.table.is_empty() {
            return Vec::new();
        }

        let row_totals: Vec<u64> = self.table.cells.iter().map(|r| r.iter().sum()).collect();
        let scale = row_totals.iter().copied().max().unwrap_or(0);
        let label_width = self
            .table
            .rows
            .iter()
            .map(|r| r.width())
            .max()
            .unwrap_or(0);

        let mut lines: Vec<Line<'a>> = Vec::with_capacity(self.table.rows.len() + 1);
        for ((label, cells), total) in self
            .table
            .rows
            .iter()
            .zip(self.table.cells.iter())
            .zip(row_totals.iter())
        {
            let pad = label_width.saturating_sub(label.width());
            let mut spans = vec![Span::styled(
                format!("{label}{} ", " ".repeat(pad)),
                self.theme.label,
            )];
            let mut drawn = 0usize;
            for (i, chars) in segment_widths(cells, scale, self.width).into_iter().enumerate() {
                drawn += chars;
                if chars > 0 {
                    spans.push(Span::styled(
                        FILLED.to_string().repeat(chars),
                        Style::default().fg(self.theme.series_color(i)),
                    ));
                }
            }
            let rest = (self.width as usize).saturating_sub(drawn);
            if rest > 0 {
                spans.push(Span::styled(
                    EMPTY.to_string().repeat(rest),
                    self.theme.bar_empty,
                ));
            }
            spans.push(Span::styled(format!(" {total}"), self.theme.value));
            lines.push(Line::from(spans));
        }

        lines.push(self.legend());
        lines
    }

    fn legend(&self) -> Line<'a> {
        let mut spans: Vec<Span<'a>> = Vec::new();
        for (i, column) in self.table.columns.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(
                "■ ",
                Style::default().fg(self.theme.series_color(i)),
            ));
            spans.push(Span::styled(column.clone(), self.theme.dim));
        }
        Line::from(spans)
    }
}

/// Split a row into per-segment widths.
///
/// Uses cumulative rounding so the segments of a row always add up to
/// `round(sum / scale * width)`, never more than `width`.
pub fn segment_widths(values: &[u64], scale: u64, width: u16) -> Vec<usize> {
    if scale == 0 {
        return vec![0; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut prefix = 0u64;
    let mut drawn = 0usize;
    for v in values {
        prefix += v;
        let end = ((prefix as f64 / scale as f64) * width as f64).round() as usize;
        let end = end.min(width as usize);
        out.push(end.saturating_sub(drawn));
        drawn = drawn.max(end);
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
