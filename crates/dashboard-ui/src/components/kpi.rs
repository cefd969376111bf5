use crate::themes::Theme;
use dashboard_core::formatting::format_count;
use dashboard_data::aggregator::KpiSummary;
use ratatui::style::Style;
use ratatui::text::{Line, Span};

// ── KpiPanel ─────────────────────────────────────────────────────────────────

/// Two-line KPI strip: one line for cases, one for checks.
///
/// ```text
/// 📁 Cases   Open 1  │  Approved 0  │  Rejected 1  │  Total 2
/// 🔎 Checks  Pending 1  │  Approved 1  │  Rejected 1  │  Total 3
/// ```
pub struct KpiPanel<'a> {
    pub kpis: &'a KpiSummary,
    pub theme: &'a Theme,
}

impl<'a> KpiPanel<'a> {
    pub fn new(kpis: &'a KpiSummary, theme: &'a Theme) -> Self {
        Self { kpis, theme }
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let c = &self.kpis.cases;
        let k = &self.kpis.checks;
        vec![
            self.line(
                "📁 Cases   ",
                [
                    ("Open", c.open, self.theme.pending),
                    ("Approved", c.approved, self.theme.success),
                    ("Rejected", c.rejected, self.theme.error),
                    ("Total", c.total, self.theme.value),
                ],
            ),
            self.line(
                "🔎 Checks  ",
                [
                    ("Pending", k.pending, self.theme.pending),
                    ("Approved", k.approved, self.theme.success),
                    ("Rejected", k.rejected, self.theme.error),
                    ("Total", k.total, self.theme.value),
                ],
            ),
        ]
    }

    fn line(&self, title: &'static str, metrics: [(&'static str, u64, Style); 4]) -> Line<'a> {
        let mut spans = vec![Span::styled(title, self.theme.bold)];
        for (i, (label, value, style)) in metrics.into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  │  ", self.theme.separator));
            }
            spans.push(Span::styled(format!("{label} "), self.theme.label));
            spans.push(Span::styled(format_count(value), style));
        }
        Line::from(spans)
    }
}

// ── WarningList ──────────────────────────────────────────────────────────────

/// Non-fatal problems found while loading or filtering, one per line.
pub struct WarningList<'a> {
    pub warnings: &'a [String],
    pub theme: &'a Theme,
}

impl<'a> WarningList<'a> {
    pub fn new(warnings: &'a [String], theme: &'a Theme) -> Self {
        Self { warnings, theme }
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        self.warnings
            .iter()
            .map(|w| {
                Line::from(vec![
                    Span::styled("⚠ ", self.theme.warning),
                    Span::styled(w.as_str(), self.theme.warning),
                ])
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
