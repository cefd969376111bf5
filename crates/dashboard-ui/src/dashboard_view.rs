//! Full-screen dashboard layout.
//!
//! ```text
//! ┌ summary ──────────────────────────────────────────────┐
//! │ header, KPIs, warnings, status                        │
//! ├ monthly cases ──────────────┬ monthly checks ─────────┤
//! │ stacked bars per month      │ stacked bars per month  │
//! ├ cases by assignee ──────────┼ checks by assignee ─────┤
//! ├ filtered data ──────────────┴─────────────────────────┤
//! └ key help ─────────────────────────────────────────────┘
//! ```
//!
//! When the filtered subset is empty the chart and table regions are
//! replaced by a single placeholder and nothing else is drawn.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use dashboard_core::formatting::format_count;
use dashboard_data::aggregator::PivotTable;
use dashboard_runtime::session::DashboardSnapshot;

use crate::components::bars::StackedBars;
use crate::components::header::Header;
use crate::components::kpi::{KpiPanel, WarningList};
use crate::table_view;
use crate::themes::Theme;

/// Key reference shown in the footer.
pub const KEY_HELP: &str = "f: filters  p: PEP filter  t: totals  r: reload  e: export  q: quit";

/// Build the summary block: header, KPI strip, date span, warnings and an
/// optional status message.
pub fn build_summary_lines<'a>(
    snapshot: &'a DashboardSnapshot,
    data_file: &'a str,
    filters: &'a str,
    status: Option<&'a str>,
    theme: &'a Theme,
) -> Vec<Line<'a>> {
    let mut lines = Header::new(data_file, filters, theme).to_lines();
    lines.extend(KpiPanel::new(&snapshot.report.kpis, theme).to_lines());

    let meta = &snapshot.report.metadata;
    let mut info = vec![
        Span::styled("📊 Rows ", theme.label),
        Span::styled(
            format!(
                "{} / {}",
                format_count(meta.filtered_rows as u64),
                format_count(meta.source_rows as u64)
            ),
            theme.value,
        ),
    ];
    if let Some((first, last)) = snapshot.date_span {
        info.push(Span::styled("   📅 Data span ", theme.label));
        info.push(Span::styled(format!("{first} → {last}"), theme.value));
    }
    if snapshot.include_totals {
        info.push(Span::styled("   Σ totals on", theme.info));
    }
    lines.push(Line::from(info));

    lines.extend(WarningList::new(&snapshot.warnings, theme).to_lines());
    if let Some(msg) = status {
        lines.push(Line::from(Span::styled(msg, theme.success)));
    }
    lines
}

/// Render the whole dashboard into `area`.
pub fn render_dashboard(
    frame: &mut Frame,
    area: Rect,
    snapshot: &DashboardSnapshot,
    status: Option<&str>,
    theme: &Theme,
) {
    let data_file = snapshot
        .data_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| snapshot.data_path.display().to_string());
    let filters = snapshot.filter.describe();
    let summary = build_summary_lines(snapshot, &data_file, &filters, status, theme);
    let summary_height = summary.len() as u16 + 2;

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(summary_height),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new(Text::from(summary)).block(Block::default().borders(Borders::ALL)),
        outer[0],
    );
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(KEY_HELP, theme.dim))),
        outer[2],
    );

    let report = &snapshot.report;
    if report.is_empty() {
        table_view::render_no_data(frame, outer[1], theme);
        return;
    }

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if report.has_monthly_data() {
            [
                Constraint::Percentage(35),
                Constraint::Percentage(35),
                Constraint::Percentage(30),
            ]
        } else {
            [
                Constraint::Length(0),
                Constraint::Percentage(60),
                Constraint::Percentage(40),
            ]
        })
        .split(outer[1]);

    if report.has_monthly_data() {
        let charts = halves(body[0]);
        render_bars(frame, charts[0], "Monthly cases by assignee", &report.monthly_cases, theme);
        render_bars(frame, charts[1], "Monthly checks by assignee", &report.monthly_checks, theme);
    }

    let tables = halves(body[1]);
    table_view::render_pivot_table(
        frame,
        tables[0],
        "Cases by assignee",
        &report.cases_by_assignee,
        theme,
    );
    table_view::render_pivot_table(
        frame,
        tables[1],
        "Checks by assignee",
        &report.checks_by_assignee,
        theme,
    );

    table_view::render_preview_table(
        frame,
        body[2],
        &snapshot.columns,
        &snapshot.preview,
        report.metadata.filtered_rows,
        theme,
    );
}

fn halves(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area)
}

fn render_bars(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    table: &PivotTable,
    theme: &Theme,
) {
    let label_width = table.rows.iter().map(|r| r.width()).max().unwrap_or(0) as u16;
    // Borders, label, gap and count suffix.
    let bar_width = area.width.saturating_sub(label_width + 10).max(1);
    let lines = StackedBars::new(table, theme).with_width(bar_width).to_lines();
    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {title} ")),
        ),
        area,
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────
