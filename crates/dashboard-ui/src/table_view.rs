//! Table views for the case dashboard TUI.
//!
//! Renders cross-tabulations as bordered [`ratatui::widgets::Table`]s, with an
//! optional highlighted totals row and column, plus a preview table of the
//! filtered records.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use dashboard_core::formatting::{format_count, truncate};
use dashboard_core::models::{CaseRecord, DatasetColumn, Field};
use dashboard_core::time_utils::format_timestamp;
use dashboard_data::aggregator::PivotTable;

use crate::themes::Theme;

/// Widest a preview column may grow before its cells are truncated.
const MAX_PREVIEW_WIDTH: usize = 24;

/// Label of the totals row and column.
pub const TOTAL_LABEL: &str = "Total";

/// Column widths for a pivot table: the index column plus one per data
/// column, plus a totals column when present.
pub fn pivot_widths(table: &PivotTable) -> Vec<Constraint> {
    let index = table
        .rows
        .iter()
        .map(|r| r.width())
        .chain(std::iter::once(table.index_name.width()))
        .chain(table.totals.as_ref().map(|_| TOTAL_LABEL.width()))
        .max()
        .unwrap_or(0);

    let mut widths = vec![Constraint::Length(index as u16 + 1)];
    for (c, name) in table.columns.iter().enumerate() {
        let widest_cell = table
            .cells
            .iter()
            .map(|r| format_count(r[c]).width())
            .chain(
                table
                    .totals
                    .as_ref()
                    .map(|t| format_count(t.columns[c]).width()),
            )
            .max()
            .unwrap_or(1);
        widths.push(Constraint::Length(name.width().max(widest_cell) as u16 + 1));
    }
    if let Some(totals) = &table.totals {
        let grand = format_count(totals.grand).width();
        widths.push(Constraint::Length(TOTAL_LABEL.width().max(grand) as u16 + 1));
    }
    widths
}

/// Render a cross-tabulation into `area`.
///
/// One data row per pivot row; when the table carries totals, a `Total`
/// column is appended and a highlighted `Total` row closes the table.
pub fn render_pivot_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    table: &PivotTable,
    theme: &Theme,
) {
    let mut header_cells: Vec<Cell> = vec![Cell::from(table.index_name.clone())];
    header_cells.extend(
        table
            .columns
            .iter()
            .map(|c| Cell::from(c.clone()).style(theme.table_header.patch(theme.status_style(c)))),
    );
    if table.totals.is_some() {
        header_cells.push(Cell::from(TOTAL_LABEL).style(theme.table_total));
    }
    let header = Row::new(header_cells).style(theme.table_header).height(1);

    let mut rows: Vec<Row> = table
        .rows
        .iter()
        .zip(table.cells.iter())
        .enumerate()
        .map(|(i, (label, cells))| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            let mut row_cells = vec![Cell::from(label.clone())];
            row_cells.extend(cells.iter().map(|v| Cell::from(format_count(*v))));
            if let Some(totals) = &table.totals {
                row_cells.push(Cell::from(format_count(totals.rows[i])).style(theme.table_total));
            }
            Row::new(row_cells).style(style)
        })
        .collect();

    if let Some(totals) = &table.totals {
        let mut total_cells = vec![Cell::from(TOTAL_LABEL)];
        total_cells.extend(totals.columns.iter().map(|v| Cell::from(format_count(*v))));
        total_cells.push(Cell::from(format_count(totals.grand)));
        rows.push(Row::new(total_cells).style(theme.table_total));
    }

    let widget = Table::new(rows, pivot_widths(table))
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {} ", title)),
        )
        .style(theme.text);

    frame.render_widget(widget, area);
}

/// Render the first rows of the filtered subset.
pub fn render_preview_table(
    frame: &mut Frame,
    area: Rect,
    columns: &[DatasetColumn],
    records: &[CaseRecord],
    total_rows: usize,
    theme: &Theme,
) {
    let cells_of = |record: &CaseRecord| -> Vec<String> {
        columns
            .iter()
            .map(|c| truncate(&preview_cell(record, c), MAX_PREVIEW_WIDTH))
            .collect()
    };
    let body: Vec<Vec<String>> = records.iter().map(cells_of).collect();

    let widths: Vec<Constraint> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let widest = body.iter().map(|r| r[i].width()).max().unwrap_or(0);
            let w = c.name.width().max(widest).min(MAX_PREVIEW_WIDTH);
            Constraint::Length(w as u16 + 1)
        })
        .collect();

    let header = Row::new(
        columns
            .iter()
            .map(|c| Cell::from(c.name.clone()).style(theme.table_header)),
    );
    let rows: Vec<Row> = body
        .into_iter()
        .enumerate()
        .map(|(i, cells)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(cells.into_iter().map(Cell::from)).style(style)
        })
        .collect();

    let title = format!(
        " Filtered data ({} of {} rows) ",
        records.len(),
        format_count(total_rows as u64)
    );
    let widget = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(title),
        )
        .style(theme.text);

    frame.render_widget(widget, area);
}

/// Render the placeholder shown when the filters leave no rows.
pub fn render_no_data(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No records match the current filters", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            "Press 'f' to adjust the filters or 'p' to cycle the PEP filter.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Case Dashboard "),
        ),
        area,
    );
}

fn preview_cell(record: &CaseRecord, column: &DatasetColumn) -> String {
    match column.field {
        Some(Field::IsPep) => record
            .is_pep
            .map(|b| if b { "Yes" } else { "No" }.to_string())
            .unwrap_or_default(),
        Some(Field::CreatedAt) => record.created_at.map(format_timestamp).unwrap_or_default(),
        Some(field) => record.text(field).unwrap_or_default().to_string(),
        None => record.extras.get(&column.name).cloned().unwrap_or_default(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
