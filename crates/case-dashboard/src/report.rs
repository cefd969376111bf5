//! Plain-text rendering of a dashboard snapshot for the `summary` view.

use std::io::{self, Write};

use dashboard_core::formatting::format_count;
use dashboard_data::aggregator::PivotTable;
use dashboard_runtime::session::DashboardSnapshot;
use unicode_width::UnicodeWidthStr;

/// Write the KPIs, warnings and every cross-tabulation to `out`.
pub fn write_summary<W: Write>(out: &mut W, snapshot: &DashboardSnapshot) -> io::Result<()> {
    let report = &snapshot.report;
    let meta = &report.metadata;

    writeln!(out, "Case dashboard: {}", snapshot.data_path.display())?;
    writeln!(out, "Filters: {}", snapshot.filter.describe())?;
    writeln!(
        out,
        "Rows: {} of {}",
        format_count(meta.filtered_rows as u64),
        format_count(meta.source_rows as u64)
    )?;
    if let Some((first, last)) = snapshot.date_span {
        writeln!(out, "Data span: {first} to {last}")?;
    }
    if snapshot.undated_rows > 0 {
        writeln!(
            out,
            "Note: {} rows without a created_at date are included; set --start-date or --end-date to drop them",
            format_count(snapshot.undated_rows as u64)
        )?;
    }
    writeln!(out)?;

    let c = &report.kpis.cases;
    let k = &report.kpis.checks;
    writeln!(
        out,
        "Cases   open {}  approved {}  rejected {}  total {}",
        c.open, c.approved, c.rejected, c.total
    )?;
    writeln!(
        out,
        "Checks  pending {}  approved {}  rejected {}  total {}",
        k.pending, k.approved, k.rejected, k.total
    )?;

    if !snapshot.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Warnings:")?;
        for w in &snapshot.warnings {
            writeln!(out, "  - {w}")?;
        }
    }

    if report.is_empty() {
        writeln!(out)?;
        writeln!(out, "No records match the current filters.")?;
        return Ok(());
    }

    let sections = [
        ("Monthly cases by assignee", &report.monthly_cases),
        ("Monthly checks by assignee", &report.monthly_checks),
        ("Cases by assignee", &report.cases_by_assignee),
        ("Checks by assignee", &report.checks_by_assignee),
    ];
    for (title, table) in sections {
        if table.is_empty() {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "{title}")?;
        write_pivot(out, table)?;
    }
    Ok(())
}

/// Write `table` as left-aligned text columns separated by two spaces.
pub fn write_pivot<W: Write>(out: &mut W, table: &PivotTable) -> io::Result<()> {
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(table.rows.len() + 2);

    let mut header = vec![table.index_name.clone()];
    header.extend(table.columns.iter().cloned());
    if table.totals.is_some() {
        header.push("Total".to_string());
    }
    grid.push(header);

    for (i, (label, cells)) in table.rows.iter().zip(table.cells.iter()).enumerate() {
        let mut line = vec![label.clone()];
        line.extend(cells.iter().map(|v| format_count(*v)));
        if let Some(totals) = &table.totals {
            line.push(format_count(totals.rows[i]));
        }
        grid.push(line);
    }

    if let Some(totals) = &table.totals {
        let mut line = vec!["Total".to_string()];
        line.extend(totals.columns.iter().map(|v| format_count(*v)));
        line.push(format_count(totals.grand));
        grid.push(line);
    }

    let columns = grid.first().map_or(0, Vec::len);
    let widths: Vec<usize> = (0..columns)
        .map(|c| grid.iter().map(|r| r[c].width()).max().unwrap_or(0))
        .collect();

    for row in &grid {
        let mut line = String::new();
        for (c, cell) in row.iter().enumerate() {
            if c > 0 {
                line.push_str("  ");
            }
            line.push_str(cell);
            if c + 1 < row.len() {
                line.push_str(&" ".repeat(widths[c].saturating_sub(cell.width())));
            }
        }
        writeln!(out, "{line}")?;
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::filters::{FilterSpec, Selection};
    use dashboard_core::schema::SchemaConfig;
    use dashboard_runtime::session::DashboardSession;
    use std::fs;
    use tempfile::TempDir;

    const DATA: &str = "case_id,check_id,cases_status,check_status,assignee_name,check_type,created_at\n\
C1,K1,open,in_progress,Alice,kyc,2024-01-05 09:00:00\n\
C1,K2,open,approved,Alice,aml,2024-01-06 09:00:00\n\
C2,K3,rejected,rejected,Bob,kyc,2024-02-01 09:00:00\n";

    fn summary(filter: FilterSpec, totals: bool) -> String {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Data.csv");
        fs::write(&path, DATA).unwrap();
        let schema = SchemaConfig {
            include_totals: totals,
            ..Default::default()
        };
        let mut session = DashboardSession::new(path, schema, filter);
        let snapshot = session.run().unwrap();

        let mut buf = Vec::new();
        write_summary(&mut buf, snapshot).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_summary_contains_kpis() {
        let text = summary(FilterSpec::default(), false);
        assert!(text.contains("Rows: 3 of 3"));
        assert!(text.contains("Cases   open 1  approved 0  rejected 1  total 2"));
        assert!(text.contains("Checks  pending 1  approved 1  rejected 1  total 3"));
        assert!(text.contains("Data span: 2024-01-05 to 2024-02-01"));
        assert!(text.contains("Monthly cases by assignee"));
        assert!(text.contains("Checks by assignee"));
        assert!(text.contains("country"), "optional column warning listed");
    }

    #[test]
    fn test_summary_empty_result() {
        let filter = FilterSpec {
            cases_status: Selection::from_values(["approved"]),
            ..Default::default()
        };
        let text = summary(filter, false);
        assert!(text.contains("Rows: 0 of 3"));
        assert!(text.contains("total 0"));
        assert!(text.contains("No records match"));
        assert!(!text.contains("Monthly cases by assignee"));
    }

    #[test]
    fn test_write_pivot_alignment() {
        let table = PivotTable {
            index_name: "assignee_name".to_string(),
            rows: vec!["Alice".to_string(), "Bob".to_string()],
            columns: vec!["open".to_string(), "rejected".to_string()],
            cells: vec![vec![1, 0], vec![0, 1]],
            totals: None,
        }
        .with_totals();

        let mut buf = Vec::new();
        write_pivot(&mut buf, &table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "assignee_name  open  rejected  Total");
        assert_eq!(lines[1], "Alice          1     0         1");
        assert_eq!(lines[2], "Bob            0     1         1");
        assert_eq!(lines[3], "Total          1     1         2");
    }

    #[test]
    fn test_summary_notes_undated_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Data.csv");
        fs::write(&path, format!("{DATA}C3,K4,open,in_progress,Carol,kyc,\n")).unwrap();
        let mut session = DashboardSession::new(path, SchemaConfig::default(), FilterSpec::default());

        let mut buf = Vec::new();
        write_summary(&mut buf, session.run().unwrap()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Rows: 4 of 4"));
        assert!(text.contains("Note: 1 rows without a created_at date are included"));

        let dated = summary(FilterSpec::default(), false);
        assert!(!dated.contains("without a created_at"));
    }

    #[test]
    fn test_summary_with_totals() {
        let text = summary(FilterSpec::default(), true);
        assert!(text.contains("Total"));
    }
}
