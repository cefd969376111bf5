//! KPI counts, monthly distributions and cross-tabulations.
//!
//! Every count here is a distinct-identifier count: one case joined to five
//! check rows contributes one to the case figures.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use dashboard_core::models::CaseRecord;
use dashboard_core::schema::SchemaConfig;
use dashboard_core::time_utils::month_key;
use serde::Serialize;

// ── KPIs ──────────────────────────────────────────────────────────────────────

/// Case KPIs: distinct `case_id` per case status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaseKpis {
    pub open: u64,
    pub approved: u64,
    pub rejected: u64,
    pub total: u64,
}

/// Check KPIs: distinct `check_id` per collapsed check status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckKpis {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KpiSummary {
    pub cases: CaseKpis,
    pub checks: CheckKpis,
}

// ── PivotTable ────────────────────────────────────────────────────────────────

/// Grand totals computed from a pivot table's own cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PivotTotals {
    /// One per row.
    pub rows: Vec<u64>,
    /// One per column.
    pub columns: Vec<u64>,
    pub grand: u64,
}

/// A wide table of distinct-id counts keyed by two categorical dimensions.
///
/// Missing combinations hold `0`. Row and column labels are sorted, which
/// for `"%Y-%m"` month keys is chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PivotTable {
    /// Label of the row dimension, e.g. `"Month"` or `"assignee_name"`.
    pub index_name: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `cells[row][column]`.
    pub cells: Vec<Vec<u64>>,
    pub totals: Option<PivotTotals>,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count at (`row`, `column`), `0` for unknown labels.
    pub fn get(&self, row: &str, column: &str) -> u64 {
        let Some(r) = self.rows.iter().position(|x| x == row) else {
            return 0;
        };
        let Some(c) = self.columns.iter().position(|x| x == column) else {
            return 0;
        };
        self.cells[r][c]
    }

    /// Sum of every cell.
    pub fn cell_sum(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }

    /// Attach a grand-total row and column derived from the cells.
    pub fn with_totals(mut self) -> Self {
        let rows: Vec<u64> = self.cells.iter().map(|r| r.iter().sum()).collect();
        let columns: Vec<u64> = (0..self.columns.len())
            .map(|c| self.cells.iter().map(|r| r[c]).sum())
            .collect();
        let grand = rows.iter().sum();
        self.totals = Some(PivotTotals {
            rows,
            columns,
            grand,
        });
        self
    }
}

// ── ReportAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that summarises a filtered subset.
pub struct ReportAggregator;

impl ReportAggregator {
    /// Case and check KPIs using the status labels configured in `schema`.
    pub fn kpis<'a, I>(records: I, schema: &SchemaConfig) -> KpiSummary
    where
        I: IntoIterator<Item = &'a CaseRecord>,
    {
        let mut case_ids: HashSet<&str> = HashSet::new();
        let mut open: HashSet<&str> = HashSet::new();
        let mut case_approved: HashSet<&str> = HashSet::new();
        let mut case_rejected: HashSet<&str> = HashSet::new();

        let mut check_ids: HashSet<&str> = HashSet::new();
        let mut pending: HashSet<&str> = HashSet::new();
        let mut check_approved: HashSet<&str> = HashSet::new();
        let mut check_rejected: HashSet<&str> = HashSet::new();

        for record in records {
            if let Some(id) = record.case_id.as_deref() {
                case_ids.insert(id);
                match record.cases_status.as_deref() {
                    Some(s) if s == schema.open_status => {
                        open.insert(id);
                    }
                    Some(s) if s == schema.approved_status => {
                        case_approved.insert(id);
                    }
                    Some(s) if s == schema.rejected_status => {
                        case_rejected.insert(id);
                    }
                    _ => {}
                }
            }
            if let Some(id) = record.check_id.as_deref() {
                check_ids.insert(id);
                match record.check_status_kpi.as_deref() {
                    Some(s) if s == schema.pending_status => {
                        pending.insert(id);
                    }
                    Some(s) if s == schema.approved_status => {
                        check_approved.insert(id);
                    }
                    Some(s) if s == schema.rejected_status => {
                        check_rejected.insert(id);
                    }
                    _ => {}
                }
            }
        }

        KpiSummary {
            cases: CaseKpis {
                open: open.len() as u64,
                approved: case_approved.len() as u64,
                rejected: case_rejected.len() as u64,
                total: case_ids.len() as u64,
            },
            checks: CheckKpis {
                pending: pending.len() as u64,
                approved: check_approved.len() as u64,
                rejected: check_rejected.len() as u64,
                total: check_ids.len() as u64,
            },
        }
    }

    /// Distinct cases per (month, assignee). Rows are months.
    pub fn monthly_cases<'a, I>(records: I) -> PivotTable
    where
        I: IntoIterator<Item = &'a CaseRecord>,
    {
        Self::pivot(
            records,
            "Month",
            |r| r.created_at.map(month_key),
            |r| r.assignee_name.clone(),
            |r| r.case_id.as_deref(),
        )
    }

    /// Distinct checks per (month, assignee). Rows are months.
    pub fn monthly_checks<'a, I>(records: I) -> PivotTable
    where
        I: IntoIterator<Item = &'a CaseRecord>,
    {
        Self::pivot(
            records,
            "Month",
            |r| r.created_at.map(month_key),
            |r| r.assignee_name.clone(),
            |r| r.check_id.as_deref(),
        )
    }

    /// Distinct cases per (assignee, case status).
    pub fn cases_by_assignee<'a, I>(records: I) -> PivotTable
    where
        I: IntoIterator<Item = &'a CaseRecord>,
    {
        Self::pivot(
            records,
            "assignee_name",
            |r| r.assignee_name.clone(),
            |r| r.cases_status.clone(),
            |r| r.case_id.as_deref(),
        )
    }

    /// Distinct checks per (assignee, raw check status).
    pub fn checks_by_assignee<'a, I>(records: I) -> PivotTable
    where
        I: IntoIterator<Item = &'a CaseRecord>,
    {
        Self::pivot(
            records,
            "assignee_name",
            |r| r.assignee_name.clone(),
            |r| r.check_status_original.clone(),
            |r| r.check_id.as_deref(),
        )
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Generic distinct-count pivot.
    ///
    /// Records with an empty row key, column key or id are skipped.
    fn pivot<'a, I>(
        records: I,
        index_name: &str,
        row_key: impl Fn(&CaseRecord) -> Option<String>,
        column_key: impl Fn(&CaseRecord) -> Option<String>,
        id_key: impl Fn(&'a CaseRecord) -> Option<&'a str>,
    ) -> PivotTable
    where
        I: IntoIterator<Item = &'a CaseRecord>,
    {
        // BTreeMap keeps both dimensions sorted.
        let mut groups: BTreeMap<String, BTreeMap<String, HashSet<&'a str>>> = BTreeMap::new();
        let mut all_columns: BTreeSet<String> = BTreeSet::new();

        for record in records {
            let (Some(row), Some(column), Some(id)) =
                (row_key(record), column_key(record), id_key(record))
            else {
                continue;
            };
            all_columns.insert(column.clone());
            groups
                .entry(row)
                .or_default()
                .entry(column)
                .or_default()
                .insert(id);
        }

        let columns: Vec<String> = all_columns.into_iter().collect();
        let mut rows = Vec::with_capacity(groups.len());
        let mut cells = Vec::with_capacity(groups.len());
        for (row, by_column) in groups {
            cells.push(
                columns
                    .iter()
                    .map(|c| by_column.get(c).map_or(0, |ids| ids.len() as u64))
                    .collect(),
            );
            rows.push(row);
        }

        PivotTable {
            index_name: index_name.to_string(),
            rows,
            columns,
            cells,
            totals: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
