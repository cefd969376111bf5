//! CSV export of the filtered subset.
//!
//! Output is UTF-8, comma-delimited, with a header row. Source columns keep
//! their file order; the derived `check_status_original` and
//! `check_status_kpi` columns are appended when a check status exists.

use std::io::Write;
use std::path::Path;

use dashboard_core::error::{DashboardError, Result};
use dashboard_core::models::{
    CaseRecord, Dataset, Field, CHECK_STATUS_KPI_COLUMN, CHECK_STATUS_ORIGINAL_COLUMN,
};
use dashboard_core::time_utils::format_timestamp;
use tracing::info;

enum ExportColumn<'a> {
    Field(Field),
    Extra(&'a str),
    CheckStatusOriginal,
    CheckStatusKpi,
}

/// Write `records` as CSV to `writer`.
pub fn write_csv<'a, W, I>(writer: W, dataset: &Dataset, records: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a CaseRecord>,
{
    let columns = export_columns(dataset);
    let mut wtr = csv::Writer::from_writer(writer);

    let header: Vec<&str> = dataset
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .chain(
            columns
                .iter()
                .filter_map(|c| match c {
                    ExportColumn::CheckStatusOriginal => Some(CHECK_STATUS_ORIGINAL_COLUMN),
                    ExportColumn::CheckStatusKpi => Some(CHECK_STATUS_KPI_COLUMN),
                    _ => None,
                }),
        )
        .collect();
    wtr.write_record(&header)?;

    for record in records {
        let row: Vec<String> = columns.iter().map(|c| cell(record, c)).collect();
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write `records` to `path`, returning the number of data rows written.
pub fn export_to_path<'a, I>(path: &Path, dataset: &Dataset, records: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a CaseRecord>,
{
    let file = std::fs::File::create(path).map_err(|source| DashboardError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    let mut count = 0usize;
    write_csv(
        std::io::BufWriter::new(file),
        dataset,
        records.into_iter().inspect(|_| count += 1),
    )?;
    info!("exported {} rows to {}", count, path.display());
    Ok(count)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn export_columns(dataset: &Dataset) -> Vec<ExportColumn<'_>> {
    let mut columns: Vec<ExportColumn<'_>> = dataset
        .columns
        .iter()
        .map(|c| match c.field {
            Some(f) => ExportColumn::Field(f),
            None => ExportColumn::Extra(c.name.as_str()),
        })
        .collect();
    if dataset.has(Field::CheckStatus) {
        columns.push(ExportColumn::CheckStatusOriginal);
        columns.push(ExportColumn::CheckStatusKpi);
    }
    columns
}

fn cell(record: &CaseRecord, column: &ExportColumn<'_>) -> String {
    match column {
        ExportColumn::Field(Field::IsPep) => record
            .is_pep
            .map(|b| if b { "True" } else { "False" }.to_string())
            .unwrap_or_default(),
        ExportColumn::Field(Field::CreatedAt) => {
            record.created_at.map(format_timestamp).unwrap_or_default()
        }
        ExportColumn::Field(f) => record.text(*f).unwrap_or_default().to_string(),
        ExportColumn::Extra(name) => record.extras.get(*name).cloned().unwrap_or_default(),
        ExportColumn::CheckStatusOriginal => {
            record.check_status_original.clone().unwrap_or_default()
        }
        ExportColumn::CheckStatusKpi => record.check_status_kpi.clone().unwrap_or_default(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
