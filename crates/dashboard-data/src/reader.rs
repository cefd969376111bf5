//! Tabular file loading for the case dashboard.
//!
//! Reads a delimited file into a [`RawTable`] of strings and hands it to the
//! [`ColumnNormalizer`] to produce the typed, read-only [`Dataset`].
//!
//! [`Dataset`]: dashboard_core::models::Dataset

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use dashboard_core::error::{DashboardError, Result};
use dashboard_core::schema::SchemaConfig;
use tracing::{debug, info};

use crate::normalizer::{ColumnNormalizer, NormalizedDataset};

/// Untyped table as read from disk: one header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    /// Each row has exactly `headers.len()` cells.
    pub rows: Vec<Vec<String>>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Read `path` and normalize it against `schema`.
///
/// Only an unreadable or malformed file is an error; missing columns are
/// reported as warnings on the returned [`NormalizedDataset`].
pub fn load_dataset(path: &Path, schema: &SchemaConfig) -> Result<NormalizedDataset> {
    let started = Instant::now();
    let raw = read_table(path)?;
    let normalized = ColumnNormalizer::new(schema).normalize(raw);

    info!(
        rows = normalized.dataset.len(),
        columns = normalized.dataset.columns.len(),
        warnings = normalized.warnings.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "loaded {}",
        path.display()
    );

    Ok(normalized)
}

/// Read a `.csv` (comma) or `.tsv` (tab) file into a [`RawTable`].
pub fn read_table(path: &Path) -> Result<RawTable> {
    let delimiter = delimiter_for(path)?;
    let file = std::fs::File::open(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    read_table_from(file, delimiter)
}

/// Read delimited text from any reader. The first record is the header row.
///
/// Short rows are padded with empty cells and long rows truncated so every
/// row lines up with the header.
pub fn read_table_from<R: Read>(reader: R, delimiter: u8) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let width = headers.len();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    debug!("read {} rows with {} columns", rows.len(), width);
    Ok(RawTable { headers, rows })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn delimiter_for(path: &Path) -> Result<u8> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match ext.as_deref() {
        Some("csv") | Some("txt") => Ok(b','),
        Some("tsv") => Ok(b'\t'),
        _ => Err(DashboardError::UnsupportedFormat(path.to_path_buf())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::models::Field;
    use tempfile::TempDir;

    #[test]
    fn test_read_table_from_pads_short_rows() {
        let data = "a,b,c\n1,2,3\n4,5\n";
        let table = read_table_from(data.as_bytes(), b',').unwrap();
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["4", "5", ""]);
    }

    #[test]
    fn test_read_table_from_strips_bom_and_handles_quotes() {
        let data = "\u{feff}case_id,notes\nC1,\"hello, world\"\n";
        let table = read_table_from(data.as_bytes(), b',').unwrap();
        assert_eq!(table.headers[0], "case_id");
        assert_eq!(table.rows[0][1], "hello, world");
    }

    #[test]
    fn test_read_table_from_header_only() {
        let table = read_table_from("case_id,check_id\n".as_bytes(), b',').unwrap();
        assert_eq!(table.headers.len(), 2);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_read_table_tsv_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cases.tsv");
        std::fs::write(&path, "case_id\tcountry\nC1\tFrance\n").unwrap();
        let table = read_table(&path).unwrap();
        assert_eq!(table.headers, vec!["case_id", "country"]);
        assert_eq!(table.rows[0], vec!["C1", "France"]);
    }

    #[test]
    fn test_read_table_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = read_table(&tmp.path().join("Data.csv")).unwrap_err();
        assert!(matches!(err, DashboardError::FileRead { .. }));
    }

    #[test]
    fn test_read_table_unsupported_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Data.xlsx");
        std::fs::write(&path, b"PK").unwrap();
        let err = read_table(&path).unwrap_err();
        assert!(matches!(err, DashboardError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_load_dataset_normalizes_headers() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Data.csv");
        std::fs::write(
            &path,
            " Case_ID ,CHECK_ID,cases_status,check_status,assignee_name,check_type,created_at\n\
             C1,K1,open,in_progress,,kyc,2024-01-15 10:00:00\n",
        )
        .unwrap();

        let loaded = load_dataset(&path, &SchemaConfig::default()).unwrap();
        assert!(loaded.dataset.has(Field::CaseId));
        assert!(loaded.dataset.has(Field::CheckId));
        assert_eq!(loaded.dataset.columns[0].name, "case_id");
        let record = &loaded.dataset.records[0];
        assert_eq!(record.assignee_name.as_deref(), Some("Un-assignee"));
        assert_eq!(record.check_status_kpi.as_deref(), Some("pending"));
    }
}
