//! Column normalization: header mapping, presence checks and derived fields.

use std::collections::{BTreeSet, HashSet};

use dashboard_core::error::DashboardError;
use dashboard_core::models::{
    CaseRecord, Dataset, DatasetColumn, Field, CHECK_STATUS_KPI_COLUMN,
    CHECK_STATUS_ORIGINAL_COLUMN,
};
use dashboard_core::schema::SchemaConfig;
use dashboard_core::time_utils::parse_timestamp;
use tracing::{debug, warn};

use crate::reader::RawTable;

/// A normalized dataset plus the non-fatal problems found while building it.
#[derive(Debug, Default)]
pub struct NormalizedDataset {
    pub dataset: Dataset,
    /// Only [`DashboardError::MissingColumn`] values.
    pub warnings: Vec<DashboardError>,
    /// Non-empty `created_at` cells that could not be parsed.
    pub unparseable_timestamps: usize,
}

impl NormalizedDataset {
    /// Human-readable warning lines for the presentation layer.
    pub fn warning_messages(&self) -> Vec<String> {
        let mut messages: Vec<String> = self.warnings.iter().map(|w| w.to_string()).collect();
        if self.unparseable_timestamps > 0 {
            messages.push(format!(
                "{} created_at values could not be parsed and were ignored",
                self.unparseable_timestamps
            ));
        }
        messages
    }
}

/// How one source column is consumed.
enum ColumnRole {
    Field(Field),
    Extra(String),
    /// A derived column from a previous export; recomputed instead.
    Derived,
}

/// Maps a [`RawTable`] onto the record schema described by a [`SchemaConfig`].
pub struct ColumnNormalizer<'a> {
    schema: &'a SchemaConfig,
}

impl<'a> ColumnNormalizer<'a> {
    pub fn new(schema: &'a SchemaConfig) -> Self {
        Self { schema }
    }

    /// Build the typed dataset.
    ///
    /// * unparseable `created_at` values become `None`;
    /// * empty `assignee_name` values become the unassigned sentinel;
    /// * `check_status_kpi` is derived from the raw check status.
    ///
    /// Missing schema columns never abort normalization.
    pub fn normalize(&self, raw: RawTable) -> NormalizedDataset {
        let (columns, roles) = self.map_columns(&raw.headers);

        let mut dataset = Dataset {
            columns,
            records: Vec::with_capacity(raw.rows.len()),
        };
        let warnings = self.check_presence(&dataset);

        let has_assignee = dataset.has(Field::AssigneeName);
        let mut unparseable_timestamps = 0usize;

        for row in raw.rows {
            let mut record = CaseRecord::default();
            for (cell, role) in row.into_iter().zip(roles.iter()) {
                match role {
                    ColumnRole::Field(field) => {
                        if *field == Field::CreatedAt && !cell.trim().is_empty() {
                            record.created_at = parse_timestamp(&cell);
                            if record.created_at.is_none() {
                                unparseable_timestamps += 1;
                            }
                        } else {
                            self.assign(&mut record, *field, cell);
                        }
                    }
                    ColumnRole::Extra(name) => {
                        record.extras.insert(name.clone(), cell);
                    }
                    ColumnRole::Derived => {}
                }
            }

            if has_assignee && record.assignee_name.is_none() {
                record.assignee_name = Some(self.schema.unassigned_label.clone());
            }
            record.check_status_kpi = record
                .check_status_original
                .as_deref()
                .map(|s| self.schema.check_status_kpi(s));

            dataset.records.push(record);
        }

        if unparseable_timestamps > 0 {
            warn!(
                "{} created_at values could not be parsed and were set to null",
                unparseable_timestamps
            );
        }

        NormalizedDataset {
            dataset,
            warnings,
            unparseable_timestamps,
        }
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn map_columns(&self, headers: &[String]) -> (Vec<DatasetColumn>, Vec<ColumnRole>) {
        let mut columns = Vec::with_capacity(headers.len());
        let mut roles = Vec::with_capacity(headers.len());
        let mut seen: BTreeSet<Field> = BTreeSet::new();
        let mut names: HashSet<String> = HashSet::new();

        for header in headers {
            let name = self.schema.normalize_header(header);

            if name == CHECK_STATUS_ORIGINAL_COLUMN || name == CHECK_STATUS_KPI_COLUMN {
                debug!("ignoring derived column '{}'", name);
                roles.push(ColumnRole::Derived);
                continue;
            }

            let field = self
                .schema
                .resolve(header)
                .filter(|f| !seen.contains(f));
            let name = unique_name(name, &names);
            names.insert(name.clone());
            match field {
                Some(f) => {
                    seen.insert(f);
                    roles.push(ColumnRole::Field(f));
                }
                None => roles.push(ColumnRole::Extra(name.clone())),
            }
            columns.push(DatasetColumn { name, field });
        }

        (columns, roles)
    }

    fn check_presence(&self, dataset: &Dataset) -> Vec<DashboardError> {
        let mut warnings = Vec::new();
        let expected = self
            .schema
            .required
            .iter()
            .chain(self.schema.optional.iter().filter(|f| !self.schema.is_required(**f)));

        for field in expected {
            if dataset.has(*field) {
                continue;
            }
            let required = self.schema.is_required(*field);
            if required {
                warn!("required column '{}' is missing in the dataset", field);
            } else {
                warn!("optional column '{}' is missing in the dataset", field);
            }
            warnings.push(DashboardError::MissingColumn {
                column: field.column_name().to_string(),
                required,
            });
        }
        warnings
    }

    fn assign(&self, record: &mut CaseRecord, field: Field, cell: String) {
        let value = if cell.trim().is_empty() {
            None
        } else {
            Some(cell)
        };
        match field {
            Field::CaseId => record.case_id = value,
            Field::CheckId => record.check_id = value,
            Field::CasesStatus => record.cases_status = value,
            Field::CheckStatus => record.check_status_original = value,
            Field::AssigneeName => record.assignee_name = value,
            Field::CheckType => record.check_type = value,
            Field::Country => record.country = value,
            Field::RiskLevel => record.risk_level = value,
            Field::IsPep => record.is_pep = value.as_deref().and_then(parse_bool),
            Field::CreatedAt => record.created_at = value.as_deref().and_then(parse_timestamp),
        }
    }
}

/// `name`, or `name.1`, `name.2`, ... when an earlier column already uses it.
fn unique_name(name: String, taken: &HashSet<String>) -> String {
    if !taken.contains(&name) {
        return name;
    }
    let renamed = (1..)
        .map(|n| format!("{name}.{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_default();
    debug!("duplicate column '{}' renamed to '{}'", name, renamed);
    renamed
}

/// Lenient boolean parsing for flag columns such as `is_pep`.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" | "1.0" => Some(true),
        "false" | "f" | "no" | "n" | "0" | "0.0" => Some(false),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
