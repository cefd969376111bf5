use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ── Field ─────────────────────────────────────────────────────────────────────

/// A schema field the dashboard knows how to interpret.
///
/// Source columns are mapped onto these fields by [`crate::schema::SchemaConfig`];
/// everything else is carried through untouched as an extra column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CaseId,
    CheckId,
    CasesStatus,
    CheckStatus,
    AssigneeName,
    CheckType,
    Country,
    RiskLevel,
    IsPep,
    CreatedAt,
}

impl Field {
    /// Every field, in canonical column order.
    pub const ALL: [Field; 10] = [
        Field::CaseId,
        Field::CheckId,
        Field::CasesStatus,
        Field::CheckStatus,
        Field::AssigneeName,
        Field::CheckType,
        Field::Country,
        Field::RiskLevel,
        Field::IsPep,
        Field::CreatedAt,
    ];

    /// Canonical (normalized) column name.
    pub fn column_name(self) -> &'static str {
        match self {
            Field::CaseId => "case_id",
            Field::CheckId => "check_id",
            Field::CasesStatus => "cases_status",
            Field::CheckStatus => "check_status",
            Field::AssigneeName => "assignee_name",
            Field::CheckType => "check_type",
            Field::Country => "country",
            Field::RiskLevel => "risk_level",
            Field::IsPep => "is_pep",
            Field::CreatedAt => "created_at",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Name of the derived column holding the raw check status.
pub const CHECK_STATUS_ORIGINAL_COLUMN: &str = "check_status_original";

/// Name of the derived column holding the collapsed KPI check status.
pub const CHECK_STATUS_KPI_COLUMN: &str = "check_status_kpi";

// ── CaseRecord ────────────────────────────────────────────────────────────────

/// One row of the dataset: a single (case, check) pairing.
///
/// Every schema field is optional because the source column may be absent
/// or the cell empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseRecord {
    pub case_id: Option<String>,
    pub check_id: Option<String>,
    pub cases_status: Option<String>,
    pub check_status_original: Option<String>,
    /// Pure function of `check_status_original`.
    pub check_status_kpi: Option<String>,
    pub assignee_name: Option<String>,
    pub check_type: Option<String>,
    pub country: Option<String>,
    pub risk_level: Option<String>,
    pub is_pep: Option<bool>,
    /// Timezone-naive creation time; `None` when missing or unparseable.
    pub created_at: Option<NaiveDateTime>,
    /// Unmapped source columns, keyed by normalized column name.
    pub extras: BTreeMap<String, String>,
}

impl CaseRecord {
    /// Text value of a string-valued field.
    ///
    /// Returns `None` for `IsPep` and `CreatedAt`, which are not text.
    pub fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::CaseId => &self.case_id,
            Field::CheckId => &self.check_id,
            Field::CasesStatus => &self.cases_status,
            Field::CheckStatus => &self.check_status_original,
            Field::AssigneeName => &self.assignee_name,
            Field::CheckType => &self.check_type,
            Field::Country => &self.country,
            Field::RiskLevel => &self.risk_level,
            Field::IsPep | Field::CreatedAt => return None,
        };
        value.as_deref()
    }
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// A source column as it appears in the loaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetColumn {
    /// Normalized header name.
    pub name: String,
    /// Schema field this column was mapped to, if any.
    pub field: Option<Field>,
}

/// The normalized, read-only base table.
///
/// Filtering never mutates a `Dataset`; it only selects records from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Source columns in file order.
    pub columns: Vec<DatasetColumn>,
    /// Records in file order.
    pub records: Vec<CaseRecord>,
}

impl Dataset {
    /// `true` when a source column was mapped to `field`.
    pub fn has(&self, field: Field) -> bool {
        self.columns.iter().any(|c| c.field == Some(field))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_column_names_are_unique() {
        let mut names: Vec<&str> = Field::ALL.iter().map(|f| f.column_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Field::ALL.len());
    }

    #[test]
    fn test_field_serde_uses_column_name() {
        let json = serde_json::to_string(&Field::AssigneeName).unwrap();
        assert_eq!(json, "\"assignee_name\"");
        let back: Field = serde_json::from_str("\"created_at\"").unwrap();
        assert_eq!(back, Field::CreatedAt);
    }

    #[test]
    fn test_record_text_lookup() {
        let record = CaseRecord {
            case_id: Some("C1".to_string()),
            check_status_original: Some("in_progress".to_string()),
            check_status_kpi: Some("pending".to_string()),
            is_pep: Some(true),
            ..Default::default()
        };
        assert_eq!(record.text(Field::CaseId), Some("C1"));
        assert_eq!(record.text(Field::CheckStatus), Some("in_progress"));
        assert_eq!(record.text(Field::Country), None);
        assert_eq!(record.text(Field::IsPep), None);
    }

    #[test]
    fn test_dataset_has_field() {
        let dataset = Dataset {
            columns: vec![
                DatasetColumn {
                    name: "case_id".to_string(),
                    field: Some(Field::CaseId),
                },
                DatasetColumn {
                    name: "notes".to_string(),
                    field: None,
                },
            ],
            records: Vec::new(),
        };
        assert!(dataset.has(Field::CaseId));
        assert!(!dataset.has(Field::Country));
        assert!(dataset.is_empty());
    }
}
