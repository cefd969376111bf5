//! Column mapping and derived-field rules.
//!
//! A single [`SchemaConfig`] describes how raw header names map onto
//! [`Field`]s and how derived values (KPI check status, unassigned sentinel)
//! are computed, so dashboards over similar files share one pipeline.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::models::Field;

/// Sentinel assignee used when `assignee_name` is empty.
pub const DEFAULT_UNASSIGNED: &str = "Un-assignee";

/// Raw check statuses collapsed into the pending KPI bucket.
pub const DEFAULT_PENDING_STATUSES: [&str; 3] = ["in_progress", "processing", "need_review"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Display name of the dashboard variant.
    pub name: String,
    /// Trim whitespace and lowercase header names before matching.
    pub normalize_headers: bool,
    /// Accepted header names per field. Fields without an entry match their
    /// canonical column name.
    pub columns: BTreeMap<Field, Vec<String>>,
    /// Fields whose absence is reported as a required-column warning.
    pub required: Vec<Field>,
    /// Fields whose absence is reported as an optional-column warning.
    pub optional: Vec<Field>,
    /// Raw check statuses that collapse into `pending_status`.
    pub pending_statuses: Vec<String>,
    pub pending_status: String,
    pub open_status: String,
    pub approved_status: String,
    pub rejected_status: String,
    /// Replacement for empty assignee names.
    pub unassigned_label: String,
    /// Append grand-total rows and columns to cross-tabulations.
    pub include_totals: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            name: "Case Dashboard".to_string(),
            normalize_headers: true,
            columns: BTreeMap::new(),
            required: vec![
                Field::CreatedAt,
                Field::AssigneeName,
                Field::CheckStatus,
                Field::CaseId,
                Field::CheckId,
                Field::CasesStatus,
                Field::CheckType,
            ],
            optional: vec![Field::Country, Field::RiskLevel, Field::IsPep],
            pending_statuses: DEFAULT_PENDING_STATUSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            pending_status: "pending".to_string(),
            open_status: "open".to_string(),
            approved_status: "approved".to_string(),
            rejected_status: "rejected".to_string(),
            unassigned_label: DEFAULT_UNASSIGNED.to_string(),
            include_totals: false,
        }
    }
}

impl SchemaConfig {
    /// Load a schema from a JSON document. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DashboardError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply the header normalization rule to a raw header.
    pub fn normalize_header(&self, raw: &str) -> String {
        if self.normalize_headers {
            raw.trim().to_lowercase()
        } else {
            raw.to_string()
        }
    }

    /// Map a raw header onto a schema field.
    pub fn resolve(&self, raw_header: &str) -> Option<Field> {
        let header = self.normalize_header(raw_header);
        Field::ALL.into_iter().find(|field| match self.columns.get(field) {
            Some(aliases) => aliases.iter().any(|a| self.normalize_header(a) == header),
            None => header == field.column_name(),
        })
    }

    /// `true` when absence of `field` should be reported as required.
    pub fn is_required(&self, field: Field) -> bool {
        self.required.contains(&field)
    }

    /// Collapse a raw check status into its KPI bucket.
    ///
    /// Pending aliases map to `pending_status`; anything else maps to itself.
    pub fn check_status_kpi(&self, raw: &str) -> String {
        if self.pending_statuses.iter().any(|s| s == raw) {
            self.pending_status.clone()
        } else {
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_trims_and_casefolds() {
        let schema = SchemaConfig::default();
        assert_eq!(schema.resolve("  Created_At "), Some(Field::CreatedAt));
        assert_eq!(schema.resolve("CASE_ID"), Some(Field::CaseId));
        assert_eq!(schema.resolve("notes"), None);
    }

    #[test]
    fn test_resolve_without_normalization_is_exact() {
        let schema = SchemaConfig {
            normalize_headers: false,
            ..Default::default()
        };
        assert_eq!(schema.resolve("created_at"), Some(Field::CreatedAt));
        assert_eq!(schema.resolve("Created_At"), None);
    }

    #[test]
    fn test_resolve_with_aliases() {
        let mut schema = SchemaConfig::default();
        schema
            .columns
            .insert(Field::AssigneeName, vec!["Analyst".to_string(), "owner".to_string()]);
        assert_eq!(schema.resolve("analyst"), Some(Field::AssigneeName));
        assert_eq!(schema.resolve("Owner"), Some(Field::AssigneeName));
        // The canonical name no longer matches once aliases are configured.
        assert_eq!(schema.resolve("assignee_name"), None);
    }

    #[test]
    fn test_check_status_kpi_mapping() {
        let schema = SchemaConfig::default();
        assert_eq!(schema.check_status_kpi("in_progress"), "pending");
        assert_eq!(schema.check_status_kpi("processing"), "pending");
        assert_eq!(schema.check_status_kpi("need_review"), "pending");
        assert_eq!(schema.check_status_kpi("approved"), "approved");
        assert_eq!(schema.check_status_kpi("rejected"), "rejected");
        assert_eq!(schema.check_status_kpi("weird"), "weird");
    }

    #[test]
    fn test_check_status_kpi_is_deterministic() {
        let schema = SchemaConfig::default();
        for raw in ["in_progress", "approved", "", "PENDING"] {
            assert_eq!(schema.check_status_kpi(raw), schema.check_status_kpi(raw));
        }
    }

    #[test]
    fn test_from_file_partial_document_keeps_defaults() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("schema.json");
        std::fs::write(
            &path,
            r#"{ "name": "Checks", "include_totals": true, "columns": { "assignee_name": ["agent"] } }"#,
        )
        .expect("write");

        let schema = SchemaConfig::from_file(&path).expect("load");
        assert_eq!(schema.name, "Checks");
        assert!(schema.include_totals);
        assert_eq!(schema.unassigned_label, DEFAULT_UNASSIGNED);
        assert_eq!(schema.resolve("Agent"), Some(Field::AssigneeName));
    }

    #[test]
    fn test_from_file_missing_is_file_read_error() {
        let tmp = TempDir::new().expect("tempdir");
        let err = SchemaConfig::from_file(&tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, DashboardError::FileRead { .. }));
    }
}
