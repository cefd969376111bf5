//! The filter engine: derives the filtered subset of a dataset.
//!
//! Filtering never mutates the [`Dataset`]; it returns the indices of the
//! matching records in source order.

use std::collections::HashSet;

use chrono::NaiveDate;
use dashboard_core::filters::{FilterSpec, PepFilter, Selection};
use dashboard_core::models::{CaseRecord, Dataset, Field};
use tracing::{debug, warn};

/// Indices of the records that satisfied every applied constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Positions in `Dataset::records`, ascending.
    pub indices: Vec<usize>,
    /// Constraints that were requested but skipped because their column is
    /// absent from the dataset.
    pub skipped: Vec<Field>,
}

impl FilterOutcome {
    /// Iterate over the matching records of `dataset`.
    pub fn records<'a>(&'a self, dataset: &'a Dataset) -> impl Iterator<Item = &'a CaseRecord> {
        self.indices.iter().filter_map(|&i| dataset.records.get(i))
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Stateless helper that applies a [`FilterSpec`] to a [`Dataset`].
pub struct FilterEngine;

impl FilterEngine {
    /// Apply every active constraint (logical AND).
    ///
    /// A constraint whose column is missing is skipped rather than eliminating
    /// every row; the skipped fields are listed on the outcome.
    pub fn apply(dataset: &Dataset, spec: &FilterSpec) -> FilterOutcome {
        let mut skipped: Vec<Field> = Vec::new();
        let mut selections: Vec<(Field, Selection)> = Vec::new();

        let country = Self::effective_country_selection(dataset, spec);
        let requested = [
            (Field::CasesStatus, spec.cases_status.clone()),
            (Field::CheckStatus, spec.check_status.clone()),
            (Field::AssigneeName, spec.assignee.clone()),
            (Field::CheckType, spec.check_type.clone()),
            (Field::Country, country),
            (Field::RiskLevel, spec.risk_level.clone()),
        ];
        for (field, selection) in requested {
            if selection.is_all() {
                continue;
            }
            if dataset.has(field) {
                selections.push((field, selection));
            } else {
                skipped.push(field);
            }
        }

        let pep = if spec.pep != PepFilter::All && !dataset.has(Field::IsPep) {
            skipped.push(Field::IsPep);
            PepFilter::All
        } else {
            spec.pep
        };

        let date_range = if !spec.date_range.is_open() && !dataset.has(Field::CreatedAt) {
            skipped.push(Field::CreatedAt);
            None
        } else {
            Some(spec.date_range)
        };

        for field in &skipped {
            warn!("skipping filter on missing column '{}'", field);
        }

        let indices: Vec<usize> = dataset
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                selections
                    .iter()
                    .all(|(field, selection)| selection.matches(record.text(*field)))
                    && pep.matches(record.is_pep)
                    && date_range.map_or(true, |r| r.contains(record.created_at))
            })
            .map(|(i, _)| i)
            .collect();

        debug!(
            "filter kept {} of {} records ({})",
            indices.len(),
            dataset.len(),
            spec.describe()
        );

        FilterOutcome { indices, skipped }
    }

    /// Distinct non-empty values of `field`, in first-seen order.
    ///
    /// Used to populate selection widgets. A missing or empty column yields
    /// an empty list.
    pub fn options(dataset: &Dataset, field: Field) -> Vec<String> {
        if !dataset.has(field) {
            return Vec::new();
        }
        let mut seen: HashSet<&str> = HashSet::new();
        dataset
            .records
            .iter()
            .filter_map(|r| r.text(field))
            .filter(|v| seen.insert(*v))
            .map(str::to_string)
            .collect()
    }

    /// Countries whose name contains `search`, ignoring case.
    ///
    /// An empty search returns every country.
    pub fn country_candidates(dataset: &Dataset, search: &str) -> Vec<String> {
        let needle = search.trim().to_lowercase();
        Self::options(dataset, Field::Country)
            .into_iter()
            .filter(|c| needle.is_empty() || c.to_lowercase().contains(&needle))
            .collect()
    }

    /// Earliest and latest `created_at` dates, if any timestamp parsed.
    pub fn date_span(dataset: &Dataset) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = dataset
            .records
            .iter()
            .filter_map(|r| r.created_at.map(|ts| ts.date()));
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Resolve the country selection after applying the free-text search.
    ///
    /// The search narrows the candidates: with no explicit list the matches
    /// become the selection, with a list only matching entries remain.
    fn effective_country_selection(dataset: &Dataset, spec: &FilterSpec) -> Selection {
        let Some(search) = spec.country_search.as_deref().filter(|s| !s.trim().is_empty()) else {
            return spec.country.clone();
        };
        let needle = search.trim().to_lowercase();
        match &spec.country {
            Selection::All => {
                Selection::Only(Self::country_candidates(dataset, search).into_iter().collect())
            }
            Selection::Only(values) => Selection::Only(
                values
                    .iter()
                    .filter(|c| c.to_lowercase().contains(&needle))
                    .cloned()
                    .collect(),
            ),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::filters::DateRange;
    use dashboard_core::models::DatasetColumn;
    use chrono::NaiveDateTime;

    fn columns(fields: &[Field]) -> Vec<DatasetColumn> {
        fields
            .iter()
            .map(|f| DatasetColumn {
                name: f.column_name().to_string(),
                field: Some(*f),
            })
            .collect()
    }

    fn record(
        case_id: &str,
        check_id: &str,
        cases_status: &str,
        check_status: &str,
        country: Option<&str>,
        is_pep: Option<bool>,
        created_at: Option<&str>,
    ) -> CaseRecord {
        CaseRecord {
            case_id: Some(case_id.to_string()),
            check_id: Some(check_id.to_string()),
            cases_status: Some(cases_status.to_string()),
            check_status_original: Some(check_status.to_string()),
            check_status_kpi: Some(check_status.to_string()),
            assignee_name: Some("Alice".to_string()),
            check_type: Some("kyc".to_string()),
            country: country.map(str::to_string),
            risk_level: Some("low".to_string()),
            is_pep,
            created_at: created_at
                .map(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()),
            ..Default::default()
        }
    }

    fn sample() -> Dataset {
        Dataset {
            columns: columns(&Field::ALL),
            records: vec![
                record("C1", "K1", "open", "in_progress", Some("France"), Some(true), Some("2024-01-05 09:00:00")),
                record("C1", "K2", "open", "approved", Some("France"), Some(true), Some("2024-01-05 10:00:00")),
                record("C2", "K3", "rejected", "rejected", Some("Finland"), Some(false), Some("2024-02-10 00:00:00")),
                record("C3", "K4", "approved", "approved", None, None, None),
            ],
        }
    }

    #[test]
    fn test_unconstrained_keeps_everything_in_order() {
        let ds = sample();
        let out = FilterEngine::apply(&ds, &FilterSpec::default());
        assert_eq!(out.indices, vec![0, 1, 2, 3]);
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn test_set_membership_is_or_within_and_across() {
        let ds = sample();
        let spec = FilterSpec {
            cases_status: Selection::from_values(["open", "rejected"]),
            check_status: Selection::from_values(["approved", "rejected"]),
            ..Default::default()
        };
        let out = FilterEngine::apply(&ds, &spec);
        assert_eq!(out.indices, vec![1, 2]);
    }

    #[test]
    fn test_every_kept_row_satisfies_all_constraints() {
        let ds = sample();
        let spec = FilterSpec {
            cases_status: Selection::from_values(["open", "rejected", "approved"]),
            pep: PepFilter::Yes,
            date_range: DateRange::new(NaiveDate::from_ymd_opt(2024, 1, 1), None),
            ..Default::default()
        };
        let out = FilterEngine::apply(&ds, &spec);
        assert!(out.len() <= ds.len());
        for r in out.records(&ds) {
            assert_eq!(r.is_pep, Some(true));
            assert!(spec.date_range.contains(r.created_at));
        }
        assert_eq!(out.indices, vec![0, 1]);
    }

    #[test]
    fn test_pep_no_excludes_nulls() {
        let ds = sample();
        let spec = FilterSpec {
            pep: PepFilter::No,
            ..Default::default()
        };
        assert_eq!(FilterEngine::apply(&ds, &spec).indices, vec![2]);
    }

    #[test]
    fn test_date_range_excluding_everything_is_empty() {
        let ds = sample();
        let spec = FilterSpec {
            date_range: DateRange::new(
                NaiveDate::from_ymd_opt(2030, 1, 1),
                NaiveDate::from_ymd_opt(2030, 12, 31),
            ),
            ..Default::default()
        };
        let out = FilterEngine::apply(&ds, &spec);
        assert!(out.is_empty());
    }

    #[test]
    fn test_country_search_narrows_candidates() {
        let ds = sample();
        let spec = FilterSpec {
            country_search: Some("FIN".to_string()),
            ..Default::default()
        };
        assert_eq!(FilterEngine::apply(&ds, &spec).indices, vec![2]);

        let spec = FilterSpec {
            country: Selection::from_values(["France", "Finland"]),
            country_search: Some("fra".to_string()),
            ..Default::default()
        };
        assert_eq!(FilterEngine::apply(&ds, &spec).indices, vec![0, 1]);
    }

    #[test]
    fn test_country_search_without_match_is_empty() {
        let ds = sample();
        let spec = FilterSpec {
            country_search: Some("atlantis".to_string()),
            ..Default::default()
        };
        assert!(FilterEngine::apply(&ds, &spec).is_empty());
    }

    #[test]
    fn test_missing_column_filter_is_skipped() {
        let mut ds = sample();
        ds.columns.retain(|c| c.field != Some(Field::Country) && c.field != Some(Field::IsPep));
        let spec = FilterSpec {
            country: Selection::from_values(["France"]),
            pep: PepFilter::Yes,
            cases_status: Selection::from_values(["open"]),
            ..Default::default()
        };
        let out = FilterEngine::apply(&ds, &spec);
        assert_eq!(out.indices, vec![0, 1]);
        assert_eq!(out.skipped, vec![Field::Country, Field::IsPep]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let ds = sample();
        let spec = FilterSpec {
            check_status: Selection::from_values(["approved"]),
            ..Default::default()
        };
        assert_eq!(FilterEngine::apply(&ds, &spec), FilterEngine::apply(&ds, &spec));
    }

    #[test]
    fn test_options_first_seen_distinct() {
        let ds = sample();
        assert_eq!(
            FilterEngine::options(&ds, Field::CasesStatus),
            vec!["open", "rejected", "approved"]
        );
        assert_eq!(FilterEngine::options(&ds, Field::Country), vec!["France", "Finland"]);
    }

    #[test]
    fn test_options_missing_column_is_empty() {
        let mut ds = sample();
        ds.columns.retain(|c| c.field != Some(Field::RiskLevel));
        assert!(FilterEngine::options(&ds, Field::RiskLevel).is_empty());
    }

    #[test]
    fn test_country_candidates_case_insensitive() {
        let ds = sample();
        assert_eq!(FilterEngine::country_candidates(&ds, "f"), vec!["France", "Finland"]);
        assert_eq!(FilterEngine::country_candidates(&ds, "LAND"), vec!["Finland"]);
        assert_eq!(FilterEngine::country_candidates(&ds, ""), vec!["France", "Finland"]);
    }

    #[test]
    fn test_date_span() {
        let ds = sample();
        assert_eq!(
            FilterEngine::date_span(&ds),
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
            ))
        );
        assert_eq!(FilterEngine::date_span(&Dataset::default()), None);
    }

    #[test]
    fn test_undated_rows_survive_only_without_date_bounds() {
        let ds = sample();

        let open = FilterEngine::apply(&ds, &FilterSpec::default());
        assert!(open.indices.contains(&3), "null created_at kept with no bounds");

        let (first, last) = FilterEngine::date_span(&ds).unwrap();
        let spanned = FilterSpec {
            date_range: DateRange::new(Some(first), Some(last)),
            ..Default::default()
        };
        let out = FilterEngine::apply(&ds, &spanned);
        assert!(!out.indices.contains(&3), "any bound drops null created_at");
        assert_eq!(out.indices, vec![0, 1, 2]);
    }
}
