//! User-selected filter criteria.
//!
//! These types only describe a filter; applying one to a dataset is the job
//! of the filter engine in `dashboard-data`.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::Field;
use crate::time_utils::midnight;

// ── Selection ─────────────────────────────────────────────────────────────────

/// Set-membership constraint over one column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// No constraint; rows with empty values are kept too.
    #[default]
    All,
    /// Keep rows whose value is one of these. Empty values never match.
    Only(BTreeSet<String>),
}

impl Selection {
    /// Build a selection from user input; an empty list means no constraint.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if set.is_empty() {
            Selection::All
        } else {
            Selection::Only(set)
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(set) => value.is_some_and(|v| set.contains(v)),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// `true` when `value` is explicitly selected.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Selection::All => false,
            Selection::Only(set) => set.contains(value),
        }
    }

    /// Add `value` to the selection, or remove it if already selected.
    /// Removing the last value returns to [`Selection::All`].
    pub fn toggle(&mut self, value: &str) {
        match self {
            Selection::All => *self = Selection::from_values([value]),
            Selection::Only(set) => {
                if !set.remove(value) {
                    set.insert(value.to_string());
                }
                if set.is_empty() {
                    *self = Selection::All;
                }
            }
        }
    }
}

// ── PepFilter ─────────────────────────────────────────────────────────────────

/// Three-way filter over the `is_pep` flag.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PepFilter {
    #[default]
    All,
    Yes,
    No,
}

impl PepFilter {
    /// `All` accepts anything; `Yes`/`No` require an exact boolean match.
    pub fn matches(self, is_pep: Option<bool>) -> bool {
        match self {
            PepFilter::All => true,
            PepFilter::Yes => is_pep == Some(true),
            PepFilter::No => is_pep == Some(false),
        }
    }

    /// Next value in the All → Yes → No cycle.
    pub fn next(self) -> Self {
        match self {
            PepFilter::All => PepFilter::Yes,
            PepFilter::Yes => PepFilter::No,
            PepFilter::No => PepFilter::All,
        }
    }
}

impl fmt::Display for PepFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PepFilter::All => "All",
            PepFilter::Yes => "Yes",
            PepFilter::No => "No",
        })
    }
}

// ── DateRange ─────────────────────────────────────────────────────────────────

/// Inclusive range over `created_at`, both bounds normalized to midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Null timestamps are excluded whenever either bound is set.
    pub fn contains(&self, ts: Option<NaiveDateTime>) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(ts) = ts else {
            return false;
        };
        if let Some(start) = self.start {
            if ts < midnight(start) {
                return false;
            }
        }
        if let Some(end) = self.end {
            if ts > midnight(end) {
                return false;
            }
        }
        true
    }
}

// ── FilterSpec ────────────────────────────────────────────────────────────────

/// All active filter criteria. Constraints combine with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub cases_status: Selection,
    pub check_status: Selection,
    pub assignee: Selection,
    pub check_type: Selection,
    pub country: Selection,
    /// Case-insensitive substring narrowing the country candidates.
    pub country_search: Option<String>,
    pub risk_level: Selection,
    pub pep: PepFilter,
    pub date_range: DateRange,
}

impl FilterSpec {
    /// Fields that carry a multi-value [`Selection`], in display order.
    pub const SELECTABLE: [Field; 6] = [
        Field::CasesStatus,
        Field::CheckStatus,
        Field::AssigneeName,
        Field::CheckType,
        Field::Country,
        Field::RiskLevel,
    ];

    /// The selection constraining `field`, if it has one.
    pub fn selection(&self, field: Field) -> Option<&Selection> {
        match field {
            Field::CasesStatus => Some(&self.cases_status),
            Field::CheckStatus => Some(&self.check_status),
            Field::AssigneeName => Some(&self.assignee),
            Field::CheckType => Some(&self.check_type),
            Field::Country => Some(&self.country),
            Field::RiskLevel => Some(&self.risk_level),
            Field::CaseId | Field::CheckId | Field::IsPep | Field::CreatedAt => None,
        }
    }

    pub fn selection_mut(&mut self, field: Field) -> Option<&mut Selection> {
        match field {
            Field::CasesStatus => Some(&mut self.cases_status),
            Field::CheckStatus => Some(&mut self.check_status),
            Field::AssigneeName => Some(&mut self.assignee),
            Field::CheckType => Some(&mut self.check_type),
            Field::Country => Some(&mut self.country),
            Field::RiskLevel => Some(&mut self.risk_level),
            Field::CaseId | Field::CheckId | Field::IsPep | Field::CreatedAt => None,
        }
    }

    /// `true` when no constraint is active.
    pub fn is_unconstrained(&self) -> bool {
        self.cases_status.is_all()
            && self.check_status.is_all()
            && self.assignee.is_all()
            && self.check_type.is_all()
            && self.country.is_all()
            && self.country_search.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.risk_level.is_all()
            && self.pep == PepFilter::All
            && self.date_range.is_open()
    }

    /// Short human-readable description of the active constraints.
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let selections = [
            ("case status", &self.cases_status),
            ("check status", &self.check_status),
            ("assignee", &self.assignee),
            ("check type", &self.check_type),
            ("country", &self.country),
            ("risk", &self.risk_level),
        ];
        for (label, selection) in selections {
            if let Selection::Only(values) = selection {
                let joined: Vec<&str> = values.iter().map(String::as_str).collect();
                parts.push(format!("{label}: {}", joined.join(", ")));
            }
        }
        if let Some(search) = self.country_search.as_deref().filter(|s| !s.trim().is_empty()) {
            parts.push(format!("country ~ \"{}\"", search.trim()));
        }
        if self.pep != PepFilter::All {
            parts.push(format!("PEP: {}", self.pep));
        }
        if !self.date_range.is_open() {
            let fmt = |d: Option<NaiveDate>| d.map_or("…".to_string(), |d| d.to_string());
            parts.push(format!(
                "{} → {}",
                fmt(self.date_range.start),
                fmt(self.date_range.end)
            ));
        }
        if parts.is_empty() {
            "no filters".to_string()
        } else {
            parts.join(" | ")
        }
    }
}
