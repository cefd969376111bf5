//! Interactive dashboard session.
//!
//! A [`DashboardSession`] owns the dataset cache, the schema and the current
//! filter specification. Every state change is followed by one call to
//! [`DashboardSession::run`], which performs a full
//! load → filter → aggregate pass and stores the resulting
//! [`DashboardSnapshot`] for the presentation layer.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use dashboard_core::error::Result;
use dashboard_core::filters::{FilterSpec, PepFilter};
use dashboard_core::models::{CaseRecord, DatasetColumn, Field};
use dashboard_core::schema::SchemaConfig;
use dashboard_data::analysis::{build_report, DashboardReport};
use dashboard_data::export::export_to_path;
use dashboard_data::filter::FilterEngine;

use crate::data_manager::DatasetCache;

/// Rows of the filtered subset kept for the preview table.
pub const PREVIEW_ROWS: usize = 50;

// ── Public types ──────────────────────────────────────────────────────────────

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub report: DashboardReport,
    pub data_path: PathBuf,
    pub filter: FilterSpec,
    pub include_totals: bool,
    /// Normalizer warnings plus any skipped-filter notices.
    pub warnings: Vec<String>,
    pub columns: Vec<DatasetColumn>,
    /// First [`PREVIEW_ROWS`] rows of the filtered subset.
    pub preview: Vec<CaseRecord>,
    /// Available `created_at` span of the whole dataset.
    pub date_span: Option<(NaiveDate, NaiveDate)>,
    /// Filtered rows with no usable `created_at`. Always zero once a date
    /// bound is set.
    pub undated_rows: usize,
}

/// One user's dashboard state.
pub struct DashboardSession {
    cache: DatasetCache,
    data_path: PathBuf,
    schema: SchemaConfig,
    filter: FilterSpec,
    snapshot: Option<DashboardSnapshot>,
    runs: u64,
}

impl DashboardSession {
    pub fn new(data_path: impl Into<PathBuf>, schema: SchemaConfig, filter: FilterSpec) -> Self {
        Self {
            cache: DatasetCache::new(),
            data_path: data_path.into(),
            schema,
            filter,
            snapshot: None,
            runs: 0,
        }
    }

    // ── Pipeline ──────────────────────────────────────────────────────────

    /// Run the full pipeline against the current state.
    ///
    /// The dataset comes from the cache unless the file changed. Only load
    /// failures are errors; an empty result is a valid snapshot.
    pub fn run(&mut self) -> Result<&DashboardSnapshot> {
        let data = self.cache.get(&self.data_path, &self.schema)?;
        let report = build_report(&data.dataset, &self.filter, &self.schema);

        let mut warnings = data.warning_messages();
        warnings.extend(report.metadata.skipped_filters.iter().map(|f| {
            format!("Filter on '{f}' skipped: column not in dataset")
        }));

        let undated_rows = report
            .filtered
            .records(&data.dataset)
            .filter(|r| r.created_at.is_none())
            .count();

        let preview: Vec<CaseRecord> = report
            .filtered
            .records(&data.dataset)
            .take(PREVIEW_ROWS)
            .cloned()
            .collect();

        let snapshot = DashboardSnapshot {
            data_path: self.data_path.clone(),
            filter: self.filter.clone(),
            include_totals: self.schema.include_totals,
            warnings,
            columns: data.dataset.columns.clone(),
            preview,
            date_span: FilterEngine::date_span(&data.dataset),
            undated_rows,
            report,
        };

        self.runs += 1;
        tracing::debug!(
            run = self.runs,
            loads = self.cache.load_count(),
            filter = %self.filter.describe(),
            "pipeline run complete"
        );
        Ok(&*self.snapshot.insert(snapshot))
    }

    /// Last completed snapshot, if [`run`](Self::run) has succeeded once.
    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_ref()
    }

    /// Drop the cached dataset and run again.
    pub fn reload(&mut self) -> Result<&DashboardSnapshot> {
        self.cache.invalidate(&self.data_path);
        self.run()
    }

    pub fn run_count(&self) -> u64 {
        self.runs
    }

    // ── State changes ─────────────────────────────────────────────────────

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.filter = filter;
    }

    /// Advance the PEP filter All → Yes → No → All.
    pub fn cycle_pep(&mut self) -> PepFilter {
        self.filter.pep = self.filter.pep.next();
        self.filter.pep
    }

    /// Flip grand totals on the cross-tabulations.
    pub fn toggle_totals(&mut self) -> bool {
        self.schema.include_totals = !self.schema.include_totals;
        self.schema.include_totals
    }

    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Selectable values for `field` across the whole dataset.
    pub fn options(&mut self, field: Field) -> Result<Vec<String>> {
        let data = self.cache.get(&self.data_path, &self.schema)?;
        Ok(FilterEngine::options(&data.dataset, field))
    }

    /// Countries matching a free-text search.
    pub fn country_candidates(&mut self, search: &str) -> Result<Vec<String>> {
        let data = self.cache.get(&self.data_path, &self.schema)?;
        Ok(FilterEngine::country_candidates(&data.dataset, search))
    }

    /// Write the current filtered subset to `path` as CSV.
    pub fn export(&mut self, path: &Path) -> Result<usize> {
        let data = self.cache.get(&self.data_path, &self.schema)?;
        let outcome = FilterEngine::apply(&data.dataset, &self.filter);
        export_to_path(path, &data.dataset, outcome.records(&data.dataset))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
