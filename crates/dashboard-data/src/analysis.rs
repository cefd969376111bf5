//! Main reporting pipeline for the case dashboard.
//!
//! Runs the filter engine over a normalized dataset and the aggregation engine
//! over the result, returning a [`DashboardReport`] ready for the UI layer.

use chrono::Local;
use dashboard_core::filters::FilterSpec;
use dashboard_core::models::{Dataset, Field};
use dashboard_core::schema::SchemaConfig;
use serde::Serialize;

use crate::aggregator::{KpiSummary, PivotTable, ReportAggregator};
use crate::filter::{FilterEngine, FilterOutcome};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// Rows in the base table.
    pub source_rows: usize,
    /// Rows that survived filtering.
    pub filtered_rows: usize,
    /// Requested filters skipped because their column is absent.
    pub skipped_filters: Vec<Field>,
    /// Wall-clock seconds spent filtering.
    pub filter_time_seconds: f64,
    /// Wall-clock seconds spent aggregating.
    pub aggregate_time_seconds: f64,
}

/// The complete output of [`build_report`].
#[derive(Debug, Clone)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    /// Indices of the filtered subset inside the base table.
    pub filtered: FilterOutcome,
    pub kpis: KpiSummary,
    pub monthly_cases: PivotTable,
    pub monthly_checks: PivotTable,
    pub cases_by_assignee: PivotTable,
    pub checks_by_assignee: PivotTable,
}

impl DashboardReport {
    /// `true` when the filters left no rows. Not an error.
    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    /// Monthly charts are only worth drawing when a bucket exists.
    pub fn has_monthly_data(&self) -> bool {
        !self.monthly_cases.is_empty() || !self.monthly_checks.is_empty()
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full pipeline.
///
/// 1. Filter `dataset` with `spec`.
/// 2. Compute KPIs over the subset.
/// 3. Build the monthly distributions.
/// 4. Build the assignee cross-tabulations, with grand totals when
///    `schema.include_totals` is set.
///
/// An empty subset yields zero KPIs and empty tables.
pub fn build_report(dataset: &Dataset, spec: &FilterSpec, schema: &SchemaConfig) -> DashboardReport {
    // ── Step 1: Filter ────────────────────────────────────────────────────────
    let filter_start = std::time::Instant::now();
    let filtered = FilterEngine::apply(dataset, spec);
    let filter_time = filter_start.elapsed().as_secs_f64();

    // ── Steps 2-4: Aggregate ──────────────────────────────────────────────────
    let aggregate_start = std::time::Instant::now();
    let kpis = ReportAggregator::kpis(filtered.records(dataset), schema);
    let monthly_cases = ReportAggregator::monthly_cases(filtered.records(dataset));
    let monthly_checks = ReportAggregator::monthly_checks(filtered.records(dataset));
    let mut cases_by_assignee = ReportAggregator::cases_by_assignee(filtered.records(dataset));
    let mut checks_by_assignee = ReportAggregator::checks_by_assignee(filtered.records(dataset));
    if schema.include_totals {
        cases_by_assignee = cases_by_assignee.with_totals();
        checks_by_assignee = checks_by_assignee.with_totals();
    }
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    tracing::debug!(
        filtered = filtered.len(),
        total_cases = kpis.cases.total,
        total_checks = kpis.checks.total,
        "report built"
    );

    let metadata = ReportMetadata {
        generated_at: Local::now().to_rfc3339(),
        source_rows: dataset.len(),
        filtered_rows: filtered.len(),
        skipped_filters: filtered.skipped.clone(),
        filter_time_seconds: filter_time,
        aggregate_time_seconds: aggregate_time,
    };

    DashboardReport {
        metadata,
        filtered,
        kpis,
        monthly_cases,
        monthly_checks,
        cases_by_assignee,
        checks_by_assignee,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
