//! Terminal UI layer for the case dashboard.
//!
//! Provides themes, the header, KPI and stacked-bar components, pivot and
//! preview tables, the full dashboard layout, the filter panel, and the event loop built on
//! top of [`ratatui`].

pub mod app;
pub mod components;
pub mod dashboard_view;
pub mod filter_panel;
pub mod table_view;
pub mod themes;

pub use dashboard_core as core;
