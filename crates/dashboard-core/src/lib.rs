//! Shared domain types for the case dashboard.
//!
//! Holds the record model, schema configuration, filter criteria, error
//! taxonomy, CLI settings and small time/formatting helpers used by every
//! other crate in the workspace.

pub mod error;
pub mod filters;
pub mod formatting;
pub mod models;
pub mod schema;
pub mod settings;
pub mod time_utils;
