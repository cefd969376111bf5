//! Runtime layer for the case dashboard.
//!
//! Holds the file-identity dataset cache and the interactive session that
//! re-runs the pipeline after every state change.

pub mod data_manager;
pub mod session;

pub use dashboard_core as core;
pub use dashboard_data as data;
