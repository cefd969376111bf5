//! Data layer for the case dashboard.
//!
//! Reads a delimited case/check file, normalizes it against a
//! [`SchemaConfig`](dashboard_core::schema::SchemaConfig), filters it, and
//! aggregates the filtered subset into KPIs and cross-tabulations.

pub mod aggregator;
pub mod analysis;
pub mod export;
pub mod filter;
pub mod normalizer;
pub mod reader;

pub use dashboard_core as core;
