//! Line-oriented building blocks composed by the dashboard view.

pub mod bars;
pub mod header;
pub mod kpi;
