//! Data reshaping for Georgian environmental statistics charts.
//!
//! This crate handles transforming raw observation rows into forms
//! suitable for charting and export:
//! - `pivot`: labeled series, one row per year (line/bar/area charts)
//! - `flow`: node/link graphs (flow diagrams)
//! - `decade`: per-bucket averages (decade heatmap)
//! - `table`: row-oriented download shapes

pub mod decade;
pub mod flow;
pub mod pivot;
pub mod table;
