//! Core types for the Georgian environmental statistics charts: the chart
//! catalog, API payload shapes, the per-chart fetch lifecycle and, behind the
//! `api` feature, the HTTP client for the statistics API.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch_state;
pub mod language;
pub mod observation;
pub mod payload;
pub mod request;

#[cfg(feature = "api")]
pub mod client;

pub use error::{GeostatError, Result};
pub use language::Language;
pub use observation::{ObservationRow, ValueLabel};
