//! Per-country, per-year metrics dashboard.
//!
//! ```text
//!  .csv / .tsv / .json / .parquet
//!        │  data::loader
//!        ▼
//!   Dataset ──► Selection::new ──► data::filter ──► chart::resolve
//!                (validate)        (FilteredView)    (ChartSpec | NoData)
//!                                        │
//!                                        ▼
//!                                  export (delimited bytes)
//! ```

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod export;
pub mod selection;

pub use chart::{ChartOutcome, ChartSpec};
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, Evaluation};
pub use error::DashboardError;
pub use selection::{ChartKind, FeaturePolicy, Selection, SelectionInput};
