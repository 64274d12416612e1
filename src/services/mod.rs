//! Query engines and orchestration.

pub mod aggregation;
pub mod cache;
pub mod export;
pub mod orchestrator;
pub mod ranking;
pub mod time_window;

pub use aggregation::AggregationEngine;
pub use cache::QueryCache;
pub use export::{ExportFormat, ExportResult, export_items};
pub use orchestrator::QueryOrchestrator;
pub use ranking::RankingEngine;
pub use time_window::{TimeRangePreset, resolve_window, resolve_window_at};
