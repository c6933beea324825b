//! Report module - recompute pipeline, presentation models and export

pub mod engine;
pub mod export;
pub mod presenter;

pub use engine::{Report, ReportEngine, Selection};
pub use export::{export_csv_to_path, EXPORT_FILE_NAME};
pub use presenter::{ChartSpec, DetailTable, GroupSummary, MetricCard, TableColumn};
