mod loader;

pub use loader::{AggregationConfig, CollectorConfig, Config, IndexConfig, ReportConfig};
