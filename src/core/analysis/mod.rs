pub mod describe;
pub mod histogram;
pub mod model;

// Re-exports
pub use describe::{describe_column, ColumnSummary};
pub use histogram::{plot_histogram, DEFAULT_BINS};
pub use model::{model, Metric, ModelReport, TaskKind};
