// Data Analysis MCP Server Library
// Exposes the analysis tools and the MCP server for the binary and tests

pub mod config;
pub mod core;
pub mod error;

// Re-export commonly used types for convenience
pub use config::Config;
pub use crate::core::analysis::{describe_column, model, plot_histogram, ColumnSummary, ModelReport};
pub use crate::core::mcp::McpServer;
pub use error::{AnalysisError, Result};
