// MCP Tools handler modules
pub mod data_analysis;
pub mod registry;

pub use registry::{RegisteredTool, ToolContext, ToolHandler, ToolRegistry};
