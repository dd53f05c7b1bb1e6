pub mod base;
pub mod prompts;
pub mod tools;

pub use base::McpHandlers;
