use crate::core::mcp::types::Tool;
use crate::error::AnalysisError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// Per-server settings every tool handler can read.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Directory for generated files; `None` means the process working directory.
    pub output_dir: Option<PathBuf>,
}

pub type ToolHandler = fn(&ToolContext, Value) -> Result<Value, AnalysisError>;

#[derive(Clone)]
pub struct RegisteredTool {
    pub definition: Tool,
    pub handler: ToolHandler,
}

/// Name → tool mapping, built once at start-up and handed to the dispatcher.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_analysis_tools() -> Self {
        let mut registry = Self::new();
        super::data_analysis::register(&mut registry);
        registry
    }

    /// Registering a name twice replaces the earlier handler in place.
    pub fn register(&mut self, definition: Tool, handler: ToolHandler) {
        let tool = RegisteredTool {
            definition,
            handler,
        };
        match self.index.get(&tool.definition.name).copied() {
            Some(i) => self.tools[i] = tool,
            None => {
                self.index.insert(tool.definition.name.clone(), self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Definitions in registration order, for `tools/list`.
    pub fn definitions(&self) -> Vec<Tool> {
        self.tools.iter().map(|tool| tool.definition.clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.definition.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(_: &ToolContext, args: Value) -> Result<Value, AnalysisError> {
        Ok(args)
    }

    fn fail(_: &ToolContext, _: Value) -> Result<Value, AnalysisError> {
        Err(AnalysisError::invalid_argument("nope"))
    }

    fn tool(name: &str) -> Tool {
        Tool {
            name: name.to_string(),
            description: String::new(),
            input_schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn test_data_analysis_tools_are_registered() {
        let registry = ToolRegistry::with_data_analysis_tools();
        assert_eq!(registry.names(), vec!["describe_column", "plot_histogram", "model"]);
        assert!(registry.get("drop_table").is_none());
    }

    #[test]
    fn test_reregistering_replaces_handler() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("a"), echo);
        registry.register(tool("b"), echo);
        registry.register(tool("a"), fail);

        assert_eq!(registry.definitions().len(), 2);
        assert_eq!(registry.names(), vec!["a", "b"]);
        let handler = registry.get("a").unwrap().handler;
        assert!(handler(&ToolContext::default(), json!({})).is_err());
    }
}
