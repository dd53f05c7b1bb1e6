use crate::core::mcp::response::{wrap_mcp_error, wrap_mcp_response};
use crate::core::mcp::types::*;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::prompts;
use super::tools::{ToolContext, ToolRegistry};

#[derive(Clone)]
pub struct McpHandlers {
    pub registry: Arc<ToolRegistry>,
    pub context: ToolContext,
}

impl McpHandlers {
    pub fn new(registry: ToolRegistry, context: ToolContext) -> Self {
        Self {
            registry: Arc::new(registry),
            context,
        }
    }

    pub async fn handle_initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        // Echo the client's protocol version back
        let client_protocol_version = params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string());

        info!(
            "Handling initialize request (protocol {}), advertising tools: {:?}",
            client_protocol_version,
            self.registry.names()
        );

        let result = InitializeResult {
            protocol_version: client_protocol_version,
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: Capabilities {
                tools: Some(ToolsCapability {
                    list_changed: false, // Our tool list is static
                }),
                prompts: Some(PromptsCapability {
                    list_changed: false,
                }),
            },
        };

        serde_json::to_value(result).map_err(|e| {
            JsonRpcError::new(INTERNAL_ERROR, format!("Failed to serialize response: {}", e))
        })
    }

    pub async fn handle_ping(&self, _params: Option<Value>) -> Result<Value, JsonRpcError> {
        Ok(json!({}))
    }

    pub async fn handle_tools_list(&self, _params: Option<Value>) -> Result<Value, JsonRpcError> {
        Ok(json!({
            "tools": self.registry.definitions()
        }))
    }

    pub async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params =
            params.ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "Missing parameters"))?;

        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "Missing tool name"))?;

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        let tool = self.registry.get(tool_name).ok_or_else(|| {
            JsonRpcError::new(METHOD_NOT_FOUND, format!("Unknown tool: {}", tool_name))
        })?;

        info!("Handling tools/call request for tool: {}", tool_name);

        let handler = tool.handler;
        let context = self.context.clone();
        let start_time = Instant::now();

        // Tool work is synchronous; run it off the I/O thread and wait for it
        let outcome = tokio::task::spawn_blocking(move || handler(&context, arguments))
            .await
            .map_err(|e| {
                JsonRpcError::new(INTERNAL_ERROR, format!("Tool '{}' aborted: {}", tool_name, e))
            })?;

        let duration = start_time.elapsed();
        match outcome {
            Ok(result) => {
                debug!("Tool '{}' completed in {}ms", tool_name, duration.as_millis());
                Ok(wrap_mcp_response(result))
            }
            Err(error) if error.is_invalid_argument() => {
                warn!("Tool '{}' rejected its arguments: {}", tool_name, error);
                Err(JsonRpcError::new(INVALID_PARAMS, error.to_string()))
            }
            Err(error) => {
                warn!(
                    "Tool '{}' failed after {}ms: {}",
                    tool_name,
                    duration.as_millis(),
                    error
                );
                Ok(wrap_mcp_error(&error.to_string()))
            }
        }
    }

    pub async fn handle_prompts_list(&self, _params: Option<Value>) -> Result<Value, JsonRpcError> {
        Ok(json!({
            "prompts": prompts::get_prompts()
        }))
    }

    pub async fn handle_prompts_get(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params =
            params.ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "Missing parameters"))?;

        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "Missing prompt name"))?;

        info!("Handling prompts/get request for prompt: {}", name);
        prompts::get_prompt(name, params.get("arguments"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mcp::response::unwrap_mcp_response;
    use std::fs;
    use tempfile::TempDir;

    fn handlers(dir: &TempDir) -> McpHandlers {
        McpHandlers::new(
            ToolRegistry::with_data_analysis_tools(),
            ToolContext {
                output_dir: Some(dir.path().to_path_buf()),
            },
        )
    }

    #[tokio::test]
    async fn test_initialize_echoes_protocol_version() {
        let dir = TempDir::new().unwrap();
        let result = handlers(&dir)
            .handle_initialize(Some(json!({"protocolVersion": "2024-11-05"})))
            .await
            .unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"]["prompts"].is_object());

        let result = handlers(&dir).handle_initialize(None).await.unwrap();
        assert_eq!(result["protocolVersion"], DEFAULT_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let dir = TempDir::new().unwrap();
        let result = handlers(&dir).handle_tools_list(None).await.unwrap();
        let names: Vec<&str> = result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["describe_column", "plot_histogram", "model"]);
        assert!(result["tools"][0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_tools_call_success_is_wrapped() {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("data.csv");
        fs::write(&csv, "v\n1\n2\n3\n4\n5\n").unwrap();

        let result = handlers(&dir)
            .handle_tools_call(Some(json!({
                "name": "describe_column",
                "arguments": {"csv_path": csv, "column": "v"}
            })))
            .await
            .unwrap();
        let stats = unwrap_mcp_response(&result).unwrap();
        assert_eq!(stats["count"], 5);
        assert_eq!(stats["min"], 1.0);
        assert_eq!(stats["max"], 5.0);
    }

    #[tokio::test]
    async fn test_tools_call_missing_column_is_invalid_params() {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("data.csv");
        fs::write(&csv, "v\n1\n").unwrap();

        let error = handlers(&dir)
            .handle_tools_call(Some(json!({
                "name": "plot_histogram",
                "arguments": {"csv_path": csv, "column": "w"}
            })))
            .await
            .unwrap_err();
        assert_eq!(error.code, INVALID_PARAMS);
        assert_eq!(error.message, "Column 'w' not found in CSV.");
    }

    #[tokio::test]
    async fn test_tools_call_library_failure_is_error_result() {
        let dir = TempDir::new().unwrap();
        let result = handlers(&dir)
            .handle_tools_call(Some(json!({
                "name": "describe_column",
                "arguments": {"csv_path": dir.path().join("absent.csv"), "column": "v"}
            })))
            .await
            .unwrap();
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let dir = TempDir::new().unwrap();
        let error = handlers(&dir)
            .handle_tools_call(Some(json!({"name": "drop_everything"})))
            .await
            .unwrap_err();
        assert_eq!(error.code, METHOD_NOT_FOUND);

        let error = handlers(&dir).handle_tools_call(None).await.unwrap_err();
        assert_eq!(error.code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_prompts() {
        let dir = TempDir::new().unwrap();
        let list = handlers(&dir).handle_prompts_list(None).await.unwrap();
        assert_eq!(list["prompts"][0]["name"], prompts::DEFAULT_PROMPT);

        let prompt = handlers(&dir)
            .handle_prompts_get(Some(json!({
                "name": "default_prompt",
                "arguments": {"message": "Plot age"}
            })))
            .await
            .unwrap();
        assert_eq!(prompt["messages"][1]["content"]["text"], "Plot age");
    }
}
