pub mod handlers;
pub mod response;
pub mod types;

use crate::config::Config;
use handlers::tools::{ToolContext, ToolRegistry};
use handlers::McpHandlers;
use serde_json::Value;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};
use types::*;

pub struct McpServer {
    handlers: McpHandlers,
}

impl McpServer {
    pub fn new(config: &Config) -> Self {
        let registry = ToolRegistry::with_data_analysis_tools();
        let context = ToolContext {
            output_dir: config.output_dir.clone(),
        };
        Self {
            handlers: McpHandlers::new(registry, context),
        }
    }

    /// Serve newline-delimited JSON-RPC on stdin/stdout until stdin closes.
    pub async fn run(&self) -> anyhow::Result<()> {
        info!("MCP Server ready, waiting for JSON-RPC requests on stdin...");

        let mut lines = BufReader::new(io::stdin()).lines();
        let mut stdout = io::stdout();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            debug!("Received request: {}", line);

            // Requests are handled one at a time, in arrival order
            if let Some(response) = self.handle_request(&line).await {
                stdout.write_all(response.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;

                debug!("Sent response: {}", response);
            }
        }

        info!("MCP Server shutting down");
        Ok(())
    }

    /// Handle one request line. Notifications produce no response.
    pub async fn handle_request(&self, line: &str) -> Option<String> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                return Some(encode(&JsonRpcResponse::failure(
                    None,
                    JsonRpcError::new(PARSE_ERROR, format!("Parse error: {}", e)),
                )));
            }
        };

        let Some(id) = request.id else {
            debug!("Received notification: {}", request.method);
            return None;
        };

        let result = self.dispatch(&request.method, request.params).await;

        let response = match result {
            Ok(value) => JsonRpcResponse::success(Some(id), value),
            Err(error) => JsonRpcResponse::failure(Some(id), error),
        };
        Some(encode(&response))
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => self.handlers.handle_initialize(params).await,
            "ping" => self.handlers.handle_ping(params).await,
            "tools/list" => self.handlers.handle_tools_list(params).await,
            "tools/call" => self.handlers.handle_tools_call(params).await,
            "prompts/list" => self.handlers.handle_prompts_list(params).await,
            "prompts/get" => self.handlers.handle_prompts_get(params).await,
            _ => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            )),
        }
    }
}

fn encode(response: &JsonRpcResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        error!("Failed to serialize response: {}", e);
        format!(
            r#"{{"jsonrpc":"2.0","id":null,"error":{{"code":{},"message":"Failed to serialize response"}}}}"#,
            INTERNAL_ERROR
        )
    })
}

// Public function to run the MCP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    info!(
        "MCP Server v{} starting (output dir: {})",
        env!("CARGO_PKG_VERSION"),
        config
            .output_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "working directory".to_string())
    );
    McpServer::new(&config).run().await
}
