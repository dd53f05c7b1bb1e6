use crate::core::mcp::types::*;
use serde_json::{json, Value};

pub const DEFAULT_PROMPT: &str = "default_prompt";

const ASSISTANT_FRAMING: &str = "You are a helpful data analysis assistant. \n\
Please clearly organize and return the results of the tool calling and the data analysis.";

/// Assistant framing followed by the user's message.
pub fn default_prompt(message: &str) -> Vec<PromptMessage> {
    vec![
        PromptMessage {
            role: Role::Assistant,
            content: TextContent::new(ASSISTANT_FRAMING),
        },
        PromptMessage {
            role: Role::User,
            content: TextContent::new(message),
        },
    ]
}

/// Get prompt definitions for the MCP prompts list
pub fn get_prompts() -> Vec<Prompt> {
    vec![Prompt {
        name: DEFAULT_PROMPT.to_string(),
        description: "Seed a data analysis conversation with the user's message".to_string(),
        arguments: vec![PromptArgument {
            name: "message".to_string(),
            description: "The user's request".to_string(),
            required: true,
        }],
    }]
}

pub fn get_prompt(name: &str, arguments: Option<&Value>) -> Result<Value, JsonRpcError> {
    if name != DEFAULT_PROMPT {
        return Err(JsonRpcError::new(
            INVALID_PARAMS,
            format!("Unknown prompt: {}", name),
        ));
    }

    let message = arguments
        .and_then(|args| args.get("message"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "Missing message argument"))?;

    Ok(json!({
        "description": "Data analysis assistant prompt",
        "messages": default_prompt(message)
    }))
}
