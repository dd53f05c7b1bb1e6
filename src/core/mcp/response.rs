use serde_json::{json, Value};

/// Wraps a tool result in the MCP resource format
pub fn wrap_mcp_response(result: Value) -> Value {
    json!({
        "content": [
            {
                "type": "resource",
                "resource": {
                    "uri": format!("mcp://tool-result/{}", uuid::Uuid::new_v4()),
                    "name": "Tool Result",
                    "mimeType": "application/json",
                    "text": result.to_string()
                }
            }
        ]
    })
}

/// Wraps a failed tool invocation so the client sees `isError`
pub fn wrap_mcp_error(error_message: &str) -> Value {
    json!({
        "content": [
            {
                "type": "text",
                "text": error_message
            }
        ],
        "isError": true
    })
}

/// Pulls the JSON result back out of a `wrap_mcp_response` payload.
#[cfg(test)]
pub(crate) fn unwrap_mcp_response(wrapped: &Value) -> Option<Value> {
    let text = wrapped
        .get("content")?
        .as_array()?
        .first()?
        .get("resource")?
        .get("text")?
        .as_str()?;
    serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_mcp_response() {
        let result = json!({"model_type": "regression", "metric": "rmse", "score": 0.5});
        let wrapped = wrap_mcp_response(result.clone());

        let content = wrapped.get("content").unwrap().as_array().unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0]["type"], "resource");
        assert!(content[0]["resource"]["uri"]
            .as_str()
            .unwrap()
            .starts_with("mcp://tool-result/"));
        assert_eq!(unwrap_mcp_response(&wrapped), Some(result));
    }

    #[test]
    fn test_wrap_mcp_error() {
        let wrapped = wrap_mcp_error("CSV error: boom");
        assert_eq!(wrapped["isError"], true);
        assert_eq!(wrapped["content"][0]["text"], "CSV error: boom");
        assert_eq!(unwrap_mcp_response(&wrapped), None);
    }
}
