//! Tool result helpers for the karar server.
//!
//! Failures a caller should see are returned as tool errors whose text is a
//! JSON body `{error, details}`; protocol-level `McpError`s are reserved for
//! problems with the server itself.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use serde_json::{Value, json};

/// JSON body of a failed tool call.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Build a tool error result with body `{error, details}`.
pub fn error_result(message: impl Into<String>, details: Option<Value>) -> CallToolResult {
    let body = ErrorBody { error: message.into(), details };
    let text = serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.error.clone());
    CallToolResult::error(vec![Content::text(text)])
}

/// Tool error result carrying the code and message of a core error.
pub fn failure_result(message: &str, err: karar_core::Error) -> CallToolResult {
    let text = err.to_string();
    let code = McpError::from(err).code.0;
    error_result(message, Some(json!({ "message": text, "code": code })))
}

/// Serialize `value` as the pretty-printed text of a successful result.
pub fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("failed to serialize output: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Text of the first content item of a tool result.
#[cfg(test)]
pub fn result_text(result: &CallToolResult) -> String {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content")
        .to_string()
}
