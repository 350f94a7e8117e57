//! yargitay_cache_clear tool implementation.
//!
//! Evicts expired hot entries and purges stale persisted results.

use crate::error::json_result;
use chrono::Utc;
use karar_client::{CleanupReport, Resolver};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheClearOutput {
    pub message: String,
    pub cleaned: CleanupReport,
    pub timestamp: String,
}

/// Implementation of the yargitay_cache_clear tool.
pub async fn cache_clear_impl(resolver: &Resolver) -> Result<CallToolResult, McpError> {
    let cleaned = resolver.cleanup().await;
    json_result(&CacheClearOutput {
        message: "cache cleanup completed".into(),
        cleaned,
        timestamp: Utc::now().to_rfc3339(),
    })
}
