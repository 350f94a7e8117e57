//! yargitay_popular tool implementation.

use crate::error::{failure_result, json_result};
use karar_client::Resolver;
use karar_core::cache::PopularQuery;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const MAX_LIMIT: usize = 100;

/// Input parameters for yargitay_popular tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PopularParams {
    /// Maximum number of queries to return (1-100, default 20).
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PopularOutput {
    pub results: Vec<PopularQuery>,
}

/// Implementation of the yargitay_popular tool.
pub async fn popular_impl(resolver: &Resolver, params: PopularParams) -> Result<CallToolResult, McpError> {
    let limit = params.limit.unwrap_or(20).clamp(1, MAX_LIMIT);
    match resolver.popular_queries(limit).await {
        Ok(results) => json_result(&PopularOutput { results }),
        Err(e) => Ok(failure_result("failed to load popular queries", e)),
    }
}
