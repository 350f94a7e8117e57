//! yargitay_analytics tool implementation.

use crate::error::{failure_result, json_result};
use karar_client::Resolver;
use karar_core::cache::DailyAnalytics;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const MAX_DAYS: u32 = 365;

/// Input parameters for yargitay_analytics tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AnalyticsParams {
    /// Number of past days to include (1-365, default 7).
    #[serde(default)]
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AnalyticsOutput {
    pub results: Vec<DailyAnalytics>,
}

/// Implementation of the yargitay_analytics tool.
pub async fn analytics_impl(resolver: &Resolver, params: AnalyticsParams) -> Result<CallToolResult, McpError> {
    let days = params.days.unwrap_or(7).clamp(1, MAX_DAYS);
    match resolver.analytics(days).await {
        Ok(results) => json_result(&AnalyticsOutput { results }),
        Err(e) => Ok(failure_result("failed to load analytics", e)),
    }
}
