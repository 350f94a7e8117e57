//! yargitay_stats tool implementation.

use crate::error::json_result;
use chrono::Utc;
use karar_client::{Resolver, ResolverStats};
use karar_core::AppConfig;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;

/// Output structure for yargitay_stats tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct StatsOutput {
    pub timestamp: String,
    pub stats: ResolverStats,
    /// Share of the last 24 hours' requests answered by either cache tier,
    /// falling back to the hot tier's own rate when the store is unreadable.
    pub combined_hit_rate: u64,
    pub config: ConfigExcerpt,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ConfigExcerpt {
    pub max_results: usize,
    pub hot_ttl_ms: u64,
    pub persistent_ttl_days: u32,
    pub popular_threshold: u32,
    pub remote_browser: bool,
}

impl From<&AppConfig> for ConfigExcerpt {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_results: config.max_results,
            hot_ttl_ms: config.hot_ttl_ms,
            persistent_ttl_days: config.persistent_ttl_days,
            popular_threshold: config.popular_threshold,
            remote_browser: config.browser_ws_url.is_some(),
        }
    }
}

/// Implementation of the yargitay_stats tool.
pub async fn stats_impl(resolver: &Resolver, config: &AppConfig) -> Result<CallToolResult, McpError> {
    let stats = resolver.stats().await;
    let combined_hit_rate = stats.persistent.as_ref().map_or(stats.hot.hit_rate, |p| p.cache_hit_rate);

    json_result(&StatsOutput {
        timestamp: Utc::now().to_rfc3339(),
        combined_hit_rate,
        stats,
        config: ConfigExcerpt::from(config),
    })
}
