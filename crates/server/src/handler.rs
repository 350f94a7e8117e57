//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    AnalyticsParams, PopularParams, SearchParams, analytics_impl, cache_clear_impl, health_impl, popular_impl,
    search_impl, stats_impl,
};
use karar_client::{Resolver, SessionProvider};
use karar_core::AppConfig;
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for karar.
#[derive(Clone)]
pub struct KararServer {
    resolver: Arc<Resolver>,
    provider: Arc<dyn SessionProvider>,
    config: Arc<AppConfig>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl KararServer {
    /// Create a new server handler.
    pub fn new(resolver: Arc<Resolver>, provider: Arc<dyn SessionProvider>, config: Arc<AppConfig>) -> Self {
        Self { resolver, provider, config, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Search Yargıtay (Turkish Court of Cassation) decisions. Answers from the in-memory cache, then the database, then a live search of the decision site. Set refresh to drop the in-memory entry and re-read the database before searching live."
    )]
    async fn yargitay_search_optimized(&self, params: Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        search_impl(&self.resolver, params.0).await
    }

    #[tool(description = "Health check for the browser, the in-memory cache and the database.")]
    async fn yargitay_health(&self) -> Result<CallToolResult, McpError> {
        health_impl(&self.resolver, self.provider.as_ref()).await
    }

    #[tool(description = "Cache statistics: in-memory hit rate and 24-hour database efficiency.")]
    async fn yargitay_stats(&self) -> Result<CallToolResult, McpError> {
        stats_impl(&self.resolver, &self.config).await
    }

    #[tool(description = "List the most frequently requested queries.")]
    async fn yargitay_popular(&self, params: Parameters<PopularParams>) -> Result<CallToolResult, McpError> {
        popular_impl(&self.resolver, params.0).await
    }

    #[tool(description = "Daily search analytics for the last N days.")]
    async fn yargitay_analytics(&self, params: Parameters<AnalyticsParams>) -> Result<CallToolResult, McpError> {
        analytics_impl(&self.resolver, params.0).await
    }

    #[tool(description = "Remove expired in-memory entries and purge stale database results.")]
    async fn yargitay_cache_clear(&self) -> Result<CallToolResult, McpError> {
        cache_clear_impl(&self.resolver).await
    }
}

impl ServerHandler for KararServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "karar-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
