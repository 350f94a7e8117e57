//! yargitay_health tool implementation.
//!
//! Checks the rendering capability by opening and closing a session, pings
//! the store, and reports hot cache counters.

use crate::error::json_result;
use chrono::Utc;
use karar_client::{Resolver, SessionProvider};
use karar_core::cache::HotCacheStats;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct HealthOutput {
    /// `healthy` when rendering and the store both respond, else `degraded`.
    pub status: String,
    pub timestamp: String,
    pub services: Services,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Services {
    pub renderer: RendererHealth,
    pub cache: CacheHealth,
    pub database: DatabaseHealth,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RendererHealth {
    pub healthy: bool,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheHealth {
    pub healthy: bool,
    pub stats: HotCacheStats,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DatabaseHealth {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Implementation of the yargitay_health tool.
pub async fn health_impl(resolver: &Resolver, provider: &dyn SessionProvider) -> Result<CallToolResult, McpError> {
    let renderer_error = provider.health_check().await.err().map(|e| e.to_string());
    let database_error = resolver.ping_store().await.err().map(|e| e.to_string());

    let healthy = renderer_error.is_none() && database_error.is_none();
    if !healthy {
        tracing::warn!(renderer = ?renderer_error, database = ?database_error, "health check degraded");
    }

    json_result(&HealthOutput {
        status: if healthy { "healthy" } else { "degraded" }.into(),
        timestamp: Utc::now().to_rfc3339(),
        services: Services {
            renderer: RendererHealth {
                healthy: renderer_error.is_none(),
                mode: provider.mode().into(),
                error: renderer_error,
            },
            cache: CacheHealth { healthy: true, stats: resolver.hot_stats() },
            database: DatabaseHealth { healthy: database_error.is_none(), error: database_error },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::result_text;
    use crate::tools::testing::{StaticSource, resolver};
    use karar_client::{DisabledProvider, RenderError, RenderSession};
    use serde_json::Value;

    struct AlwaysUp;

    struct IdleSession;

    #[async_trait::async_trait]
    impl RenderSession for IdleSession {
        async fn navigate(&mut self, _url: &str, _timeout: std::time::Duration) -> Result<(), RenderError> {
            Ok(())
        }
        async fn wait_for(&mut self, _selector: &str, _timeout: std::time::Duration) -> Result<(), RenderError> {
            Ok(())
        }
        async fn exists(&mut self, _selector: &str) -> Result<bool, RenderError> {
            Ok(false)
        }
        async fn type_text(&mut self, _selector: &str, _text: &str) -> Result<(), RenderError> {
            Ok(())
        }
        async fn click(&mut self, _selector: &str) -> Result<(), RenderError> {
            Ok(())
        }
        async fn click_nth(&mut self, _selector: &str, _index: usize) -> Result<(), RenderError> {
            Ok(())
        }
        async fn text_content(&mut self, _selector: &str) -> Result<String, RenderError> {
            Ok(String::new())
        }
        async fn inner_html(&mut self, _selector: &str) -> Result<String, RenderError> {
            Ok(String::new())
        }
        async fn page_text(&mut self) -> Result<String, RenderError> {
            Ok(String::new())
        }
        async fn row_cells(&mut self, _row_selector: &str) -> Result<Vec<Vec<String>>, RenderError> {
            Ok(Vec::new())
        }
        async fn close(&mut self) -> Result<(), RenderError> {
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl SessionProvider for AlwaysUp {
        async fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError> {
            Ok(Box::new(IdleSession))
        }

        fn mode(&self) -> &'static str {
            "remote"
        }
    }

    #[tokio::test]
    async fn test_health_all_up() {
        let (resolver, _db) = resolver(StaticSource(Ok(Vec::new()))).await;
        let result = health_impl(&resolver, &AlwaysUp).await.unwrap();
        let body: Value = serde_json::from_str(&result_text(&result)).unwrap();

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["services"]["renderer"]["mode"], "remote");
        assert_eq!(body["services"]["database"]["healthy"], true);
        assert_eq!(body["services"]["cache"]["stats"]["size"], 0);
    }

    #[tokio::test]
    async fn test_health_degraded_without_renderer() {
        let (resolver, _db) = resolver(StaticSource(Ok(Vec::new()))).await;
        let result = health_impl(&resolver, &DisabledProvider).await.unwrap();
        let body: Value = serde_json::from_str(&result_text(&result)).unwrap();

        assert_eq!(body["status"], "degraded");
        assert_eq!(body["services"]["renderer"]["healthy"], false);
        assert_eq!(body["services"]["renderer"]["error"], "rendering disabled");
        assert_eq!(body["services"]["database"]["healthy"], true);
    }
}
