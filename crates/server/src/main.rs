//! karar MCP server entry point.
//!
//! Boots the MCP server on stdio transport. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use karar_client::{ExtractionPipeline, Resolver, ResolverSettings, SessionProvider};
use karar_core::{AppConfig, CacheDb, DetachedStore, ResultStore};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    config.log_summary();

    let store = open_store(&config).await;
    let provider = session_provider(&config);
    let pipeline = ExtractionPipeline::from_config(Arc::clone(&provider), &config);
    let resolver = Arc::new(Resolver::new(store, Arc::new(pipeline), ResolverSettings::from_config(&config)));

    let cleanup = spawn_cleanup(Arc::clone(&resolver), config.cleanup_interval());

    tracing::info!("Starting karar server on stdio transport");

    let handler = handler::KararServer::new(Arc::clone(&resolver), provider, Arc::new(config));
    let server = serve_server(handler, stdio()).await?;

    tokio::select! {
        quit = server.waiting() => {
            quit?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
        }
    }

    cleanup.abort();
    resolver.drain().await;
    tracing::info!("karar server stopped");

    Ok(())
}

/// Open the persistent cache, or fall back to a store that fails every call
/// so the server keeps answering from memory and live search.
async fn open_store(config: &AppConfig) -> Arc<dyn ResultStore> {
    match CacheDb::open(&config.db_path).await {
        Ok(db) => Arc::new(db.with_popular_threshold(config.popular_threshold)),
        Err(e) => {
            tracing::warn!(
                db_path = %config.db_path.display(),
                error = %e,
                "persistent cache unavailable, continuing without it"
            );
            Arc::new(DetachedStore::new(e.to_string()))
        }
    }
}

#[cfg(feature = "render")]
fn session_provider(config: &AppConfig) -> Arc<dyn SessionProvider> {
    Arc::new(karar_client::ChromeSessionProvider::from_endpoint(config.browser_endpoint()))
}

#[cfg(not(feature = "render"))]
fn session_provider(_config: &AppConfig) -> Arc<dyn SessionProvider> {
    tracing::warn!("built without the render feature; searches that miss the cache will fail");
    Arc::new(karar_client::DisabledProvider)
}

/// Run `cleanup` every `interval`, skipping the immediate first tick.
fn spawn_cleanup(resolver: Arc<Resolver>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let report = resolver.cleanup().await;
            tracing::debug!(hot_evicted = report.hot_evicted, persistent_deleted = report.persistent_deleted, "periodic cleanup");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unopenable_database_degrades() {
        let config = AppConfig { db_path: "/nonexistent/karar/cache.sqlite".into(), ..Default::default() };
        let store = open_store(&config).await;
        assert!(matches!(store.ping().await, Err(karar_core::Error::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_in_memory_path_opens() {
        let config = AppConfig { db_path: ":memory:".into(), ..Default::default() };
        let store = open_store(&config).await;
        assert!(store.ping().await.is_ok());
    }
}
