//! Tiered resolution of search queries.
//!
//! A query is answered from the first tier that has it:
//!
//! 1. the hot cache, keyed by query fingerprint;
//! 2. the persistent store, unless the record is stale;
//! 3. a fresh extraction, written through to both tiers.
//!
//! Store failures never fail a resolution: lookups fall through and writes
//! are reported to the [`FailureReporter`]. Persistent writes, access
//! touches and statistics run as background tasks; [`Resolver::drain`]
//! waits for them.
//!
//! Two concurrent cold resolutions of the same query both extract.

mod report;

pub use report::{FailureReporter, LogReporter};

use crate::pipeline::DecisionSource;
use chrono::Utc;
use karar_core::cache::{
    CacheEfficiency, DailyAnalytics, HotCacheStats, PopularQuery, is_stale, normalize_query, query_fingerprint,
};
use karar_core::{AppConfig, Decision, Error, HotCache, ResultStore, ScrapeStat, Source};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Tier lifetimes.
#[derive(Debug, Clone, Copy)]
pub struct ResolverSettings {
    pub hot_ttl: Duration,
    /// Persisted results older than this are stale on lookup and purged by cleanup.
    pub persistent_ttl_days: u32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self { hot_ttl: karar_core::cache::hot::DEFAULT_HOT_TTL, persistent_ttl_days: 30 }
    }
}

impl ResolverSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { hot_ttl: config.hot_ttl(), persistent_ttl_days: config.persistent_ttl_days }
    }
}

/// Freshness details of a persistent hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ResolutionMeta {
    pub age_ms: u64,
    pub access_count: i64,
    pub is_popular: bool,
}

/// The answer to one query.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub source: Source,
    pub data: Vec<Decision>,
    /// Present only for persistent hits.
    pub metadata: Option<ResolutionMeta>,
}

/// Counts from one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct CleanupReport {
    pub hot_evicted: usize,
    pub persistent_deleted: u64,
}

/// Combined view of both tiers.
#[derive(Debug, Clone, Serialize, schemars::JsonSchema)]
pub struct ResolverStats {
    pub hot: HotCacheStats,
    /// Last 24 hours; `None` when the store could not be read.
    pub persistent: Option<CacheEfficiency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_error: Option<String>,
}

/// Cache orchestrator in front of a [`DecisionSource`].
pub struct Resolver {
    hot: HotCache<Vec<Decision>>,
    store: Arc<dyn ResultStore>,
    source: Arc<dyn DecisionSource>,
    settings: ResolverSettings,
    reporter: Arc<dyn FailureReporter>,
    tasks: Mutex<JoinSet<()>>,
}

impl Resolver {
    pub fn new(store: Arc<dyn ResultStore>, source: Arc<dyn DecisionSource>, settings: ResolverSettings) -> Self {
        Self {
            hot: HotCache::new(settings.hot_ttl),
            store,
            source,
            settings,
            reporter: Arc::new(LogReporter),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Answer `query` from the fastest tier that has it.
    ///
    /// With `force_refresh` the hot entry is dropped first, so the answer
    /// comes from a fresh persisted record or a new extraction. Records
    /// exactly one [`ScrapeStat`] per call with a non-empty query.
    pub async fn resolve(&self, query: &str, force_refresh: bool) -> Result<Resolution, Error> {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            return Err(Error::InvalidInput("query must not be empty".into()));
        }
        let fingerprint = query_fingerprint(&normalized);
        let query = query.trim();
        let started = Instant::now();

        if force_refresh && self.hot.remove(&fingerprint) {
            tracing::debug!(query, fingerprint = %fingerprint, "hot entry dropped for refresh");
        }

        if let Some(data) = self.hot.get(&fingerprint) {
            tracing::debug!(query, fingerprint = %fingerprint, result_count = data.len(), "hot cache hit");
            self.record(query, Source::Hot, started, Ok(data.len())).await;
            return Ok(Resolution { source: Source::Hot, data, metadata: None });
        }

        if let Some(resolution) = self.lookup_persistent(query, &fingerprint).await {
            self.record(query, Source::Persistent, started, Ok(resolution.data.len())).await;
            return Ok(resolution);
        }

        match self.source.search(query).await {
            Ok(data) => {
                self.hot.insert(&fingerprint, data.clone());

                let store = Arc::clone(&self.store);
                let reporter = Arc::clone(&self.reporter);
                let owned_query = query.to_string();
                let decisions = data.clone();
                self.spawn_background(async move {
                    if let Err(e) = store.upsert(&owned_query, &decisions).await {
                        reporter.report("upsert", &owned_query, &e);
                    }
                })
                .await;

                tracing::info!(query, fingerprint = %fingerprint, result_count = data.len(), "resolved by extraction");
                self.record(query, Source::Extraction, started, Ok(data.len())).await;
                Ok(Resolution { source: Source::Extraction, data, metadata: None })
            }
            Err(e) => {
                self.record(query, Source::Extraction, started, Err(&e)).await;
                Err(e)
            }
        }
    }

    async fn lookup_persistent(&self, query: &str, fingerprint: &str) -> Option<Resolution> {
        let stored = match self.store.find_by_fingerprint(fingerprint).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(e) => {
                self.reporter.report("find_by_fingerprint", query, &e);
                return None;
            }
        };

        let result = stored.result;
        if is_stale(result.scraped_at, self.settings.persistent_ttl_days) {
            tracing::debug!(query, scraped_at = %result.scraped_at, "persistent record stale");
            return None;
        }

        self.hot.insert(fingerprint, stored.decisions.clone());

        let store = Arc::clone(&self.store);
        let reporter = Arc::clone(&self.reporter);
        let owned_query = query.to_string();
        let owned_fingerprint = fingerprint.to_string();
        self.spawn_background(async move {
            if let Err(e) = store.touch_access(&owned_fingerprint).await {
                reporter.report("touch_access", &owned_query, &e);
            }
        })
        .await;

        let age_ms = (Utc::now() - result.scraped_at).num_milliseconds().max(0) as u64;
        tracing::debug!(query, age_ms, access_count = result.access_count, "persistent cache hit");

        Some(Resolution {
            source: Source::Persistent,
            data: stored.decisions,
            metadata: Some(ResolutionMeta {
                age_ms,
                access_count: result.access_count,
                is_popular: result.is_popular,
            }),
        })
    }

    async fn record(&self, query: &str, source: Source, started: Instant, outcome: Result<usize, &Error>) {
        let stat = ScrapeStat {
            query: query.to_string(),
            success: outcome.is_ok(),
            duration_ms: started.elapsed().as_millis() as u64,
            error_message: outcome.as_ref().err().map(|e| e.to_string()),
            source,
            result_count: outcome.unwrap_or(0),
        };
        let store = Arc::clone(&self.store);
        let reporter = Arc::clone(&self.reporter);
        self.spawn_background(async move {
            if let Err(e) = store.record_stat(&stat).await {
                reporter.report("record_stat", &stat.query, &e);
            }
        })
        .await;
    }

    async fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Drop the hot entry for `query`. The persisted record is kept.
    pub fn invalidate(&self, query: &str) -> bool {
        self.hot.remove(&query_fingerprint(query))
    }

    /// Evict expired hot entries and purge stale persisted results.
    pub async fn cleanup(&self) -> CleanupReport {
        let hot_evicted = self.hot.sweep();
        let persistent_deleted = match self.store.purge_older_than(self.settings.persistent_ttl_days).await {
            Ok(deleted) => deleted,
            Err(e) => {
                self.reporter.report("purge_older_than", "", &e);
                0
            }
        };
        tracing::info!(hot_evicted, persistent_deleted, "cache cleanup finished");
        CleanupReport { hot_evicted, persistent_deleted }
    }

    pub fn hot_stats(&self) -> HotCacheStats {
        self.hot.stats()
    }

    /// Hot counters plus persistent efficiency over the last 24 hours.
    pub async fn stats(&self) -> ResolverStats {
        match self.store.cache_efficiency(24).await {
            Ok(efficiency) => {
                ResolverStats { hot: self.hot.stats(), persistent: Some(efficiency), persistent_error: None }
            }
            Err(e) => {
                tracing::warn!(error = %e, "persistent statistics unavailable");
                ResolverStats { hot: self.hot.stats(), persistent: None, persistent_error: Some(e.to_string()) }
            }
        }
    }

    pub async fn popular_queries(&self, limit: usize) -> Result<Vec<PopularQuery>, Error> {
        self.store.popular_queries(limit).await
    }

    pub async fn analytics(&self, days: u32) -> Result<Vec<DailyAnalytics>, Error> {
        self.store.analytics(days).await
    }

    pub async fn ping_store(&self) -> Result<(), Error> {
        self.store.ping().await
    }

    /// Wait for every background write spawned so far.
    pub async fn drain(&self) {
        let mut tasks = std::mem::take(&mut *self.tasks.lock().await);
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "background cache task panicked");
            }
        }
    }
}
