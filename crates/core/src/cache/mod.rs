//! Hot and persistent cache tiers.
//!
//! - [`hot`]: in-process TTL cache keyed by query fingerprint
//! - [`connection`], [`migrations`]: SQLite handle with WAL and versioned schema
//! - [`results`]: persisted search results and their decisions
//! - [`stats`]: append-only resolution statistics and aggregates
//! - [`detached`]: failing stand-in when no database could be opened
//!
//! The persistent tier is reached through the [`ResultStore`] trait so the
//! resolver can be exercised against any backing store.

pub mod connection;
pub mod detached;
pub mod hash;
pub mod hot;
pub mod migrations;
pub mod results;
pub mod stats;

pub use crate::Error;

pub use connection::CacheDb;
pub use detached::DetachedStore;
pub use hash::{normalize_query, query_fingerprint};
pub use hot::{HotCache, HotCacheStats};
pub use results::{PersistedSearchResult, PopularQuery, StoredSearch, is_stale};
pub use stats::{CacheEfficiency, DailyAnalytics, ScrapeStat, Source};

use crate::Decision;
use chrono::{DateTime, SecondsFormat, Utc};

/// Typed facade over the durable store.
#[async_trait::async_trait]
pub trait ResultStore: Send + Sync {
    /// Look up a persisted result and its decisions, ordered by position.
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<StoredSearch>, Error>;

    /// Atomically replace the persisted result for `query` with `decisions`.
    async fn upsert(&self, query: &str, decisions: &[Decision]) -> Result<i64, Error>;

    /// Bump the access count and last-access time.
    async fn touch_access(&self, fingerprint: &str) -> Result<(), Error>;

    /// Append one resolution statistic.
    async fn record_stat(&self, stat: &ScrapeStat) -> Result<(), Error>;

    async fn popular_queries(&self, limit: usize) -> Result<Vec<PopularQuery>, Error>;

    async fn analytics(&self, days: u32) -> Result<Vec<DailyAnalytics>, Error>;

    async fn cache_efficiency(&self, hours: u32) -> Result<CacheEfficiency, Error>;

    /// Delete results scraped more than `days_to_keep` days ago.
    async fn purge_older_than(&self, days_to_keep: u32) -> Result<u64, Error>;

    async fn ping(&self) -> Result<(), Error>;
}

#[async_trait::async_trait]
impl ResultStore for CacheDb {
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<StoredSearch>, Error> {
        CacheDb::find_by_fingerprint(self, fingerprint).await
    }

    async fn upsert(&self, query: &str, decisions: &[Decision]) -> Result<i64, Error> {
        self.upsert_search_result(query, decisions).await
    }

    async fn touch_access(&self, fingerprint: &str) -> Result<(), Error> {
        CacheDb::touch_access(self, fingerprint).await
    }

    async fn record_stat(&self, stat: &ScrapeStat) -> Result<(), Error> {
        CacheDb::record_stat(self, stat).await
    }

    async fn popular_queries(&self, limit: usize) -> Result<Vec<PopularQuery>, Error> {
        CacheDb::popular_queries(self, limit).await
    }

    async fn analytics(&self, days: u32) -> Result<Vec<DailyAnalytics>, Error> {
        CacheDb::analytics(self, days).await
    }

    async fn cache_efficiency(&self, hours: u32) -> Result<CacheEfficiency, Error> {
        CacheDb::cache_efficiency(self, hours).await
    }

    async fn purge_older_than(&self, days_to_keep: u32) -> Result<u64, Error> {
        CacheDb::purge_older_than(self, days_to_keep).await
    }

    async fn ping(&self) -> Result<(), Error> {
        CacheDb::ping(self).await
    }
}

/// Render a timestamp in the fixed-width form stored in every table.
///
/// Millisecond precision with a `Z` suffix keeps lexical and chronological
/// order identical, which the range queries rely on.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp, mapping failures to a column conversion error.
pub(crate) fn parse_timestamp(raw: &str, column: usize) -> tokio_rusqlite::rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            tokio_rusqlite::rusqlite::Error::FromSqlConversionFailure(
                column,
                tokio_rusqlite::rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}
