//! Stand-in store used when the database could not be opened.

use super::{CacheEfficiency, DailyAnalytics, PopularQuery, ResultStore, ScrapeStat, StoredSearch};
use crate::{Decision, Error};

/// [`ResultStore`] with no backing database. Every call fails with
/// [`Error::StoreUnavailable`] carrying the reason the store is missing, so
/// the resolver degrades to the hot tier and extraction.
#[derive(Debug, Clone)]
pub struct DetachedStore {
    reason: String,
}

impl DetachedStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    fn unavailable(&self) -> Error {
        Error::StoreUnavailable(self.reason.clone())
    }
}

#[async_trait::async_trait]
impl ResultStore for DetachedStore {
    async fn find_by_fingerprint(&self, _fingerprint: &str) -> Result<Option<StoredSearch>, Error> {
        Err(self.unavailable())
    }

    async fn upsert(&self, _query: &str, _decisions: &[Decision]) -> Result<i64, Error> {
        Err(self.unavailable())
    }

    async fn touch_access(&self, _fingerprint: &str) -> Result<(), Error> {
        Err(self.unavailable())
    }

    async fn record_stat(&self, _stat: &ScrapeStat) -> Result<(), Error> {
        Err(self.unavailable())
    }

    async fn popular_queries(&self, _limit: usize) -> Result<Vec<PopularQuery>, Error> {
        Err(self.unavailable())
    }

    async fn analytics(&self, _days: u32) -> Result<Vec<DailyAnalytics>, Error> {
        Err(self.unavailable())
    }

    async fn cache_efficiency(&self, _hours: u32) -> Result<CacheEfficiency, Error> {
        Err(self.unavailable())
    }

    async fn purge_older_than(&self, _days_to_keep: u32) -> Result<u64, Error> {
        Err(self.unavailable())
    }

    async fn ping(&self) -> Result<(), Error> {
        Err(self.unavailable())
    }
}
