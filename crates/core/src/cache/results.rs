//! Persisted search results.
//!
//! A search result row owns the ordered list of decisions it produced. The
//! decisions are never patched: every write deletes the previous set and
//! inserts the new one inside the same transaction as the parent upsert.

use super::connection::CacheDb;
use super::hash::query_fingerprint;
use super::{parse_timestamp, timestamp};
use crate::{Decision, Error};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// Metadata for one persisted search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSearchResult {
    pub id: i64,
    pub fingerprint: String,
    pub query: String,
    pub result_count: usize,
    pub scraped_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: i64,
    /// Maintained by the store from `access_count`; read-only for callers.
    pub is_popular: bool,
}

/// A persisted search together with its decisions.
#[derive(Debug, Clone)]
pub struct StoredSearch {
    pub result: PersistedSearchResult,
    pub decisions: Vec<Decision>,
}

/// A frequently accessed query.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PopularQuery {
    pub query: String,
    pub access_count: i64,
    pub result_count: usize,
    pub last_accessed_at: DateTime<Utc>,
    pub scraped_at: DateTime<Utc>,
    pub age_hours: i64,
}

/// Whether a result scraped at `scraped_at` is older than `max_age_days`.
pub fn is_stale(scraped_at: DateTime<Utc>, max_age_days: u32) -> bool {
    is_stale_at(scraped_at, max_age_days, Utc::now())
}

/// [`is_stale`] evaluated against an explicit clock.
pub fn is_stale_at(scraped_at: DateTime<Utc>, max_age_days: u32, now: DateTime<Utc>) -> bool {
    now - scraped_at > Duration::days(i64::from(max_age_days))
}

fn read_result(row: &rusqlite::Row<'_>) -> rusqlite::Result<PersistedSearchResult> {
    let scraped_at: String = row.get(4)?;
    let last_accessed_at: String = row.get(5)?;
    Ok(PersistedSearchResult {
        id: row.get(0)?,
        fingerprint: row.get(1)?,
        query: row.get(2)?,
        result_count: row.get::<_, i64>(3)? as usize,
        scraped_at: parse_timestamp(&scraped_at, 4)?,
        last_accessed_at: parse_timestamp(&last_accessed_at, 5)?,
        access_count: row.get(6)?,
        is_popular: row.get::<_, i32>(7)? == 1,
    })
}

fn read_decision(row: &rusqlite::Row<'_>) -> rusqlite::Result<Decision> {
    Ok(Decision {
        sequence_no: row.get(0)?,
        chamber: row.get(1)?,
        case_no: row.get(2)?,
        ruling_no: row.get(3)?,
        ruling_date: row.get(4)?,
        content: row.get(5)?,
        content_length: row.get::<_, i64>(6)? as usize,
        position_in_results: row.get::<_, i64>(7)? as usize,
    })
}

impl CacheDb {
    /// Get a persisted result by fingerprint, with decisions in result order.
    ///
    /// Returns None if nothing has been stored for the fingerprint. Never
    /// deletes anything, stale or not.
    pub async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<StoredSearch>, Error> {
        let fingerprint = fingerprint.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredSearch>, Error> {
                let result = conn
                    .query_row(
                        "SELECT id, fingerprint, query, result_count, scraped_at,
                                last_accessed_at, access_count, is_popular
                         FROM search_results WHERE fingerprint = ?1",
                        params![fingerprint],
                        read_result,
                    )
                    .optional()?;

                let Some(result) = result else {
                    return Ok(None);
                };

                let mut stmt = conn.prepare(
                    "SELECT sequence_no, chamber, case_no, ruling_no, ruling_date,
                            content, content_length, position_in_results
                     FROM decisions
                     WHERE search_result_id = ?1
                     ORDER BY position_in_results ASC",
                )?;
                let decisions = stmt
                    .query_map(params![result.id], read_decision)?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Some(StoredSearch { result, decisions }))
            })
            .await
            .map_err(Error::from)
    }

    /// Find by the raw query text; the fingerprint is derived here.
    pub async fn find_by_query(&self, query: &str) -> Result<Option<StoredSearch>, Error> {
        self.find_by_fingerprint(&query_fingerprint(query)).await
    }

    /// Replace the persisted result for `query` with `decisions`.
    ///
    /// Returns the search result id.
    pub async fn upsert_search_result(&self, query: &str, decisions: &[Decision]) -> Result<i64, Error> {
        self.upsert_search_result_at(query, decisions, Utc::now()).await
    }

    /// [`CacheDb::upsert_search_result`] with an explicit scrape time.
    ///
    /// The parent upsert, the delete of the previous decisions and the insert
    /// of the new ones share one transaction: either the whole replacement is
    /// visible afterwards or none of it is. Positions are recomputed from the
    /// slice order.
    pub async fn upsert_search_result_at(
        &self, query: &str, decisions: &[Decision], scraped_at: DateTime<Utc>,
    ) -> Result<i64, Error> {
        let fingerprint = query_fingerprint(query);
        let query = query.trim().to_string();
        let decisions = decisions.to_vec();
        let scraped_at = timestamp(scraped_at);

        self.conn
            .call(move |conn| -> Result<i64, Error> {
                let tx = conn.transaction()?;

                tx.execute(
                    "INSERT INTO search_results (fingerprint, query, result_count, scraped_at, last_accessed_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)
                     ON CONFLICT(fingerprint) DO UPDATE SET
                         query = excluded.query,
                         result_count = excluded.result_count,
                         scraped_at = excluded.scraped_at,
                         last_accessed_at = excluded.last_accessed_at",
                    params![fingerprint, query, decisions.len() as i64, scraped_at],
                )?;

                let id: i64 = tx.query_row(
                    "SELECT id FROM search_results WHERE fingerprint = ?1",
                    params![fingerprint],
                    |row| row.get(0),
                )?;

                tx.execute("DELETE FROM decisions WHERE search_result_id = ?1", params![id])?;

                {
                    let mut insert = tx.prepare(
                        "INSERT INTO decisions (
                            search_result_id, sequence_no, chamber, case_no, ruling_no,
                            ruling_date, content, content_length, position_in_results
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    )?;
                    for (position, d) in decisions.iter().enumerate() {
                        insert.execute(params![
                            id,
                            &d.sequence_no,
                            &d.chamber,
                            &d.case_no,
                            &d.ruling_no,
                            &d.ruling_date,
                            &d.content,
                            d.content.chars().count() as i64,
                            position as i64,
                        ])?;
                    }
                }

                tx.commit()?;
                Ok(id)
            })
            .await
            .map_err(Error::from)
    }

    /// Record an access: bump the counter, refresh the access time and
    /// re-derive the popularity flag.
    pub async fn touch_access(&self, fingerprint: &str) -> Result<(), Error> {
        let fingerprint = fingerprint.to_string();
        let now = timestamp(Utc::now());
        let threshold = i64::from(self.popular_threshold);
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "UPDATE search_results SET
                         access_count = access_count + 1,
                         last_accessed_at = ?2,
                         is_popular = (access_count + 1 >= ?3)
                     WHERE fingerprint = ?1",
                    params![fingerprint, now, threshold],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Popular queries, most accessed first.
    pub async fn popular_queries(&self, limit: usize) -> Result<Vec<PopularQuery>, Error> {
        let limit = limit as i64;
        let now = Utc::now();
        self.conn
            .call(move |conn| -> Result<Vec<PopularQuery>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT query, access_count, result_count, last_accessed_at, scraped_at
                     FROM search_results
                     WHERE is_popular = 1
                     ORDER BY access_count DESC, last_accessed_at DESC
                     LIMIT ?1",
                )?;
                let rows = stmt
                    .query_map(params![limit], |row| {
                        let last_accessed_at: String = row.get(3)?;
                        let scraped_at = parse_timestamp(&row.get::<_, String>(4)?, 4)?;
                        Ok(PopularQuery {
                            query: row.get(0)?,
                            access_count: row.get(1)?,
                            result_count: row.get::<_, i64>(2)? as usize,
                            last_accessed_at: parse_timestamp(&last_accessed_at, 3)?,
                            scraped_at,
                            age_hours: (now - scraped_at).num_hours(),
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete search results scraped more than `days_to_keep` days ago, along
    /// with their decisions and any statistics older than the same cutoff.
    ///
    /// Returns the number of search results deleted.
    pub async fn purge_older_than(&self, days_to_keep: u32) -> Result<u64, Error> {
        let cutoff = timestamp(Utc::now() - Duration::days(i64::from(days_to_keep)));
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let results = tx.execute("DELETE FROM search_results WHERE scraped_at < ?1", params![cutoff])?;
                let stats = tx.execute("DELETE FROM scrape_stats WHERE recorded_at < ?1", params![cutoff])?;
                tx.commit()?;
                tracing::debug!(results, stats, "purged persistent cache");
                Ok(results as u64)
            })
            .await
            .map_err(Error::from)
    }
}
