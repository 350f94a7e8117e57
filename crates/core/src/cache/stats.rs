//! Resolution statistics.
//!
//! One row per resolution attempt, never updated after insert. The
//! aggregates below are read-only and return zeroed values on an empty table.

use super::connection::CacheDb;
use super::hot::hit_rate;
use super::timestamp;
use crate::Error;
use chrono::{Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_rusqlite::params;

/// The tier that served (or failed to serve) a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Hot,
    Persistent,
    Extraction,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Hot => "hot",
            Source::Persistent => "persistent",
            Source::Extraction => "extraction",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeStat {
    pub query: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error_message: Option<String>,
    pub source: Source,
    pub result_count: usize,
}

/// Per-day aggregate over [`ScrapeStat`] rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DailyAnalytics {
    /// Calendar day (UTC), `YYYY-MM-DD`.
    pub date: String,
    pub total_requests: u64,
    pub unique_queries: u64,
    pub hot_hits: u64,
    pub persistent_hits: u64,
    pub extractions: u64,
    pub successful: u64,
    pub failed: u64,
    pub avg_duration_ms: f64,
}

/// Cache effectiveness over a trailing window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheEfficiency {
    pub total_requests: u64,
    pub hot_hits: u64,
    pub persistent_hits: u64,
    pub extractions: u64,
    pub avg_duration_ms: f64,
    pub successful: u64,
    pub failed: u64,
    /// Share of requests served by either cache tier, as a rounded percentage.
    pub cache_hit_rate: u64,
}

impl CacheDb {
    /// Append one statistic row.
    pub async fn record_stat(&self, stat: &ScrapeStat) -> Result<(), Error> {
        let stat = stat.clone();
        let recorded_at = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO scrape_stats (query, success, duration_ms, error_message, source, result_count, recorded_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        &stat.query,
                        stat.success as i32,
                        stat.duration_ms as i64,
                        &stat.error_message,
                        stat.source.as_str(),
                        stat.result_count as i64,
                        recorded_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Daily aggregates for today and the previous `days` days, newest first.
    pub async fn analytics(&self, days: u32) -> Result<Vec<DailyAnalytics>, Error> {
        let start_day = (Utc::now() - Duration::days(i64::from(days))).date_naive();
        let cutoff = timestamp(start_day.and_time(NaiveTime::default()).and_utc());
        self.conn
            .call(move |conn| -> Result<Vec<DailyAnalytics>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT substr(recorded_at, 1, 10) AS day,
                            COUNT(*),
                            COUNT(DISTINCT lower(trim(query))),
                            TOTAL(source = 'hot'),
                            TOTAL(source = 'persistent'),
                            TOTAL(source = 'extraction'),
                            TOTAL(success = 1),
                            TOTAL(success = 0),
                            COALESCE(AVG(duration_ms), 0.0)
                     FROM scrape_stats
                     WHERE recorded_at >= ?1
                     GROUP BY day
                     ORDER BY day DESC",
                )?;
                let rows = stmt
                    .query_map(params![cutoff], |row| {
                        Ok(DailyAnalytics {
                            date: row.get(0)?,
                            total_requests: row.get::<_, i64>(1)? as u64,
                            unique_queries: row.get::<_, i64>(2)? as u64,
                            hot_hits: row.get::<_, f64>(3)? as u64,
                            persistent_hits: row.get::<_, f64>(4)? as u64,
                            extractions: row.get::<_, f64>(5)? as u64,
                            successful: row.get::<_, f64>(6)? as u64,
                            failed: row.get::<_, f64>(7)? as u64,
                            avg_duration_ms: row.get(8)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }

    /// Totals over the trailing `hours` hours.
    pub async fn cache_efficiency(&self, hours: u32) -> Result<CacheEfficiency, Error> {
        let cutoff = timestamp(Utc::now() - Duration::hours(i64::from(hours)));
        self.conn
            .call(move |conn| -> Result<CacheEfficiency, Error> {
                let efficiency = conn.query_row(
                    "SELECT COUNT(*),
                            TOTAL(source = 'hot'),
                            TOTAL(source = 'persistent'),
                            TOTAL(source = 'extraction'),
                            COALESCE(AVG(duration_ms), 0.0),
                            TOTAL(success = 1),
                            TOTAL(success = 0)
                     FROM scrape_stats
                     WHERE recorded_at >= ?1",
                    params![cutoff],
                    |row| {
                        let total_requests = row.get::<_, i64>(0)? as u64;
                        let hot_hits = row.get::<_, f64>(1)? as u64;
                        let persistent_hits = row.get::<_, f64>(2)? as u64;
                        Ok(CacheEfficiency {
                            total_requests,
                            hot_hits,
                            persistent_hits,
                            extractions: row.get::<_, f64>(3)? as u64,
                            avg_duration_ms: row.get(4)?,
                            successful: row.get::<_, f64>(5)? as u64,
                            failed: row.get::<_, f64>(6)? as u64,
                            cache_hit_rate: hit_rate(
                                hot_hits + persistent_hits,
                                total_requests.saturating_sub(hot_hits + persistent_hits),
                            ),
                        })
                    },
                )?;
                Ok(efficiency)
            })
            .await
            .map_err(Error::from)
    }
}
