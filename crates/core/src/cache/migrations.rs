//! Database schema migrations.
//!
//! A `_migrations` table records applied versions. Each pending migration is
//! applied together with its version row inside one transaction.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Migration list: (version, SQL), in ascending version order.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../migrations/001_search_results.sql")),
    (2, include_str!("../../migrations/002_scrape_stats.sql")),
];

/// Run any pending migrations.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the version whose SQL failed, or
/// `Error::Database` if the version table itself cannot be read.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for (version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > current) {
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, super::timestamp(chrono::Utc::now())],
            )?;
            tx.commit()?;
            tracing::debug!(version, "applied cache migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
