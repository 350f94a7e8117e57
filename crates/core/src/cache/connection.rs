//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! for performance and concurrency (WAL mode), and running migrations.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

/// Access count at which a persisted search result is flagged popular.
pub const DEFAULT_POPULAR_THRESHOLD: u32 = 5;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Persistent cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Cloning is cheap and shares the connection.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
    pub(crate) popular_threshold: u32,
}

impl CacheDb {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| conn.execute_batch(PRAGMAS))
            .await
            .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn, popular_threshold: DEFAULT_POPULAR_THRESHOLD })
    }

    /// Set the access count at which results are flagged popular.
    pub fn with_popular_threshold(mut self, threshold: u32) -> Self {
        self.popular_threshold = threshold;
        self
    }

    /// Round-trip a trivial query to check the connection is alive.
    pub async fn ping(&self) -> Result<(), Error> {
        self.conn
            .call(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
