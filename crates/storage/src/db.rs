// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection pool, schema creation, and additive migrations.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("meta serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to the embedded store. Cheap to clone; all clones share the pool.
#[derive(Clone)]
pub struct Store {
    pool: Pool<SqliteConnectionManager>,
}

/// A connection checked out of the pool.
pub type PooledConn = r2d2::PooledConnection<SqliteConnectionManager>;

impl Store {
    /// Open (creating if needed) the database at `path` and bring the
    /// schema up to date.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            Ok(())
        });
        let pool = Pool::builder().max_size(8).build(manager)?;

        let store = Self { pool };
        store.init_schema()?;
        info!(path = %path.display(), "SQLite store initialized");
        Ok(store)
    }

    /// Check a connection out of the pool.
    pub fn conn(&self) -> Result<PooledConn, StoreError> {
        Ok(self.pool.get()?)
    }

    /// Run `f` inside a transaction; commit on `Ok`, roll back on `Err`.
    pub fn with_tx<T>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts_utc TEXT NOT NULL,
                cpu_percent REAL,
                mem_percent REAL,
                mem_used_bytes INTEGER,
                mem_avail_bytes INTEGER,
                mem_total_bytes INTEGER,
                disk_percent REAL,
                disk_used_bytes INTEGER,
                disk_free_bytes INTEGER,
                disk_total_bytes INTEGER,
                net_sent_bps REAL,
                net_recv_bps REAL
            );
            CREATE INDEX IF NOT EXISTS idx_snapshots_ts_utc ON snapshots(ts_utc);

            CREATE TABLE IF NOT EXISTS snapshots_1m (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bucket_start_utc TEXT NOT NULL UNIQUE,
                avg_cpu_percent REAL,
                avg_mem_percent REAL,
                avg_disk_percent REAL,
                avg_net_sent_bps REAL,
                avg_net_recv_bps REAL
            );
            CREATE INDEX IF NOT EXISTS idx_snapshots_1m_bucket ON snapshots_1m(bucket_start_utc);

            CREATE TABLE IF NOT EXISTS snapshots_15m (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bucket_start_utc TEXT NOT NULL UNIQUE,
                avg_cpu_percent REAL,
                avg_mem_percent REAL,
                avg_disk_percent REAL,
                avg_net_sent_bps REAL,
                avg_net_recv_bps REAL
            );
            CREATE INDEX IF NOT EXISTS idx_snapshots_15m_bucket ON snapshots_15m(bucket_start_utc);

            CREATE TABLE IF NOT EXISTS alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts_utc TEXT NOT NULL,
                type TEXT NOT NULL,
                message TEXT NOT NULL,
                severity TEXT NOT NULL,
                acknowledged INTEGER NOT NULL DEFAULT 0,
                acknowledged_ts_utc TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_alerts_ts_utc ON alerts(ts_utc);

            CREATE TABLE IF NOT EXISTS alert_settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts_utc TEXT NOT NULL,
                kind TEXT NOT NULL,
                message TEXT NOT NULL,
                severity TEXT NOT NULL,
                meta_json TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_events_ts_utc ON events(ts_utc);
            "#,
        )?;

        migrate_snapshot_columns(&conn)?;
        Ok(())
    }
}

/// Metric columns added to `snapshots` after the first release. Databases
/// created before a column existed get it added in place.
const SNAPSHOT_COLUMNS: &[(&str, &str)] = &[
    ("cpu_percent", "REAL"),
    ("mem_percent", "REAL"),
    ("mem_used_bytes", "INTEGER"),
    ("mem_avail_bytes", "INTEGER"),
    ("mem_total_bytes", "INTEGER"),
    ("disk_percent", "REAL"),
    ("disk_used_bytes", "INTEGER"),
    ("disk_free_bytes", "INTEGER"),
    ("disk_total_bytes", "INTEGER"),
    ("net_sent_bps", "REAL"),
    ("net_recv_bps", "REAL"),
];

fn migrate_snapshot_columns(conn: &Connection) -> Result<(), StoreError> {
    let mut stmt = conn.prepare("PRAGMA table_info(snapshots)")?;
    let existing: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<_, _>>()?;

    for (name, column_type) in SNAPSHOT_COLUMNS {
        if !existing.iter().any(|c| c == name) {
            info!(column = name, "adding missing snapshots column");
            conn.execute_batch(&format!(
                "ALTER TABLE snapshots ADD COLUMN {name} {column_type}"
            ))?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
