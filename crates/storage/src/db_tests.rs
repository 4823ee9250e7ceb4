// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn temp_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("vigil.db")).unwrap();
    (dir, store)
}

#[test]
fn open_creates_schema() {
    let (_dir, store) = temp_store();
    let conn = store.conn().unwrap();
    let count: i64 = conn
        .query_row(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('snapshots', 'snapshots_1m', 'snapshots_15m', 'alerts', 'alert_settings', \
              'app_state', 'events')",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 7);
}

#[test]
fn open_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("state").join("vigil").join("vigil.db");
    Store::open(&nested).unwrap();
    assert!(nested.exists());
}

#[test]
fn open_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vigil.db");
    Store::open(&path).unwrap();
    Store::open(&path).unwrap();
}

#[test]
fn migration_adds_missing_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vigil.db");

    // Simulate a database from before the disk and net columns existed.
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts_utc TEXT NOT NULL,
                cpu_percent REAL,
                mem_percent REAL
            )",
        )
        .unwrap();
    }

    let store = Store::open(&path).unwrap();
    let conn = store.conn().unwrap();
    conn.execute(
        "INSERT INTO snapshots (ts_utc, disk_percent, net_sent_bps) VALUES (?1, ?2, ?3)",
        rusqlite::params!["2026-01-01T00:00:00+00:00", 42.0, 1000.0],
    )
    .unwrap();
}

#[test]
fn with_tx_rolls_back_on_error() {
    let (_dir, store) = temp_store();

    let result: Result<(), StoreError> = store.with_tx(|tx| {
        tx.execute(
            "INSERT INTO app_state (key, value) VALUES ('k', 'v')",
            [],
        )?;
        Err(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    });
    assert!(result.is_err());

    let conn = store.conn().unwrap();
    let count: i64 = conn
        .query_row("SELECT count(*) FROM app_state", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0, "failed transaction must leave no rows");
}

#[test]
fn with_tx_commits_on_ok() {
    let (_dir, store) = temp_store();

    store
        .with_tx(|tx| {
            tx.execute(
                "INSERT INTO app_state (key, value) VALUES ('k', 'v')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

    let conn = store.conn().unwrap();
    let value: String = conn
        .query_row("SELECT value FROM app_state WHERE key = 'k'", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(value, "v");
}
