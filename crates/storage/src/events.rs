// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeline event log.

use crate::db::StoreError;
use rusqlite::{params, Connection, Row};
use tracing::warn;
use vigil_core::{NewEvent, Severity, TimelineEvent};

/// Append-only repository over `events`.
pub struct EventLog<'c> {
    conn: &'c Connection,
}

impl<'c> EventLog<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Append an event; `meta` is serialized to compact JSON.
    pub fn insert(&self, event: &NewEvent) -> Result<i64, StoreError> {
        let meta_json = event
            .meta
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.conn.execute(
            "INSERT INTO events (ts_utc, kind, message, severity, meta_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.ts_utc,
                event.kind.as_str(),
                event.message,
                event.severity.as_str(),
                meta_json,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Events at or after `since`, newest first, capped at `limit`.
    pub fn since(&self, since_ts_utc: &str, limit: usize) -> Result<Vec<TimelineEvent>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, ts_utc, kind, message, severity, meta_json
             FROM events WHERE ts_utc >= ?1 ORDER BY ts_utc DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![since_ts_utc, limit as i64], event_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Most recent events regardless of age, newest first.
    pub fn latest(&self, limit: usize) -> Result<Vec<TimelineEvent>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, ts_utc, kind, message, severity, meta_json
             FROM events ORDER BY ts_utc DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], event_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn event_row(row: &Row<'_>) -> rusqlite::Result<TimelineEvent> {
    let severity: String = row.get(4)?;
    let meta_json: Option<String> = row.get(5)?;
    let meta = meta_json.as_deref().and_then(|raw| {
        serde_json::from_str(raw)
            .map_err(|e| warn!(error = %e, "unparseable event meta_json"))
            .ok()
    });
    Ok(TimelineEvent {
        id: row.get(0)?,
        ts_utc: row.get(1)?,
        kind: row.get(2)?,
        message: row.get(3)?,
        severity: Severity::from_str_lossy(&severity),
        meta,
    })
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
