// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alert repository and alert-scoped settings.

use crate::db::StoreError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use vigil_core::{Alert, NewAlert, Severity};

/// Key under which the mute deadline is stored.
pub const SETTING_MUTE_UNTIL: &str = "mute_until_utc";

/// Typed repository over `alerts` and `alert_settings`.
pub struct AlertStore<'c> {
    conn: &'c Connection,
}

impl<'c> AlertStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert a new, unacknowledged alert and return its id.
    pub fn insert(&self, alert: &NewAlert) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO alerts (ts_utc, type, message, severity, acknowledged, acknowledged_ts_utc)
             VALUES (?1, ?2, ?3, ?4, 0, NULL)",
            params![
                alert.ts_utc,
                alert.kind.type_str(),
                alert.message,
                alert.severity().as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent alerts, newest first. Acknowledged rows are excluded
    /// unless `include_ack` is set.
    pub fn recent(&self, limit: usize, include_ack: bool) -> Result<Vec<Alert>, StoreError> {
        let sql = if include_ack {
            "SELECT id, ts_utc, type, message, severity, acknowledged, acknowledged_ts_utc
             FROM alerts ORDER BY ts_utc DESC LIMIT ?1"
        } else {
            "SELECT id, ts_utc, type, message, severity, acknowledged, acknowledged_ts_utc
             FROM alerts WHERE acknowledged = 0 ORDER BY ts_utc DESC LIMIT ?1"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![limit as i64], alert_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Acknowledge an alert. Returns false when the alert does not exist or
    /// is already acknowledged, so a second call reports no change.
    pub fn acknowledge(&self, id: i64, ts_utc: &str) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE alerts SET acknowledged = 1, acknowledged_ts_utc = ?1
             WHERE id = ?2 AND acknowledged = 0",
            params![ts_utc, id],
        )?;
        Ok(changed > 0)
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM alert_settings WHERE key = ?1 LIMIT 1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Set or clear a setting; `None` deletes the row.
    pub fn set_setting(&self, key: &str, value: Option<&str>) -> Result<(), StoreError> {
        match value {
            Some(value) => {
                self.conn.execute(
                    "INSERT INTO alert_settings (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![key, value],
                )?;
            }
            None => {
                self.conn
                    .execute("DELETE FROM alert_settings WHERE key = ?1", params![key])?;
            }
        }
        Ok(())
    }
}

fn alert_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    let severity: String = row.get(4)?;
    Ok(Alert {
        id: row.get(0)?,
        ts_utc: row.get(1)?,
        kind: row.get(2)?,
        message: row.get(3)?,
        severity: Severity::from_str_lossy(&severity),
        acknowledged: row.get::<_, i64>(5)? != 0,
        acknowledged_ts_utc: row.get(6)?,
    })
}

#[cfg(test)]
#[path = "alerts_tests.rs"]
mod tests;
