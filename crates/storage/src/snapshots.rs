// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot repository: raw rows and rollup-backed history reads.

use crate::db::StoreError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use vigil_core::HostSample;

/// Snapshot to insert: one tick's readings with its wall-clock timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSnapshot {
    pub ts_utc: String,
    pub sample: HostSample,
}

/// Persisted snapshot row. Rows read from a rollup table reuse this shape
/// with the byte-count fields `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    pub id: i64,
    pub ts_utc: String,
    #[serde(flatten)]
    pub sample: HostSample,
}

/// Typed repository over the `snapshots` tables.
pub struct SnapshotStore<'c> {
    conn: &'c Connection,
}

impl<'c> SnapshotStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert a raw snapshot, returning its row id.
    pub fn insert(&self, snapshot: &NewSnapshot) -> Result<i64, StoreError> {
        let s = &snapshot.sample;
        self.conn.execute(
            "INSERT INTO snapshots (
                ts_utc,
                cpu_percent, mem_percent,
                mem_used_bytes, mem_avail_bytes, mem_total_bytes,
                disk_percent, disk_used_bytes, disk_free_bytes, disk_total_bytes,
                net_sent_bps, net_recv_bps
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                snapshot.ts_utc,
                s.cpu_percent,
                s.mem_percent,
                s.mem_used_bytes,
                s.mem_avail_bytes,
                s.mem_total_bytes,
                s.disk_percent,
                s.disk_used_bytes,
                s.disk_free_bytes,
                s.disk_total_bytes,
                s.net_sent_bps,
                s.net_recv_bps,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent raw snapshot, if any.
    pub fn latest(&self) -> Result<Option<SnapshotRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, ts_utc, cpu_percent, mem_percent,
                        mem_used_bytes, mem_avail_bytes, mem_total_bytes,
                        disk_percent, disk_used_bytes, disk_free_bytes, disk_total_bytes,
                        net_sent_bps, net_recv_bps
                 FROM snapshots ORDER BY ts_utc DESC LIMIT 1",
                [],
                raw_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Raw snapshots at or after `since`, ascending.
    pub fn history(&self, since_ts_utc: &str) -> Result<Vec<SnapshotRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, ts_utc, cpu_percent, mem_percent,
                    mem_used_bytes, mem_avail_bytes, mem_total_bytes,
                    disk_percent, disk_used_bytes, disk_free_bytes, disk_total_bytes,
                    net_sent_bps, net_recv_bps
             FROM snapshots WHERE ts_utc >= ?1 ORDER BY ts_utc ASC",
        )?;
        let rows = stmt
            .query_map(params![since_ts_utc], raw_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 1-minute rollup history at or after `since`, ascending.
    pub fn history_1m(&self, since_ts_utc: &str) -> Result<Vec<SnapshotRow>, StoreError> {
        self.rollup_history("snapshots_1m", since_ts_utc)
    }

    /// 15-minute rollup history at or after `since`, ascending.
    pub fn history_15m(&self, since_ts_utc: &str) -> Result<Vec<SnapshotRow>, StoreError> {
        self.rollup_history("snapshots_15m", since_ts_utc)
    }

    fn rollup_history(
        &self,
        table: &str,
        since_ts_utc: &str,
    ) -> Result<Vec<SnapshotRow>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT bucket_start_utc, avg_cpu_percent, avg_mem_percent,
                    avg_disk_percent, avg_net_sent_bps, avg_net_recv_bps
             FROM {table} WHERE bucket_start_utc >= ?1 ORDER BY bucket_start_utc ASC"
        ))?;
        let rows = stmt
            .query_map(params![since_ts_utc], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, (bucket, cpu, mem, disk, sent, recv))| SnapshotRow {
                // Rollup rows have no raw id; number them within the result.
                id: i as i64 + 1,
                ts_utc: bucket,
                sample: HostSample {
                    cpu_percent: cpu,
                    mem_percent: mem,
                    disk_percent: disk,
                    net_sent_bps: sent,
                    net_recv_bps: recv,
                    ..HostSample::default()
                },
            })
            .collect())
    }
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<SnapshotRow> {
    Ok(SnapshotRow {
        id: row.get(0)?,
        ts_utc: row.get(1)?,
        sample: HostSample {
            cpu_percent: row.get(2)?,
            mem_percent: row.get(3)?,
            mem_used_bytes: row.get(4)?,
            mem_avail_bytes: row.get(5)?,
            mem_total_bytes: row.get(6)?,
            disk_percent: row.get(7)?,
            disk_used_bytes: row.get(8)?,
            disk_free_bytes: row.get(9)?,
            disk_total_bytes: row.get(10)?,
            net_sent_bps: row.get(11)?,
            net_recv_bps: row.get(12)?,
        },
    })
}

#[cfg(test)]
#[path = "snapshots_tests.rs"]
mod tests;
