// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-span rollups and retention pruning.
//!
//! Raw snapshots roll up into per-minute averages, which roll up into
//! 15-minute averages. Each step keeps a persisted cursor (`app_state`)
//! marking the exclusive start of the next range, lags behind `now` so
//! late rows from the current bucket are not averaged early, and processes
//! a bounded span per cycle so a daemon that was off for days catches up
//! incrementally. All three steps run inside the caller's transaction;
//! cursors therefore only advance when the cycle commits.

use crate::db::StoreError;
use crate::settings::SettingsStore;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};
use vigil_core::{floor_15m, floor_minute, parse_rfc3339, rfc3339_utc};

pub const RAW_RETENTION_HOURS: i64 = 24;
pub const ROLLUP_1M_DAYS: i64 = 7;
pub const ROLLUP_15M_DAYS: i64 = 30;

const RAW_TO_1M_LAG_MINUTES: i64 = 2;
const ONE_M_TO_15M_LAG_MINUTES: i64 = 20;

const RAW_TO_1M_MAX_SPAN_MINUTES: i64 = 6 * 60;
const ONE_M_TO_15M_MAX_SPAN_MINUTES: i64 = 2 * 24 * 60;

/// Cursor: exclusive upper bound of the last committed raw→1m range.
pub const CURSOR_RAW_TO_1M: &str = "rollup_raw_to_1m_next_start_utc";
/// Cursor: exclusive upper bound of the last committed 1m→15m range.
pub const CURSOR_1M_TO_15M: &str = "rollup_1m_to_15m_next_start_utc";

fn cursor_or(
    settings: &SettingsStore<'_>,
    key: &str,
    fallback: DateTime<Utc>,
) -> Result<DateTime<Utc>, StoreError> {
    let stored = settings.get(key)?.and_then(|v| parse_rfc3339(&v));
    Ok(stored.unwrap_or(fallback))
}

/// Roll raw snapshots up into `snapshots_1m`. Returns true when a range
/// was processed.
pub fn rollup_raw_to_1m(conn: &Connection, now_utc: DateTime<Utc>) -> Result<bool, StoreError> {
    let settings = SettingsStore::new(conn);
    let cutoff = floor_minute(now_utc - Duration::minutes(RAW_TO_1M_LAG_MINUTES));
    let fallback = floor_minute(now_utc - Duration::days(ROLLUP_15M_DAYS));
    let start = floor_minute(cursor_or(&settings, CURSOR_RAW_TO_1M, fallback)?);

    if start >= cutoff {
        return Ok(false);
    }
    let end = floor_minute(std::cmp::min(
        cutoff,
        start + Duration::minutes(RAW_TO_1M_MAX_SPAN_MINUTES),
    ));
    if end <= start {
        return Ok(false);
    }

    conn.execute(
        "INSERT INTO snapshots_1m (
            bucket_start_utc,
            avg_cpu_percent,
            avg_mem_percent,
            avg_disk_percent,
            avg_net_sent_bps,
            avg_net_recv_bps
        )
        SELECT
            substr(ts_utc, 1, 16) || ':00+00:00' AS bucket_start_utc,
            avg(cpu_percent) AS avg_cpu_percent,
            avg(mem_percent) AS avg_mem_percent,
            avg(disk_percent) AS avg_disk_percent,
            avg(net_sent_bps) AS avg_net_sent_bps,
            avg(net_recv_bps) AS avg_net_recv_bps
        FROM snapshots
        WHERE ts_utc >= ?1 AND ts_utc < ?2
        GROUP BY bucket_start_utc
        ON CONFLICT(bucket_start_utc) DO UPDATE SET
            avg_cpu_percent = excluded.avg_cpu_percent,
            avg_mem_percent = excluded.avg_mem_percent,
            avg_disk_percent = excluded.avg_disk_percent,
            avg_net_sent_bps = excluded.avg_net_sent_bps,
            avg_net_recv_bps = excluded.avg_net_recv_bps",
        params![rfc3339_utc(start), rfc3339_utc(end)],
    )?;

    settings.set(CURSOR_RAW_TO_1M, &rfc3339_utc(end))?;
    Ok(true)
}

/// Roll `snapshots_1m` up into `snapshots_15m`. Returns true when a range
/// was processed.
pub fn rollup_1m_to_15m(conn: &Connection, now_utc: DateTime<Utc>) -> Result<bool, StoreError> {
    let settings = SettingsStore::new(conn);
    let cutoff = floor_15m(now_utc - Duration::minutes(ONE_M_TO_15M_LAG_MINUTES));
    let fallback = floor_15m(now_utc - Duration::days(ROLLUP_15M_DAYS));
    let start = floor_15m(cursor_or(&settings, CURSOR_1M_TO_15M, fallback)?);

    if start >= cutoff {
        return Ok(false);
    }
    let end = floor_15m(std::cmp::min(
        cutoff,
        start + Duration::minutes(ONE_M_TO_15M_MAX_SPAN_MINUTES),
    ));
    if end <= start {
        return Ok(false);
    }

    // Bucket computation: keep "YYYY-MM-DDTHH:", floor the minute field to
    // the 15-minute mark, re-suffix seconds and offset.
    conn.execute(
        "INSERT INTO snapshots_15m (
            bucket_start_utc,
            avg_cpu_percent,
            avg_mem_percent,
            avg_disk_percent,
            avg_net_sent_bps,
            avg_net_recv_bps
        )
        SELECT
            substr(bucket_start_utc, 1, 14)
                || printf(
                    '%02d',
                    CAST(CAST(substr(bucket_start_utc, 15, 2) AS INTEGER) / 15 AS INTEGER) * 15
                )
                || ':00+00:00' AS bucket_start_utc,
            avg(avg_cpu_percent) AS avg_cpu_percent,
            avg(avg_mem_percent) AS avg_mem_percent,
            avg(avg_disk_percent) AS avg_disk_percent,
            avg(avg_net_sent_bps) AS avg_net_sent_bps,
            avg(avg_net_recv_bps) AS avg_net_recv_bps
        FROM snapshots_1m
        WHERE bucket_start_utc >= ?1 AND bucket_start_utc < ?2
        GROUP BY bucket_start_utc
        ON CONFLICT(bucket_start_utc) DO UPDATE SET
            avg_cpu_percent = excluded.avg_cpu_percent,
            avg_mem_percent = excluded.avg_mem_percent,
            avg_disk_percent = excluded.avg_disk_percent,
            avg_net_sent_bps = excluded.avg_net_sent_bps,
            avg_net_recv_bps = excluded.avg_net_recv_bps",
        params![rfc3339_utc(start), rfc3339_utc(end)],
    )?;

    settings.set(CURSOR_1M_TO_15M, &rfc3339_utc(end))?;
    Ok(true)
}

/// Prune expired rows. Raw and 1m cutoffs never pass their rollup cursor,
/// so a row is only deleted after it has been averaged into the next tier.
pub fn apply_retention(conn: &Connection, now_utc: DateTime<Utc>) -> Result<(), StoreError> {
    let settings = SettingsStore::new(conn);

    let raw_cutoff = rfc3339_utc(now_utc - Duration::hours(RAW_RETENTION_HOURS));
    let one_m_cutoff = rfc3339_utc(now_utc - Duration::days(ROLLUP_1M_DAYS));
    let fifteen_m_cutoff = rfc3339_utc(now_utc - Duration::days(ROLLUP_15M_DAYS));

    let raw_cursor = settings.get(CURSOR_RAW_TO_1M)?.and_then(|v| parse_rfc3339(&v));
    let safe_raw_cutoff = match raw_cursor {
        Some(cursor) => std::cmp::min(raw_cutoff, rfc3339_utc(cursor)),
        None => raw_cutoff,
    };

    let one_m_cursor = settings.get(CURSOR_1M_TO_15M)?.and_then(|v| parse_rfc3339(&v));
    let safe_one_m_cutoff = match one_m_cursor {
        Some(cursor) => std::cmp::min(one_m_cutoff, rfc3339_utc(cursor)),
        None => one_m_cutoff,
    };

    conn.execute(
        "DELETE FROM snapshots WHERE ts_utc < ?1",
        params![safe_raw_cutoff],
    )?;
    conn.execute(
        "DELETE FROM snapshots_1m WHERE bucket_start_utc < ?1",
        params![safe_one_m_cutoff],
    )?;
    conn.execute(
        "DELETE FROM snapshots_15m WHERE bucket_start_utc < ?1",
        params![fifteen_m_cutoff],
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "rollup_tests.rs"]
mod tests;
