// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UTC timestamp formatting and bucket flooring.
//!
//! All persisted timestamps are RFC3339 with an explicit `+00:00` suffix so
//! lexicographic comparison in SQL matches chronological order.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};

/// Serialize a UTC timestamp as RFC3339 with `+00:00`.
///
/// Zero subseconds are omitted entirely, so floored bucket bounds compare
/// equal to the bucket strings synthesized in SQL.
pub fn rfc3339_utc(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Parse an RFC3339 timestamp, normalizing to UTC. Returns `None` on
/// malformed input (stored cursors may have been hand-edited).
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Floor to the start of the minute.
pub fn floor_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Floor to the start of the 15-minute bucket.
pub fn floor_15m(ts: DateTime<Utc>) -> DateTime<Utc> {
    let floored = floor_minute(ts);
    let minute = floored.minute() - floored.minute() % 15;
    floored.with_minute(minute).unwrap_or(floored)
}

#[cfg(test)]
#[path = "time_floor_tests.rs"]
mod tests;
