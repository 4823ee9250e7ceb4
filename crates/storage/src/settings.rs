// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application state key/value store (`app_state`).
//!
//! Holds the active profile name and the rollup cursors. Values are plain
//! strings; timestamps are RFC3339.

use crate::db::StoreError;
use rusqlite::{params, Connection, OptionalExtension};

/// Name of the currently selected monitoring profile.
pub const ACTIVE_PROFILE_NAME: &str = "active_profile_name";

/// Typed repository over `app_state`.
pub struct SettingsStore<'c> {
    conn: &'c Connection,
}

impl<'c> SettingsStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Read a value. Blank values read as `None` (a hand-cleared row
    /// behaves like a missing one).
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
