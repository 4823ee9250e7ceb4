// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vigil-storage: embedded SQLite store and typed repositories.
//!
//! One database file holds raw snapshots, their 1-minute and 15-minute
//! rollups, alerts, timeline events, and key/value settings. Writers
//! serialize through a one-writer-per-service convention (scheduler,
//! retention); everything uses short transactions via [`Store::with_tx`].

pub mod alerts;
pub mod db;
pub mod events;
pub mod rollup;
pub mod settings;
pub mod snapshots;

pub use alerts::AlertStore;
pub use db::{Store, StoreError};
pub use events::EventLog;
pub use rollup::{apply_retention, rollup_1m_to_15m, rollup_raw_to_1m};
pub use settings::SettingsStore;
pub use snapshots::{NewSnapshot, SnapshotRow, SnapshotStore};
