// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-table and container rows broadcast to observers.

use serde::{Deserialize, Serialize};

/// One row of the top-N process table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRow {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_bytes: i64,
    pub status: String,
    pub username: String,
}

/// One container from the container engine, with best-effort stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRow {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: String,
    pub cpu_percent: Option<f64>,
    pub mem_bytes: Option<i64>,
}
