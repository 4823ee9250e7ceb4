// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alert kinds and persisted alert rows.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// What an alert is about.
///
/// The stored `type` string and the cooldown `key` are derived here so the
/// engine and the store cannot disagree about them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlertKind {
    CpuHigh,
    RamHigh,
    /// A required port stopped listening.
    PortDown(u16),
    /// A required port's listening state oscillated past the flap threshold.
    PortFlapping(u16),
    /// Ping probe produced no reply for the sustained window.
    NetworkOffline(String),
    /// Ping latency classified as poor.
    NetworkPoor(String),
}

impl AlertKind {
    /// Stored `alerts.type` value.
    pub fn type_str(&self) -> &'static str {
        match self {
            AlertKind::CpuHigh => "cpu_high",
            AlertKind::RamHigh => "ram_high",
            AlertKind::PortDown(_) => "port_down",
            AlertKind::PortFlapping(_) => "port_flapping",
            AlertKind::NetworkOffline(_) => "network_offline",
            AlertKind::NetworkPoor(_) => "network_poor",
        }
    }

    /// Cooldown key: alerts of the same `(type, key)` share a cooldown.
    pub fn key(&self) -> String {
        match self {
            AlertKind::CpuHigh | AlertKind::RamHigh => "global".to_string(),
            AlertKind::PortDown(port) | AlertKind::PortFlapping(port) => port.to_string(),
            AlertKind::NetworkOffline(host) | AlertKind::NetworkPoor(host) => host.clone(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertKind::PortDown(_) | AlertKind::NetworkOffline(_) => Severity::Critical,
            AlertKind::CpuHigh
            | AlertKind::RamHigh
            | AlertKind::PortFlapping(_)
            | AlertKind::NetworkPoor(_) => Severity::Warning,
        }
    }
}

/// Alert to be inserted by the engine's consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub ts_utc: String,
    pub kind: AlertKind,
    pub message: String,
}

impl NewAlert {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

/// Persisted alert row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub ts_utc: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub severity: Severity,
    pub acknowledged: bool,
    pub acknowledged_ts_utc: Option<String>,
}

#[cfg(test)]
#[path = "alert_tests.rs"]
mod tests;
