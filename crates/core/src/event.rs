// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeline events.
//!
//! The timeline is the append-only chronological log of state transitions.
//! It overlaps with alerts (every alert gets an `alert_created` mirror) but
//! also records informational transitions that never alert: ports coming
//! up, network quality changes, startup, mute toggles, acknowledgements.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    AppStarted,
    AlertCreated,
    AlertAck,
    MuteEnabled,
    MuteDisabled,
    PortUp,
    PortDown,
    NetworkStatus,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AppStarted => "app_started",
            EventKind::AlertCreated => "alert_created",
            EventKind::AlertAck => "alert_ack",
            EventKind::MuteEnabled => "mute_enabled",
            EventKind::MuteDisabled => "mute_disabled",
            EventKind::PortUp => "port_up",
            EventKind::PortDown => "port_down",
            EventKind::NetworkStatus => "network_status",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event to be appended to the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub ts_utc: String,
    pub kind: EventKind,
    pub message: String,
    pub severity: Severity,
    pub meta: Option<serde_json::Value>,
}

/// Persisted timeline row. `meta` is the parsed form of `meta_json`, or
/// `None` when the stored JSON fails to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: i64,
    pub ts_utc: String,
    pub kind: String,
    pub message: String,
    pub severity: Severity,
    pub meta: Option<serde_json::Value>,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
