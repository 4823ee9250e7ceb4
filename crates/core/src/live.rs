// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live-bus message envelope.
//!
//! Every outbound message uses the same envelope:
//! `{ "type": <string>, "v": 1, "ts_utc": <RFC3339>, "data": <object> }`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveKind {
    Hello,
    Kpi,
    ChartPoint,
    Alert,
    AlertState,
    TimelineEvent,
    Processes,
    ListeningPorts,
    Profile,
}

impl LiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiveKind::Hello => "hello",
            LiveKind::Kpi => "kpi",
            LiveKind::ChartPoint => "chart_point",
            LiveKind::Alert => "alert",
            LiveKind::AlertState => "alert_state",
            LiveKind::TimelineEvent => "timeline_event",
            LiveKind::Processes => "processes",
            LiveKind::ListeningPorts => "listening_ports",
            LiveKind::Profile => "profile",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveMessage {
    #[serde(rename = "type")]
    pub kind: LiveKind,
    pub v: u32,
    pub ts_utc: String,
    pub data: serde_json::Value,
}

impl LiveMessage {
    pub fn new(kind: LiveKind, ts_utc: &str, data: serde_json::Value) -> Self {
        Self {
            kind,
            v: 1,
            ts_utc: ts_utc.to_string(),
            data,
        }
    }
}

#[cfg(test)]
#[path = "live_tests.rs"]
mod tests;
