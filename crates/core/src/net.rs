// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network quality classification from ping latency.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetQuality {
    Good,
    Ok,
    Poor,
    Offline,
}

impl NetQuality {
    /// Classify a ping latency. `None` means no reply within the timeout.
    ///
    /// Boundaries are inclusive: exactly 50ms is still `Good`, exactly
    /// 150ms is still `Ok`.
    pub fn classify(latency_ms: Option<f64>) -> Self {
        match latency_ms {
            None => NetQuality::Offline,
            Some(ms) if ms <= 50.0 => NetQuality::Good,
            Some(ms) if ms <= 150.0 => NetQuality::Ok,
            Some(_) => NetQuality::Poor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetQuality::Good => "good",
            NetQuality::Ok => "ok",
            NetQuality::Poor => "poor",
            NetQuality::Offline => "offline",
        }
    }

    /// Severity of the `network_status` timeline event announcing a
    /// transition into this quality.
    pub fn event_severity(&self) -> Severity {
        match self {
            NetQuality::Offline => Severity::Critical,
            NetQuality::Poor => Severity::Warning,
            NetQuality::Good | NetQuality::Ok => Severity::Info,
        }
    }
}

impl std::fmt::Display for NetQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "net_tests.rs"]
mod tests;
