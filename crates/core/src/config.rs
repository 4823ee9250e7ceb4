// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon and engine tunables.
//!
//! Defaults match the production profile; every field can be overridden
//! from the optional `vigil.toml` in the state directory. CPU/RAM
//! thresholds are per-profile and live on [`crate::Profile`], not here.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and probe settings owned by the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Minimum cadence of the snapshot loop; a tick that overruns simply
    /// delays the next one.
    pub snapshot_interval_secs: u64,
    pub ping_host: String,
    pub ping_timeout_ms: u64,
    /// Cadence gate for `processes` / `listening_ports` broadcasts.
    pub observer_feed_interval_secs: u64,
    pub top_processes_limit: usize,
    pub listening_ports_limit: usize,
    pub retention_interval_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            snapshot_interval_secs: 1,
            ping_host: "1.1.1.1".to_string(),
            ping_timeout_ms: 800,
            observer_feed_interval_secs: 5,
            top_processes_limit: 10,
            listening_ports_limit: 500,
            retention_interval_secs: 60,
        }
    }
}

impl DaemonConfig {
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs)
    }

    pub fn observer_feed_interval(&self) -> Duration {
        Duration::from_secs(self.observer_feed_interval_secs)
    }
}

/// Alert-rule timing owned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long CPU must stay over threshold before `cpu_high` fires.
    pub cpu_sustain_secs: u64,
    pub ram_sustain_secs: u64,
    /// How long the ping must stay offline before `network_offline` fires.
    pub net_offline_sustain_secs: u64,
    /// Trailing window over which port state transitions are counted.
    pub flap_window_secs: u64,
    /// Transitions within the window that count as flapping.
    pub flap_threshold: usize,
    /// Minimum spacing between alerts of the same `(type, key)`.
    pub cooldown_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cpu_sustain_secs: 30,
            ram_sustain_secs: 30,
            net_offline_sustain_secs: 10,
            flap_window_secs: 120,
            flap_threshold: 6,
            cooldown_secs: 60,
        }
    }
}

impl EngineConfig {
    pub fn cpu_sustain(&self) -> Duration {
        Duration::from_secs(self.cpu_sustain_secs)
    }

    pub fn ram_sustain(&self) -> Duration {
        Duration::from_secs(self.ram_sustain_secs)
    }

    pub fn net_offline_sustain(&self) -> Duration {
        Duration::from_secs(self.net_offline_sustain_secs)
    }

    pub fn flap_window(&self) -> Duration {
        Duration::from_secs(self.flap_window_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Top-level configuration file shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    pub daemon: DaemonConfig,
    pub engine: EngineConfig,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
