// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitoring profiles.
//!
//! A profile bundles the watched ports, the subset that must stay up, and
//! the CPU/RAM alert thresholds. Profiles are built in; the active one is
//! persisted by name in `app_state`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Ordered, unique TCP ports shown on the ports panel and tracked for
    /// up/down timeline events.
    pub watch_ports: Vec<u16>,
    /// Ports that fire a critical alert when not listening. Expected to be
    /// a subset of `watch_ports`, but not enforced.
    pub required_ports: Vec<u16>,
    pub alert_cpu_percent: f64,
    pub alert_ram_percent: f64,
}

impl Profile {
    pub fn is_required(&self, port: u16) -> bool {
        self.required_ports.contains(&port)
    }

    /// Ports the scheduler must probe each tick: the watch list plus any
    /// required port not already on it.
    pub fn probed_ports(&self) -> Vec<u16> {
        let mut ports = self.watch_ports.clone();
        for port in &self.required_ports {
            if !ports.contains(port) {
                ports.push(*port);
            }
        }
        ports
    }
}

/// The built-in profile registry, in presentation order.
pub fn builtin_profiles() -> IndexMap<String, Profile> {
    let mut profiles = IndexMap::new();
    profiles.insert(
        "default".to_string(),
        Profile {
            name: "default".to_string(),
            watch_ports: vec![3000, 5173, 8000, 1433, 5672, 15672],
            required_ports: vec![3000, 1433, 5672],
            alert_cpu_percent: 85.0,
            alert_ram_percent: 90.0,
        },
    );
    profiles.insert(
        "frontend-dev".to_string(),
        Profile {
            name: "frontend-dev".to_string(),
            watch_ports: vec![3000, 5173, 8000],
            required_ports: vec![5173],
            alert_cpu_percent: 90.0,
            alert_ram_percent: 92.0,
        },
    );
    profiles.insert(
        "microservices".to_string(),
        Profile {
            name: "microservices".to_string(),
            watch_ports: vec![8000, 8001, 8002, 1433, 5432, 5672, 6379, 15672],
            required_ports: vec![8000, 1433, 5672],
            alert_cpu_percent: 85.0,
            alert_ram_percent: 90.0,
        },
    );
    profiles
}

/// Look up a built-in profile by name.
pub fn find(name: &str) -> Option<Profile> {
    builtin_profiles().get(name).cloned()
}

/// Resolve a possibly-unknown name, falling back to `default`.
pub fn resolve(name: &str) -> Profile {
    find(name).unwrap_or_else(default_profile)
}

fn default_profile() -> Profile {
    let mut profiles = builtin_profiles();
    // The registry always contains "default".
    #[allow(clippy::unwrap_used)]
    profiles.shift_remove("default").unwrap()
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
