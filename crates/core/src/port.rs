// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watched-port status and listening-socket rows.

use serde::{Deserialize, Serialize};

/// Status of one watched TCP port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortStatus {
    pub port: u16,
    pub listening: bool,
    pub pid: Option<u32>,
    pub process_name: Option<String>,
}

impl PortStatus {
    pub fn down(port: u16) -> Self {
        Self {
            port,
            listening: false,
            pid: None,
            process_name: None,
        }
    }

    pub fn up(port: u16) -> Self {
        Self {
            port,
            listening: true,
            pid: None,
            process_name: None,
        }
    }
}

/// One listening socket from the host-wide enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningSocket {
    pub local_ip: String,
    pub port: u16,
    pub pid: u32,
    pub process_name: String,
}

/// Dedupe by `(ip, port, pid)`, sort by `(port, ip, pid)`, cap at `limit`.
pub fn normalize_sockets(mut sockets: Vec<ListeningSocket>, limit: usize) -> Vec<ListeningSocket> {
    sockets.sort_by(|a, b| {
        (a.port, &a.local_ip, a.pid).cmp(&(b.port, &b.local_ip, b.pid))
    });
    sockets.dedup_by(|a, b| a.local_ip == b.local_ip && a.port == b.port && a.pid == b.pid);
    sockets.truncate(limit);
    sockets
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
