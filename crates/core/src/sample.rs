// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host metric readings and the per-tick sample assembled from them.

use serde::{Deserialize, Serialize};

/// One point-in-time reading of host metrics.
///
/// Every field is optional: a field is `None` iff its probe failed on that
/// tick. The scheduler persists the sample as-is; alert rules referencing a
/// `None` value do not fire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostSample {
    pub cpu_percent: Option<f64>,
    pub mem_percent: Option<f64>,
    pub mem_used_bytes: Option<i64>,
    pub mem_avail_bytes: Option<i64>,
    pub mem_total_bytes: Option<i64>,
    pub disk_percent: Option<f64>,
    pub disk_used_bytes: Option<i64>,
    pub disk_free_bytes: Option<i64>,
    pub disk_total_bytes: Option<i64>,
    pub net_sent_bps: Option<f64>,
    pub net_recv_bps: Option<f64>,
}

/// CPU utilization reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuReading {
    pub percent: f64,
}

/// Virtual memory reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryReading {
    pub percent: f64,
    pub used_bytes: i64,
    pub available_bytes: i64,
    pub total_bytes: i64,
}

/// Disk usage reading for the primary volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskReading {
    pub percent: f64,
    pub used_bytes: i64,
    pub free_bytes: i64,
    pub total_bytes: i64,
}

/// Cumulative interface counters, summed across interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

/// Per-second network rates derived from two counter readings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetRates {
    pub sent_bps: f64,
    pub recv_bps: f64,
}

impl HostSample {
    /// Assemble a sample from whatever probes succeeded this tick.
    pub fn from_readings(
        cpu: Option<CpuReading>,
        mem: Option<MemoryReading>,
        disk: Option<DiskReading>,
        net: Option<NetRates>,
    ) -> Self {
        Self {
            cpu_percent: cpu.map(|c| c.percent),
            mem_percent: mem.map(|m| m.percent),
            mem_used_bytes: mem.map(|m| m.used_bytes),
            mem_avail_bytes: mem.map(|m| m.available_bytes),
            mem_total_bytes: mem.map(|m| m.total_bytes),
            disk_percent: disk.map(|d| d.percent),
            disk_used_bytes: disk.map(|d| d.used_bytes),
            disk_free_bytes: disk.map(|d| d.free_bytes),
            disk_total_bytes: disk.map(|d| d.total_bytes),
            net_sent_bps: net.map(|n| n.sent_bps),
            net_recv_bps: net.map(|n| n.recv_bps),
        }
    }
}
