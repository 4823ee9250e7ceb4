// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Probe seams between the scheduler and the platform.
//!
//! Each probe produces one reading per call. Probes never panic into the
//! scheduler: failures surface as [`ProbeError`] and the scheduler
//! substitutes an empty reading. The network counter probe is the only
//! stateful one; [`NetRateTracker`] turns its cumulative counters into
//! per-second rates.

use std::time::Instant;
use thiserror::Error;
use vigil_core::{
    ContainerRow, CpuReading, DiskReading, ListeningSocket, MemoryReading, NetCounters, NetRates,
    PortStatus, ProcessRow,
};

/// Why a probe produced no reading.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    /// The probe cannot run here (missing permission, unsupported
    /// platform, engine not installed).
    #[error("probe unavailable: {0}")]
    Unavailable(String),

    /// The probe ran and failed.
    #[error("probe failed: {0}")]
    Failed(String),
}

/// The platform probes the scheduler ticks against.
///
/// `ping`, `port_status`, and the enumeration probes may block; the
/// scheduler off-loads them to the worker pool.
pub trait ProbeSet: Send + Sync {
    fn cpu(&self) -> Result<CpuReading, ProbeError>;

    fn memory(&self) -> Result<MemoryReading, ProbeError>;

    fn disk(&self) -> Result<DiskReading, ProbeError>;

    /// Cumulative interface byte counters since boot, summed across
    /// interfaces.
    fn net_counters(&self) -> Result<NetCounters, ProbeError>;

    /// One ICMP round-trip. `None` means no reply within `timeout_ms`.
    fn ping(&self, host: &str, timeout_ms: u64) -> Option<f64>;

    /// Listening status of each given port, in the given order.
    fn port_status(&self, ports: &[u16]) -> Vec<PortStatus>;

    fn top_processes(&self, limit: usize) -> Result<Vec<ProcessRow>, ProbeError>;

    fn listening_sockets(&self, limit: usize) -> Result<Vec<ListeningSocket>, ProbeError>;

    fn containers(&self) -> Result<Vec<ContainerRow>, ProbeError>;
}

/// Converts cumulative counters into per-second rates.
///
/// The first reading establishes a baseline and reports zeros. A
/// non-positive elapsed interval (clock went backward) also reports zeros.
/// Counter regressions (interface reset) clamp to zero rather than going
/// negative.
#[derive(Debug, Default)]
pub struct NetRateTracker {
    last: Option<(NetCounters, Instant)>,
}

impl NetRateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, counters: NetCounters, now: Instant) -> NetRates {
        let rates = match self.last {
            None => NetRates::default(),
            Some((prev, prev_at)) => {
                let dt = now.saturating_duration_since(prev_at).as_secs_f64();
                if dt <= 0.0 {
                    NetRates::default()
                } else {
                    NetRates {
                        sent_bps: (counters.bytes_sent.saturating_sub(prev.bytes_sent)) as f64 / dt,
                        recv_bps: (counters.bytes_recv.saturating_sub(prev.bytes_recv)) as f64 / dt,
                    }
                }
            }
        };
        self.last = Some((counters, now));
        rates
    }
}

/// Scriptable probe set for tests: every reading is set explicitly and
/// returned until changed.
#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct FakeProbes {
    inner: parking_lot::Mutex<FakeReadings>,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
struct FakeReadings {
    cpu: Option<CpuReading>,
    memory: Option<MemoryReading>,
    disk: Option<DiskReading>,
    net: Option<NetCounters>,
    latency_ms: Option<f64>,
    listening: std::collections::BTreeSet<u16>,
    processes: Option<Vec<ProcessRow>>,
    sockets: Option<Vec<ListeningSocket>>,
    containers: Option<Vec<ContainerRow>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeProbes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cpu(&self, percent: f64) {
        self.inner.lock().cpu = Some(CpuReading { percent });
    }

    pub fn clear_cpu(&self) {
        self.inner.lock().cpu = None;
    }

    pub fn set_memory(&self, percent: f64) {
        self.inner.lock().memory = Some(MemoryReading {
            percent,
            used_bytes: 8_000_000_000,
            available_bytes: 8_000_000_000,
            total_bytes: 16_000_000_000,
        });
    }

    pub fn set_disk(&self, percent: f64) {
        self.inner.lock().disk = Some(DiskReading {
            percent,
            used_bytes: 500_000_000_000,
            free_bytes: 500_000_000_000,
            total_bytes: 1_000_000_000_000,
        });
    }

    pub fn set_net_counters(&self, bytes_sent: u64, bytes_recv: u64) {
        self.inner.lock().net = Some(NetCounters {
            bytes_sent,
            bytes_recv,
        });
    }

    pub fn set_latency_ms(&self, latency_ms: Option<f64>) {
        self.inner.lock().latency_ms = latency_ms;
    }

    pub fn set_port_listening(&self, port: u16, listening: bool) {
        let mut inner = self.inner.lock();
        if listening {
            inner.listening.insert(port);
        } else {
            inner.listening.remove(&port);
        }
    }

    pub fn set_processes(&self, processes: Vec<ProcessRow>) {
        self.inner.lock().processes = Some(processes);
    }

    pub fn set_sockets(&self, sockets: Vec<ListeningSocket>) {
        self.inner.lock().sockets = Some(sockets);
    }

    pub fn set_containers(&self, containers: Vec<ContainerRow>) {
        self.inner.lock().containers = Some(containers);
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ProbeSet for FakeProbes {
    fn cpu(&self) -> Result<CpuReading, ProbeError> {
        self.inner
            .lock()
            .cpu
            .ok_or_else(|| ProbeError::Unavailable("no cpu reading scripted".into()))
    }

    fn memory(&self) -> Result<MemoryReading, ProbeError> {
        self.inner
            .lock()
            .memory
            .ok_or_else(|| ProbeError::Unavailable("no memory reading scripted".into()))
    }

    fn disk(&self) -> Result<DiskReading, ProbeError> {
        self.inner
            .lock()
            .disk
            .ok_or_else(|| ProbeError::Unavailable("no disk reading scripted".into()))
    }

    fn net_counters(&self) -> Result<NetCounters, ProbeError> {
        self.inner
            .lock()
            .net
            .ok_or_else(|| ProbeError::Unavailable("no net counters scripted".into()))
    }

    fn ping(&self, _host: &str, _timeout_ms: u64) -> Option<f64> {
        self.inner.lock().latency_ms
    }

    fn port_status(&self, ports: &[u16]) -> Vec<PortStatus> {
        let inner = self.inner.lock();
        ports
            .iter()
            .map(|&port| {
                if inner.listening.contains(&port) {
                    PortStatus::up(port)
                } else {
                    PortStatus::down(port)
                }
            })
            .collect()
    }

    fn top_processes(&self, limit: usize) -> Result<Vec<ProcessRow>, ProbeError> {
        let mut processes = self
            .inner
            .lock()
            .processes
            .clone()
            .ok_or_else(|| ProbeError::Unavailable("no process table scripted".into()))?;
        processes.truncate(limit);
        Ok(processes)
    }

    fn listening_sockets(&self, limit: usize) -> Result<Vec<ListeningSocket>, ProbeError> {
        let mut sockets = self
            .inner
            .lock()
            .sockets
            .clone()
            .ok_or_else(|| ProbeError::Unavailable("no socket table scripted".into()))?;
        sockets.truncate(limit);
        Ok(sockets)
    }

    fn containers(&self) -> Result<Vec<ContainerRow>, ProbeError> {
        self.inner
            .lock()
            .containers
            .clone()
            .ok_or_else(|| ProbeError::Unavailable("no containers scripted".into()))
    }
}

#[cfg(test)]
#[path = "probes_tests.rs"]
mod tests;
