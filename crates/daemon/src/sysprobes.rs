// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort platform probes.
//!
//! CPU, memory, disk, network counters, and the process table come from
//! `sysinfo`. Ping shells out to the system `ping` binary with a bounded
//! timeout. Watch-port checks are loopback TCP connects, so pid and
//! process name are unknown here. Listening sockets are parsed from
//! `/proc/net/tcp{,6}` where available. Container rows shell out to
//! `docker ps` behind a short TTL cache.

use parking_lot::Mutex;
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::process::Command;
use std::time::{Duration, Instant};
use sysinfo::{Disks, Networks, System, Users};
use vigil_core::{
    ContainerRow, CpuReading, DiskReading, ListeningSocket, MemoryReading, NetCounters,
    PortStatus, ProcessRow,
};
use vigil_engine::{ProbeError, ProbeSet};

const PORT_CONNECT_TIMEOUT: Duration = Duration::from_millis(200);
const CONTAINER_CACHE_TTL: Duration = Duration::from_secs(2);

pub struct SystemProbes {
    system: Mutex<System>,
    users: Users,
    container_cache: Mutex<Option<(Instant, Vec<ContainerRow>)>>,
}

impl Default for SystemProbes {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbes {
    pub fn new() -> Self {
        let mut system = System::new_all();
        system.refresh_cpu();
        Self {
            system: Mutex::new(system),
            users: Users::new_with_refreshed_list(),
            container_cache: Mutex::new(None),
        }
    }
}

impl ProbeSet for SystemProbes {
    fn cpu(&self) -> Result<CpuReading, ProbeError> {
        let mut system = self.system.lock();
        system.refresh_cpu();
        Ok(CpuReading {
            percent: f64::from(system.global_cpu_info().cpu_usage()),
        })
    }

    fn memory(&self) -> Result<MemoryReading, ProbeError> {
        let mut system = self.system.lock();
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return Err(ProbeError::Failed("total memory reported as zero".into()));
        }
        let used = system.used_memory();
        Ok(MemoryReading {
            percent: used as f64 / total as f64 * 100.0,
            used_bytes: used as i64,
            available_bytes: system.available_memory() as i64,
            total_bytes: total as i64,
        })
    }

    fn disk(&self) -> Result<DiskReading, ProbeError> {
        let disks = Disks::new_with_refreshed_list();
        // Prefer the root volume; otherwise take the largest mount.
        let disk = disks
            .iter()
            .find(|d| d.mount_point() == std::path::Path::new("/"))
            .or_else(|| disks.iter().max_by_key(|d| d.total_space()))
            .ok_or_else(|| ProbeError::Unavailable("no disks enumerated".into()))?;

        let total = disk.total_space();
        if total == 0 {
            return Err(ProbeError::Failed("disk reports zero capacity".into()));
        }
        let free = disk.available_space();
        let used = total - free;
        Ok(DiskReading {
            percent: used as f64 / total as f64 * 100.0,
            used_bytes: used as i64,
            free_bytes: free as i64,
            total_bytes: total as i64,
        })
    }

    fn net_counters(&self) -> Result<NetCounters, ProbeError> {
        let networks = Networks::new_with_refreshed_list();
        let mut sent = 0u64;
        let mut recv = 0u64;
        for (_name, data) in &networks {
            sent = sent.saturating_add(data.total_transmitted());
            recv = recv.saturating_add(data.total_received());
        }
        Ok(NetCounters {
            bytes_sent: sent,
            bytes_recv: recv,
        })
    }

    fn ping(&self, host: &str, timeout_ms: u64) -> Option<f64> {
        let timeout_secs = timeout_ms.div_ceil(1000).max(1);
        let output = Command::new("ping")
            .args(["-c", "1", "-W", &timeout_secs.to_string(), host])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ping_time(&stdout)
    }

    fn port_status(&self, ports: &[u16]) -> Vec<PortStatus> {
        ports
            .iter()
            .map(|&port| {
                let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
                let listening = TcpStream::connect_timeout(&addr, PORT_CONNECT_TIMEOUT).is_ok();
                PortStatus {
                    port,
                    listening,
                    pid: None,
                    process_name: None,
                }
            })
            .collect()
    }

    fn top_processes(&self, limit: usize) -> Result<Vec<ProcessRow>, ProbeError> {
        let mut system = self.system.lock();
        system.refresh_processes();

        let mut rows: Vec<ProcessRow> = system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessRow {
                pid: pid.as_u32(),
                name: process.name().to_string(),
                cpu_percent: f64::from(process.cpu_usage()),
                memory_bytes: process.memory() as i64,
                status: process.status().to_string(),
                username: process
                    .user_id()
                    .and_then(|uid| self.users.get_user_by_id(uid))
                    .map(|user| user.name().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            })
            .collect();

        rows.sort_by(|a, b| {
            (b.cpu_percent, b.memory_bytes)
                .partial_cmp(&(a.cpu_percent, a.memory_bytes))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows.truncate(limit.clamp(1, 50));
        Ok(rows)
    }

    fn listening_sockets(&self, limit: usize) -> Result<Vec<ListeningSocket>, ProbeError> {
        let mut sockets = Vec::new();
        let mut any_source = false;
        for path in ["/proc/net/tcp", "/proc/net/tcp6"] {
            if let Ok(contents) = std::fs::read_to_string(path) {
                any_source = true;
                sockets.extend(parse_proc_net_tcp(&contents));
            }
        }
        if !any_source {
            return Err(ProbeError::Unavailable(
                "socket enumeration requires /proc/net".into(),
            ));
        }
        sockets.truncate(limit);
        Ok(sockets)
    }

    fn containers(&self) -> Result<Vec<ContainerRow>, ProbeError> {
        {
            let cache = self.container_cache.lock();
            if let Some((at, rows)) = cache.as_ref() {
                if at.elapsed() <= CONTAINER_CACHE_TTL {
                    return Ok(rows.clone());
                }
            }
        }

        let output = Command::new("docker")
            .args(["ps", "--all", "--format", "{{json .}}"])
            .output()
            .map_err(|e| ProbeError::Unavailable(format!("docker not runnable: {e}")))?;
        if !output.status.success() {
            return Err(ProbeError::Unavailable("docker engine not responding".into()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let rows: Vec<ContainerRow> = stdout
            .lines()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .map(|value| ContainerRow {
                id: string_field(&value, "ID"),
                name: string_field(&value, "Names"),
                image: string_field(&value, "Image"),
                state: string_field(&value, "State"),
                cpu_percent: None,
                mem_bytes: None,
            })
            .collect();

        *self.container_cache.lock() = Some((Instant::now(), rows.clone()));
        Ok(rows)
    }
}

fn string_field(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Extract the round-trip time from ping output ("time=12.3 ms").
fn parse_ping_time(output: &str) -> Option<f64> {
    let idx = output.find("time=")?;
    let rest = &output[idx + 5..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Parse LISTEN rows from a `/proc/net/tcp`-format table. Owning pids are
/// not resolved here; rows carry pid 0.
fn parse_proc_net_tcp(contents: &str) -> Vec<ListeningSocket> {
    const STATE_LISTEN: &str = "0A";
    contents
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _slot = fields.next()?;
            let local = fields.next()?;
            let _remote = fields.next()?;
            let state = fields.next()?;
            if state != STATE_LISTEN {
                return None;
            }

            let (ip_hex, port_hex) = local.rsplit_once(':')?;
            let port = u16::from_str_radix(port_hex, 16).ok()?;
            let local_ip = match ip_hex.len() {
                8 => {
                    let raw = u32::from_str_radix(ip_hex, 16).ok()?;
                    Ipv4Addr::from(raw.swap_bytes()).to_string()
                }
                // Keep v6 addresses in their hex form rather than decoding
                // the kernel's word order.
                _ => ip_hex.to_string(),
            };

            Some(ListeningSocket {
                local_ip,
                port,
                pid: 0,
                process_name: "unknown".to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "sysprobes_tests.rs"]
mod tests;
