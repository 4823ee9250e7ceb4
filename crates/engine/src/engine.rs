// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stateful alert rule evaluation.
//!
//! The engine consumes one tick's readings and produces zero or more alert
//! drafts plus zero or more timeline events. All rule state (cooldowns,
//! duration gates, latches, flap windows) lives in memory only: after a
//! restart, baselines re-establish on the next tick without firing.
//!
//! Mute suppresses alerts and freezes rule state, but informational state
//! transitions (watch-port up/down, network quality) are still emitted.

use crate::flap::FlapWindow;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use vigil_core::{
    rfc3339_utc, AlertKind, EngineConfig, EventKind, HostSample, NetQuality, NewEvent, PortStatus,
    Profile, Severity,
};

/// Everything the engine needs for one evaluation.
pub struct TickInput<'a> {
    pub sample: &'a HostSample,
    /// Status of the active profile's probed ports, one entry per port.
    pub ports: &'a [PortStatus],
    pub latency_ms: Option<f64>,
    pub quality: NetQuality,
    pub profile: &'a Profile,
    pub ping_host: &'a str,
    pub now_utc: DateTime<Utc>,
    pub now_mono: Instant,
    pub muted: bool,
}

/// An alert the engine decided to fire. The caller assigns the timestamp
/// and persists it; severity derives from the kind.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub kind: AlertKind,
    pub message: String,
}

/// One evaluation's output.
#[derive(Debug, Default)]
pub struct TickOutput {
    pub alerts: Vec<AlertDraft>,
    pub events: Vec<NewEvent>,
}

/// The rule engine. Owned by the scheduler task; never shared.
pub struct AlertEngine {
    config: EngineConfig,

    /// Last fire instant per `(type, key)`, for cooldown suppression.
    last_fired: HashMap<(&'static str, String), Instant>,

    cpu_high_since: Option<Instant>,
    cpu_fired: bool,
    ram_high_since: Option<Instant>,
    ram_fired: bool,
    net_offline_since: Option<Instant>,
    net_offline_fired: bool,
    net_poor_latched: bool,

    /// Required-port listening state from the previous evaluation.
    port_last_state: HashMap<u16, bool>,
    port_down_active: HashSet<u16>,
    port_flapping_active: HashSet<u16>,
    flap_windows: HashMap<u16, FlapWindow>,

    /// Watch-port listening state, tracked separately from alert rules.
    watch_port_last: HashMap<u16, bool>,
    last_quality: Option<NetQuality>,
}

impl AlertEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            last_fired: HashMap::new(),
            cpu_high_since: None,
            cpu_fired: false,
            ram_high_since: None,
            ram_fired: false,
            net_offline_since: None,
            net_offline_fired: false,
            net_poor_latched: false,
            port_last_state: HashMap::new(),
            port_down_active: HashSet::new(),
            port_flapping_active: HashSet::new(),
            flap_windows: HashMap::new(),
            watch_port_last: HashMap::new(),
            last_quality: None,
        }
    }

    /// Evaluate one tick.
    pub fn evaluate(&mut self, input: TickInput<'_>) -> TickOutput {
        let mut out = TickOutput::default();
        let ts_utc = rfc3339_utc(input.now_utc);

        self.track_watch_ports(&input, &ts_utc, &mut out);
        self.track_net_quality(&input, &ts_utc, &mut out);

        if input.muted {
            return out;
        }

        self.eval_cpu(&input, &mut out);
        self.eval_ram(&input, &mut out);
        self.eval_network(&input, &mut out);
        self.eval_required_ports(&input, &mut out);
        out
    }

    /// Emit `port_up` / `port_down` timeline events for watch-port state
    /// transitions. The first observation of a port establishes its
    /// baseline silently.
    fn track_watch_ports(&mut self, input: &TickInput<'_>, ts_utc: &str, out: &mut TickOutput) {
        for status in input.ports {
            if !input.profile.watch_ports.contains(&status.port) {
                continue;
            }
            let prev = self.watch_port_last.insert(status.port, status.listening);
            let Some(prev) = prev else {
                continue;
            };
            if prev == status.listening {
                continue;
            }

            if status.listening {
                let message = match (&status.process_name, status.pid) {
                    (Some(name), Some(pid)) => {
                        format!("Port {} up ({name}, pid {pid})", status.port)
                    }
                    _ => format!("Port {} up", status.port),
                };
                out.events.push(NewEvent {
                    ts_utc: ts_utc.to_string(),
                    kind: EventKind::PortUp,
                    message,
                    severity: Severity::Info,
                    meta: Some(json!({
                        "port": status.port,
                        "pid": status.pid,
                        "process_name": status.process_name,
                    })),
                });
            } else {
                let required = input.profile.is_required(status.port);
                out.events.push(NewEvent {
                    ts_utc: ts_utc.to_string(),
                    kind: EventKind::PortDown,
                    message: format!("Port {} down", status.port),
                    severity: if required {
                        Severity::Critical
                    } else {
                        Severity::Warning
                    },
                    meta: Some(json!({
                        "port": status.port,
                        "required": required,
                    })),
                });
            }
        }
    }

    /// Emit a `network_status` timeline event on quality transitions.
    fn track_net_quality(&mut self, input: &TickInput<'_>, ts_utc: &str, out: &mut TickOutput) {
        let prev = self.last_quality.replace(input.quality);
        let Some(prev) = prev else {
            return;
        };
        if prev == input.quality {
            return;
        }

        let latency_str = match input.latency_ms {
            Some(ms) => format!("{ms:.0}ms"),
            None => "no reply".to_string(),
        };
        out.events.push(NewEvent {
            ts_utc: ts_utc.to_string(),
            kind: EventKind::NetworkStatus,
            message: format!(
                "Network quality changed from {prev} to {} ({latency_str})",
                input.quality
            ),
            severity: input.quality.event_severity(),
            meta: Some(json!({
                "prev": prev.as_str(),
                "status": input.quality.as_str(),
                "latency_ms": input.latency_ms,
            })),
        });
    }

    fn eval_cpu(&mut self, input: &TickInput<'_>, out: &mut TickOutput) {
        // A failed probe neither advances nor clears the duration gate.
        let Some(cpu) = input.sample.cpu_percent else {
            return;
        };
        if cpu >= input.profile.alert_cpu_percent {
            let since = *self.cpu_high_since.get_or_insert(input.now_mono);
            if !self.cpu_fired
                && input.now_mono.duration_since(since) >= self.config.cpu_sustain()
            {
                // Latch even when cooldown suppresses the insert.
                self.cpu_fired = true;
                self.try_fire(
                    AlertKind::CpuHigh,
                    format!("CPU usage high: {cpu:.1}%"),
                    input.now_mono,
                    out,
                );
            }
        } else {
            self.cpu_high_since = None;
            self.cpu_fired = false;
        }
    }

    fn eval_ram(&mut self, input: &TickInput<'_>, out: &mut TickOutput) {
        let Some(ram) = input.sample.mem_percent else {
            return;
        };
        if ram >= input.profile.alert_ram_percent {
            let since = *self.ram_high_since.get_or_insert(input.now_mono);
            if !self.ram_fired
                && input.now_mono.duration_since(since) >= self.config.ram_sustain()
            {
                self.ram_fired = true;
                self.try_fire(
                    AlertKind::RamHigh,
                    format!("RAM usage high: {ram:.1}%"),
                    input.now_mono,
                    out,
                );
            }
        } else {
            self.ram_high_since = None;
            self.ram_fired = false;
        }
    }

    fn eval_network(&mut self, input: &TickInput<'_>, out: &mut TickOutput) {
        let host = input.ping_host;

        if input.quality == NetQuality::Offline {
            let since = *self.net_offline_since.get_or_insert(input.now_mono);
            if !self.net_offline_fired
                && input.now_mono.duration_since(since) >= self.config.net_offline_sustain()
            {
                self.net_offline_fired = true;
                self.try_fire(
                    AlertKind::NetworkOffline(host.to_string()),
                    format!("Network offline (no reply from {host})"),
                    input.now_mono,
                    out,
                );
            }
        } else {
            self.net_offline_since = None;
            self.net_offline_fired = false;
        }

        if input.quality == NetQuality::Poor {
            if !self.net_poor_latched {
                self.net_poor_latched = true;
                let latency_str = match input.latency_ms {
                    Some(ms) => format!("{ms:.0}ms"),
                    None => "unknown".to_string(),
                };
                self.try_fire(
                    AlertKind::NetworkPoor(host.to_string()),
                    format!("Network poor (ping {host} latency {latency_str})"),
                    input.now_mono,
                    out,
                );
            }
        } else {
            self.net_poor_latched = false;
        }
    }

    fn eval_required_ports(&mut self, input: &TickInput<'_>, out: &mut TickOutput) {
        for &port in &input.profile.required_ports {
            let Some(status) = input.ports.iter().find(|s| s.port == port) else {
                continue;
            };

            let prev = self.port_last_state.insert(port, status.listening);

            // Down detection waits for a second observation: a port that is
            // already down when the daemon starts alerts one tick later.
            if !status.listening {
                if prev.is_some() && self.port_down_active.insert(port) {
                    self.try_fire(
                        AlertKind::PortDown(port),
                        format!("Required port {port} down"),
                        input.now_mono,
                        out,
                    );
                }
            } else {
                self.port_down_active.remove(&port);
            }

            // Flap detection counts transitions in the trailing window.
            let transitioned = matches!(prev, Some(p) if p != status.listening);
            let threshold = self.config.flap_threshold;
            let window_span = self.config.flap_window();
            let count = {
                let window = self
                    .flap_windows
                    .entry(port)
                    .or_insert_with(|| FlapWindow::new(threshold));
                if transitioned {
                    window.record(input.now_mono);
                }
                window.count(input.now_mono, window_span)
            };

            if count >= self.config.flap_threshold {
                if self.port_flapping_active.insert(port) {
                    self.try_fire(
                        AlertKind::PortFlapping(port),
                        format!(
                            "Port {port} flapping: {count} transitions in {}s",
                            self.config.flap_window_secs
                        ),
                        input.now_mono,
                        out,
                    );
                }
            } else {
                self.port_flapping_active.remove(&port);
            }
        }
    }

    /// Fire unless the `(type, key)` pair is inside its cooldown. The fire
    /// instant is only recorded on an actual fire.
    fn try_fire(
        &mut self,
        kind: AlertKind,
        message: String,
        now_mono: Instant,
        out: &mut TickOutput,
    ) -> bool {
        let key = (kind.type_str(), kind.key());
        if let Some(last) = self.last_fired.get(&key) {
            if now_mono.duration_since(*last) < self.config.cooldown() {
                return false;
            }
        }
        self.last_fired.insert(key, now_mono);
        out.alerts.push(AlertDraft { kind, message });
        true
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
