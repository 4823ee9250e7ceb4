// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The periodic snapshot pipeline.
//!
//! Each tick collects the probes, persists the sample plus any timeline
//! events and alerts in one transaction, and fans out to the live bus only
//! after the commit. A failed commit ends the tick without fan-out; engine
//! state (latches, cooldowns) survives into the next tick.
//!
//! The interval is a minimum cadence: the loop sleeps the full interval
//! after each tick, so an overrunning tick delays the next one rather than
//! overlapping it.

use crate::live_bus::LiveBus;
use crate::runtime_state::RuntimeState;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vigil_core::{
    normalize_sockets, rfc3339_utc, Clock, DaemonConfig, EngineConfig, EventKind, HostSample,
    LiveKind, LiveMessage, NetQuality, NewAlert, NewEvent, TimelineEvent,
};
use vigil_engine::{AlertEngine, NetRateTracker, ProbeError, ProbeSet, TickInput};
use vigil_storage::{AlertStore, EventLog, NewSnapshot, SnapshotStore, Store};

/// The periodic sampling service. `start()` spawns the loop; `stop()`
/// cancels it and waits. Both are idempotent; a stopped scheduler stays
/// stopped.
pub struct SnapshotScheduler<P: ProbeSet + 'static, C: Clock + 'static> {
    inner: Arc<Inner<P, C>>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct Inner<P, C> {
    store: Store,
    bus: Arc<LiveBus>,
    state: Arc<RuntimeState>,
    probes: Arc<P>,
    clock: C,
    config: DaemonConfig,
    engine: Mutex<AlertEngine>,
    net_rates: Mutex<NetRateTracker>,
    last_processes_at: Mutex<Option<Instant>>,
    last_sockets_at: Mutex<Option<Instant>>,
}

impl<P: ProbeSet + 'static, C: Clock + 'static> SnapshotScheduler<P, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Store,
        bus: Arc<LiveBus>,
        state: Arc<RuntimeState>,
        probes: Arc<P>,
        clock: C,
        config: DaemonConfig,
        engine_config: EngineConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                bus,
                state,
                probes,
                clock,
                config,
                engine: Mutex::new(AlertEngine::new(engine_config)),
                net_rates: Mutex::new(NetRateTracker::new()),
                last_processes_at: Mutex::new(None),
                last_sockets_at: Mutex::new(None),
            }),
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the tick loop.
    pub fn start(&self) {
        let mut slot = self.handle.lock();
        if slot.is_some() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let cancel = self.cancel.clone();
        let interval = self.inner.config.snapshot_interval();
        *slot = Some(tokio::spawn(async move {
            info!("snapshot scheduler started");
            loop {
                inner.tick().await;
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            info!("snapshot scheduler stopped");
        }));
    }

    /// Request cancellation and wait for the loop to exit.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Run exactly one tick. The loop calls this; tests drive it directly.
    pub async fn tick(&self) {
        self.inner.tick().await;
    }
}

impl<P: ProbeSet + 'static, C: Clock + 'static> Inner<P, C> {
    async fn tick(&self) {
        let now_utc = self.clock.now_utc();
        let now_mono = self.clock.now();
        let ts_utc = rfc3339_utc(now_utc);

        // In-process synchronous probes.
        let cpu = log_probe("cpu", self.probes.cpu());
        let mem = log_probe("memory", self.probes.memory());
        let disk = log_probe("disk", self.probes.disk());
        let net = log_probe("net", self.probes.net_counters())
            .map(|counters| self.net_rates.lock().update(counters, now_mono));

        let profile = self.state.active_profile();
        let muted = self.state.muted_at(now_utc);

        // Ping and port scanning may block; run them on the worker pool.
        let latency_ms = {
            let probes = Arc::clone(&self.probes);
            let host = self.config.ping_host.clone();
            let timeout_ms = self.config.ping_timeout_ms;
            join_blocking(
                tokio::task::spawn_blocking(move || probes.ping(&host, timeout_ms)),
                "ping",
            )
            .await
            .flatten()
        };
        let ports = {
            let probes = Arc::clone(&self.probes);
            let probed = profile.probed_ports();
            join_blocking(
                tokio::task::spawn_blocking(move || probes.port_status(&probed)),
                "port_status",
            )
            .await
            .unwrap_or_default()
        };

        let quality = NetQuality::classify(latency_ms);
        let sample = HostSample::from_readings(cpu, mem, disk, net);

        let output = self.engine.lock().evaluate(TickInput {
            sample: &sample,
            ports: &ports,
            latency_ms,
            quality,
            profile: &profile,
            ping_host: &self.config.ping_host,
            now_utc,
            now_mono,
            muted,
        });

        // Persist the whole tick in one transaction; broadcast only after
        // the commit.
        let persisted = self.store.with_tx(|tx| {
            SnapshotStore::new(tx).insert(&NewSnapshot {
                ts_utc: ts_utc.clone(),
                sample: sample.clone(),
            })?;
            let log = EventLog::new(tx);
            let alert_store = AlertStore::new(tx);

            let mut events = Vec::new();
            for event in &output.events {
                let id = log.insert(event)?;
                events.push((id, event.clone()));
            }

            let mut alerts = Vec::new();
            for draft in &output.alerts {
                let alert = NewAlert {
                    ts_utc: ts_utc.clone(),
                    kind: draft.kind.clone(),
                    message: draft.message.clone(),
                };
                let alert_id = alert_store.insert(&alert)?;
                let mirror = NewEvent {
                    ts_utc: ts_utc.clone(),
                    kind: EventKind::AlertCreated,
                    message: alert.message.clone(),
                    severity: alert.severity(),
                    meta: Some(json!({
                        "alert_id": alert_id,
                        "type": alert.kind.type_str(),
                    })),
                };
                let mirror_id = log.insert(&mirror)?;
                alerts.push((alert_id, alert, mirror_id, mirror));
            }
            Ok((events, alerts))
        });

        let (events, alerts) = match persisted {
            Ok(committed) => committed,
            Err(e) => {
                error!(error = %e, "tick commit failed; skipping fan-out");
                return;
            }
        };

        for (id, event) in &events {
            self.bus
                .broadcast(&LiveMessage::new(
                    LiveKind::TimelineEvent,
                    &ts_utc,
                    event_payload(*id, event),
                ))
                .await;
        }

        for (alert_id, alert, mirror_id, mirror) in &alerts {
            self.bus
                .broadcast(&LiveMessage::new(
                    LiveKind::Alert,
                    &ts_utc,
                    json!({
                        "id": alert_id,
                        "ts_utc": alert.ts_utc,
                        "type": alert.kind.type_str(),
                        "severity": alert.severity().as_str(),
                        "message": alert.message,
                    }),
                ))
                .await;
            self.bus
                .broadcast(&LiveMessage::new(
                    LiveKind::TimelineEvent,
                    &ts_utc,
                    event_payload(*mirror_id, mirror),
                ))
                .await;
        }

        self.bus
            .broadcast(&LiveMessage::new(
                LiveKind::Kpi,
                &ts_utc,
                json!({
                    "cpu_percent": sample.cpu_percent,
                    "mem_percent": sample.mem_percent,
                    "mem_used_bytes": sample.mem_used_bytes,
                    "mem_avail_bytes": sample.mem_avail_bytes,
                    "mem_total_bytes": sample.mem_total_bytes,
                    "disk_percent": sample.disk_percent,
                    "disk_used_bytes": sample.disk_used_bytes,
                    "disk_free_bytes": sample.disk_free_bytes,
                    "disk_total_bytes": sample.disk_total_bytes,
                    "net_sent_bps": sample.net_sent_bps,
                    "net_recv_bps": sample.net_recv_bps,
                    "network_quality": quality.as_str(),
                    "ping_latency_ms": latency_ms,
                }),
            ))
            .await;
        self.bus
            .broadcast(&LiveMessage::new(
                LiveKind::ChartPoint,
                &ts_utc,
                json!({
                    "cpu_percent": sample.cpu_percent,
                    "mem_percent": sample.mem_percent,
                }),
            ))
            .await;

        // Expensive enumeration probes only run with someone watching, on
        // their own cadence.
        if self.bus.observer_count() > 0 {
            self.maybe_broadcast_processes(now_mono, &ts_utc).await;
            self.maybe_broadcast_listening_ports(now_mono, &ts_utc).await;
        }
    }

    async fn maybe_broadcast_processes(&self, now_mono: Instant, ts_utc: &str) {
        if !self.gate_elapsed(&self.last_processes_at, now_mono) {
            return;
        }
        let probes = Arc::clone(&self.probes);
        let limit = self.config.top_processes_limit;
        let result = join_blocking(
            tokio::task::spawn_blocking(move || probes.top_processes(limit)),
            "processes",
        )
        .await;
        match result {
            Some(Ok(items)) => {
                self.bus
                    .broadcast(&LiveMessage::new(
                        LiveKind::Processes,
                        ts_utc,
                        json!({ "items": items }),
                    ))
                    .await;
            }
            Some(Err(e)) => debug!(error = %e, "process probe unavailable"),
            None => {}
        }
    }

    async fn maybe_broadcast_listening_ports(&self, now_mono: Instant, ts_utc: &str) {
        if !self.gate_elapsed(&self.last_sockets_at, now_mono) {
            return;
        }
        let probes = Arc::clone(&self.probes);
        let limit = self.config.listening_ports_limit;
        let result = join_blocking(
            tokio::task::spawn_blocking(move || probes.listening_sockets(limit)),
            "listening_sockets",
        )
        .await;
        match result {
            Some(Ok(sockets)) => {
                let items = normalize_sockets(sockets, self.config.listening_ports_limit);
                self.bus
                    .broadcast(&LiveMessage::new(
                        LiveKind::ListeningPorts,
                        ts_utc,
                        json!({ "items": items }),
                    ))
                    .await;
            }
            Some(Err(e)) => debug!(error = %e, "socket probe unavailable"),
            None => {}
        }
    }

    /// True when the feed interval has elapsed; records the new instant.
    fn gate_elapsed(&self, last_at: &Mutex<Option<Instant>>, now_mono: Instant) -> bool {
        let mut last = last_at.lock();
        if let Some(at) = *last {
            if now_mono.duration_since(at) < self.config.observer_feed_interval() {
                return false;
            }
        }
        *last = Some(now_mono);
        true
    }
}

fn log_probe<T>(name: &str, result: Result<T, ProbeError>) -> Option<T> {
    match result {
        Ok(reading) => Some(reading),
        Err(e) => {
            debug!(probe = name, error = %e, "probe failed; substituting null");
            None
        }
    }
}

async fn join_blocking<T>(handle: JoinHandle<T>, name: &str) -> Option<T> {
    match handle.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(task = name, error = %e, "worker-pool task failed");
            None
        }
    }
}

/// Payload of a `timeline_event` message, mirroring the stored row.
fn event_payload(id: i64, event: &NewEvent) -> serde_json::Value {
    serde_json::to_value(TimelineEvent {
        id,
        ts_utc: event.ts_utc.clone(),
        kind: event.kind.as_str().to_string(),
        message: event.message.clone(),
        severity: event.severity,
        meta: event.meta.clone(),
    })
    .unwrap_or_else(|_| json!({ "id": id }))
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
