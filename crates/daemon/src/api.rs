// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-side contracts consumed by the HTTP surface.
//!
//! Every operation returns the `{ok, data, meta}` envelope the transport
//! serializes verbatim. Mutating operations (ack, mute, profile select)
//! persist first and broadcast on the live bus after the commit.

use crate::live_bus::LiveBus;
use crate::runtime_state::RuntimeState;
use chrono::Duration;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;
use vigil_core::{
    normalize_sockets, profile, rfc3339_utc, Clock, DaemonConfig, EventKind, LiveKind,
    LiveMessage, NetQuality, NewEvent, Severity, TimelineEvent,
};
use vigil_engine::ProbeSet;
use vigil_storage::{alerts, settings, AlertStore, EventLog, SnapshotStore, Store, StoreError};

pub const HISTORY_DEFAULT_HOURS: i64 = 24;

/// Uniform response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub meta: Value,
}

impl<T> ApiResponse<T> {
    fn ok(data: T, meta: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            meta,
        }
    }

    fn rejected(message: &str, mut meta: Value) -> Self {
        if let Value::Object(ref mut map) = meta {
            map.insert("message".to_string(), json!(message));
        }
        Self {
            ok: false,
            data: None,
            meta,
        }
    }
}

/// The core read API. The transport holds one of these per daemon.
pub struct CoreApi<P: ProbeSet + 'static, C: Clock> {
    store: Store,
    bus: Arc<LiveBus>,
    state: Arc<RuntimeState>,
    probes: Arc<P>,
    clock: C,
    config: DaemonConfig,
}

impl<P: ProbeSet + 'static, C: Clock> CoreApi<P, C> {
    pub fn new(
        store: Store,
        bus: Arc<LiveBus>,
        state: Arc<RuntimeState>,
        probes: Arc<P>,
        clock: C,
        config: DaemonConfig,
    ) -> Self {
        Self {
            store,
            bus,
            state,
            probes,
            clock,
            config,
        }
    }

    pub fn health(&self) -> ApiResponse<Value> {
        ApiResponse::ok(json!({"status": "ok"}), json!({}))
    }

    /// Latest snapshot, or `ok=false` when none exist yet.
    pub fn summary(&self) -> Result<ApiResponse<vigil_storage::SnapshotRow>, StoreError> {
        let conn = self.store.conn()?;
        match SnapshotStore::new(&conn).latest()? {
            Some(row) => Ok(ApiResponse::ok(row, json!({}))),
            None => Ok(ApiResponse::rejected("no snapshots yet", json!({}))),
        }
    }

    /// History at the resolution implied by the requested span: raw up to
    /// 24h, 1-minute up to 7 days, 15-minute beyond.
    pub fn history(
        &self,
        hours: i64,
    ) -> Result<ApiResponse<Vec<vigil_storage::SnapshotRow>>, StoreError> {
        let hours = hours.clamp(1, 720);
        let since_ts_utc = rfc3339_utc(self.clock.now_utc() - Duration::hours(hours));

        let conn = self.store.conn()?;
        let snapshots = SnapshotStore::new(&conn);
        let (resolution, rows) = if hours <= 24 {
            ("raw", snapshots.history(&since_ts_utc)?)
        } else if hours <= 168 {
            ("1m", snapshots.history_1m(&since_ts_utc)?)
        } else {
            ("15m", snapshots.history_15m(&since_ts_utc)?)
        };

        let meta = json!({
            "resolution": resolution,
            "hours": hours,
            "since_ts_utc": since_ts_utc,
            "count": rows.len(),
        });
        Ok(ApiResponse::ok(rows, meta))
    }

    /// Retention horizons, for the dashboard's range picker.
    pub fn history_meta(&self) -> ApiResponse<Value> {
        ApiResponse::ok(
            json!({
                "raw_retention_hours": vigil_storage::rollup::RAW_RETENTION_HOURS,
                "rollup_1m_days": vigil_storage::rollup::ROLLUP_1M_DAYS,
                "rollup_15m_days": vigil_storage::rollup::ROLLUP_15M_DAYS,
                "supported_ranges": [1, 6, 24, 168, 720],
            }),
            json!({}),
        )
    }

    pub fn timeline(
        &self,
        hours: i64,
        limit: usize,
    ) -> Result<ApiResponse<Value>, StoreError> {
        let hours = hours.clamp(1, 168);
        let limit = limit.clamp(1, 500);
        let now = self.clock.now_utc();
        let since_ts_utc = rfc3339_utc(now - Duration::hours(hours));

        let conn = self.store.conn()?;
        let items = EventLog::new(&conn).since(&since_ts_utc, limit)?;
        Ok(ApiResponse::ok(
            json!({ "items": items }),
            json!({"hours": hours, "limit": limit, "ts_utc": rfc3339_utc(now)}),
        ))
    }

    pub fn timeline_latest(&self, limit: usize) -> Result<ApiResponse<Value>, StoreError> {
        let limit = limit.clamp(1, 500);
        let conn = self.store.conn()?;
        let items = EventLog::new(&conn).latest(limit)?;
        Ok(ApiResponse::ok(
            json!({ "items": items }),
            json!({"hours": Value::Null, "limit": limit, "ts_utc": rfc3339_utc(self.clock.now_utc())}),
        ))
    }

    /// Fresh status of the active profile's watch ports.
    pub async fn ports(&self) -> ApiResponse<Value> {
        let profile = self.state.active_profile();
        let watch_ports = profile.watch_ports.clone();
        let probes = Arc::clone(&self.probes);
        let ports = watch_ports.clone();
        let statuses = tokio::task::spawn_blocking(move || probes.port_status(&ports))
            .await
            .unwrap_or_default();
        ApiResponse::ok(
            json!(statuses),
            json!({"watch_ports": watch_ports, "profile": profile.name}),
        )
    }

    /// Host-wide listening sockets, deduped and sorted.
    pub async fn ports_listening(&self, limit: usize) -> ApiResponse<Value> {
        let limit = limit.clamp(1, 2000);
        let probes = Arc::clone(&self.probes);
        let result = tokio::task::spawn_blocking(move || probes.listening_sockets(limit)).await;
        let items = match result {
            Ok(Ok(sockets)) => normalize_sockets(sockets, limit),
            Ok(Err(e)) => {
                warn!(error = %e, "listening socket probe unavailable");
                Vec::new()
            }
            Err(_) => Vec::new(),
        };
        let count = items.len();
        ApiResponse::ok(
            json!({ "items": items }),
            json!({
                "limit": limit,
                "count": count,
                "ts_utc": rfc3339_utc(self.clock.now_utc()),
            }),
        )
    }

    /// Top processes by CPU, then memory.
    pub async fn processes(&self, limit: usize) -> ApiResponse<Value> {
        let limit = limit.clamp(1, 50);
        let probes = Arc::clone(&self.probes);
        let result = tokio::task::spawn_blocking(move || probes.top_processes(limit)).await;
        let items = match result {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                warn!(error = %e, "process probe unavailable");
                Vec::new()
            }
            Err(_) => Vec::new(),
        };
        ApiResponse::ok(
            json!({ "items": items }),
            json!({"limit": limit, "ts_utc": rfc3339_utc(self.clock.now_utc())}),
        )
    }

    pub fn alerts(
        &self,
        limit: usize,
        include_ack: bool,
    ) -> Result<ApiResponse<Vec<vigil_core::Alert>>, StoreError> {
        let limit = limit.clamp(1, 200);
        let conn = self.store.conn()?;
        let rows = AlertStore::new(&conn).recent(limit, include_ack)?;
        let count = rows.len();
        Ok(ApiResponse::ok(
            rows,
            json!({
                "limit": limit,
                "count": count,
                "include_ack": include_ack,
                "mute_until_utc": self.state.mute_until().map(rfc3339_utc),
            }),
        ))
    }

    /// Acknowledge an alert; mirrors an `alert_ack` timeline event and
    /// broadcasts `alert_state` + `timeline_event` after the commit.
    pub async fn alerts_ack(&self, alert_id: i64) -> Result<ApiResponse<Value>, StoreError> {
        let ts_utc = rfc3339_utc(self.clock.now_utc());

        let committed = self.store.with_tx(|tx| {
            if !AlertStore::new(tx).acknowledge(alert_id, &ts_utc)? {
                return Ok(None);
            }
            let event = NewEvent {
                ts_utc: ts_utc.clone(),
                kind: EventKind::AlertAck,
                message: format!("Alert {alert_id} acknowledged"),
                severity: Severity::Info,
                meta: Some(json!({"alert_id": alert_id})),
            };
            let event_id = EventLog::new(tx).insert(&event)?;
            Ok(Some((event_id, event)))
        })?;

        let Some((event_id, event)) = committed else {
            return Ok(ApiResponse::rejected("alert not found", json!({})));
        };

        self.bus
            .broadcast(&LiveMessage::new(
                LiveKind::AlertState,
                &ts_utc,
                json!({"id": alert_id, "acknowledged": true}),
            ))
            .await;
        self.broadcast_event(event_id, &event).await;

        Ok(ApiResponse::ok(
            json!({
                "id": alert_id,
                "acknowledged": true,
                "acknowledged_ts_utc": ts_utc,
            }),
            json!({}),
        ))
    }

    /// Mute alerts for `minutes` (0 clears). Persists the deadline, emits
    /// the matching timeline event, and broadcasts after the commit.
    pub async fn alerts_mute(&self, minutes: i64) -> Result<ApiResponse<Value>, StoreError> {
        let minutes = minutes.clamp(0, 24 * 60);
        let now = self.clock.now_utc();
        let ts_utc = rfc3339_utc(now);
        let mute_until = (minutes > 0).then(|| now + Duration::minutes(minutes));
        let mute_until_str = mute_until.map(rfc3339_utc);

        self.state.set_mute_until(mute_until);

        let (event_id, event) = self.store.with_tx(|tx| {
            AlertStore::new(tx)
                .set_setting(alerts::SETTING_MUTE_UNTIL, mute_until_str.as_deref())?;
            let (kind, message) = match minutes {
                0 => (EventKind::MuteDisabled, "Alerts unmuted".to_string()),
                m => (EventKind::MuteEnabled, format!("Alerts muted for {m} minutes")),
            };
            let event = NewEvent {
                ts_utc: ts_utc.clone(),
                kind,
                message,
                severity: Severity::Info,
                meta: Some(json!({
                    "minutes": minutes,
                    "mute_until_utc": mute_until_str,
                })),
            };
            let event_id = EventLog::new(tx).insert(&event)?;
            Ok((event_id, event))
        })?;

        self.bus
            .broadcast(&LiveMessage::new(
                LiveKind::AlertState,
                &ts_utc,
                json!({"mute_until_utc": mute_until_str}),
            ))
            .await;
        self.broadcast_event(event_id, &event).await;

        Ok(ApiResponse::ok(
            json!({
                "muted": mute_until.is_some(),
                "mute_until_utc": mute_until_str,
            }),
            json!({"minutes": minutes}),
        ))
    }

    pub fn profiles(&self) -> ApiResponse<Value> {
        let profiles: Vec<_> = profile::builtin_profiles().into_values().collect();
        ApiResponse::ok(
            json!({
                "active": self.state.active_profile().name,
                "profiles": profiles,
            }),
            json!({"ts_utc": rfc3339_utc(self.clock.now_utc())}),
        )
    }

    /// Select a profile by name; rejects unknown names without mutating
    /// anything. Broadcasts `profile` after the commit.
    pub async fn profiles_select(&self, name: &str) -> Result<ApiResponse<Value>, StoreError> {
        let ts_utc = rfc3339_utc(self.clock.now_utc());
        let Some(selected) = profile::find(name) else {
            return Ok(ApiResponse::rejected(
                "unknown profile",
                json!({"name": name, "ts_utc": ts_utc}),
            ));
        };

        self.store.with_tx(|tx| {
            vigil_storage::SettingsStore::new(tx).set(settings::ACTIVE_PROFILE_NAME, &selected.name)
        })?;
        self.state.set_active_profile(selected.clone());

        self.bus
            .broadcast(&LiveMessage::new(
                LiveKind::Profile,
                &ts_utc,
                json!({"active": selected.name, "profile": selected}),
            ))
            .await;

        Ok(ApiResponse::ok(
            json!({"active": selected.name, "profile": selected}),
            json!({"ts_utc": ts_utc}),
        ))
    }

    /// Containers from the local engine, when one is reachable. The probe
    /// caches briefly; unavailability is reported, not an error.
    pub async fn containers(&self, limit: usize) -> ApiResponse<Value> {
        let limit = limit.clamp(1, 200);
        let probes = Arc::clone(&self.probes);
        let result = tokio::task::spawn_blocking(move || probes.containers()).await;
        let (available, reason, mut items) = match result {
            Ok(Ok(items)) => (true, "ok".to_string(), items),
            Ok(Err(e)) => (false, e.to_string(), Vec::new()),
            Err(e) => (false, e.to_string(), Vec::new()),
        };
        items.truncate(limit);
        let count = items.len();
        ApiResponse::ok(
            json!({ "items": items }),
            json!({
                "available": available,
                "reason": reason,
                "limit": limit,
                "count": count,
                "ts_utc": rfc3339_utc(self.clock.now_utc()),
            }),
        )
    }

    /// One fresh ping classification; never cached.
    pub async fn network(&self) -> ApiResponse<Value> {
        let probes = Arc::clone(&self.probes);
        let host = self.config.ping_host.clone();
        let timeout_ms = self.config.ping_timeout_ms;
        let latency_ms = tokio::task::spawn_blocking(move || probes.ping(&host, timeout_ms))
            .await
            .unwrap_or(None);
        let status = NetQuality::classify(latency_ms);
        ApiResponse::ok(
            json!({
                "host": self.config.ping_host,
                "timeout_ms": self.config.ping_timeout_ms,
                "latency_ms": latency_ms,
                "status": status.as_str(),
            }),
            json!({}),
        )
    }

    async fn broadcast_event(&self, event_id: i64, event: &NewEvent) {
        let payload = serde_json::to_value(TimelineEvent {
            id: event_id,
            ts_utc: event.ts_utc.clone(),
            kind: event.kind.as_str().to_string(),
            message: event.message.clone(),
            severity: event.severity,
            meta: event.meta.clone(),
        })
        .unwrap_or_else(|_| json!({"id": event_id}));
        self.bus
            .broadcast(&LiveMessage::new(LiveKind::TimelineEvent, &event.ts_utc, payload))
            .await;
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
