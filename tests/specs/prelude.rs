//! Shared rig for pipeline specs: a real store, scheduler, engine, API,
//! and live bus over scripted probes and a fake clock.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use vigil_core::{Alert, DaemonConfig, EngineConfig, FakeClock, TimelineEvent};
use vigil_daemon::{CoreApi, LiveBus, RuntimeState, SnapshotScheduler};
use vigil_engine::FakeProbes;
use vigil_storage::{AlertStore, EventLog, Store};

pub struct Rig {
    _dir: tempfile::TempDir,
    pub store: Store,
    pub bus: Arc<LiveBus>,
    pub state: Arc<RuntimeState>,
    pub probes: Arc<FakeProbes>,
    pub clock: FakeClock,
    pub scheduler: SnapshotScheduler<FakeProbes, FakeClock>,
    pub api: CoreApi<FakeProbes, FakeClock>,
}

/// A rig over a healthy host: low CPU/RAM, fast ping, every default watch
/// port listening.
pub fn rig() -> Rig {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("vigil.db")).unwrap();
    let bus = Arc::new(LiveBus::new());
    let state = Arc::new(RuntimeState::load(&store).unwrap());
    let probes = Arc::new(FakeProbes::new());
    let clock = FakeClock::new();

    probes.set_cpu(10.0);
    probes.set_memory(40.0);
    probes.set_disk(50.0);
    probes.set_net_counters(1_000, 2_000);
    probes.set_latency_ms(Some(10.0));
    for port in [3000, 5173, 8000, 1433, 5672, 15672] {
        probes.set_port_listening(port, true);
    }

    let scheduler = SnapshotScheduler::new(
        store.clone(),
        Arc::clone(&bus),
        Arc::clone(&state),
        Arc::clone(&probes),
        clock.clone(),
        DaemonConfig::default(),
        EngineConfig::default(),
    );
    let api = CoreApi::new(
        store.clone(),
        Arc::clone(&bus),
        Arc::clone(&state),
        Arc::clone(&probes),
        clock.clone(),
        DaemonConfig::default(),
    );

    Rig {
        _dir: dir,
        store,
        bus,
        state,
        probes,
        clock,
        scheduler,
        api,
    }
}

impl Rig {
    /// Run one scheduler tick, then advance both clocks one second.
    pub async fn tick(&self) {
        self.scheduler.tick().await;
        self.clock.advance(Duration::from_secs(1));
    }

    pub async fn ticks(&self, n: usize) {
        for _ in 0..n {
            self.tick().await;
        }
    }

    pub fn alert_rows(&self) -> Vec<Alert> {
        let conn = self.store.conn().unwrap();
        AlertStore::new(&conn).recent(500, true).unwrap()
    }

    pub fn event_rows(&self) -> Vec<TimelineEvent> {
        let conn = self.store.conn().unwrap();
        EventLog::new(&conn).latest(500).unwrap()
    }

    pub fn events_of_kind(&self, kind: &str) -> Vec<TimelineEvent> {
        self.event_rows()
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }
}
