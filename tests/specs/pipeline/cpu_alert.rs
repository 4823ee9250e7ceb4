//! Sustained CPU load produces exactly one alert, mirrored on the
//! timeline and broadcast once.

use crate::prelude::rig;
use vigil_core::{LiveKind, Severity};
use vigil_daemon::RecordingObserver;

#[tokio::test]
async fn sustained_cpu_fires_exactly_once() {
    let rig = rig();
    let observer = RecordingObserver::new();
    rig.bus.attach(observer.clone(), "t").await.unwrap();

    rig.probes.set_cpu(95.0);

    // Thirty one-second ticks: the 30s gate has not yet elapsed.
    rig.ticks(30).await;
    assert!(rig.alert_rows().is_empty(), "no alert through tick 30");

    // Tick 31 crosses the gate.
    rig.tick().await;
    let alerts = rig.alert_rows();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, "cpu_high");
    assert_eq!(alerts[0].severity, Severity::Warning);
    assert!(alerts[0].message.starts_with("CPU usage high"));

    // One mirror timeline event.
    let mirrors = rig.events_of_kind("alert_created");
    assert_eq!(mirrors.len(), 1);
    assert_eq!(mirrors[0].meta.as_ref().unwrap()["type"], "cpu_high");

    // One live `alert` broadcast.
    let alert_broadcasts = observer
        .kinds()
        .into_iter()
        .filter(|k| *k == LiveKind::Alert)
        .count();
    assert_eq!(alert_broadcasts, 1);

    // Sixty more seconds of sustained load: nothing new.
    rig.ticks(60).await;
    assert_eq!(rig.alert_rows().len(), 1);
    assert_eq!(
        observer
            .kinds()
            .into_iter()
            .filter(|k| *k == LiveKind::Alert)
            .count(),
        1
    );
}

#[tokio::test]
async fn every_tick_inserts_one_snapshot_row() {
    let rig = rig();
    rig.ticks(5).await;

    let conn = rig.store.conn().unwrap();
    let count: i64 = conn
        .query_row("SELECT count(*) FROM snapshots", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 5);

    let distinct: i64 = conn
        .query_row("SELECT count(DISTINCT ts_utc) FROM snapshots", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(distinct, 5, "each tick carries its own timestamp");
}
