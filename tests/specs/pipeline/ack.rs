//! Acknowledging an alert mirrors onto the timeline and the live bus.

use crate::prelude::rig;
use vigil_core::{LiveKind, Severity};
use vigil_daemon::RecordingObserver;

#[tokio::test]
async fn ack_sets_state_mirrors_event_and_broadcasts() {
    let rig = rig();

    // Produce a real alert through the pipeline: required port 3000 down.
    rig.probes.set_port_listening(3000, false);
    rig.ticks(2).await;
    let alerts = rig.alert_rows();
    assert_eq!(alerts.len(), 1);
    let alert_id = alerts[0].id;

    let observer = RecordingObserver::new();
    rig.bus.attach(observer.clone(), "t").await.unwrap();

    let response = rig.api.alerts_ack(alert_id).await.unwrap();
    assert!(response.ok);
    let data = response.data.unwrap();
    assert_eq!(data["acknowledged"], true);
    assert!(data["acknowledged_ts_utc"].is_string());

    // Store state updated.
    let row = rig
        .alert_rows()
        .into_iter()
        .find(|a| a.id == alert_id)
        .unwrap();
    assert!(row.acknowledged);
    assert!(row.acknowledged_ts_utc.is_some());

    // Timeline mirror.
    let acks = rig.events_of_kind("alert_ack");
    assert_eq!(acks.len(), 1);
    assert_eq!(acks[0].severity, Severity::Info);
    assert_eq!(acks[0].meta.as_ref().unwrap()["alert_id"], alert_id);

    // Exactly one alert_state and one timeline_event broadcast.
    assert_eq!(
        observer.kinds(),
        [LiveKind::Hello, LiveKind::AlertState, LiveKind::TimelineEvent]
    );

    // Second ack is a no-op.
    let second = rig.api.alerts_ack(alert_id).await.unwrap();
    assert!(!second.ok);
    assert_eq!(rig.events_of_kind("alert_ack").len(), 1);
}
