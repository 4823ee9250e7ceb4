//! Mute suppresses alert production entirely; unmuting re-arms the
//! duration gates from scratch.

use crate::prelude::rig;

#[tokio::test]
async fn muted_overload_produces_no_alerts() {
    let rig = rig();

    let response = rig.api.alerts_mute(5).await.unwrap();
    assert!(response.ok);
    assert_eq!(response.data.unwrap()["muted"], true);

    rig.probes.set_cpu(99.0);
    rig.ticks(40).await;
    assert!(rig.alert_rows().is_empty(), "muted: 40s of overload stays silent");

    // Unmute; the sustain window starts fresh.
    let response = rig.api.alerts_mute(0).await.unwrap();
    assert_eq!(response.data.unwrap()["muted"], false);

    rig.ticks(30).await;
    assert!(rig.alert_rows().is_empty(), "gate restarted at unmute");

    rig.ticks(5).await;
    let alerts = rig.alert_rows();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, "cpu_high");
}

#[tokio::test]
async fn mute_toggles_are_recorded_on_the_timeline() {
    let rig = rig();

    rig.api.alerts_mute(30).await.unwrap();
    rig.api.alerts_mute(0).await.unwrap();

    assert_eq!(rig.events_of_kind("mute_enabled").len(), 1);
    assert_eq!(rig.events_of_kind("mute_disabled").len(), 1);

    let enabled = &rig.events_of_kind("mute_enabled")[0];
    assert_eq!(enabled.meta.as_ref().unwrap()["minutes"], 30);
}

#[tokio::test]
async fn mute_expires_on_its_own() {
    let rig = rig();

    rig.api.alerts_mute(1).await.unwrap(); // one minute
    rig.probes.set_cpu(99.0);

    // 60 muted ticks exhaust the mute window; the gate then needs its own
    // 30 sustained seconds.
    rig.ticks(60).await;
    assert!(rig.alert_rows().is_empty());

    rig.ticks(31).await;
    assert_eq!(rig.alert_rows().len(), 1);
}
