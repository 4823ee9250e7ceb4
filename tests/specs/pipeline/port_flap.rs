//! A required port oscillating past the flap threshold alerts once per
//! window.

use crate::prelude::{rig, Rig};

async fn toggle(rig: &Rig, listening: &mut bool) {
    *listening = !*listening;
    rig.probes.set_port_listening(3000, *listening);
    // One transition tick plus four quiet seconds keeps six toggles
    // inside a 30-second burst.
    rig.ticks(5).await;
}

#[tokio::test]
async fn six_transitions_in_the_window_fire_one_flapping_alert() {
    let rig = rig();
    rig.tick().await; // baseline: listening

    let mut listening = true;
    for _ in 0..5 {
        toggle(&rig, &mut listening).await;
    }
    let flapping = |rig: &Rig| {
        rig.alert_rows()
            .into_iter()
            .filter(|a| a.kind == "port_flapping")
            .count()
    };
    assert_eq!(flapping(&rig), 0, "five transitions stay quiet");

    toggle(&rig, &mut listening).await;
    assert_eq!(flapping(&rig), 1, "sixth transition fires");

    let alerts: Vec<_> = rig
        .alert_rows()
        .into_iter()
        .filter(|a| a.kind == "port_flapping")
        .collect();
    assert!(alerts[0].message.contains("3000"));

    // More toggles inside the same 120s window: no further flapping alerts.
    for _ in 0..4 {
        toggle(&rig, &mut listening).await;
    }
    assert_eq!(flapping(&rig), 1);
}

#[tokio::test]
async fn transitions_also_land_on_the_timeline() {
    let rig = rig();
    rig.tick().await;

    let mut listening = true;
    for _ in 0..2 {
        toggle(&rig, &mut listening).await;
    }

    assert_eq!(rig.events_of_kind("port_down").len(), 1);
    assert_eq!(rig.events_of_kind("port_up").len(), 1);
}
