//! Live-bus resilience: one failing observer never affects the rest.

use crate::prelude::rig;
use vigil_core::LiveKind;
use vigil_daemon::RecordingObserver;

#[tokio::test]
async fn failing_observer_is_dropped_mid_broadcast() {
    let rig = rig();

    let first = RecordingObserver::new();
    let flaky = RecordingObserver::new();
    let third = RecordingObserver::new();
    for observer in [&first, &flaky, &third] {
        rig.bus.attach(observer.clone(), "t").await.unwrap();
    }
    assert_eq!(rig.bus.observer_count(), 3);

    flaky.fail_next_sends();
    rig.tick().await; // broadcasts kpi + chart_point

    let kpis = |o: &RecordingObserver| {
        o.kinds()
            .into_iter()
            .filter(|k| *k == LiveKind::Kpi)
            .count()
    };
    assert_eq!(kpis(&first), 1);
    assert_eq!(kpis(&third), 1);
    assert_eq!(kpis(&flaky), 0);
    assert_eq!(rig.bus.observer_count(), 2, "flaky observer removed");

    // Subsequent ticks only reach the survivors.
    rig.tick().await;
    assert_eq!(kpis(&first), 2);
    assert_eq!(kpis(&third), 2);
    assert_eq!(kpis(&flaky), 0);
}
