//! Rollup and retention over pre-seeded raw history.

use crate::prelude::rig;
use std::time::Duration;
use vigil_core::{floor_minute, rfc3339_utc, Clock, HostSample};
use vigil_daemon::RetentionService;
use vigil_storage::{rollup, NewSnapshot, SettingsStore, SnapshotStore};

#[tokio::test]
async fn one_cycle_rolls_up_and_preserves_raw() {
    let rig = rig();
    // Put "now" an hour past the epoch so the seeded window is in range.
    rig.clock.advance(Duration::from_secs(3600));
    let now = rig.clock.now_utc();

    // 120 raw snapshots at 1s intervals ending ten minutes ago.
    {
        let conn = rig.store.conn().unwrap();
        let snapshots = SnapshotStore::new(&conn);
        for i in 0..120i64 {
            snapshots
                .insert(&NewSnapshot {
                    ts_utc: rfc3339_utc(now - chrono::Duration::seconds(600 + (120 - i))),
                    sample: HostSample {
                        cpu_percent: Some(40.0 + i as f64),
                        mem_percent: Some(50.0),
                        ..HostSample::default()
                    },
                })
                .unwrap();
        }
    }

    let service = RetentionService::new(rig.store.clone(), rig.clock.clone(), Duration::from_secs(60));
    service.run_cycle().unwrap();

    let conn = rig.store.conn().unwrap();
    let buckets: i64 = conn
        .query_row("SELECT count(*) FROM snapshots_1m", [], |r| r.get(0))
        .unwrap();
    assert!(
        (2..=3).contains(&buckets),
        "two minutes of seeded samples produce 2-3 minute buckets, got {buckets}"
    );

    // Raw rows remain: still well within the 24h horizon.
    let raw: i64 = conn
        .query_row("SELECT count(*) FROM snapshots", [], |r| r.get(0))
        .unwrap();
    assert_eq!(raw, 120);

    // Cursor advanced to the lagged minute floor.
    let cursor = SettingsStore::new(&conn)
        .get(rollup::CURSOR_RAW_TO_1M)
        .unwrap()
        .unwrap();
    assert_eq!(
        cursor,
        rfc3339_utc(floor_minute(now - chrono::Duration::minutes(2)))
    );
}

#[tokio::test]
async fn rerunning_the_same_span_changes_nothing() {
    let rig = rig();
    rig.clock.advance(Duration::from_secs(3600));
    let now = rig.clock.now_utc();

    {
        let conn = rig.store.conn().unwrap();
        let snapshots = SnapshotStore::new(&conn);
        for i in 0..60i64 {
            snapshots
                .insert(&NewSnapshot {
                    ts_utc: rfc3339_utc(now - chrono::Duration::seconds(600 + i)),
                    sample: HostSample {
                        cpu_percent: Some(30.0),
                        ..HostSample::default()
                    },
                })
                .unwrap();
        }
    }

    let service = RetentionService::new(rig.store.clone(), rig.clock.clone(), Duration::from_secs(60));
    service.run_cycle().unwrap();

    let dump = |store: &vigil_storage::Store| -> Vec<(String, f64)> {
        let conn = store.conn().unwrap();
        let mut stmt = conn
            .prepare("SELECT bucket_start_utc, avg_cpu_percent FROM snapshots_1m ORDER BY bucket_start_utc")
            .unwrap();
        let rows = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        rows
    };
    let first = dump(&rig.store);

    // Rewind the cursor and run the same span again.
    {
        let conn = rig.store.conn().unwrap();
        SettingsStore::new(&conn)
            .set(
                rollup::CURSOR_RAW_TO_1M,
                &rfc3339_utc(now - chrono::Duration::hours(1)),
            )
            .unwrap();
    }
    service.run_cycle().unwrap();

    assert_eq!(dump(&rig.store), first);
}
