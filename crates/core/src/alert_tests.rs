// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn cpu_and_ram_share_the_global_key() {
    assert_eq!(AlertKind::CpuHigh.key(), "global");
    assert_eq!(AlertKind::RamHigh.key(), "global");
    assert_ne!(AlertKind::CpuHigh.type_str(), AlertKind::RamHigh.type_str());
}

#[test]
fn port_kinds_key_on_the_port() {
    assert_eq!(AlertKind::PortDown(3000).key(), "3000");
    assert_eq!(AlertKind::PortFlapping(5173).key(), "5173");
}

#[test]
fn network_kinds_key_on_the_ping_host() {
    assert_eq!(AlertKind::NetworkOffline("1.1.1.1".into()).key(), "1.1.1.1");
    assert_eq!(AlertKind::NetworkPoor("1.1.1.1".into()).key(), "1.1.1.1");
}

#[yare::parameterized(
    port_down   = { AlertKind::PortDown(3000), Severity::Critical },
    net_offline = { AlertKind::NetworkOffline("1.1.1.1".into()), Severity::Critical },
    cpu         = { AlertKind::CpuHigh, Severity::Warning },
    ram         = { AlertKind::RamHigh, Severity::Warning },
    flapping    = { AlertKind::PortFlapping(3000), Severity::Warning },
    net_poor    = { AlertKind::NetworkPoor("1.1.1.1".into()), Severity::Warning },
)]
fn severity_mapping(kind: AlertKind, expected: Severity) {
    assert_eq!(kind.severity(), expected);
}

#[test]
fn alert_row_serializes_type_field() {
    let alert = Alert {
        id: 7,
        ts_utc: "2026-01-01T00:00:00+00:00".into(),
        kind: "cpu_high".into(),
        message: "CPU usage high: 91.0%".into(),
        severity: Severity::Warning,
        acknowledged: false,
        acknowledged_ts_utc: None,
    };
    let json = serde_json::to_value(&alert).unwrap();
    assert_eq!(json["type"], "cpu_high");
    assert_eq!(json["severity"], "warning");
}
