// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn kind_strings_match_stored_values() {
    assert_eq!(EventKind::AppStarted.as_str(), "app_started");
    assert_eq!(EventKind::AlertCreated.as_str(), "alert_created");
    assert_eq!(EventKind::AlertAck.as_str(), "alert_ack");
    assert_eq!(EventKind::MuteEnabled.as_str(), "mute_enabled");
    assert_eq!(EventKind::MuteDisabled.as_str(), "mute_disabled");
    assert_eq!(EventKind::PortUp.as_str(), "port_up");
    assert_eq!(EventKind::PortDown.as_str(), "port_down");
    assert_eq!(EventKind::NetworkStatus.as_str(), "network_status");
}

#[test]
fn kind_serde_uses_snake_case() {
    let json = serde_json::to_string(&EventKind::NetworkStatus).unwrap();
    assert_eq!(json, "\"network_status\"");
    let parsed: EventKind = serde_json::from_str("\"port_up\"").unwrap();
    assert_eq!(parsed, EventKind::PortUp);
}
