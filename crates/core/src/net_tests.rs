// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    no_reply       = { None, NetQuality::Offline },
    fast           = { Some(1.0), NetQuality::Good },
    good_boundary  = { Some(50.0), NetQuality::Good },
    just_over_good = { Some(50.001), NetQuality::Ok },
    ok_boundary    = { Some(150.0), NetQuality::Ok },
    just_over_ok   = { Some(150.001), NetQuality::Poor },
    very_slow      = { Some(2000.0), NetQuality::Poor },
)]
fn classification_boundaries(latency_ms: Option<f64>, expected: NetQuality) {
    assert_eq!(NetQuality::classify(latency_ms), expected);
}

#[yare::parameterized(
    offline = { NetQuality::Offline, Severity::Critical },
    poor    = { NetQuality::Poor, Severity::Warning },
    ok      = { NetQuality::Ok, Severity::Info },
    good    = { NetQuality::Good, Severity::Info },
)]
fn transition_event_severity(quality: NetQuality, expected: Severity) {
    assert_eq!(quality.event_severity(), expected);
}

#[test]
fn serializes_as_snake_case_strings() {
    assert_eq!(serde_json::to_string(&NetQuality::Offline).unwrap(), "\"offline\"");
    assert_eq!(NetQuality::Poor.as_str(), "poor");
}
