// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn socket(ip: &str, port: u16, pid: u32) -> ListeningSocket {
    ListeningSocket {
        local_ip: ip.to_string(),
        port,
        pid,
        process_name: "proc".to_string(),
    }
}

#[test]
fn normalize_sorts_by_port_ip_pid() {
    let sockets = vec![
        socket("127.0.0.1", 8000, 2),
        socket("0.0.0.0", 3000, 9),
        socket("127.0.0.1", 8000, 1),
        socket("0.0.0.0", 8000, 1),
    ];
    let normalized = normalize_sockets(sockets, 10);
    let keys: Vec<(u16, &str, u32)> = normalized
        .iter()
        .map(|s| (s.port, s.local_ip.as_str(), s.pid))
        .collect();
    assert_eq!(
        keys,
        [
            (3000, "0.0.0.0", 9),
            (8000, "0.0.0.0", 1),
            (8000, "127.0.0.1", 1),
            (8000, "127.0.0.1", 2),
        ]
    );
}

#[test]
fn normalize_dedupes_identical_triples() {
    let sockets = vec![
        socket("127.0.0.1", 3000, 7),
        socket("127.0.0.1", 3000, 7),
        socket("127.0.0.1", 3000, 8),
    ];
    assert_eq!(normalize_sockets(sockets, 10).len(), 2);
}

#[test]
fn normalize_caps_at_limit() {
    let sockets = (0..10).map(|i| socket("::", 3000 + i, 1)).collect();
    assert_eq!(normalize_sockets(sockets, 3).len(), 3);
}
