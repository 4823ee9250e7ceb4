// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_linux_ping_output() {
    let output = "64 bytes from 1.1.1.1: icmp_seq=1 ttl=58 time=12.3 ms\n";
    assert_eq!(parse_ping_time(output), Some(12.3));
}

#[test]
fn parses_integer_ping_time() {
    let output = "64 bytes from 1.1.1.1: icmp_seq=1 ttl=58 time=7 ms\n";
    assert_eq!(parse_ping_time(output), Some(7.0));
}

#[test]
fn missing_time_field_is_none() {
    assert_eq!(parse_ping_time("Request timeout for icmp_seq 0\n"), None);
    assert_eq!(parse_ping_time(""), None);
}

#[test]
fn parses_proc_net_tcp_listen_rows() {
    // 0100007F:1F90 = 127.0.0.1:8080; state 0A = LISTEN, 01 = ESTABLISHED.
    let table = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid
   0: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000
   1: 00000000:0050 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0
   2: 0100007F:AAAA 0200007F:0016 01 00000000:00000000 00:00000000 00000000  1000
";
    let sockets = parse_proc_net_tcp(table);
    assert_eq!(sockets.len(), 2);
    assert_eq!(sockets[0].local_ip, "127.0.0.1");
    assert_eq!(sockets[0].port, 8080);
    assert_eq!(sockets[1].local_ip, "0.0.0.0");
    assert_eq!(sockets[1].port, 80);
}

#[test]
fn port_status_reflects_a_live_listener() {
    let probes = SystemProbes::new();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let statuses = probes.port_status(&[port]);
    assert_eq!(statuses.len(), 1);
    assert!(statuses[0].listening);

    drop(listener);
    let statuses = probes.port_status(&[port]);
    assert!(!statuses[0].listening);
}

#[test]
fn memory_reading_is_internally_consistent() {
    let probes = SystemProbes::new();
    let reading = probes.memory().unwrap();
    assert!(reading.total_bytes > 0);
    assert!(reading.percent >= 0.0 && reading.percent <= 100.0);
    assert!(reading.used_bytes <= reading.total_bytes);
}
