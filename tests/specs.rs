//! Behavioral specifications for the vigil pipeline.
//!
//! These tests drive the real scheduler, engine, store, and live bus
//! together; only the platform probes and the clock are fakes. Each spec
//! mirrors an observable end-to-end scenario.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// pipeline/
#[path = "specs/pipeline/ack.rs"]
mod pipeline_ack;
#[path = "specs/pipeline/cpu_alert.rs"]
mod pipeline_cpu_alert;
#[path = "specs/pipeline/live_bus.rs"]
mod pipeline_live_bus;
#[path = "specs/pipeline/mute.rs"]
mod pipeline_mute;
#[path = "specs/pipeline/port_flap.rs"]
mod pipeline_port_flap;
#[path = "specs/pipeline/retention.rs"]
mod pipeline_retention;

// daemon/
#[path = "specs/daemon/help.rs"]
mod daemon_help;
