// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vigil-engine: stateful alert evaluation over the sample stream.

pub mod engine;
pub mod flap;
pub mod probes;

pub use engine::{AlertDraft, AlertEngine, TickInput, TickOutput};
pub use flap::FlapWindow;
pub use probes::{NetRateTracker, ProbeError, ProbeSet};

#[cfg(any(test, feature = "test-support"))]
pub use probes::FakeProbes;
