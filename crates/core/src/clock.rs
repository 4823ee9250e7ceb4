// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for deterministic time in tests.
//!
//! The pipeline needs two notions of time: a monotonic instant for
//! cooldowns, duration gates, and flap windows, and a UTC wall clock for
//! persisted timestamps. Both come from the same [`Clock`] so tests can
//! drive them in lockstep.

use chrono::{DateTime, TimeZone, Utc};
use std::time::{Duration, Instant};

/// Source of monotonic and wall-clock time.
pub trait Clock: Send + Sync {
    /// Monotonic instant. Never goes backward within a process.
    fn now(&self) -> Instant;

    /// Current UTC wall-clock time.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
///
/// Monotonic and UTC time advance together via [`FakeClock::advance`], so a
/// test that moves 30 seconds forward sees both the duration gate and the
/// persisted timestamps move by 30 seconds.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone)]
pub struct FakeClock {
    base: Instant,
    base_utc: DateTime<Utc>,
    offset: std::sync::Arc<parking_lot::Mutex<Duration>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeClock {
    /// Create a clock anchored at a fixed, readable UTC epoch.
    pub fn new() -> Self {
        #[allow(clippy::unwrap_used)] // constant is a valid timestamp
        let base_utc = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().unwrap();
        Self {
            base: Instant::now(),
            base_utc,
            offset: std::sync::Arc::new(parking_lot::Mutex::new(Duration::ZERO)),
        }
    }

    /// Move both monotonic and wall-clock time forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock();
        *offset += by;
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        let offset = *self.offset.lock();
        self.base_utc
            + chrono::Duration::from_std(offset).unwrap_or_else(|_| chrono::Duration::zero())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
