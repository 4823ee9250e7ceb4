// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trailing window of port state transitions.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Records transition instants and counts how many fall inside a trailing
/// window. Entries are pruned from the front on every query; the deque is
/// hard-capped at twice the flap threshold.
#[derive(Debug)]
pub struct FlapWindow {
    transitions: VecDeque<Instant>,
    cap: usize,
}

impl FlapWindow {
    pub fn new(threshold: usize) -> Self {
        Self {
            transitions: VecDeque::new(),
            cap: threshold.saturating_mul(2).max(1),
        }
    }

    /// Record one state transition.
    pub fn record(&mut self, now: Instant) {
        if self.transitions.len() == self.cap {
            self.transitions.pop_front();
        }
        self.transitions.push_back(now);
    }

    /// Transitions within `window` of `now`, pruning expired entries.
    pub fn count(&mut self, now: Instant, window: Duration) -> usize {
        while let Some(front) = self.transitions.front() {
            if now.duration_since(*front) > window {
                self.transitions.pop_front();
            } else {
                break;
            }
        }
        self.transitions.len()
    }
}

#[cfg(test)]
#[path = "flap_tests.rs"]
mod tests;
