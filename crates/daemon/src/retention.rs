// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic rollup and retention worker.
//!
//! Independent of the snapshot scheduler; runs every 60 seconds. Each
//! cycle performs both rollup steps and the prune inside one transaction,
//! so the cursors only advance when the whole cycle commits. A failed
//! cycle rolls back and the same range is retried next cycle.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use vigil_core::Clock;
use vigil_storage::{apply_retention, rollup_1m_to_15m, rollup_raw_to_1m, Store, StoreError};

pub struct RetentionService<C: Clock + 'static> {
    inner: Arc<Inner<C>>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct Inner<C> {
    store: Store,
    clock: C,
    interval: std::time::Duration,
}

impl<C: Clock + 'static> RetentionService<C> {
    pub fn new(store: Store, clock: C, interval: std::time::Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                clock,
                interval,
            }),
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    pub fn start(&self) {
        let mut slot = self.handle.lock();
        if slot.is_some() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let cancel = self.cancel.clone();
        *slot = Some(tokio::spawn(async move {
            info!("retention service started");
            loop {
                if let Err(e) = inner.run_cycle() {
                    error!(error = %e, "retention cycle failed; will retry");
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(inner.interval) => {}
                }
            }
            info!("retention service stopped");
        }));
    }

    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Run one rollup + prune cycle. The loop calls this; tests drive it
    /// directly.
    pub fn run_cycle(&self) -> Result<(), StoreError> {
        self.inner.run_cycle()
    }
}

impl<C: Clock> Inner<C> {
    fn run_cycle(&self) -> Result<(), StoreError> {
        let now_utc = self.clock.now_utc();
        self.store.with_tx(|tx| {
            let raw_progressed = rollup_raw_to_1m(tx, now_utc)?;
            let one_m_progressed = rollup_1m_to_15m(tx, now_utc)?;
            apply_retention(tx, now_utc)?;
            if raw_progressed || one_m_progressed {
                debug!(raw_progressed, one_m_progressed, "rollup progressed");
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
