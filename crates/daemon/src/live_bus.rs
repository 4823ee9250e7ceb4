// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of live messages to observer sessions.
//!
//! Sessions register under a single mutex; sends happen outside it so one
//! slow observer cannot block the set. A failed send marks the session
//! dead: it is removed and closed, and the broadcast continues to everyone
//! else. Messages to a single session arrive in emit order; there is no
//! ordering guarantee between sessions.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;
use vigil_core::{LiveKind, LiveMessage};

/// Close code sent when the daemon shuts down.
pub const CLOSE_GOING_AWAY: u16 = 1001;

#[derive(Debug, Error)]
#[error("observer session error: {0}")]
pub struct SessionError(pub String);

/// One connected observer. The transport (a WebSocket, in practice) lives
/// behind this trait.
#[async_trait]
pub trait ObserverSession: Send + Sync {
    async fn send(&self, message: &LiveMessage) -> Result<(), SessionError>;

    async fn close(&self, code: u16) -> Result<(), SessionError>;
}

type SessionEntry = (Uuid, Arc<dyn ObserverSession>);

/// The in-process live bus.
pub struct LiveBus {
    sessions: Mutex<Vec<SessionEntry>>,
}

impl Default for LiveBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveBus {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// Register a session and perform the `hello` handshake. On handshake
    /// failure the session is unregistered and closed.
    pub async fn attach(
        &self,
        session: Arc<dyn ObserverSession>,
        server_time_utc: &str,
    ) -> Result<Uuid, SessionError> {
        let id = Uuid::new_v4();
        self.sessions.lock().push((id, Arc::clone(&session)));

        let hello = LiveMessage::new(
            LiveKind::Hello,
            server_time_utc,
            serde_json::json!({
                "server_time_utc": server_time_utc,
                "message": "connected",
            }),
        );
        if let Err(e) = session.send(&hello).await {
            self.detach(id);
            let _ = session.close(CLOSE_GOING_AWAY).await;
            return Err(e);
        }
        debug!(%id, "observer attached");
        Ok(id)
    }

    pub fn detach(&self, id: Uuid) {
        self.sessions.lock().retain(|(sid, _)| *sid != id);
    }

    pub fn observer_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Send to every session. Failed sessions are removed and closed after
    /// the sweep; close failures are ignored.
    pub async fn broadcast(&self, message: &LiveMessage) {
        let targets: Vec<SessionEntry> = self.sessions.lock().clone();
        if targets.is_empty() {
            return;
        }

        let mut dead: Vec<SessionEntry> = Vec::new();
        for (id, session) in targets {
            if let Err(e) = session.send(message).await {
                warn!(%id, error = %e, "observer send failed; dropping session");
                dead.push((id, session));
            }
        }

        if !dead.is_empty() {
            {
                let mut sessions = self.sessions.lock();
                sessions.retain(|(id, _)| !dead.iter().any(|(dead_id, _)| dead_id == id));
            }
            for (_, session) in dead {
                let _ = session.close(CLOSE_GOING_AWAY).await;
            }
        }
    }

    /// Drain the set and attempt an orderly close on every session.
    pub async fn close_all(&self, code: u16) {
        let targets: Vec<SessionEntry> = std::mem::take(&mut *self.sessions.lock());
        for (id, session) in targets {
            debug!(%id, code, "closing observer");
            let _ = session.close(code).await;
        }
    }
}

/// Observer that records everything it receives; can be scripted to fail.
#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct RecordingObserver {
    messages: Mutex<Vec<LiveMessage>>,
    fail_sends: std::sync::atomic::AtomicBool,
    closed_with: Mutex<Option<u16>>,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next_sends(&self) {
        self.fail_sends
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<LiveMessage> {
        self.messages.lock().clone()
    }

    pub fn kinds(&self) -> Vec<LiveKind> {
        self.messages.lock().iter().map(|m| m.kind).collect()
    }

    pub fn closed_with(&self) -> Option<u16> {
        *self.closed_with.lock()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ObserverSession for RecordingObserver {
    async fn send(&self, message: &LiveMessage) -> Result<(), SessionError> {
        if self.fail_sends.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(SessionError("scripted send failure".into()));
        }
        self.messages.lock().push(message.clone());
        Ok(())
    }

    async fn close(&self, code: u16) -> Result<(), SessionError> {
        *self.closed_with.lock() = Some(code);
        Ok(())
    }
}

#[cfg(test)]
#[path = "live_bus_tests.rs"]
mod tests;
