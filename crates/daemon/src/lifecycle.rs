// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: configuration, startup, shutdown.

use crate::live_bus::LiveBus;
use crate::runtime_state::RuntimeState;
use fs2::FileExt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};
use vigil_core::{rfc3339_utc, Clock, EventKind, NewEvent, Severity, SystemClock, VigilConfig};
use vigil_storage::{EventLog, Store, StoreError};

/// Daemon configuration: filesystem layout plus tunables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/vigil)
    pub state_dir: PathBuf,
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Path to the lock/PID file
    pub lock_path: PathBuf,
    /// Path to the daemon log file
    pub log_path: PathBuf,
    /// Tunables from vigil.toml (defaults when the file is absent)
    pub settings: VigilConfig,
}

impl Config {
    /// Load configuration for the user-level daemon.
    ///
    /// Uses fixed paths under `~/.local/state/vigil/` (or
    /// `$XDG_STATE_HOME/vigil/`; `$VIGIL_STATE_DIR` overrides both).
    pub fn load() -> Result<Self, LifecycleError> {
        Self::load_from(state_dir()?)
    }

    /// Load configuration rooted at an explicit state directory.
    pub fn load_from(state_dir: PathBuf) -> Result<Self, LifecycleError> {
        let settings = load_settings(&state_dir.join("vigil.toml"))?;
        Ok(Self {
            db_path: state_dir.join("vigil.db"),
            lock_path: state_dir.join("vigild.pid"),
            log_path: state_dir.join("vigild.log"),
            state_dir,
            settings,
        })
    }
}

/// Daemon state during operation.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub store: Store,
    pub state: Arc<RuntimeState>,
    pub bus: Arc<LiveBus>,
    pub start_time: Instant,
}

impl DaemonState {
    /// Release lifecycle files. The store itself needs no teardown.
    pub fn shutdown(&self) {
        info!("Shutting down daemon...");
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }
        info!("Daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Invalid configuration file {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon: acquire the single-instance lock, open the store,
/// load persisted settings, and record the startup on the timeline.
pub fn startup(config: Config) -> Result<DaemonState, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Acquire the lock FIRST; avoid truncating before we hold it, which
    // would wipe the running daemon's PID.
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    let store = Store::open(&config.db_path)?;
    let state = Arc::new(RuntimeState::load(&store)?);

    // Startup marker on the timeline.
    {
        let conn = store.conn()?;
        EventLog::new(&conn).insert(&NewEvent {
            ts_utc: rfc3339_utc(SystemClock.now_utc()),
            kind: EventKind::AppStarted,
            message: format!("vigil {} started", env!("CARGO_PKG_VERSION")),
            severity: Severity::Info,
            meta: Some(serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "profile": state.active_profile().name,
            })),
        })?;
    }

    info!(
        state_dir = %config.state_dir.display(),
        profile = %state.active_profile().name,
        "Daemon started"
    );

    Ok(DaemonState {
        config,
        lock_file,
        store,
        state,
        bus: Arc::new(LiveBus::new()),
        start_time: Instant::now(),
    })
}

fn load_settings(path: &Path) -> Result<VigilConfig, LifecycleError> {
    if !path.exists() {
        return Ok(VigilConfig::default());
    }
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|e| LifecycleError::InvalidConfig {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Get the state directory for vigil
fn state_dir() -> Result<PathBuf, LifecycleError> {
    // VIGIL_STATE_DIR takes priority (used by tests for isolation)
    if let Ok(dir) = std::env::var("VIGIL_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }

    // Fall back to XDG_STATE_HOME/vigil or ~/.local/state/vigil
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("vigil"));
    }

    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/vigil"))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
