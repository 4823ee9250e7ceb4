// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Vigil Daemon (vigild)
//!
//! Background process that samples host metrics, evaluates alert rules,
//! persists history, and fans live updates out to observers.
//!
//! Architecture:
//! - Snapshot scheduler task: the per-second collection pipeline
//! - Retention task: rollups and pruning every 60s
//! - Live bus: in-process fan-out the transport layer attaches to

use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use vigil_daemon::live_bus::CLOSE_GOING_AWAY;
use vigil_daemon::{lifecycle, Config, RetentionService, SnapshotScheduler, SystemProbes};
use vigil_core::SystemClock;

/// Rotate the log once it exceeds this size.
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("vigild {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("vigild {}", env!("CARGO_PKG_VERSION"));
                println!("Vigil Daemon - local workstation telemetry: snapshots, alerts, rollups");
                println!();
                println!("USAGE:");
                println!("    vigild");
                println!();
                println!("State lives under ~/.local/state/vigil (override with");
                println!("VIGIL_STATE_DIR). Tunables are read from vigil.toml in the");
                println!("state directory when present.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: vigild [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    rotate_log_if_needed(&config.log_path);
    let _log_guard = setup_logging(&config)?;

    info!("Starting vigil daemon");

    let daemon = match lifecycle::startup(config) {
        Ok(daemon) => daemon,
        Err(e @ lifecycle::LifecycleError::LockFailed(_)) => {
            eprintln!("vigild is already running");
            eprintln!("  {e}");
            std::process::exit(1);
        }
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            return Err(e.into());
        }
    };

    let settings = daemon.config.settings.clone();
    let scheduler = SnapshotScheduler::new(
        daemon.store.clone(),
        Arc::clone(&daemon.bus),
        Arc::clone(&daemon.state),
        Arc::new(SystemProbes::new()),
        SystemClock,
        settings.daemon.clone(),
        settings.engine.clone(),
    );
    scheduler.start();

    let retention = RetentionService::new(
        daemon.store.clone(),
        SystemClock,
        Duration::from_secs(settings.daemon.retention_interval_secs),
    );
    retention.start();

    // Run until SIGTERM or SIGINT.
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("SIGTERM received"),
        _ = sigint.recv() => info!("SIGINT received"),
    }

    scheduler.stop().await;
    retention.stop().await;
    daemon.bus.close_all(CLOSE_GOING_AWAY).await;
    daemon.shutdown();
    Ok(())
}

/// Move an oversized log aside; the previous rotation is overwritten.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let Ok(metadata) = std::fs::metadata(log_path) else {
        return;
    };
    if metadata.len() < MAX_LOG_BYTES {
        return;
    }
    let rotated = log_path.with_extension("log.1");
    let _ = std::fs::rename(log_path, rotated);
}

/// File logging with env-filter; returns the guard keeping the writer alive.
fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.state_dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}
