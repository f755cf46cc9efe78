// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gpujob daemon (gjd)
//!
//! Watches the shared inbox, admits jobs against host cores and GPUs,
//! supervises their process trees, and publishes the status board.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::fs;
use std::io::Write;
use std::path::Path;

use gj_adapters::{
    CommandNotifyAdapter, GpuProbe, HostProcessAdapter, NoGpuProbe, NoOpNotifyAdapter,
    NotifyAdapter, NvidiaSmiProbe, TracedProcess,
};
use gj_core::SystemClock;
use gj_daemon::{startup, Config, Daemon, Deps, LifecycleError, PidLock};
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::MissedTickBehavior;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("gjd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("gjd {}", env!("CARGO_PKG_VERSION"));
                println!("gpujob daemon - schedules batch jobs on this host's cores and GPUs");
                println!();
                println!("USAGE:");
                println!("    gjd");
                println!();
                println!("Jobs are submitted with `gj submit` and picked up from the");
                println!("shared inbox once per tick. Configuration comes from GJ_*");
                println!("environment variables.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: gjd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    let pid_lock = match claim_instance(&config) {
        Ok(lock) => lock,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = fs::read_to_string(config.layout.pid_file())
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("gjd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };
    let _log_guard = match setup_logging(&config.layout.log_file()) {
        Ok(guard) => guard,
        Err(e) => {
            pid_lock.release();
            return Err(e.into());
        }
    };

    let notify_cmd = config.notify_cmd.clone();
    let gpu_probe = config.gpu_probe.clone();
    let result = match (notify_cmd, gpu_probe) {
        (Some(cmd), Some(probe)) => {
            serve(config, CommandNotifyAdapter::new(cmd), NvidiaSmiProbe::new(probe)).await
        }
        (Some(cmd), None) => serve(config, CommandNotifyAdapter::new(cmd), NoGpuProbe).await,
        (None, Some(probe)) => {
            serve(config, NoOpNotifyAdapter::new(), NvidiaSmiProbe::new(probe)).await
        }
        (None, None) => serve(config, NoOpNotifyAdapter::new(), NoGpuProbe).await,
    };

    pid_lock.release();
    info!("Daemon stopped");
    result
}

/// Run ticks until SIGTERM or SIGINT, then shut down.
async fn serve<N, G>(config: Config, notify: N, gpu: G) -> Result<(), Box<dyn std::error::Error>>
where
    N: NotifyAdapter,
    G: GpuProbe,
{
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let mut ticker = tokio::time::interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        root = %config.layout.root().display(),
        cores = config.cpu_cores,
        tick_ms = config.tick.as_millis() as u64,
        "Daemon ready"
    );

    let mut daemon = Daemon::new(
        config,
        Deps {
            process: TracedProcess::new(HostProcessAdapter::new()),
            notify,
            gpu,
            clock: SystemClock,
        },
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                daemon.tick().await;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
        }
    }

    daemon.shutdown().await;
    Ok(())
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- gjd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- gjd: starting (pid: ";

/// Log size that triggers rotation on startup.
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Rotated copies kept: gjd.log.1 (newest) to gjd.log.3 (oldest).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the log once it grows past [`MAX_LOG_SIZE`]. Best effort.
fn rotate_log_if_needed(path: &Path) {
    let size = match fs::metadata(path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size <= MAX_LOG_SIZE {
        return;
    }

    let path_str = path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let _ = fs::rename(format!("{path_str}.{i}"), format!("{path_str}.{}", i + 1));
    }
    let _ = fs::rename(path, format!("{path_str}.1"));
}

/// Take the single-instance lock, then rotate the log and append the
/// startup marker. A refused start leaves the running daemon's log alone.
fn claim_instance(config: &Config) -> Result<PidLock, LifecycleError> {
    let pid_lock = startup(config)?;
    let log_path = config.layout.log_file();
    rotate_log_if_needed(&log_path);
    write_startup_marker(&log_path)?;
    Ok(pid_lock)
}

fn write_startup_marker(path: &Path) -> Result<(), LifecycleError> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

fn setup_logging(
    path: &Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let invalid = || LifecycleError::InvalidConfig(format!("bad log path {}", path.display()));
    let file_appender = tracing_appender::rolling::never(
        path.parent().ok_or_else(invalid)?,
        path.file_name().ok_or_else(invalid)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
