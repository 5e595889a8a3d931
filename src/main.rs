//! switchy: Caps Lock input-language switcher
//!
//! Installs a system-wide low-level keyboard hook and gives two keys new jobs:
//! - Caps Lock tapped alone switches to the next keyboard input language
//! - Caps Lock + Left Shift, in either order, toggles Caps Lock itself
//! - Alt + Caps Lock turns the remapping on and off
//!
//! Only one instance runs at a time. Startup failures are shown to the user
//! and exit with status 1.

// The hook that drives the core only exists on Windows
#![cfg_attr(not(windows), allow(dead_code))]

mod actions;
mod config;
mod error;
mod events;
mod hotkey;
mod lifecycle;
mod state;

use std::future::Future;
use std::process::ExitCode;

use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::StartupError;
use crate::events::RemapEvent;
use crate::hotkey::HookListener;
use crate::lifecycle::{notify, ShutdownSignal, SingleInstance};
use crate::state::StateMachine;

/// Log filter when RUST_LOG is unset
const DEFAULT_LOG_FILTER: &str = if cfg!(debug_assertions) { "debug" } else { "info" };

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "switchy starting");

    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!(?e, "invalid configuration");
            notify::show_error(&format!("{e:#}"));
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => {
            info!("switchy stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "switchy failed");
            notify::show_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    // Checked before the hook exists so a duplicate never touches the keyboard
    let instance = SingleInstance::acquire(&config.instance_name)?;
    info!(instance = instance.name(), "single instance confirmed");

    let shutdown = ShutdownSignal::new();

    // State machine -> event logger
    let (event_tx, event_rx) = broadcast::channel::<RemapEvent>(config.event_capacity);
    let event_logger = tokio::spawn(events::log_events(event_rx));

    let state_machine = StateMachine::new(actions::platform(), event_tx);

    let mut listener = HookListener::new();
    listener.start(state_machine)?;
    info!("keyboard listener started, entering main loop");

    let outcome = supervise(listener.stopped(), lifecycle::signalled(shutdown.wait())).await;

    // Cleanup
    info!("shutting down...");
    listener.stop();
    if let Ok(seen) = event_logger.await {
        info!(seen, "remap event stream closed");
    }
    drop(instance);

    outcome
}

/// Run until a shutdown signal arrives or the hook thread dies on its own
async fn supervise(
    hook_exited: impl Future<Output = ()>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), StartupError> {
    tokio::select! {
        _ = hook_exited => {
            warn!("keyboard hook thread exited unexpectedly");
            Err(StartupError::HookExited)
        }

        _ = shutdown => {
            info!("shutdown signal received");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_supervise_clean_shutdown() {
        let result = supervise(std::future::pending(), async {}).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_supervise_reports_dead_hook() {
        let result = supervise(async {}, std::future::pending()).await;
        assert!(matches!(result, Err(StartupError::HookExited)));
    }

    #[tokio::test]
    async fn test_signal_setup_failure_keeps_hook_running() {
        let broken_signals = lifecycle::signalled(async {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "no console"))
        });
        let supervised = supervise(std::future::pending(), broken_signals);

        let finished = tokio::time::timeout(Duration::from_millis(50), supervised).await;
        assert!(finished.is_err());
    }

    #[tokio::test]
    async fn test_signal_setup_failure_still_sees_dead_hook() {
        let broken_signals = lifecycle::signalled(async {
            Err(io::Error::new(io::ErrorKind::Other, "no console"))
        });
        let result = supervise(async {}, broken_signals).await;
        assert!(matches!(result, Err(StartupError::HookExited)));
    }
}
