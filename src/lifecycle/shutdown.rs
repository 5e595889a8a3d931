//! Signal handling for graceful shutdown

use std::future::Future;

use tracing::{debug, error};

/// Handles shutdown signals (Ctrl-C and console close on Windows,
/// SIGTERM / SIGINT elsewhere)
pub struct ShutdownSignal;

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        Self
    }

    /// Wait for a shutdown signal
    #[cfg(unix)]
    pub async fn wait(&self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                debug!("received SIGTERM");
            }
            _ = sigint.recv() => {
                debug!("received SIGINT");
            }
        }

        Ok(())
    }

    /// Wait for a shutdown signal
    #[cfg(windows)]
    pub async fn wait(&self) -> std::io::Result<()> {
        use tokio::signal::windows::{ctrl_c, ctrl_close, ctrl_shutdown};

        let mut ctrl_c = ctrl_c()?;
        let mut close = ctrl_close()?;
        let mut shutdown = ctrl_shutdown()?;

        tokio::select! {
            _ = ctrl_c.recv() => {
                debug!("received Ctrl-C");
            }
            _ = close.recv() => {
                debug!("console window closed");
            }
            _ = shutdown.recv() => {
                debug!("system shutting down");
            }
        }

        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once `wait` reports a shutdown signal.
///
/// If the signal handlers cannot be installed the remapper keeps running:
/// the error is logged and this never resolves.
pub async fn signalled<F>(wait: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = wait.await {
        error!(?e, "failed to listen for shutdown signals, running until the hook exits");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_signalled_resolves_on_signal() {
        let done = tokio::time::timeout(Duration::from_millis(100), signalled(async { Ok(()) }));
        assert!(done.await.is_ok());
    }

    #[tokio::test]
    async fn test_signalled_keeps_running_when_handlers_fail() {
        let failing = async { Err(io::Error::new(io::ErrorKind::Other, "no console")) };
        let done = tokio::time::timeout(Duration::from_millis(50), signalled(failing));
        assert!(done.await.is_err());
    }
}
