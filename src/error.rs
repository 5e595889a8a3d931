//! Fatal errors: startup failures and a hook that dies while running

use crate::hotkey::HookError;

/// Errors that end the process with a non-zero status
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Another instance of Switchy is already running!")]
    InstanceAlreadyRunning,

    #[error("Failed to create the single-instance lock: {0}")]
    InstanceLock(String),

    #[error("Failed to register the keyboard listener: {0}")]
    ListenerRegistrationFailed(#[from] HookError),

    #[error("The keyboard hook stopped unexpectedly")]
    HookExited,
}
