//! Process lifecycle: single-instance lock, shutdown signals, fatal error display

mod instance;
pub mod notify;
mod shutdown;

pub use instance::SingleInstance;
pub use shutdown::{signalled, ShutdownSignal};
