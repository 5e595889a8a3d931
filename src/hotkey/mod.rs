//! Hotkey module for global keyboard event interception
//!
//! Uses a Win32 low-level keyboard hook to see every key transition before
//! any application does.

mod keys;
mod listener;

#[cfg(windows)]
pub use keys::HookReturn;
pub use keys::{Key, KeyEvent, Transition};
pub use listener::{HookError, HookListener};
