//! Side effects triggered by the state machine
//!
//! The state machine only decides *when* to act; an [`ActionSink`] performs
//! the action. Calls must return promptly since they run inside the
//! keyboard hook.

#[cfg(windows)]
mod win32;

#[cfg(windows)]
pub use win32::Win32Actions;

use tracing::info;

/// Actions the remapper can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Ask the foreground window to switch to the next input language
    NextInputLanguage,
    /// Flip the Caps Lock indicator with a synthesized press and release
    ToggleIndicator,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::NextInputLanguage => write!(f, "next input language"),
            Action::ToggleIndicator => write!(f, "toggle caps lock indicator"),
        }
    }
}

/// Fire-and-forget sink for remapper actions
pub trait ActionSink {
    fn request_next_input_language(&mut self);

    fn toggle_indicator_led(&mut self);

    fn perform(&mut self, action: Action) {
        match action {
            Action::NextInputLanguage => self.request_next_input_language(),
            Action::ToggleIndicator => self.toggle_indicator_led(),
        }
    }
}

/// Sink that only records actions in the log
#[cfg_attr(windows, allow(dead_code))]
#[derive(Debug, Default)]
pub struct LoggingActions;

impl ActionSink for LoggingActions {
    fn request_next_input_language(&mut self) {
        info!(action = %Action::NextInputLanguage, "action (not performed on this platform)");
    }

    fn toggle_indicator_led(&mut self) {
        info!(action = %Action::ToggleIndicator, "action (not performed on this platform)");
    }
}

/// The sink that drives the real system on this platform
#[cfg(windows)]
pub fn platform() -> Win32Actions {
    Win32Actions::new()
}

/// The sink that drives the real system on this platform
#[cfg(not(windows))]
pub fn platform() -> LoggingActions {
    LoggingActions
}

/// Sink that remembers every action, in order
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingActions {
    pub performed: Vec<Action>,
}

#[cfg(test)]
impl RecordingActions {
    pub fn count(&self, action: Action) -> usize {
        self.performed.iter().filter(|a| **a == action).count()
    }
}

#[cfg(test)]
impl ActionSink for RecordingActions {
    fn request_next_input_language(&mut self) {
        self.performed.push(Action::NextInputLanguage);
    }

    fn toggle_indicator_led(&mut self) {
        self.performed.push(Action::ToggleIndicator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perform_dispatches() {
        let mut sink = RecordingActions::default();
        sink.perform(Action::ToggleIndicator);
        sink.perform(Action::NextInputLanguage);
        assert_eq!(
            sink.performed,
            vec![Action::ToggleIndicator, Action::NextInputLanguage]
        );
        assert_eq!(sink.count(Action::ToggleIndicator), 1);
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::NextInputLanguage.to_string(), "next input language");
        assert_eq!(Action::ToggleIndicator.to_string(), "toggle caps lock indicator");
    }
}
