//! Core state machine implementation
//!
//! Tracks which of Caps Lock and Left Shift are held and decides, for every
//! key transition, whether the event is swallowed and which action fires:
//! - Caps Lock tapped alone: switch to the next input language
//! - Caps Lock + Left Shift, in either order: toggle the Caps Lock indicator
//! - Alt + Caps Lock: turn the remapping on or off

use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::actions::{Action, ActionSink};
use crate::events::RemapEvent;
use crate::hotkey::{Key, KeyEvent, Transition};

/// Whether the hooked event reaches the rest of the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Suppress the key's native effect
    Swallow,
    /// Forward unchanged
    PassThrough,
}

/// Everything the state machine remembers between events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookState {
    /// Remapping is active
    pub enabled: bool,
    /// A Caps Lock press is in progress (down seen, up not yet)
    pub caps_down: bool,
    /// A Left Shift press is in progress
    pub shift_down: bool,
}

impl Default for HookState {
    fn default() -> Self {
        Self {
            enabled: true,
            caps_down: false,
            shift_down: false,
        }
    }
}

/// The remapper state machine, fed one key event at a time
pub struct StateMachine<A> {
    state: HookState,
    actions: A,
    /// Channel for emitting remap events
    event_tx: broadcast::Sender<RemapEvent>,
}

impl<A: ActionSink> StateMachine<A> {
    /// Create a new state machine with remapping enabled
    pub fn new(actions: A, event_tx: broadcast::Sender<RemapEvent>) -> Self {
        Self {
            state: HookState::default(),
            actions,
            event_tx,
        }
    }

    /// Snapshot of the current state
    #[cfg(test)]
    pub fn state(&self) -> HookState {
        self.state
    }

    #[cfg(test)]
    pub fn actions(&self) -> &A {
        &self.actions
    }

    /// Process one key event and decide its fate
    pub fn process(&mut self, event: KeyEvent) -> Decision {
        // Our own synthesized Caps Lock presses come back through the hook
        if event.injected {
            return Decision::PassThrough;
        }

        let decision = match event.key {
            Key::CapsLock => self.on_caps_lock(event.transition),
            Key::LeftShift => self.on_left_shift(event.transition),
            Key::Other => return Decision::PassThrough,
        };

        trace!(
            key = ?event.key,
            transition = ?event.transition,
            ?decision,
            state = ?self.state,
            "key processed"
        );

        decision
    }

    fn on_caps_lock(&mut self, transition: Transition) -> Decision {
        if transition == Transition::SystemDown && !self.state.caps_down {
            self.state.caps_down = true;
            self.state.enabled = !self.state.enabled;
            self.emit(RemapEvent::RemapToggled {
                enabled: self.state.enabled,
            });
            return Decision::Swallow;
        }

        if transition.is_up() {
            self.state.caps_down = false;

            if self.state.enabled {
                if !self.state.shift_down {
                    self.fire(Action::NextInputLanguage);
                } else {
                    // The chord already fired on the way down
                    self.state.shift_down = false;
                }
            }
        }

        if !self.state.enabled {
            return Decision::PassThrough;
        }

        if transition == Transition::Down && !self.state.caps_down {
            self.state.caps_down = true;

            if self.state.shift_down {
                self.fire(Action::ToggleIndicator);
                return Decision::Swallow;
            }
        }

        Decision::Swallow
    }

    fn on_left_shift(&mut self, transition: Transition) -> Decision {
        // While Caps Lock is held the chord stays latched until Caps Lock is released
        if transition.is_up() && !self.state.caps_down {
            self.state.shift_down = false;
        }

        if !self.state.enabled {
            return Decision::PassThrough;
        }

        if transition == Transition::Down && !self.state.shift_down {
            self.state.shift_down = true;

            if self.state.caps_down {
                self.fire(Action::ToggleIndicator);
                return Decision::Swallow;
            }
        }

        Decision::Swallow
    }

    /// Perform an action and report it
    fn fire(&mut self, action: Action) {
        self.actions.perform(action);
        self.emit(match action {
            Action::NextInputLanguage => RemapEvent::LanguageSwitchRequested,
            Action::ToggleIndicator => RemapEvent::IndicatorToggled,
        });
    }

    fn emit(&self, event: RemapEvent) {
        debug!(%event, "emitting remap event");
        // No subscriber is fine
        let _ = self.event_tx.send(event);
    }
}
