//! Key definitions and raw event classification
//!
//! Maps the raw values delivered to a low-level keyboard hook (virtual-key
//! code, window message, flag bits) onto the small vocabulary the state
//! machine understands.

use crate::state::Decision;

/// Raw values seen by the low-level keyboard hook
pub mod raw {
    /// Caps Lock virtual-key code (VK_CAPITAL)
    pub const VK_CAPITAL: u32 = 0x14;
    /// Left Shift virtual-key code (VK_LSHIFT)
    pub const VK_LSHIFT: u32 = 0xA0;

    pub const WM_KEYDOWN: u32 = 0x0100;
    pub const WM_KEYUP: u32 = 0x0101;
    pub const WM_SYSKEYDOWN: u32 = 0x0104;
    pub const WM_SYSKEYUP: u32 = 0x0105;

    /// Set on events synthesized by software rather than hardware
    pub const LLKHF_INJECTED: u32 = 0x10;
}

/// The keys the remapper cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    CapsLock,
    LeftShift,
    /// Any key without a role
    Other,
}

impl Key {
    /// Classify a virtual-key code
    pub fn from_vk(vk_code: u32) -> Self {
        match vk_code {
            raw::VK_CAPITAL => Key::CapsLock,
            raw::VK_LSHIFT => Key::LeftShift,
            _ => Key::Other,
        }
    }
}

/// Kind of key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Down while a system modifier (Alt) is held
    SystemDown,
    Down,
    Up,
    /// Up while a system modifier (Alt) is held
    SystemUp,
}

impl Transition {
    /// Classify a keyboard window message, `None` for anything else
    pub fn from_message(message: u32) -> Option<Self> {
        match message {
            raw::WM_KEYDOWN => Some(Transition::Down),
            raw::WM_KEYUP => Some(Transition::Up),
            raw::WM_SYSKEYDOWN => Some(Transition::SystemDown),
            raw::WM_SYSKEYUP => Some(Transition::SystemUp),
            _ => None,
        }
    }

    pub fn is_up(self) -> bool {
        matches!(self, Transition::Up | Transition::SystemUp)
    }
}

/// One key transition as delivered by the hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub transition: Transition,
    /// Generated by software (including our own synthesized input)
    pub injected: bool,
}

impl KeyEvent {
    pub fn new(key: Key, transition: Transition) -> Self {
        Self {
            key,
            transition,
            injected: false,
        }
    }

    /// Mark the event as synthesized
    #[cfg(test)]
    pub fn injected(mut self) -> Self {
        self.injected = true;
        self
    }

    /// Build an event from the raw hook arguments
    pub fn from_raw(vk_code: u32, message: u32, flags: u32) -> Option<Self> {
        let transition = Transition::from_message(message)?;
        let mut event = Self::new(Key::from_vk(vk_code), transition);
        event.injected = flags & raw::LLKHF_INJECTED != 0;
        Some(event)
    }
}

/// What the hook procedure hands back to the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookReturn {
    /// Forward through `CallNextHookEx`
    CallNext,
    /// Return nonzero: the event is dropped entirely
    Block,
    /// Return zero without calling the next hook: later hooks are skipped
    /// but the focused window still receives the key
    Handled,
}

impl HookReturn {
    /// Translate a state machine decision for the given key.
    ///
    /// Left Shift must keep acting as a modifier for the focused window even
    /// while the remapper owns it, so its swallow stops at the hook chain.
    pub fn for_decision(key: Key, decision: Decision) -> Self {
        match (decision, key) {
            (Decision::PassThrough, _) => HookReturn::CallNext,
            (Decision::Swallow, Key::LeftShift) => HookReturn::Handled,
            (Decision::Swallow, _) => HookReturn::Block,
        }
    }

    /// Like [`HookReturn::for_decision`], for a hook call that may not have
    /// reached the state machine (no handler installed, or already borrowed
    /// by a re-entrant call). Such events are forwarded untouched.
    pub fn for_outcome(key: Key, decision: Option<Decision>) -> Self {
        match decision {
            Some(decision) => Self::for_decision(key, decision),
            None => HookReturn::CallNext,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_vk() {
        assert_eq!(Key::from_vk(0x14), Key::CapsLock);
        assert_eq!(Key::from_vk(0xA0), Key::LeftShift);
        // Right Shift and the generic VK_SHIFT have no role
        assert_eq!(Key::from_vk(0xA1), Key::Other);
        assert_eq!(Key::from_vk(0x10), Key::Other);
        assert_eq!(Key::from_vk(0x41), Key::Other);
    }

    #[test]
    fn test_transition_from_message() {
        assert_eq!(Transition::from_message(0x0100), Some(Transition::Down));
        assert_eq!(Transition::from_message(0x0101), Some(Transition::Up));
        assert_eq!(Transition::from_message(0x0104), Some(Transition::SystemDown));
        assert_eq!(Transition::from_message(0x0105), Some(Transition::SystemUp));
        assert_eq!(Transition::from_message(0x0102), None);
    }

    #[test]
    fn test_is_up() {
        assert!(Transition::Up.is_up());
        assert!(Transition::SystemUp.is_up());
        assert!(!Transition::Down.is_up());
        assert!(!Transition::SystemDown.is_up());
    }

    #[test]
    fn test_from_raw_injected_flag() {
        let event = KeyEvent::from_raw(raw::VK_CAPITAL, raw::WM_KEYDOWN, 0).unwrap();
        assert_eq!(event, KeyEvent::new(Key::CapsLock, Transition::Down));

        let event = KeyEvent::from_raw(raw::VK_LSHIFT, raw::WM_KEYUP, raw::LLKHF_INJECTED).unwrap();
        assert_eq!(event, KeyEvent::new(Key::LeftShift, Transition::Up).injected());

        // Extended-key bit alone is not injection
        let event = KeyEvent::from_raw(raw::VK_CAPITAL, raw::WM_SYSKEYDOWN, 0x01).unwrap();
        assert!(!event.injected);
        assert_eq!(event.transition, Transition::SystemDown);
    }

    #[test]
    fn test_from_raw_rejects_non_key_messages() {
        assert!(KeyEvent::from_raw(raw::VK_CAPITAL, 0x0000, 0).is_none());
    }

    #[test]
    fn test_hook_return_mapping() {
        assert_eq!(
            HookReturn::for_decision(Key::CapsLock, Decision::Swallow),
            HookReturn::Block
        );
        assert_eq!(
            HookReturn::for_decision(Key::LeftShift, Decision::Swallow),
            HookReturn::Handled
        );
        assert_eq!(
            HookReturn::for_decision(Key::CapsLock, Decision::PassThrough),
            HookReturn::CallNext
        );
        assert_eq!(
            HookReturn::for_decision(Key::Other, Decision::PassThrough),
            HookReturn::CallNext
        );
    }

    #[test]
    fn test_unhandled_hook_call_passes_through() {
        // Re-entrant delivery while the state machine is busy
        for key in [Key::CapsLock, Key::LeftShift, Key::Other] {
            assert_eq!(HookReturn::for_outcome(key, None), HookReturn::CallNext);
        }

        assert_eq!(
            HookReturn::for_outcome(Key::CapsLock, Some(Decision::Swallow)),
            HookReturn::Block
        );
        assert_eq!(
            HookReturn::for_outcome(Key::LeftShift, Some(Decision::Swallow)),
            HookReturn::Handled
        );
        assert_eq!(
            HookReturn::for_outcome(Key::LeftShift, Some(Decision::PassThrough)),
            HookReturn::CallNext
        );
    }
}
