//! State machine module for the Caps Lock remapper
//!
//! Holds the per-key chord state and the on/off switch:
//! - `caps_down` / `shift_down`: presses in progress, as observed
//! - `enabled`: remapping active, flipped with Alt + Caps Lock

mod machine;

pub use machine::{Decision, StateMachine};
