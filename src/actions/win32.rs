//! Win32 implementation of the remapper actions

use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
    VK_CAPITAL,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, PostMessageW, WM_INPUTLANGCHANGEREQUEST,
};
use tracing::{debug, warn};

use super::ActionSink;

/// wParam of WM_INPUTLANGCHANGEREQUEST selecting the next installed layout
const INPUTLANGCHANGE_FORWARD: usize = 0x0002;

/// Tag carried in dwExtraInfo of every event we synthesize
const SYNTHESIZED_EVENT_MARKER: usize = 0x5357;

/// Performs actions against the live desktop
#[derive(Debug, Default)]
pub struct Win32Actions;

impl Win32Actions {
    pub fn new() -> Self {
        Self
    }

    fn key_input(flags: KEYBD_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VK_CAPITAL,
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: SYNTHESIZED_EVENT_MARKER,
                },
            },
        }
    }
}

impl ActionSink for Win32Actions {
    fn request_next_input_language(&mut self) {
        unsafe {
            let hwnd = GetForegroundWindow();
            match PostMessageW(
                hwnd,
                WM_INPUTLANGCHANGEREQUEST,
                WPARAM(INPUTLANGCHANGE_FORWARD),
                LPARAM(0),
            ) {
                Ok(()) => debug!("language switch requested"),
                Err(e) => warn!(?e, "failed to post language switch request"),
            }
        }
    }

    fn toggle_indicator_led(&mut self) {
        let inputs = [
            Self::key_input(KEYBD_EVENT_FLAGS(0)),
            Self::key_input(KEYEVENTF_KEYUP),
        ];

        let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize == inputs.len() {
            debug!("caps lock state toggled");
        } else {
            warn!(sent, "caps lock toggle was only partially injected");
        }
    }
}
