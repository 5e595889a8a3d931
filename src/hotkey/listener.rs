//! Global keyboard listener using a Win32 low-level keyboard hook
//!
//! The hook is installed on a dedicated thread that owns the state machine
//! and pumps that thread's message queue. Windows calls the hook procedure
//! synchronously from that loop for every key transition in the session, so
//! the procedure must decide quickly and never block.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::oneshot;
#[cfg(windows)]
use tracing::info;
use tracing::warn;

use crate::actions::ActionSink;
use crate::state::StateMachine;

/// How long `start` waits for the hook thread to report registration
const REGISTRATION_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Errors that can occur in the keyboard listener
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("keyboard listener is already running")]
    AlreadyRunning,

    #[error("failed to install the low-level keyboard hook: {0}")]
    Registration(String),

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),

    #[error("listener thread did not report back in time")]
    StartupTimeout,

    #[error("low-level keyboard hooks are only available on Windows")]
    Unsupported,
}

/// Global keyboard listener that feeds every key transition to a state machine
pub struct HookListener {
    running: Arc<AtomicBool>,
    /// Message-loop thread id, for posting WM_QUIT
    thread_id: Option<u32>,
    thread_handle: Option<JoinHandle<()>>,
    /// Fires when the hook thread leaves its message loop
    exited_rx: Option<oneshot::Receiver<()>>,
}

impl HookListener {
    /// Create a new, idle listener
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            thread_id: None,
            thread_handle: None,
            exited_rx: None,
        }
    }

    /// Check if the hook thread is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Wait until the hook thread exits on its own.
    ///
    /// Pending forever when the listener was never started.
    pub async fn stopped(&mut self) {
        match self.exited_rx.as_mut() {
            Some(rx) => {
                let _ = rx.await;
                self.exited_rx = None;
            }
            None => std::future::pending().await,
        }
    }

    /// Stop the listener and wait for its thread
    pub fn stop(&mut self) {
        if let Some(thread_id) = self.thread_id.take() {
            platform::post_quit(thread_id);
        }

        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("keyboard hook thread panicked");
            }
        }

        self.running.store(false, Ordering::SeqCst);
        self.exited_rx = None;
    }

    /// Install the hook and start processing key events.
    ///
    /// Spawns a dedicated thread that installs the hook and runs a message
    /// loop. Returns once the hook is registered, or with the reason it
    /// could not be.
    #[cfg(windows)]
    pub fn start<A>(&mut self, machine: StateMachine<A>) -> Result<(), HookError>
    where
        A: ActionSink + Send + 'static,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(HookError::AlreadyRunning);
        }

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<u32, HookError>>();
        let (exited_tx, exited_rx) = oneshot::channel();
        let running = Arc::clone(&self.running);

        let spawned = std::thread::Builder::new()
            .name("keyboard-hook".to_string())
            .spawn(move || {
                info!("keyboard hook thread started");

                platform::run_hook_loop(machine, ready_tx);

                running.store(false, Ordering::SeqCst);
                let _ = exited_tx.send(());
                info!("keyboard hook thread stopped");
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(HookError::ThreadSpawn(e.to_string()));
            }
        };

        let registered = ready_rx
            .recv_timeout(REGISTRATION_TIMEOUT)
            .unwrap_or(Err(HookError::StartupTimeout));

        match registered {
            Ok(thread_id) => {
                self.thread_id = Some(thread_id);
                self.thread_handle = Some(handle);
                self.exited_rx = Some(exited_rx);
                Ok(())
            }
            Err(e) => {
                // A thread that never answered may still be stuck; leave it detached
                if !matches!(e, HookError::StartupTimeout) {
                    let _ = handle.join();
                }
                self.running.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Install the hook and start processing key events.
    ///
    /// There is no session-wide keyboard hook outside Windows.
    #[cfg(not(windows))]
    pub fn start<A>(&mut self, machine: StateMachine<A>) -> Result<(), HookError>
    where
        A: ActionSink + Send + 'static,
    {
        drop(machine);
        Err(HookError::Unsupported)
    }
}

impl Default for HookListener {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for HookListener {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(windows)]
mod platform {
    use std::cell::RefCell;
    use std::sync::mpsc;

    use tracing::{debug, error, info, trace, warn};
    use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::System::Threading::GetCurrentThreadId;
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
        TranslateMessage, UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL,
        WM_QUIT,
    };

    use super::HookError;
    use crate::actions::ActionSink;
    use crate::hotkey::{HookReturn, KeyEvent};
    use crate::state::{Decision, StateMachine};

    type KeyHandler = Box<dyn FnMut(KeyEvent) -> Decision>;

    thread_local! {
        /// State machine owned by the hook thread, reached from the hook procedure
        static HANDLER: RefCell<Option<KeyHandler>> = const { RefCell::new(None) };
    }

    /// Install the hook, report back, and pump messages until WM_QUIT
    pub(super) fn run_hook_loop<A>(
        mut machine: StateMachine<A>,
        ready_tx: mpsc::Sender<Result<u32, HookError>>,
    ) where
        A: ActionSink + 'static,
    {
        HANDLER.with(|slot| {
            *slot.borrow_mut() = Some(Box::new(move |event| machine.process(event)));
        });

        let hook = unsafe {
            GetModuleHandleW(None).and_then(|module| {
                SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_proc), HINSTANCE(module.0), 0)
            })
        };

        let hook = match hook {
            Ok(hook) => hook,
            Err(e) => {
                error!(?e, "SetWindowsHookExW failed");
                HANDLER.with(|slot| slot.borrow_mut().take());
                let _ = ready_tx.send(Err(HookError::Registration(e.to_string())));
                return;
            }
        };

        let thread_id = unsafe { GetCurrentThreadId() };
        let _ = ready_tx.send(Ok(thread_id));
        info!(thread_id, "low-level keyboard hook installed");

        let mut msg = MSG::default();
        unsafe {
            loop {
                let status = GetMessageW(&mut msg, None, 0, 0);
                if status.0 == 0 {
                    debug!("received WM_QUIT, leaving message loop");
                    break;
                }
                if status.0 == -1 {
                    error!("GetMessageW failed, leaving message loop");
                    break;
                }

                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }

            if let Err(e) = UnhookWindowsHookEx(hook) {
                warn!(?e, "failed to remove keyboard hook");
            }
        }

        HANDLER.with(|slot| slot.borrow_mut().take());
    }

    /// Ask the hook thread's message loop to exit
    pub(super) fn post_quit(thread_id: u32) {
        unsafe {
            if let Err(e) = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) {
                warn!(?e, "failed to post WM_QUIT to keyboard hook thread");
            }
        }
    }

    unsafe extern "system" fn keyboard_proc(ncode: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
        let info = lparam.0 as *const KBDLLHOOKSTRUCT;

        if ncode == HC_ACTION as i32 && !info.is_null() {
            let info = &*info;
            trace!(vk = info.vkCode, message = wparam.0, flags = info.flags.0, "key event");

            if let Some(event) = KeyEvent::from_raw(info.vkCode, wparam.0 as u32, info.flags.0) {
                let decision = HANDLER.with(|slot| match slot.try_borrow_mut() {
                    Ok(mut handler) => handler.as_mut().map(|handle| handle(event)),
                    // Delivered while an action of ours is still running
                    Err(_) => None,
                });

                match HookReturn::for_outcome(event.key, decision) {
                    HookReturn::Block => return LRESULT(1),
                    HookReturn::Handled => return LRESULT(0),
                    HookReturn::CallNext => {}
                }
            }
        }

        CallNextHookEx(None, ncode, wparam, lparam)
    }
}

#[cfg(not(windows))]
mod platform {
    pub(super) fn post_quit(_thread_id: u32) {}
}
