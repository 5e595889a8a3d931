//! Single-instance enforcement via a named mutex

use tracing::debug;

use crate::error::StartupError;

/// Held for the lifetime of the process; released on drop
pub struct SingleInstance {
    #[cfg(windows)]
    handle: windows::Win32::Foundation::HANDLE,
    name: String,
}

impl SingleInstance {
    /// Claim the named lock, failing if another process already holds it
    #[cfg(windows)]
    pub fn acquire(name: &str) -> Result<Self, StartupError> {
        use windows::core::HSTRING;
        use windows::Win32::Foundation::{CloseHandle, GetLastError, BOOL, ERROR_ALREADY_EXISTS};
        use windows::Win32::System::Threading::CreateMutexW;

        let handle = unsafe { CreateMutexW(None, BOOL::from(false), &HSTRING::from(name)) }
            .map_err(|e| StartupError::InstanceLock(e.to_string()))?;

        if unsafe { GetLastError() } == ERROR_ALREADY_EXISTS {
            unsafe {
                let _ = CloseHandle(handle);
            }
            return Err(StartupError::InstanceAlreadyRunning);
        }

        debug!(name, "single-instance lock acquired");
        Ok(Self {
            handle,
            name: name.to_string(),
        })
    }

    /// Claim the named lock.
    ///
    /// Without a session-wide hook there is nothing to guard off Windows.
    #[cfg(not(windows))]
    pub fn acquire(name: &str) -> Result<Self, StartupError> {
        if name.is_empty() {
            return Err(StartupError::InstanceLock("empty instance name".into()));
        }

        debug!(name, "single-instance lock is a no-op on this platform");
        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for SingleInstance {
    fn drop(&mut self) {
        #[cfg(windows)]
        unsafe {
            let _ = windows::Win32::Foundation::CloseHandle(self.handle);
        }
        debug!(name = %self.name, "single-instance lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[test]
    fn test_acquire_off_windows() {
        let lock = SingleInstance::acquire("SwitchyTest").unwrap();
        assert_eq!(lock.name(), "SwitchyTest");
        assert!(matches!(
            SingleInstance::acquire(""),
            Err(StartupError::InstanceLock(_))
        ));
    }

    #[cfg(windows)]
    #[test]
    fn test_second_acquire_is_refused() {
        let name = format!("SwitchyTest-{}", std::process::id());
        let first = SingleInstance::acquire(&name).unwrap();

        // Same process still counts: the mutex name is already taken
        assert!(matches!(
            SingleInstance::acquire(&name),
            Err(StartupError::InstanceAlreadyRunning)
        ));

        drop(first);
        assert!(SingleInstance::acquire(&name).is_ok());
    }
}
