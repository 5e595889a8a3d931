//! Fatal error display

/// Show a blocking error message to the user
#[cfg(windows)]
pub fn show_error(message: &str) {
    use windows::core::{w, HSTRING};
    use windows::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_OK};

    unsafe {
        MessageBoxW(None, &HSTRING::from(message), w!("Error"), MB_OK | MB_ICONERROR);
    }
}

/// Show a blocking error message to the user
#[cfg(not(windows))]
pub fn show_error(message: &str) {
    eprintln!("Error: {message}");
}
