// Shutdown coordination
// A global flag plus the thread running the main message loop, so a Ctrl+C
// handler can end the loop and let teardown run in order

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Set once shutdown has started
static APP_SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

/// OS thread id of the thread pumping the main message loop
static MAIN_LOOP_THREAD: Mutex<Option<u32>> = Mutex::new(None);

/// Signal that the app is shutting down
pub fn signal_shutdown() {
    APP_SHUTTING_DOWN.store(true, Ordering::SeqCst);
    crate::info!("App shutdown signaled");
}

/// True after signal_shutdown() has been called
pub fn is_shutting_down() -> bool {
    APP_SHUTTING_DOWN.load(Ordering::SeqCst)
}

/// Record the calling thread as the one running the main message loop
pub fn register_main_loop() {
    if let Ok(mut guard) = MAIN_LOOP_THREAD.lock() {
        *guard = Some(current_thread_id());
        crate::debug!("Main loop thread registered for shutdown coordination");
    }
}

/// Ask the main message loop to return
pub fn stop_main_loop() {
    let thread_id = MAIN_LOOP_THREAD.lock().ok().and_then(|g| *g);
    match thread_id {
        Some(thread_id) => post_quit(thread_id),
        None => crate::debug!("No main loop registered"),
    }
}

#[cfg(target_os = "windows")]
fn current_thread_id() -> u32 {
    unsafe { windows::Win32::System::Threading::GetCurrentThreadId() }
}

#[cfg(not(target_os = "windows"))]
fn current_thread_id() -> u32 {
    0
}

#[cfg(target_os = "windows")]
fn post_quit(thread_id: u32) {
    use windows::Win32::Foundation::{LPARAM, WPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{PostThreadMessageW, WM_QUIT};

    unsafe {
        if let Err(e) = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) {
            crate::warn!("Failed to stop main loop: {}", e);
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn post_quit(_thread_id: u32) {}

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod tests;
