// Global keyboard interception hook
//
// A system-wide low-level keyboard hook runs on its own thread with its own
// message loop. Each invocation is turned into a HookKeyEvent and passed to the
// registered listeners; a listener that sets `consume` swallows the event.

mod dedup;
mod dispatcher;
#[cfg(target_os = "windows")]
mod win32;

pub use dedup::DuplicateFilter;
pub use dispatcher::HookDispatcher;

use crate::config::Tunables;
use crate::events::HookKeyEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set while any KeyboardHook in this process has its hook installed
static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

/// What the hook procedure tells the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// Drop the event; no application sees it
    Consume,
    /// Hand the event to the next hook in the chain
    PassThrough,
}

/// Receives hook notifications synchronously on the hook thread.
///
/// Implementations must return quickly and must not block beyond a short,
/// bounded wait.
pub trait HookListener: Send + Sync {
    fn on_key_down(&self, event: &mut HookKeyEvent);

    fn on_key_up(&self, _event: &mut HookKeyEvent) {}
}

/// Error types for hook installation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HookError {
    #[error("A keyboard hook is already installed in this process")]
    AlreadyInstalled,
    #[error("Failed to install keyboard hook: {0}")]
    InstallFailed(String),
    #[error("Failed to spawn keyboard hook thread: {0}")]
    ThreadSpawn(String),
    #[error("Global keyboard interception is not supported on this platform")]
    Unsupported,
}

/// Owns the single global hook registration of this process
pub struct KeyboardHook {
    dispatcher: Arc<HookDispatcher>,
    #[cfg(target_os = "windows")]
    thread: Option<win32::HookThread>,
}

impl KeyboardHook {
    pub fn new(tunables: &Tunables) -> Self {
        Self {
            dispatcher: Arc::new(HookDispatcher::new(tunables)),
            #[cfg(target_os = "windows")]
            thread: None,
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn HookListener>) {
        self.dispatcher.add_listener(listener);
    }

    pub fn dispatcher(&self) -> &Arc<HookDispatcher> {
        &self.dispatcher
    }

    /// Install the hook. This instance's existing registration is removed
    /// first; a hook held by another instance is `AlreadyInstalled`.
    #[cfg(target_os = "windows")]
    pub fn start(&mut self) -> Result<(), HookError> {
        if self.thread.is_some() {
            crate::info!("Keyboard hook already installed, reinstalling");
            self.stop();
        }
        claim_process_hook()?;
        let thread = match win32::HookThread::spawn(self.dispatcher.clone()) {
            Ok(thread) => thread,
            Err(e) => {
                release_process_hook();
                return Err(e);
            }
        };
        self.thread = Some(thread);
        crate::info!("Keyboard hook installed");
        Ok(())
    }

    #[cfg(not(target_os = "windows"))]
    pub fn start(&mut self) -> Result<(), HookError> {
        Err(HookError::Unsupported)
    }

    /// Uninstall the hook. Safe to call when not installed.
    pub fn stop(&mut self) {
        #[cfg(target_os = "windows")]
        if let Some(thread) = self.thread.take() {
            thread.stop();
            release_process_hook();
            crate::info!("Keyboard hook removed");
        }
    }

    pub fn is_active(&self) -> bool {
        #[cfg(target_os = "windows")]
        {
            self.thread.is_some()
        }
        #[cfg(not(target_os = "windows"))]
        {
            false
        }
    }
}

/// Reserve the single hook slot of this process
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn claim_process_hook() -> Result<(), HookError> {
    HOOK_INSTALLED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .map(|_| ())
        .map_err(|_| HookError::AlreadyInstalled)
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn release_process_hook() {
    HOOK_INSTALLED.store(false, Ordering::SeqCst);
}

impl Drop for KeyboardHook {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
