//! Device-scoped keyboard observer.
//!
//! Raw input tells us which physical keyboard produced each key, but cannot
//! stop the key from reaching applications. The observer tags every key-down
//! with a stable device identifier and whether it came from the target
//! (macro) keyboard, and offers a detection mode where the next key-down
//! chooses the target.

#[cfg(target_os = "windows")]
mod win32;

#[cfg(target_os = "windows")]
pub use win32::{run_message_loop, MessageWindow, Win32DeviceResolver};

use crate::events::{DeviceId, DeviceKeyEvent};
use crate::keymap::{self, key_name};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Key released
pub const RI_KEY_BREAK: u16 = 0x01;
/// Extended key (right-hand Ctrl/Alt)
pub const RI_KEY_E0: u16 = 0x02;
/// Scan code of the right Shift key
const RIGHT_SHIFT_MAKE_CODE: u16 = 0x36;
/// Placeholder VK sent for fake keys in some escaped sequences
const VK_FAKE: u16 = 0xFF;

/// Keyboard payload of one raw input message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyboardInput {
    pub device_handle: isize,
    pub virtual_key: u16,
    pub make_code: u16,
    pub flags: u16,
}

impl RawKeyboardInput {
    pub fn is_key_up(&self) -> bool {
        self.flags & RI_KEY_BREAK != 0
    }

    /// Virtual key with the handedness raw input leaves out.
    ///
    /// Raw input reports generic modifier codes; the sided code is what the
    /// global hook reports for the same key.
    pub fn sided_virtual_key(&self) -> u16 {
        match self.virtual_key {
            keymap::VK_SHIFT if self.make_code == RIGHT_SHIFT_MAKE_CODE => keymap::VK_RSHIFT,
            keymap::VK_SHIFT => keymap::VK_LSHIFT,
            keymap::VK_CONTROL if self.flags & RI_KEY_E0 != 0 => keymap::VK_RCONTROL,
            keymap::VK_CONTROL => keymap::VK_LCONTROL,
            keymap::VK_MENU if self.flags & RI_KEY_E0 != 0 => keymap::VK_RMENU,
            keymap::VK_MENU => keymap::VK_LMENU,
            vk => vk,
        }
    }
}

/// Derives a stable identifier for a raw device handle
pub trait DeviceResolver: Send + Sync {
    fn resolve(&self, device_handle: isize) -> DeviceId;
}

/// Identifier built from the handle value alone; used when the device path
/// cannot be read
pub fn fallback_device_id(device_handle: isize) -> DeviceId {
    DeviceId::new(format!("DEVICE_{:08X}", device_handle))
}

/// Resolver that only uses the handle value
pub struct HandleDeviceResolver;

impl DeviceResolver for HandleDeviceResolver {
    fn resolve(&self, device_handle: isize) -> DeviceId {
        fallback_device_id(device_handle)
    }
}

/// Receives device-scoped notifications on the message-loop thread
pub trait DeviceKeyListener: Send + Sync {
    fn on_key_down(&self, event: &DeviceKeyEvent);

    /// Detection mode captured a keyboard
    fn on_device_detected(&self, _device: &DeviceId) {}
}

/// Error types for raw input registration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObserverError {
    #[error("Failed to register for raw keyboard input: {0}")]
    RegistrationFailed(String),
    #[error("Failed to create message window: {0}")]
    WindowCreation(String),
    #[error("Raw keyboard input is not supported on this platform")]
    Unsupported,
}

#[derive(Debug, Default)]
struct TargetState {
    detecting: bool,
    target: Option<DeviceId>,
}

pub struct DeviceObserver {
    state: Mutex<TargetState>,
    /// Handle -> identifier; never evicted
    devices: Mutex<HashMap<isize, DeviceId>>,
    resolver: Box<dyn DeviceResolver>,
    listeners: RwLock<Vec<Arc<dyn DeviceKeyListener>>>,
    /// Window the registration routes to, while registered
    registration: Mutex<Option<isize>>,
}

impl DeviceObserver {
    pub fn new(resolver: Box<dyn DeviceResolver>) -> Self {
        Self {
            state: Mutex::new(TargetState::default()),
            devices: Mutex::new(HashMap::new()),
            resolver,
            listeners: RwLock::new(Vec::new()),
            registration: Mutex::new(None),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn DeviceKeyListener>) {
        self.listeners.write().push(listener);
    }

    /// Register for raw keyboard input routed to `window`.
    ///
    /// Returns false on failure; the caller keeps running without device
    /// discrimination. A previous registration is released first.
    pub fn initialize(&self, window: isize) -> bool {
        self.teardown();

        match register_raw_input(window) {
            Ok(()) => {
                *self.registration.lock() = Some(window);
                crate::info!("Raw keyboard input registered");
                true
            }
            Err(e) => {
                crate::error!("{}", e);
                false
            }
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registration.lock().is_some()
    }

    /// Release the registration. Safe to call more than once.
    pub fn teardown(&self) {
        if let Some(window) = self.registration.lock().take() {
            unregister_raw_input(window);
            crate::info!("Raw keyboard input unregistered");
        }
    }

    /// The next key-down from any keyboard becomes the target
    pub fn start_detection(&self) {
        let mut state = self.state.lock();
        state.detecting = true;
        state.target = None;
        crate::info!("Keyboard detection started, press a key on the macro keyboard");
    }

    pub fn stop_detection(&self) {
        self.state.lock().detecting = false;
    }

    pub fn is_detecting(&self) -> bool {
        self.state.lock().detecting
    }

    pub fn set_target_device(&self, device: Option<DeviceId>) {
        let mut state = self.state.lock();
        crate::debug!("Target keyboard: {:?}", device);
        state.target = device;
    }

    pub fn target_device(&self) -> Option<DeviceId> {
        self.state.lock().target.clone()
    }

    /// Identifier for a handle, derived once and cached
    pub fn device_id(&self, device_handle: isize) -> DeviceId {
        let mut devices = self.devices.lock();
        devices
            .entry(device_handle)
            .or_insert_with(|| {
                let id = self.resolver.resolve(device_handle);
                crate::debug!("New keyboard {:#x} -> {}", device_handle, id);
                id
            })
            .clone()
    }

    pub fn known_devices(&self) -> usize {
        self.devices.lock().len()
    }

    /// Process one raw keyboard message. Returns the notification sent to
    /// listeners, if any.
    pub fn handle_raw_key(&self, input: &RawKeyboardInput) -> Option<DeviceKeyEvent> {
        if input.is_key_up() || input.virtual_key == VK_FAKE {
            return None;
        }

        let device = self.device_id(input.device_handle);
        let vk = input.sided_virtual_key();

        let (is_from_target_device, detected) = {
            let mut state = self.state.lock();
            if state.detecting {
                state.detecting = false;
                state.target = Some(device.clone());
                (true, true)
            } else {
                (state.target.as_ref() == Some(&device), false)
            }
        };

        let event = DeviceKeyEvent {
            key: key_name(vk),
            virtual_key: vk,
            device: device.clone(),
            is_from_target_device,
            timestamp: Instant::now(),
        };

        let listeners = self.listeners.read().clone();
        if detected {
            crate::info!("Detected keyboard {}", device);
            for listener in &listeners {
                notify(|| listener.on_device_detected(&device));
            }
        }
        for listener in &listeners {
            notify(|| listener.on_key_down(&event));
        }

        Some(event)
    }
}

impl Drop for DeviceObserver {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn notify(f: impl FnOnce()) {
    if let Err(e) = catch_unwind(AssertUnwindSafe(f)) {
        crate::error!("Device key listener panicked: {:?}", e);
    }
}

#[cfg(target_os = "windows")]
fn register_raw_input(window: isize) -> Result<(), ObserverError> {
    win32::register(window)
}

#[cfg(not(target_os = "windows"))]
fn register_raw_input(_window: isize) -> Result<(), ObserverError> {
    Err(ObserverError::Unsupported)
}

#[cfg(target_os = "windows")]
fn unregister_raw_input(_window: isize) {
    win32::unregister();
}

#[cfg(not(target_os = "windows"))]
fn unregister_raw_input(_window: isize) {}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
