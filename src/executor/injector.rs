// Keyboard input injection backends

use super::{ActionError, ActionErrorCode};
use crate::keymap::CharKey;
use std::sync::Arc;

/// Low-level key injection, isolated so synthesis order can be tested
pub trait KeyInjector: Send + Sync {
    fn key_down(&self, virtual_key: u16) -> Result<(), ActionError>;

    fn key_up(&self, virtual_key: u16) -> Result<(), ActionError>;

    /// Key (and shift state) that types `c` on the active layout
    fn resolve_char(&self, c: char) -> Option<CharKey>;
}

/// Injector for the current platform
pub fn platform_injector() -> Arc<dyn KeyInjector> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(windows_impl::SendInputInjector)
    }
    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(UnsupportedInjector)
    }
}

/// Stand-in where input synthesis is unavailable; every injection fails
pub struct UnsupportedInjector;

impl KeyInjector for UnsupportedInjector {
    fn key_down(&self, _virtual_key: u16) -> Result<(), ActionError> {
        Err(unsupported())
    }

    fn key_up(&self, _virtual_key: u16) -> Result<(), ActionError> {
        Err(unsupported())
    }

    fn resolve_char(&self, c: char) -> Option<CharKey> {
        crate::keymap::us_layout_char_key(c)
    }
}

fn unsupported() -> ActionError {
    ActionError::new(
        ActionErrorCode::InjectionFailed,
        "keyboard input synthesis is not supported on this platform",
    )
}

#[cfg(target_os = "windows")]
pub use windows_impl::SendInputInjector;

#[cfg(target_os = "windows")]
mod windows_impl {
    use super::{ActionError, ActionErrorCode, CharKey, KeyInjector};
    use std::mem::size_of;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        SendInput, VkKeyScanW, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
        KEYEVENTF_KEYUP, VIRTUAL_KEY,
    };

    /// Injects through SendInput. Events carry the injected flag, so the
    /// global hook lets them through.
    pub struct SendInputInjector;

    impl SendInputInjector {
        fn send(&self, virtual_key: u16, flags: KEYBD_EVENT_FLAGS) -> Result<(), ActionError> {
            let input = INPUT {
                r#type: INPUT_KEYBOARD,
                Anonymous: INPUT_0 {
                    ki: KEYBDINPUT {
                        wVk: VIRTUAL_KEY(virtual_key),
                        wScan: 0,
                        dwFlags: flags,
                        time: 0,
                        dwExtraInfo: 0,
                    },
                },
            };
            let sent = unsafe { SendInput(&[input], size_of::<INPUT>() as i32) };
            if sent == 1 {
                Ok(())
            } else {
                // Blocked by UIPI or the secure desktop
                Err(ActionError::new(
                    ActionErrorCode::InjectionFailed,
                    format!("SendInput rejected VK {:#04x}", virtual_key),
                ))
            }
        }
    }

    impl KeyInjector for SendInputInjector {
        fn key_down(&self, virtual_key: u16) -> Result<(), ActionError> {
            self.send(virtual_key, KEYBD_EVENT_FLAGS(0))
        }

        fn key_up(&self, virtual_key: u16) -> Result<(), ActionError> {
            self.send(virtual_key, KEYEVENTF_KEYUP)
        }

        fn resolve_char(&self, c: char) -> Option<CharKey> {
            let mut units = [0u16; 2];
            let encoded = c.encode_utf16(&mut units);
            if encoded.len() != 1 {
                return None;
            }
            let scan = unsafe { VkKeyScanW(encoded[0]) };
            if scan == -1 {
                return None;
            }
            let scan = scan as u16;
            Some(CharKey {
                virtual_key: scan & 0xFF,
                shift: (scan >> 8) & 0x01 != 0,
            })
        }
    }
}
