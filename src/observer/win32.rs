// Raw input registration, device naming and the message-only window that
// receives WM_INPUT on the main thread

use super::{fallback_device_id, DeviceObserver, DeviceResolver, ObserverError, RawKeyboardInput};
use crate::events::DeviceId;
use std::ffi::c_void;
use std::mem::size_of;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{HANDLE, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::{
    GetRawInputData, GetRawInputDeviceInfoW, RegisterRawInputDevices, HRAWINPUT, RAWINPUT,
    RAWINPUTDEVICE, RAWINPUTDEVICE_FLAGS, RAWINPUTHEADER, RIDEV_INPUTSINK, RIDEV_REMOVE, RIDI_DEVICENAME, RID_INPUT,
    RIM_TYPEKEYBOARD,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    GetWindowLongPtrW, RegisterClassW, SetWindowLongPtrW, TranslateMessage, CREATESTRUCTW,
    GWLP_USERDATA, HMENU, HWND_MESSAGE, MSG, WINDOW_EX_STYLE, WINDOW_STYLE, WM_INPUT,
    WM_NCCREATE, WM_NCDESTROY, WNDCLASSW,
};

const HID_USAGE_PAGE_GENERIC: u16 = 0x01;
const HID_USAGE_GENERIC_KEYBOARD: u16 = 0x06;
const CLASS_NAME: PCWSTR = w!("MacroboardRawInputSink");

fn keyboard_device(flags: RAWINPUTDEVICE_FLAGS, target: HWND) -> RAWINPUTDEVICE {
    RAWINPUTDEVICE {
        usUsagePage: HID_USAGE_PAGE_GENERIC,
        usUsage: HID_USAGE_GENERIC_KEYBOARD,
        dwFlags: flags,
        hwndTarget: target,
    }
}

/// Route keyboard raw input to `window`, even while it is not focused
pub(super) fn register(window: isize) -> Result<(), ObserverError> {
    let device = keyboard_device(RIDEV_INPUTSINK, HWND(window as *mut c_void));
    unsafe {
        RegisterRawInputDevices(&[device], size_of::<RAWINPUTDEVICE>() as u32)
            .map_err(|e| ObserverError::RegistrationFailed(e.to_string()))
    }
}

pub(super) fn unregister() {
    let device = keyboard_device(RIDEV_REMOVE, HWND::default());
    unsafe {
        if let Err(e) = RegisterRawInputDevices(&[device], size_of::<RAWINPUTDEVICE>() as u32) {
            crate::warn!("Failed to remove raw input registration: {}", e);
        }
    }
}

/// Names devices by their interface path, which survives reconnects
pub struct Win32DeviceResolver;

impl DeviceResolver for Win32DeviceResolver {
    fn resolve(&self, device_handle: isize) -> DeviceId {
        match device_path(device_handle) {
            Some(path) => DeviceId::new(path),
            None => {
                crate::warn!(
                    "Could not read device path for {:#x}, using handle",
                    device_handle
                );
                fallback_device_id(device_handle)
            }
        }
    }
}

fn device_path(device_handle: isize) -> Option<String> {
    let handle = HANDLE(device_handle as *mut c_void);
    let mut len: u32 = 0;
    unsafe {
        // First call reports the length in characters
        GetRawInputDeviceInfoW(handle, RIDI_DEVICENAME, None, &mut len);
        if len == 0 {
            return None;
        }
        let mut buffer = vec![0u16; len as usize];
        let copied = GetRawInputDeviceInfoW(
            handle,
            RIDI_DEVICENAME,
            Some(buffer.as_mut_ptr() as *mut c_void),
            &mut len,
        );
        if copied == u32::MAX || copied == 0 {
            return None;
        }
        let end = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
        let path = String::from_utf16_lossy(&buffer[..end]);
        (!path.is_empty()).then_some(path)
    }
}

fn read_raw_keyboard(lparam: LPARAM) -> Option<RawKeyboardInput> {
    let mut raw = RAWINPUT::default();
    let mut size = size_of::<RAWINPUT>() as u32;
    let read = unsafe {
        GetRawInputData(
            HRAWINPUT(lparam.0 as *mut c_void),
            RID_INPUT,
            Some(&mut raw as *mut RAWINPUT as *mut c_void),
            &mut size,
            size_of::<RAWINPUTHEADER>() as u32,
        )
    };
    if read == u32::MAX || raw.header.dwType != RIM_TYPEKEYBOARD.0 {
        return None;
    }

    let keyboard = unsafe { raw.data.keyboard };
    Some(RawKeyboardInput {
        device_handle: raw.header.hDevice.0 as isize,
        virtual_key: keyboard.VKey,
        make_code: keyboard.MakeCode,
        flags: keyboard.Flags,
    })
}

/// Hidden message-only window that receives WM_INPUT for the observer
pub struct MessageWindow {
    hwnd: HWND,
}

impl MessageWindow {
    pub fn create(observer: Arc<DeviceObserver>) -> Result<Self, ObserverError> {
        unsafe {
            let module =
                GetModuleHandleW(None).map_err(|e| ObserverError::WindowCreation(e.to_string()))?;
            let instance = HINSTANCE(module.0);

            let class = WNDCLASSW {
                lpfnWndProc: Some(window_proc),
                hInstance: instance,
                lpszClassName: CLASS_NAME,
                ..Default::default()
            };
            // Zero means failure or an already registered class; creation reports the former
            RegisterClassW(&class);

            // Reclaimed in WM_NCDESTROY
            let context = Box::into_raw(Box::new(observer));
            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                CLASS_NAME,
                w!("macroboard"),
                WINDOW_STYLE::default(),
                0,
                0,
                0,
                0,
                HWND_MESSAGE,
                HMENU::default(),
                instance,
                Some(context as *const c_void),
            );
            match hwnd {
                Ok(hwnd) => Ok(Self { hwnd }),
                Err(e) => {
                    drop(Box::from_raw(context));
                    Err(ObserverError::WindowCreation(e.to_string()))
                }
            }
        }
    }

    /// Raw handle for `DeviceObserver::initialize`
    pub fn handle(&self) -> isize {
        self.hwnd.0 as isize
    }
}

impl Drop for MessageWindow {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = DestroyWindow(self.hwnd) {
                crate::warn!("DestroyWindow failed: {}", e);
            }
        }
    }
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_NCCREATE => {
            let create = &*(lparam.0 as *const CREATESTRUCTW);
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, create.lpCreateParams as isize);
        }
        WM_INPUT => {
            let context = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const Arc<DeviceObserver>;
            if !context.is_null() {
                let observer = &*context;
                let result = catch_unwind(AssertUnwindSafe(|| {
                    if let Some(input) = read_raw_keyboard(lparam) {
                        observer.handle_raw_key(&input);
                    }
                }));
                if let Err(e) = result {
                    crate::error!("Raw input handler panicked: {:?}", e);
                }
            }
        }
        WM_NCDESTROY => {
            let context = SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) as *mut Arc<DeviceObserver>;
            if !context.is_null() {
                drop(Box::from_raw(context));
            }
        }
        _ => {}
    }
    // WM_INPUT also needs the default handling to release the input buffer
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

/// Pump messages on the calling thread until WM_QUIT
pub fn run_message_loop() {
    let mut msg = MSG::default();
    unsafe {
        while GetMessageW(&mut msg, HWND::default(), 0, 0).0 > 0 {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}
