// WH_KEYBOARD_LL installation and hook procedure
//
// The hook lives on a dedicated thread: low-level hooks are called on the
// installing thread's message loop, and the correlation wait inside the
// procedure must not block the thread that receives raw input.

use super::{HookDecision, HookDispatcher, HookError};
use crate::events::{HookKeyEvent, KeyDirection};
use crate::keymap::key_name;
use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HC_ACTION, HHOOK, KBDLLHOOKSTRUCT,
    LLKHF_INJECTED, MSG, PM_NOREMOVE, WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT,
    WM_SYSKEYDOWN, WM_SYSKEYUP, WM_USER,
};

thread_local! {
    // Bound once per hook thread; the procedure has no other way to reach it
    static DISPATCHER: RefCell<Option<Arc<HookDispatcher>>> = const { RefCell::new(None) };
}

pub(super) struct HookThread {
    thread_id: u32,
    handle: JoinHandle<()>,
}

impl HookThread {
    /// Spawn the hook thread and wait until the hook is installed (or failed)
    pub(super) fn spawn(dispatcher: Arc<HookDispatcher>) -> Result<Self, HookError> {
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("keyboard-hook".to_string())
            .spawn(move || run_hook_thread(dispatcher, ready_tx))
            .map_err(|e| HookError::ThreadSpawn(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => Ok(Self { thread_id, handle }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(HookError::InstallFailed(
                    "hook thread exited before reporting".to_string(),
                ))
            }
        }
    }

    /// Quit the hook thread's message loop; the thread unhooks before exiting
    pub(super) fn stop(self) {
        unsafe {
            if let Err(e) = PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) {
                crate::error!("Failed to signal keyboard hook thread: {}", e);
                return;
            }
        }
        if self.handle.join().is_err() {
            crate::error!("Keyboard hook thread panicked");
        }
    }
}

fn run_hook_thread(dispatcher: Arc<HookDispatcher>, ready: mpsc::Sender<Result<u32, HookError>>) {
    DISPATCHER.with(|slot| *slot.borrow_mut() = Some(dispatcher));

    let installed = unsafe {
        GetModuleHandleW(None).and_then(|module| {
            SetWindowsHookExW(
                WH_KEYBOARD_LL,
                Some(low_level_keyboard_proc),
                HINSTANCE(module.0),
                0,
            )
        })
    };
    let hook = match installed {
        Ok(hook) => hook,
        Err(e) => {
            let _ = ready.send(Err(HookError::InstallFailed(e.to_string())));
            return;
        }
    };

    let mut msg = MSG::default();
    unsafe {
        // Creates the thread's message queue so WM_QUIT can be posted to it
        let _ = PeekMessageW(&mut msg, HWND::default(), WM_USER, WM_USER, PM_NOREMOVE);
    }
    let _ = ready.send(Ok(unsafe { GetCurrentThreadId() }));

    unsafe {
        // GetMessageW returns -1 on error and 0 on WM_QUIT
        while GetMessageW(&mut msg, HWND::default(), 0, 0).0 > 0 {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        if let Err(e) = UnhookWindowsHookEx(hook) {
            crate::warn!("UnhookWindowsHookEx failed: {}", e);
        }
    }

    DISPATCHER.with(|slot| slot.borrow_mut().take());
    crate::debug!("Keyboard hook thread exiting");
}

unsafe extern "system" fn low_level_keyboard_proc(
    code: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if code == HC_ACTION as i32 {
        let result = catch_unwind(AssertUnwindSafe(|| {
            let info = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
            handle_hook_event(wparam.0 as u32, info)
        }));
        match result {
            Ok(HookDecision::Consume) => return LRESULT(1),
            Ok(HookDecision::PassThrough) => {}
            Err(e) => crate::error!("Keyboard hook procedure panicked: {:?}", e),
        }
    }
    CallNextHookEx(HHOOK::default(), code, wparam, lparam)
}

fn handle_hook_event(message: u32, info: &KBDLLHOOKSTRUCT) -> HookDecision {
    let direction = match message {
        WM_KEYDOWN | WM_SYSKEYDOWN => KeyDirection::Down,
        WM_KEYUP | WM_SYSKEYUP => KeyDirection::Up,
        _ => return HookDecision::PassThrough,
    };

    let vk = info.vkCode as u16;
    let mut event = HookKeyEvent::new(key_name(vk), vk, direction);
    event.scan_code = info.scanCode as u16;
    event.injected = info.flags.0 & LLKHF_INJECTED.0 != 0;

    let dispatcher = DISPATCHER.with(|slot| slot.borrow().clone());
    match dispatcher {
        Some(dispatcher) => dispatcher.dispatch(event),
        None => HookDecision::PassThrough,
    }
}
