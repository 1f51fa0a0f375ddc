use super::*;
use crate::events::KeyDirection;

struct ConsumeAll;

impl HookListener for ConsumeAll {
    fn on_key_down(&self, event: &mut HookKeyEvent) {
        event.consume = true;
    }
}

#[test]
fn test_new_hook_is_inactive() {
    let hook = KeyboardHook::new(&Tunables::default());
    assert!(!hook.is_active());
}

#[test]
fn test_stop_without_start_is_noop() {
    let mut hook = KeyboardHook::new(&Tunables::default());
    hook.stop();
    hook.stop();
    assert!(!hook.is_active());
}

#[test]
fn test_listeners_registered_on_hook_reach_dispatcher() {
    let hook = KeyboardHook::new(&Tunables::default());
    hook.add_listener(Arc::new(ConsumeAll));

    let decision = hook
        .dispatcher()
        .dispatch(HookKeyEvent::new("F1", 0x70, KeyDirection::Down));
    assert_eq!(decision, HookDecision::Consume);
}

#[test]
fn test_key_up_default_handler_passes_through() {
    let hook = KeyboardHook::new(&Tunables::default());
    hook.add_listener(Arc::new(ConsumeAll));

    let decision = hook
        .dispatcher()
        .dispatch(HookKeyEvent::new("F1", 0x70, KeyDirection::Up));
    assert_eq!(decision, HookDecision::PassThrough);
}

#[cfg(not(target_os = "windows"))]
#[test]
fn test_start_reports_unsupported_platform() {
    let mut hook = KeyboardHook::new(&Tunables::default());
    assert_eq!(hook.start(), Err(HookError::Unsupported));
    assert!(!hook.is_active());
}

#[test]
fn test_error_messages() {
    assert_eq!(
        HookError::InstallFailed("access denied".to_string()).to_string(),
        "Failed to install keyboard hook: access denied"
    );
}

#[test]
fn test_second_hook_in_process_is_refused_until_release() {
    assert_eq!(claim_process_hook(), Ok(()));
    assert_eq!(claim_process_hook(), Err(HookError::AlreadyInstalled));

    release_process_hook();
    assert_eq!(claim_process_hook(), Ok(()));
    release_process_hook();
}
