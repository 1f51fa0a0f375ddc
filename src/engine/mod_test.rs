use super::*;
use crate::config::{Action, ActionKind, ConfigStore, Mapping};
use crate::events::{DeviceId, KeyDirection};
use crate::hook::{HookDecision, HookDispatcher};
use crate::observer::{DeviceObserver, DeviceResolver, RawKeyboardInput};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Sink that records dispatched actions instead of running them
#[derive(Default)]
struct RecordingSink {
    actions: Mutex<Vec<Action>>,
}

impl RecordingSink {
    fn texts(&self) -> Vec<String> {
        self.actions
            .lock()
            .iter()
            .map(|a| match &a.kind {
                ActionKind::SendText { text } => text.clone(),
                other => other.label().to_string(),
            })
            .collect()
    }
}

impl ActionSink for RecordingSink {
    fn dispatch(&self, action: Action) {
        self.actions.lock().push(action);
    }
}

fn hello_config() -> Configuration {
    let action = Action::send_text("Greeting", "hello");
    let mapping = Mapping::new("F1", action.id, DeviceId::new("DEV_1"));
    Configuration {
        macro_keyboard_device_id: Some(DeviceId::new("DEV_1")),
        actions: vec![action],
        mappings: vec![mapping],
        ..Default::default()
    }
}

fn engine_for(config: &Configuration) -> (Arc<MacroEngine>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let engine = Arc::new(MacroEngine::new(config, sink.clone()));
    engine.set_hook_active(true);
    (engine, sink)
}

fn device_press(key: &str, device: &str, is_target: bool, at: Instant) -> DeviceKeyEvent {
    DeviceKeyEvent {
        key: key.to_string(),
        virtual_key: 0x70,
        device: DeviceId::new(device),
        is_from_target_device: is_target,
        timestamp: at,
    }
}

fn hook_down(engine: &MacroEngine, key: &str, at: Instant) -> bool {
    let mut event = HookKeyEvent::new(key, 0x70, KeyDirection::Down).at(at);
    HookListener::on_key_down(engine, &mut event);
    event.consume
}

fn hook_up(engine: &MacroEngine, key: &str) -> bool {
    let mut event = HookKeyEvent::new(key, 0x70, KeyDirection::Up);
    HookListener::on_key_up(engine, &mut event);
    event.consume
}

#[test]
fn test_correlated_press_is_consumed_and_runs_action_once() {
    let (engine, sink) = engine_for(&hello_config());
    let t0 = Instant::now();

    DeviceKeyListener::on_key_down(engine.as_ref(), &device_press("F1", "DEV_1", true, t0));
    let consumed = hook_down(&engine, "F1", t0 + Duration::from_millis(10));

    assert!(consumed);
    assert_eq!(sink.texts(), vec!["hello"]);
}

#[test]
fn test_press_from_other_keyboard_passes_through() {
    let (engine, sink) = engine_for(&hello_config());
    let t0 = Instant::now();

    DeviceKeyListener::on_key_down(engine.as_ref(), &device_press("F1", "DEV_2", false, t0));
    let consumed = hook_down(&engine, "F1", t0 + Duration::from_millis(10));

    assert!(!consumed);
    assert!(sink.texts().is_empty());
}

#[test]
fn test_disabled_mapping_passes_through() {
    let mut config = hello_config();
    config.mappings[0].is_enabled = false;
    let (engine, sink) = engine_for(&config);
    let t0 = Instant::now();

    DeviceKeyListener::on_key_down(engine.as_ref(), &device_press("F1", "DEV_1", true, t0));
    let consumed = hook_down(&engine, "F1", t0 + Duration::from_millis(10));

    assert!(!consumed);
    assert!(sink.texts().is_empty());
}

#[test]
fn test_second_global_event_does_not_reuse_the_press() {
    let (engine, sink) = engine_for(&hello_config());
    let t0 = Instant::now();

    DeviceKeyListener::on_key_down(engine.as_ref(), &device_press("F1", "DEV_1", true, t0));
    assert!(hook_down(&engine, "F1", t0 + Duration::from_millis(5)));
    assert!(!hook_down(&engine, "F1", t0 + Duration::from_millis(8)));
    assert_eq!(sink.texts().len(), 1);
}

#[test]
fn test_unmapped_macro_key_passes_through() {
    let (engine, sink) = engine_for(&hello_config());
    let t0 = Instant::now();

    DeviceKeyListener::on_key_down(engine.as_ref(), &device_press("F2", "DEV_1", true, t0));
    assert!(!hook_down(&engine, "F2", t0 + Duration::from_millis(5)));
    assert!(sink.texts().is_empty());
}

#[test]
fn test_mapping_to_missing_action_passes_through() {
    let mut config = hello_config();
    config.actions.clear();
    let (engine, sink) = engine_for(&config);
    let t0 = Instant::now();

    DeviceKeyListener::on_key_down(engine.as_ref(), &device_press("F1", "DEV_1", true, t0));
    assert!(!hook_down(&engine, "F1", t0 + Duration::from_millis(5)));
    assert!(sink.texts().is_empty());
}

#[test]
fn test_master_switch_off_blocks_nothing() {
    let mut config = hello_config();
    config.is_enabled = false;
    let (engine, sink) = engine_for(&config);
    let t0 = Instant::now();

    DeviceKeyListener::on_key_down(engine.as_ref(), &device_press("F1", "DEV_1", true, t0));
    assert!(!hook_down(&engine, "F1", t0 + Duration::from_millis(5)));
    assert_eq!(engine.correlation().pending_entries(), 0);
    assert!(sink.texts().is_empty());
}

#[test]
fn test_key_up_of_consumed_key_is_consumed_once() {
    let (engine, _) = engine_for(&hello_config());
    let t0 = Instant::now();

    DeviceKeyListener::on_key_down(engine.as_ref(), &device_press("F1", "DEV_1", true, t0));
    assert!(hook_down(&engine, "F1", t0 + Duration::from_millis(5)));

    assert!(hook_up(&engine, "F1"));
    assert!(!hook_up(&engine, "F1"));
}

#[test]
fn test_key_up_of_passed_key_passes() {
    let (engine, _) = engine_for(&hello_config());
    assert!(!hook_up(&engine, "A"));
}

#[test]
fn test_observer_path_runs_action_when_hook_inactive() {
    let (engine, sink) = engine_for(&hello_config());
    engine.set_hook_active(false);

    DeviceKeyListener::on_key_down(
        engine.as_ref(),
        &device_press("F1", "DEV_1", true, Instant::now()),
    );
    assert_eq!(sink.texts(), vec!["hello"]);
}

#[test]
fn test_observer_path_does_not_run_action_when_hook_active() {
    let (engine, sink) = engine_for(&hello_config());

    DeviceKeyListener::on_key_down(
        engine.as_ref(),
        &device_press("F1", "DEV_1", true, Instant::now()),
    );
    assert!(sink.texts().is_empty());
    assert_eq!(engine.correlation().pending_entries(), 1);
}

#[test]
fn test_refresh_picks_up_new_mappings() {
    let mut config = hello_config();
    let (engine, sink) = engine_for(&config);
    let action_id = config.actions[0].id;
    config
        .mappings
        .push(Mapping::new("NumPad1", action_id, DeviceId::new("DEV_1")));
    engine.refresh(&config);
    assert!(engine.correlation().is_mapped("numpad1"));

    let t0 = Instant::now();
    DeviceKeyListener::on_key_down(engine.as_ref(), &device_press("NumPad1", "DEV_1", true, t0));
    assert!(hook_down(&engine, "NumPad1", t0 + Duration::from_millis(5)));
    assert_eq!(sink.texts(), vec!["hello"]);
}

#[test]
fn test_refresh_with_new_device_drops_old_records() {
    let mut config = hello_config();
    let (engine, _) = engine_for(&config);
    DeviceKeyListener::on_key_down(
        engine.as_ref(),
        &device_press("F1", "DEV_1", true, Instant::now()),
    );

    config.macro_keyboard_device_id = Some(DeviceId::new("DEV_3"));
    engine.refresh(&config);
    assert_eq!(engine.correlation().pending_entries(), 0);
}

// End-to-end through the observer and the hook dispatcher

struct NamedResolver;

impl DeviceResolver for NamedResolver {
    fn resolve(&self, device_handle: isize) -> DeviceId {
        DeviceId::new(format!("DEV_{}", device_handle))
    }
}

fn raw_down(device_handle: isize, virtual_key: u16) -> RawKeyboardInput {
    RawKeyboardInput {
        device_handle,
        virtual_key,
        make_code: 0,
        flags: 0,
    }
}

fn wire(engine: &Arc<MacroEngine>) -> (DeviceObserver, HookDispatcher) {
    let observer = DeviceObserver::new(Box::new(NamedResolver));
    observer.set_target_device(Some(DeviceId::new("DEV_1")));
    observer.add_listener(engine.clone());

    let dispatcher = HookDispatcher::new(&engine.snapshot().tunables);
    dispatcher.add_listener(engine.clone());
    (observer, dispatcher)
}

#[test]
fn test_macro_keyboard_press_is_swallowed_end_to_end() {
    let (engine, sink) = engine_for(&hello_config());
    let (observer, dispatcher) = wire(&engine);

    observer.handle_raw_key(&raw_down(1, 0x70));
    let down = dispatcher.dispatch(HookKeyEvent::new("F1", 0x70, KeyDirection::Down));
    let up = dispatcher.dispatch(HookKeyEvent::new("F1", 0x70, KeyDirection::Up));

    assert_eq!(down, HookDecision::Consume);
    assert_eq!(up, HookDecision::Consume);
    assert_eq!(sink.texts(), vec!["hello"]);
}

#[test]
fn test_regular_keyboard_press_passes_end_to_end() {
    let (engine, sink) = engine_for(&hello_config());
    let (observer, dispatcher) = wire(&engine);

    observer.handle_raw_key(&raw_down(2, 0x70));
    let down = dispatcher.dispatch(HookKeyEvent::new("F1", 0x70, KeyDirection::Down));

    assert_eq!(down, HookDecision::PassThrough);
    assert!(sink.texts().is_empty());
}

#[test]
fn test_duplicate_hook_invocation_runs_action_once_end_to_end() {
    let (engine, sink) = engine_for(&hello_config());
    let (observer, dispatcher) = wire(&engine);
    let t0 = Instant::now();

    observer.handle_raw_key(&raw_down(1, 0x70));
    let first = dispatcher.dispatch(HookKeyEvent::new("F1", 0x70, KeyDirection::Down).at(t0));
    let second = dispatcher.dispatch(
        HookKeyEvent::new("F1", 0x70, KeyDirection::Down).at(t0 + Duration::from_millis(3)),
    );

    assert_eq!(first, HookDecision::Consume);
    assert_eq!(second, HookDecision::Consume);
    assert_eq!(sink.texts().len(), 1);
}

#[test]
fn test_late_device_event_is_still_correlated() {
    let (engine, sink) = engine_for(&hello_config());
    let (observer, dispatcher) = wire(&engine);
    let observer = Arc::new(observer);

    let late = {
        let observer = observer.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(3));
            observer.handle_raw_key(&raw_down(1, 0x70));
        })
    };
    let down = dispatcher.dispatch(HookKeyEvent::new("F1", 0x70, KeyDirection::Down));
    late.join().unwrap();

    assert_eq!(down, HookDecision::Consume);
    assert_eq!(sink.texts(), vec!["hello"]);
}

struct NullEmitter;

impl crate::events::FeedbackEmitter for NullEmitter {
    fn emit_feedback(&self, _feedback: KeyFeedback) {}
}

#[test]
fn test_detection_persists_device_and_enables_mappings() {
    let temp = TempDir::new().unwrap();
    let mut store = ConfigStore::new(temp.path().join("config.json"));
    let action = Action::send_text("Greeting", "hello");
    store.add_or_update_action(action.clone()).unwrap();
    store
        .add_or_update_mapping(Mapping::new("F1", action.id, DeviceId::new("DEV_5")))
        .unwrap();

    let (engine, sink) = engine_for(store.config());
    let store = Arc::new(Mutex::new(store));

    let observer = DeviceObserver::new(Box::new(NamedResolver));
    observer.add_listener(Arc::new(DetectionHandler::new(
        store.clone(),
        engine.clone(),
        Arc::new(NullEmitter),
    )));
    observer.add_listener(engine.clone());
    let dispatcher = HookDispatcher::new(&engine.snapshot().tunables);
    dispatcher.add_listener(engine.clone());

    // Nothing configured yet: the mapping cannot fire
    assert!(!engine.correlation().is_mapped("F1"));

    observer.start_detection();
    observer.handle_raw_key(&raw_down(5, 0x41));

    assert_eq!(
        store.lock().config().macro_keyboard_device_id,
        Some(DeviceId::new("DEV_5"))
    );
    assert!(engine.correlation().is_mapped("F1"));

    observer.handle_raw_key(&raw_down(5, 0x70));
    let down = dispatcher.dispatch(HookKeyEvent::new("F1", 0x70, KeyDirection::Down));
    assert_eq!(down, HookDecision::Consume);
    assert_eq!(sink.texts(), vec!["hello"]);
}
