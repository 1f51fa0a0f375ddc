use super::*;
use std::sync::{Arc, Mutex};

/// Mock emitter that records all emitted feedback for testing
#[derive(Default, Clone)]
pub struct MockFeedbackEmitter {
    pub feedback: Arc<Mutex<Vec<KeyFeedback>>>,
}

impl MockFeedbackEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<KeyFeedback> {
        self.feedback.lock().unwrap().clone()
    }
}

impl FeedbackEmitter for MockFeedbackEmitter {
    fn emit_feedback(&self, feedback: KeyFeedback) {
        self.feedback.lock().unwrap().push(feedback);
    }
}

#[test]
fn test_device_id_equality_is_by_value() {
    let a = DeviceId::new("DEV_1");
    let b = DeviceId::from("DEV_1");
    let c = DeviceId::new("DEV_2");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.to_string(), "DEV_1");
}

#[test]
fn test_device_id_serializes_as_plain_string() {
    let json = serde_json::to_string(&DeviceId::new("DEV_1")).unwrap();
    assert_eq!(json, "\"DEV_1\"");

    let back: DeviceId = serde_json::from_str(&json).unwrap();
    assert_eq!(back.as_str(), "DEV_1");
}

#[test]
fn test_hook_event_starts_unconsumed() {
    let event = HookKeyEvent::new("F1", 0x70, KeyDirection::Down);
    assert!(!event.consume);
    assert!(!event.injected);
}

#[test]
fn test_feedback_serialization_is_tagged() {
    let json = serde_json::to_string(&KeyFeedback::Detected {
        key: "F1".to_string(),
        virtual_key: 0x70,
        action_name: Some("Copy".to_string()),
    })
    .unwrap();
    assert!(json.contains("\"state\":\"detected\""));
    assert!(json.contains("\"virtualKey\":112"));
    assert!(json.contains("\"actionName\":\"Copy\""));

    let idle = serde_json::to_string(&KeyFeedback::Idle).unwrap();
    assert_eq!(idle, "{\"state\":\"idle\"}");
}

#[test]
fn test_mock_emitter_records_in_order() {
    let emitter = MockFeedbackEmitter::new();
    emitter.emit_feedback(KeyFeedback::Idle);
    emitter.emit_feedback(KeyFeedback::KeyboardDetected {
        device_id: DeviceId::new("DEV_1"),
    });

    let recorded = emitter.recorded();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0], KeyFeedback::Idle);
}
