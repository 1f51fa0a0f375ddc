// Persists the keyboard chosen in detection mode

use super::MacroEngine;
use crate::config::ConfigStore;
use crate::events::{DeviceId, DeviceKeyEvent, FeedbackEmitter, KeyFeedback};
use crate::observer::DeviceKeyListener;
use parking_lot::Mutex;
use std::sync::Arc;

/// Saves a detected keyboard as the macro keyboard and refreshes the engine.
///
/// Register before the engine so the engine sees the new target for the
/// detecting key press itself.
pub struct DetectionHandler {
    store: Arc<Mutex<ConfigStore>>,
    engine: Arc<MacroEngine>,
    emitter: Arc<dyn FeedbackEmitter>,
}

impl DetectionHandler {
    pub fn new(
        store: Arc<Mutex<ConfigStore>>,
        engine: Arc<MacroEngine>,
        emitter: Arc<dyn FeedbackEmitter>,
    ) -> Self {
        Self {
            store,
            engine,
            emitter,
        }
    }
}

impl DeviceKeyListener for DetectionHandler {
    fn on_key_down(&self, _event: &DeviceKeyEvent) {}

    fn on_device_detected(&self, device: &DeviceId) {
        let mut store = self.store.lock();
        if let Err(e) = store.set_macro_keyboard(device.clone()) {
            // Still usable for this session
            crate::error!("Failed to save macro keyboard: {}", e);
        }
        self.engine.refresh(store.config());
        drop(store);

        self.emitter.emit_feedback(KeyFeedback::KeyboardDetected {
            device_id: device.clone(),
        });
    }
}
