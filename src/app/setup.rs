//! Application setup and teardown.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{ConfigError, ConfigStore};
use crate::engine::{DetectionHandler, FeedbackDisplay, MacroEngine};
use crate::events::{FeedbackEmitter, LogFeedbackEmitter};
use crate::executor::{platform_injector, ActionDispatcher, ActionExecutor, ActionSink};
use crate::hook::KeyboardHook;
use crate::observer::{DeviceObserver, DeviceResolver};

/// Error types for startup
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to start action worker: {0}")]
    Worker(#[from] std::io::Error),
}

/// Everything the host keeps alive while the message loop runs
pub struct Services {
    pub store: Arc<Mutex<ConfigStore>>,
    pub engine: Arc<MacroEngine>,
    pub observer: Arc<DeviceObserver>,
    pub hook: KeyboardHook,
    #[cfg(target_os = "windows")]
    window: Option<crate::observer::MessageWindow>,
    _dispatcher: Arc<ActionDispatcher>,
}

/// Main application setup function.
///
/// Must run on the thread that later pumps messages: the raw input window
/// belongs to it. Raw input and hook failures degrade the service instead of
/// failing startup.
pub fn setup(mut store: ConfigStore, resolver: Box<dyn DeviceResolver>) -> Result<Services, SetupError> {
    crate::info!("Setting up macroboard...");

    store.load()?;
    let config = store.config().clone();

    let executor = ActionExecutor::new(platform_injector(), &config.tunables);
    let dispatcher = Arc::new(ActionDispatcher::start(executor)?);

    let emitter: Arc<dyn FeedbackEmitter> = Arc::new(LogFeedbackEmitter);
    let sink: Arc<dyn ActionSink> = dispatcher.clone();
    let mut engine = MacroEngine::new(&config, sink);
    if let Some(handle) = dispatcher.handle() {
        engine = engine.with_feedback(FeedbackDisplay::new(
            emitter.clone(),
            handle,
            config.tunables.feedback_reset(),
        ));
    }
    let engine = Arc::new(engine);
    let store = Arc::new(Mutex::new(store));

    // Detection must update the engine before it sees the detecting key
    let observer = Arc::new(DeviceObserver::new(resolver));
    observer.add_listener(Arc::new(DetectionHandler::new(
        store.clone(),
        engine.clone(),
        emitter,
    )));
    observer.add_listener(engine.clone());

    #[cfg(target_os = "windows")]
    let window = attach_raw_input(&observer);

    match config.macro_keyboard_device_id.clone() {
        Some(device) => {
            crate::info!("Macro keyboard: {}", device);
            observer.set_target_device(Some(device));
        }
        None => observer.start_detection(),
    }

    let mut hook = KeyboardHook::new(&config.tunables);
    hook.add_listener(engine.clone());
    match hook.start() {
        Ok(()) => engine.set_hook_active(true),
        Err(e) => {
            crate::warn!("{}; mapped keys will run but not be blocked", e);
            engine.set_hook_active(false);
        }
    }

    crate::info!("Setup complete! Waiting for the macro keyboard.");
    Ok(Services {
        store,
        engine,
        observer,
        hook,
        #[cfg(target_os = "windows")]
        window,
        _dispatcher: dispatcher,
    })
}

#[cfg(target_os = "windows")]
fn attach_raw_input(observer: &Arc<DeviceObserver>) -> Option<crate::observer::MessageWindow> {
    match crate::observer::MessageWindow::create(observer.clone()) {
        Ok(window) => {
            if !observer.initialize(window.handle()) {
                crate::warn!("Running without device discrimination, no key will be blocked");
            }
            Some(window)
        }
        Err(e) => {
            crate::error!("{}", e);
            None
        }
    }
}

impl Services {
    /// Stop intercepting first, then release raw input, then the worker
    pub fn shutdown(mut self) {
        self.hook.stop();
        self.engine.set_hook_active(false);
        self.observer.teardown();
        #[cfg(target_os = "windows")]
        drop(self.window.take());
        crate::info!("Shutdown complete");
    }
}
