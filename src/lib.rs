// Enable coverage attribute on nightly for explicit exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod app;
mod config;
mod correlation;
mod engine;
mod events;
mod executor;
mod hook;
mod keymap;
mod logging;
mod observer;
mod shutdown;

// Re-export log macros for use throughout the crate
pub use log::{debug, error, info, trace, warn};

pub use config::{Action, ActionKind, ConfigError, ConfigStore, Configuration, Mapping, Tunables};
pub use events::{DeviceId, KeyFeedback};
pub use logging::init_logging;

/// Application entry point. Pumps messages on the calling thread until
/// Ctrl+C and returns the process exit code.
/// Note: This function cannot be unit tested as it installs a global hook.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(target_os = "windows")]
pub fn run() -> i32 {
    let store = match ConfigStore::with_default_path() {
        Ok(store) => store,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };
    info!("Using configuration file {:?}", store.path());

    let services = match app::setup(store, Box::new(observer::Win32DeviceResolver)) {
        Ok(services) => services,
        Err(e) => {
            error!("Startup failed: {}", e);
            return 1;
        }
    };

    shutdown::register_main_loop();
    if let Err(e) = ctrlc::set_handler(|| {
        shutdown::signal_shutdown();
        shutdown::stop_main_loop();
    }) {
        warn!("Failed to set Ctrl+C handler: {}", e);
    }

    info!("Press Ctrl+C to exit");
    observer::run_message_loop();
    if !shutdown::is_shutting_down() {
        warn!("Message loop ended without a shutdown request");
    }

    services.shutdown();
    0
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(not(target_os = "windows"))]
pub fn run() -> i32 {
    error!("Global keyboard interception is only supported on Windows");
    1
}
