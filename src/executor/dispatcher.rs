// Fire-and-forget handoff from input callbacks to the action worker

use super::ActionExecutor;
use crate::config::{Action, ActionKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::mpsc;

/// Accepts actions without blocking the caller
pub trait ActionSink: Send + Sync {
    fn dispatch(&self, action: Action);
}

/// Owns the worker runtime. Key combinations and text run one at a time in
/// arrival order, so synthesized sequences never interleave. Commands run as
/// their own tasks and never hold up the synthesis queue.
pub struct ActionDispatcher {
    sender: mpsc::UnboundedSender<Action>,
    runtime: Option<Runtime>,
}

impl ActionDispatcher {
    pub fn start(executor: ActionExecutor) -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("action-worker")
            .enable_all()
            .build()?;

        let executor = Arc::new(executor);
        let (sender, mut receiver) = mpsc::unbounded_channel::<Action>();
        runtime.spawn(async move {
            while let Some(action) = receiver.recv().await {
                if matches!(action.kind, ActionKind::RunCommand { .. }) {
                    let executor = executor.clone();
                    tokio::spawn(async move {
                        executor.execute(&action).await;
                    });
                } else {
                    executor.execute(&action).await;
                }
            }
            crate::debug!("Action worker stopped");
        });

        crate::info!("Action worker started");
        Ok(Self {
            sender,
            runtime: Some(runtime),
        })
    }

    /// Handle to the worker runtime, for timers that outlive an input callback
    pub fn handle(&self) -> Option<Handle> {
        self.runtime.as_ref().map(|runtime| runtime.handle().clone())
    }
}

impl ActionSink for ActionDispatcher {
    fn dispatch(&self, action: Action) {
        crate::debug!("Queueing action '{}'", action.name);
        if self.sender.send(action).is_err() {
            crate::error!("Action worker is gone, dropping action");
        }
    }
}

impl Drop for ActionDispatcher {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            // Lets an in-flight sequence release its keys
            runtime.shutdown_timeout(Duration::from_millis(500));
        }
    }
}
