// Live key feedback with an idle reset that newer keys cancel

use crate::events::{FeedbackEmitter, KeyFeedback};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub struct FeedbackDisplay {
    emitter: Arc<dyn FeedbackEmitter>,
    runtime: Handle,
    reset_after: Duration,
    pending_reset: Mutex<Option<JoinHandle<()>>>,
}

impl FeedbackDisplay {
    pub fn new(emitter: Arc<dyn FeedbackEmitter>, runtime: Handle, reset_after: Duration) -> Self {
        Self {
            emitter,
            runtime,
            reset_after,
            pending_reset: Mutex::new(None),
        }
    }

    /// Emit `feedback` now and `Idle` after the reset delay, replacing any
    /// reset still pending.
    pub fn show(&self, feedback: KeyFeedback) {
        self.emitter.emit_feedback(feedback);

        let mut pending = self.pending_reset.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let emitter = self.emitter.clone();
        let delay = self.reset_after;
        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            emitter.emit_feedback(KeyFeedback::Idle);
        }));
    }
}

impl Drop for FeedbackDisplay {
    fn drop(&mut self) {
        if let Some(pending) = self.pending_reset.lock().take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DeviceId;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<KeyFeedback>>,
    }

    impl FeedbackEmitter for Recorder {
        fn emit_feedback(&self, feedback: KeyFeedback) {
            self.seen.lock().push(feedback);
        }
    }

    fn detected(key: &str) -> KeyFeedback {
        KeyFeedback::Detected {
            key: key.to_string(),
            virtual_key: 0,
            action_name: None,
        }
    }

    #[tokio::test]
    async fn test_idle_follows_after_reset_delay() {
        let recorder = Arc::new(Recorder::default());
        let display =
            FeedbackDisplay::new(recorder.clone(), Handle::current(), Duration::from_millis(20));

        display.show(detected("F1"));
        assert_eq!(recorder.seen.lock().len(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            recorder.seen.lock().as_slice(),
            &[detected("F1"), KeyFeedback::Idle]
        );
    }

    #[tokio::test]
    async fn test_newer_key_cancels_pending_reset() {
        let recorder = Arc::new(Recorder::default());
        let display =
            FeedbackDisplay::new(recorder.clone(), Handle::current(), Duration::from_millis(50));

        display.show(detected("F1"));
        tokio::time::sleep(Duration::from_millis(10)).await;
        display.show(KeyFeedback::KeyboardDetected {
            device_id: DeviceId::new("DEV_1"),
        });
        tokio::time::sleep(Duration::from_millis(150)).await;

        let seen = recorder.seen.lock().clone();
        let idles = seen.iter().filter(|f| **f == KeyFeedback::Idle).count();
        assert_eq!(seen.len(), 3);
        assert_eq!(idles, 1);
    }
}
