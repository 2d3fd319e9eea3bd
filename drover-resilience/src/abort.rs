//! Process-wide abort signal

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Cancellation signal shared by every session of a run
///
/// Cloning is cheap and every clone observes the same signal. Once
/// triggered the signal stays triggered.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl AbortSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Trigger the abort; returns `false` if it was already triggered
    pub fn trigger(&self) -> bool {
        let was_triggered = self.sender.send_replace(true);
        if !was_triggered {
            info!("Abort triggered");
        }
        !was_triggered
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the signal is triggered
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so this only returns once triggered
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

impl Default for AbortSignal {
    fn default() -> Self {
        Self::new()
    }
}
