use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::traits::Pause;

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        trace!(?duration, "Pausing for ledger state to settle");
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately, whatever the requested duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

#[async_trait]
impl Pause for NoPause {
    async fn pause(&self, _duration: Duration) {}
}
