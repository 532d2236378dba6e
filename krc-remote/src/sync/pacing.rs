//! Request pacing
//!
//! The taste profile service allows about two requests per second. The sync
//! engine waits a fixed delay between batches through a [`Pacer`] so the
//! wait can be replaced in tests.

use async_trait::async_trait;
use std::time::Duration;

/// Waits between successive remote calls
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        tracing::debug!("Taste profile pacing: waiting {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}
