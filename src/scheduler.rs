//! Periodic tick source for the pattern engine.
//!
//! The scheduler repeats for the life of the controller. A tempo change
//! restarts the pending wait with the new interval instead of letting the old
//! one run out.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::pattern::PatternEngine;

pub struct TickScheduler {
    stop: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl TickScheduler {
    /// Spawn the tick loop on the current tokio runtime.
    pub fn spawn(engine: Arc<PatternEngine>) -> Self {
        let stop = Arc::new(Notify::new());
        let handle = tokio::spawn(run(engine, Arc::clone(&stop)));
        Self { stop, handle }
    }

    /// Stop the loop and wait until it has exited. No tick runs after this
    /// returns.
    pub async fn stop(self) {
        self.stop.notify_one();
        if let Err(err) = self.handle.await {
            tracing::warn!(error = %err, "Tick scheduler ended abnormally");
        }
        tracing::debug!("Tick scheduler stopped");
    }
}

async fn run(engine: Arc<PatternEngine>, stop: Arc<Notify>) {
    tracing::debug!(interval_ms = engine.interval().as_millis() as u64, "Tick scheduler started");
    loop {
        let interval = engine.interval();
        tokio::select! {
            biased;
            _ = stop.notified() => break,
            _ = engine.rearmed() => {
                tracing::debug!(interval_ms = engine.interval().as_millis() as u64, "Tick scheduler re-armed");
            }
            _ = tokio::time::sleep(interval) => {
                engine.tick();
            }
        }
    }
}
