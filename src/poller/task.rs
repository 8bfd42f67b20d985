//! The repeating task that drives a poller.

use std::sync::Arc;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::Poller;
use crate::source::Source;
use crate::view::Render;

/// A running poll loop. Dropping it leaves the loop running; call
/// [`PollTask::stop`] to cancel it.
#[derive(Debug)]
pub struct PollTask {
    handle: JoinHandle<()>,
    description: String,
}

impl PollTask {
    /// Cancel the loop and every cycle it has in flight.
    pub fn stop(self) {
        info!(source = %self.description, "Stopping poller");
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl<S, V> Poller<S, V>
where
    S: Source + 'static,
    V: Render<Snapshot = S::Snapshot>,
{
    /// Start polling: one cycle immediately, then one per interval.
    ///
    /// Each tick runs its cycle as a separate task so a hung request never
    /// delays the timer; the overlap policy decides what the tick does if
    /// the previous cycle is still running. Must be called within a tokio
    /// runtime.
    pub fn start(self: Arc<Self>) -> PollTask {
        let description = self.source.description().to_string();
        info!(
            source = %description,
            interval_ms = self.config.interval().as_millis() as u64,
            "Starting poller"
        );

        let handle = tokio::spawn(async move {
            let mut ticker = interval(self.config.interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Aborting this task drops the set, which aborts in-flight cycles.
            let mut cycles = JoinSet::new();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let poller = Arc::clone(&self);
                        cycles.spawn(async move { poller.tick().await });
                    }
                    Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                        match joined {
                            Ok(outcome) => debug!(?outcome, "Cycle finished"),
                            Err(e) if e.is_panic() => warn!(error = %e, "Cycle panicked"),
                            Err(_) => {}
                        }
                    }
                }
            }
        });

        PollTask {
            handle,
            description,
        }
    }
}
