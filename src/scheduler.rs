// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::pipeline::{CycleOutcome, Watcher};

/// Spawn the poll loop. Each cycle is awaited before the next tick is taken,
/// so cycles never overlap; ticks missed during a slow cycle are dropped.
/// The loop ends when `shutdown` flips to `true` or its sender is dropped.
pub fn spawn_watch_loop(
    watcher: Arc<Watcher>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            run_tick(&watcher).await;
        }
        tracing::info!(target: "watch", "watch loop stopped");
    })
}

/// One logged tick; errors end the cycle and are retried on the next tick.
pub async fn run_tick(watcher: &Watcher) -> Option<CycleOutcome> {
    gauge!("watch_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
    match watcher.tick().await {
        Ok(outcome) => {
            tracing::debug!(target: "watch", outcome = outcome.label(), "cycle finished");
            Some(outcome)
        }
        Err(e) => {
            counter!("watch_errors_total").increment(1);
            tracing::warn!(target: "watch", "watch cycle failed: {e:#}");
            None
        }
    }
}
