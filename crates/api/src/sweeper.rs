use chrono::Utc;
use eabridge_queue::QueueStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodically drop commands older than `ttl` until `shutdown` flips.
pub(crate) fn spawn_expiry_sweeper(
    store: Arc<QueueStore>,
    ttl: Duration,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            tracing::warn!(?ttl, "Command TTL out of range, expiry disabled");
            return;
        };

        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(cutoff) = Utc::now().checked_sub_signed(ttl) else {
                        continue;
                    };
                    let expired = store.expire_older_than(cutoff);
                    if !expired.is_empty() {
                        tracing::info!(count = expired.len(), "Expired stale commands");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Expiry sweeper stopped");
    })
}
