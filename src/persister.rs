// Background persister: every SAVE_INTERVAL compute a snapshot and write its entities to the
// history table and the "last known" row. Each write is best-effort; the next tick retries.
// Also prunes old history and periodically logs counters. Stops on the shutdown channel.

use crate::aggregator::SnapshotAggregator;
use crate::entities_repo::EntitiesRepo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

/// Persistence cadence.
pub const SAVE_INTERVAL: Duration = Duration::from_secs(5);
const PRUNE_INTERVAL: Duration = Duration::from_secs(3600);

/// Counters shared with whoever wants to report on the persister.
#[derive(Debug, Default)]
pub struct PersisterStats {
    pub ticks_total: AtomicU64,
    pub compute_failures_total: AtomicU64,
    pub saves_total: AtomicU64,
    pub save_failures_total: AtomicU64,
}

pub struct PersisterDeps {
    pub aggregator: Arc<SnapshotAggregator>,
    pub repo: Arc<EntitiesRepo>,
    pub stats: Arc<PersisterStats>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub struct PersisterConfig {
    pub save_interval: Duration,
    pub prune_interval: Duration,
    /// How often to log persister counters at INFO level.
    pub stats_log_interval: Duration,
}

impl Default for PersisterConfig {
    fn default() -> Self {
        Self {
            save_interval: SAVE_INTERVAL,
            prune_interval: PRUNE_INTERVAL,
            stats_log_interval: Duration::from_secs(300),
        }
    }
}

/// One tick: compute, then save to history and to the last-known slot independently.
pub async fn persist_once(aggregator: &SnapshotAggregator, repo: &EntitiesRepo, stats: &PersisterStats) {
    stats.ticks_total.fetch_add(1, Ordering::Relaxed);
    let snapshot = match aggregator.compute_snapshot().await {
        Ok(s) => s,
        Err(e) => {
            stats.compute_failures_total.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, operation = "compute_snapshot", "error getting snapshot");
            return;
        }
    };

    match repo.save_entities_group(&snapshot.entities).await {
        Ok(()) => {
            stats.saves_total.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            stats.save_failures_total.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, operation = "save_entities_group", "error saving entities group");
        }
    }
    match repo.save_last_entities_group(&snapshot.entities).await {
        Ok(()) => {
            stats.saves_total.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            stats.save_failures_total.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, operation = "save_last_entities_group", "error saving last entities group");
        }
    }
}

pub fn spawn(deps: PersisterDeps, config: PersisterConfig) -> tokio::task::JoinHandle<()> {
    let PersisterDeps {
        aggregator,
        repo,
        stats,
        mut shutdown_rx,
    } = deps;
    let PersisterConfig {
        save_interval,
        prune_interval,
        stats_log_interval,
    } = config;

    tokio::spawn(async move {
        // First save one full interval after start.
        let now = Instant::now();
        let mut save_tick = interval_at(now + save_interval, save_interval);
        save_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut prune_tick = interval_at(now + prune_interval, prune_interval);
        prune_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stats_log_tick = interval_at(now + stats_log_interval, stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(interval_ms = save_interval.as_millis() as u64, "starting snapshot persister");

        loop {
            tokio::select! {
                _ = save_tick.tick() => {
                    persist_once(&aggregator, &repo, &stats).await;
                }
                _ = prune_tick.tick() => {
                    match repo.prune_old_data().await {
                        Ok(rows) => tracing::debug!(operation = "prune_old_data", rows, "old history pruned"),
                        Err(e) => tracing::warn!(error = %e, operation = "prune_old_data", "failed to prune old history"),
                    }
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        ticks_total = stats.ticks_total.load(Ordering::Relaxed),
                        compute_failures_total = stats.compute_failures_total.load(Ordering::Relaxed),
                        saves_total = stats.saves_total.load(Ordering::Relaxed),
                        save_failures_total = stats.save_failures_total.load(Ordering::Relaxed),
                        "persister stats"
                    );
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("persister shutting down");
                    break;
                }
            }
        }
    })
}
