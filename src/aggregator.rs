// Snapshot aggregation: baseline + live entities + live queue depth + CPU utilization delta.
// One mutex covers the whole read-modify-write so "previous vs current" is always a consistent pair.
// The finished snapshot is also published behind a RwLock so plain reads never wait on a computation.

use crate::broker::QueueLister;
use crate::error::SnapshotError;
use crate::metrics::MetricsSource;
use crate::models::{EntitiesGroup, QUEUES_CATEGORY, Snapshot};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::instrument;

/// Default bound on each external query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

struct AggregatorState {
    baseline: EntitiesGroup,
    previous: Option<Arc<Snapshot>>,
}

pub struct SnapshotAggregator {
    metrics: Arc<dyn MetricsSource>,
    broker: Arc<dyn QueueLister>,
    query_timeout: Duration,
    state: Mutex<AggregatorState>,
    cached: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotAggregator {
    pub fn new(
        metrics: Arc<dyn MetricsSource>,
        broker: Arc<dyn QueueLister>,
        baseline: EntitiesGroup,
        query_timeout: Duration,
    ) -> Self {
        Self {
            metrics,
            broker,
            query_timeout,
            state: Mutex::new(AggregatorState {
                baseline,
                previous: None,
            }),
            cached: RwLock::new(None),
        }
    }

    /// Last computed snapshot, if any. Never triggers a computation.
    pub fn cached(&self) -> Option<Arc<Snapshot>> {
        self.cached
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Copy of the baseline loaded at startup.
    pub async fn baseline(&self) -> EntitiesGroup {
        self.state.lock().await.baseline.clone()
    }

    /// Builds a new snapshot and replaces the cached one. On error nothing is replaced.
    #[instrument(skip(self), fields(operation = "compute_snapshot"))]
    pub async fn compute_snapshot(&self) -> Result<Arc<Snapshot>, SnapshotError> {
        let mut state = self.state.lock().await;
        self.compute_locked(&mut state).await
    }

    /// Cached snapshot, or a freshly computed one when nothing has been computed yet.
    /// Concurrent first reads compute once.
    pub async fn current_or_compute(&self) -> Result<Arc<Snapshot>, SnapshotError> {
        if let Some(snapshot) = self.cached() {
            return Ok(snapshot);
        }
        let mut state = self.state.lock().await;
        if let Some(snapshot) = state.previous.clone() {
            return Ok(snapshot);
        }
        self.compute_locked(&mut state).await
    }

    async fn compute_locked(
        &self,
        state: &mut AggregatorState,
    ) -> Result<Arc<Snapshot>, SnapshotError> {
        let live = timeout(self.query_timeout, self.metrics.live_snapshot())
            .await
            .map_err(|_| {
                SnapshotError::MetricsUnavailable(anyhow::anyhow!(
                    "live metrics timed out after {:?}",
                    self.query_timeout
                ))
            })?
            .map_err(SnapshotError::MetricsUnavailable)?;

        let mut entities = state.baseline.clone().merge(live.entities);

        let queues = timeout(self.query_timeout, self.broker.list_queues())
            .await
            .map_err(|_| {
                SnapshotError::BrokerUnavailable(anyhow::anyhow!(
                    "queue listing timed out after {:?}",
                    self.query_timeout
                ))
            })?
            .map_err(SnapshotError::BrokerUnavailable)?;

        // Queues without a matching entity are skipped, never created.
        let mut unmatched = 0usize;
        for queue in &queues {
            match entities.get_entity_mut(QUEUES_CATEGORY, &queue.name) {
                Some(entity) => entity.output.waiting = queue.waiting,
                None => unmatched += 1,
            }
        }
        if unmatched > 0 {
            tracing::debug!(
                unmatched_queues = unmatched,
                "queues without a matching entity skipped"
            );
        }

        let mut system = live.system;
        system.set_cpu_utilization(state.previous.as_ref().map(|p| &p.system));

        let snapshot = Arc::new(Snapshot {
            timestamp: chrono::Utc::now().timestamp_millis().max(0) as u64,
            system,
            entities,
        });
        state.previous = Some(snapshot.clone());
        *self.cached.write().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());

        tracing::debug!(
            entities_count = snapshot.entities.len(),
            queues_count = queues.len(),
            cpu_utilization = snapshot.system.cpu_utilization,
            "snapshot computed"
        );
        Ok(snapshot)
    }
}
