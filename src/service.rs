// Snapshot service lifecycle: open storage, load the baseline, start the persister; stop it again.

use crate::aggregator::SnapshotAggregator;
use crate::broker::QueueLister;
use crate::config::AppConfig;
use crate::entities_repo::EntitiesRepo;
use crate::error::SnapshotError;
use crate::metrics::MetricsSource;
use crate::models::EntitiesGroup;
use crate::persister::{self, PersisterConfig, PersisterDeps, PersisterStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub struct SnapshotService {
    aggregator: Arc<SnapshotAggregator>,
    repo: Arc<EntitiesRepo>,
    stats: Arc<PersisterStats>,
    shutdown_tx: oneshot::Sender<()>,
    persister: JoinHandle<()>,
}

impl SnapshotService {
    /// Opens the store at `config.store.path`. Failing to open it is the only fatal error.
    pub async fn start(
        config: &AppConfig,
        metrics: Arc<dyn MetricsSource>,
        broker: Arc<dyn QueueLister>,
    ) -> Result<Self, SnapshotError> {
        let repo = EntitiesRepo::connect(&config.store.path, config.store.retention_days)
            .await
            .map_err(SnapshotError::InitializationFailure)?;
        repo.init()
            .await
            .map_err(SnapshotError::InitializationFailure)?;
        let persister_config = PersisterConfig {
            stats_log_interval: Duration::from_secs(config.snapshot.stats_log_interval_secs),
            ..Default::default()
        };
        Ok(Self::start_with_repo(
            Arc::new(repo),
            metrics,
            broker,
            config.snapshot.query_timeout(),
            persister_config,
        )
        .await)
    }

    /// Starts on an already initialized repo.
    pub async fn start_with_repo(
        repo: Arc<EntitiesRepo>,
        metrics: Arc<dyn MetricsSource>,
        broker: Arc<dyn QueueLister>,
        query_timeout: Duration,
        persister_config: PersisterConfig,
    ) -> Self {
        let baseline = load_baseline(&repo).await;
        let aggregator = Arc::new(SnapshotAggregator::new(
            metrics,
            broker,
            baseline,
            query_timeout,
        ));
        let stats = Arc::new(PersisterStats::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let persister = persister::spawn(
            PersisterDeps {
                aggregator: aggregator.clone(),
                repo: repo.clone(),
                stats: stats.clone(),
                shutdown_rx,
            },
            persister_config,
        );
        Self {
            aggregator,
            repo,
            stats,
            shutdown_tx,
            persister,
        }
    }

    pub fn aggregator(&self) -> Arc<SnapshotAggregator> {
        self.aggregator.clone()
    }

    pub fn repo(&self) -> Arc<EntitiesRepo> {
        self.repo.clone()
    }

    pub fn stats(&self) -> Arc<PersisterStats> {
        self.stats.clone()
    }

    /// Stops the persister (an in-flight tick finishes first) and closes the store.
    pub async fn stop(self) -> Result<(), SnapshotError> {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.persister.await {
            tracing::warn!(error = %e, "persister task ended abnormally");
        }
        self.repo
            .close()
            .await
            .map_err(SnapshotError::PersistenceFailure)?;
        tracing::info!("snapshot service stopped");
        Ok(())
    }
}

/// Last saved entities, or an empty group on a fresh store or a failed load.
async fn load_baseline(repo: &EntitiesRepo) -> EntitiesGroup {
    match repo.load_last_entities().await {
        Ok(Some(entities)) => {
            tracing::info!(entities_count = entities.len(), "loaded last entities baseline");
            entities
        }
        Ok(None) => {
            tracing::info!("no stored entities, starting with an empty baseline");
            EntitiesGroup::new()
        }
        Err(e) => {
            let e = SnapshotError::PersistenceFailure(e);
            tracing::error!(error = %e, "error getting last entities data from local db");
            EntitiesGroup::new()
        }
    }
}
