// Snapshot error taxonomy

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Live metrics query failed or timed out.
    #[error("metrics unavailable: {0}")]
    MetricsUnavailable(#[source] anyhow::Error),

    /// Broker queue listing failed or timed out.
    #[error("broker unavailable: {0}")]
    BrokerUnavailable(#[source] anyhow::Error),

    /// Loading or saving entities failed.
    #[error("persistence failure: {0}")]
    PersistenceFailure(#[source] anyhow::Error),

    /// Storage could not be opened at startup.
    #[error("initialization failure: {0}")]
    InitializationFailure(#[source] anyhow::Error),
}
