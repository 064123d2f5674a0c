// Live metrics: the source contract the aggregator consumes, plus the bundled process source.

mod process;
mod recorder;

pub use process::ProcessMetrics;
pub use recorder::{Direction, EntityRecorder};

use crate::models::{EntitiesGroup, SystemStats};
use async_trait::async_trait;

/// Process counters and entity counters captured together.
#[derive(Debug, Clone, Default)]
pub struct LiveMetrics {
    pub system: SystemStats,
    pub entities: EntitiesGroup,
}

/// Supplies a complete, self-consistent live capture. Errors are opaque to callers.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn live_snapshot(&self) -> anyhow::Result<LiveMetrics>;
}
