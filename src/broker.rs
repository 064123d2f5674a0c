// Broker queue depth: the listing contract and an in-memory registry the broker updates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueDepth {
    pub name: String,
    pub waiting: u64,
}

/// Lists live queues with their current depth.
#[async_trait]
pub trait QueueLister: Send + Sync {
    async fn list_queues(&self) -> anyhow::Result<Vec<QueueDepth>>;
}

/// Current depth per queue, kept by the broker as messages are enqueued and delivered.
#[derive(Debug, Default)]
pub struct QueueRegistry {
    queues: RwLock<BTreeMap<String, u64>>,
}

impl QueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_waiting(&self, name: &str, waiting: u64) {
        match self.queues.write() {
            Ok(mut q) => {
                q.insert(name.to_string(), waiting);
            }
            Err(e) => tracing::warn!(error = %e, operation = "set_waiting", "queue registry lock poisoned"),
        }
    }

    pub fn remove(&self, name: &str) {
        match self.queues.write() {
            Ok(mut q) => {
                q.remove(name);
            }
            Err(e) => tracing::warn!(error = %e, operation = "remove_queue", "queue registry lock poisoned"),
        }
    }
}

#[async_trait]
impl QueueLister for QueueRegistry {
    async fn list_queues(&self) -> anyhow::Result<Vec<QueueDepth>> {
        let q = self
            .queues
            .read()
            .map_err(|e| anyhow::anyhow!("queue registry lock poisoned: {}", e))?;
        Ok(q.iter()
            .map(|(name, waiting)| QueueDepth {
                name: name.clone(),
                waiting: *waiting,
            })
            .collect())
    }
}
