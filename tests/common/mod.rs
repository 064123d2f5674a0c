// Shared test helpers: scripted metrics source and broker.
#![allow(dead_code)]

use async_trait::async_trait;
use brokerstats::broker::{QueueDepth, QueueLister};
use brokerstats::entities_repo::EntitiesRepo;
use brokerstats::metrics::{LiveMetrics, MetricsSource};
use brokerstats::models::*;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

pub fn entity(name: &str, messages: u64, waiting: u64) -> Entity {
    let mut e = Entity::new(name);
    e.input.messages = messages;
    e.output.waiting = waiting;
    e
}

pub fn system(uptime_secs: f64, total_cpu_seconds: f64) -> SystemStats {
    SystemStats {
        uptime_secs,
        total_cpu_seconds,
        cpus: 4,
        ..Default::default()
    }
}

/// Returns whatever live metrics were last set; fails while `fail` is set.
#[derive(Default)]
pub struct FakeMetrics {
    pub live: Mutex<LiveMetrics>,
    pub fail: AtomicBool,
    pub delay: Mutex<Option<Duration>>,
    pub calls: AtomicUsize,
}

impl FakeMetrics {
    pub fn new(system: SystemStats, entities: EntitiesGroup) -> Self {
        Self {
            live: Mutex::new(LiveMetrics { system, entities }),
            ..Default::default()
        }
    }

    pub fn set_system(&self, system: SystemStats) {
        self.live.lock().unwrap().system = system;
    }
}

#[async_trait]
impl MetricsSource for FakeMetrics {
    async fn live_snapshot(&self) -> anyhow::Result<LiveMetrics> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        anyhow::ensure!(!self.fail.load(Ordering::SeqCst), "metrics exporter down");
        Ok(self.live.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeBroker {
    pub queues: Mutex<Vec<QueueDepth>>,
    pub fail: AtomicBool,
    pub delay: Mutex<Option<Duration>>,
}

impl FakeBroker {
    pub fn with_queues(queues: &[(&str, u64)]) -> Self {
        let b = Self::default();
        b.set_queues(queues);
        b
    }

    pub fn set_queues(&self, queues: &[(&str, u64)]) {
        *self.queues.lock().unwrap() = queues
            .iter()
            .map(|(name, waiting)| QueueDepth {
                name: name.to_string(),
                waiting: *waiting,
            })
            .collect();
    }
}

#[async_trait]
impl QueueLister for FakeBroker {
    async fn list_queues(&self) -> anyhow::Result<Vec<QueueDepth>> {
        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        anyhow::ensure!(!self.fail.load(Ordering::SeqCst), "broker unreachable");
        Ok(self.queues.lock().unwrap().clone())
    }
}

pub async fn temp_repo(dir: &TempDir) -> EntitiesRepo {
    let path = dir.path().join("store").join("entities.db");
    let repo = EntitiesRepo::connect(path.to_str().unwrap(), 7)
        .await
        .unwrap();
    repo.init().await.unwrap();
    repo
}

/// Second connection to the `temp_repo` database, for tampering with tables directly.
pub async fn raw_pool(dir: &TempDir) -> sqlx::SqlitePool {
    let path = dir.path().join("store").join("entities.db");
    sqlx::SqlitePool::connect(&format!("sqlite:{}", path.display()))
        .await
        .unwrap()
}
