// Process counters via sysinfo, combined with the entity recorder.

use super::{EntityRecorder, LiveMetrics, MetricsSource};
use crate::models::SystemStats;
use crate::version::VERSION;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::instrument;

pub struct ProcessMetrics {
    sys: Arc<std::sync::Mutex<System>>,
    pid: Pid,
    started: Instant,
    cpus: u32,
    recorder: Arc<EntityRecorder>,
}

impl ProcessMetrics {
    pub fn new(recorder: Arc<EntityRecorder>) -> anyhow::Result<Self> {
        let pid = sysinfo::get_current_pid().map_err(|e| anyhow::anyhow!("current pid: {}", e))?;
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1);
        Ok(Self {
            sys: Arc::new(std::sync::Mutex::new(System::new())),
            pid,
            started: Instant::now(),
            cpus,
            recorder,
        })
    }

    #[instrument(skip(self), fields(source = "process", operation = "get_system_stats"))]
    async fn system_stats(&self) -> anyhow::Result<SystemStats> {
        let sys = self.sys.clone();
        let pid = self.pid;
        let cpus = self.cpus;
        let uptime_secs = self.started.elapsed().as_secs_f64();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            let process = sys
                .process(pid)
                .ok_or_else(|| anyhow::anyhow!("process {} not found", pid))?;
            Ok(SystemStats {
                uptime_secs,
                // accumulated_cpu_time is in milliseconds
                total_cpu_seconds: process.accumulated_cpu_time() as f64 / 1000.0,
                cpu_utilization: 0.0,
                cpus,
                memory_bytes: process.memory(),
                version: VERSION.to_string(),
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }
}

#[async_trait]
impl MetricsSource for ProcessMetrics {
    async fn live_snapshot(&self) -> anyhow::Result<LiveMetrics> {
        let system = self.system_stats().await?;
        let entities = self.recorder.entities()?;
        Ok(LiveMetrics { system, entities })
    }
}
