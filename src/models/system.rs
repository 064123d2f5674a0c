// Process stats, snapshot and the serialized read view

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Counters, EntitiesGroup};

/// Cumulative process counters plus the derived CPU utilization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub uptime_secs: f64,
    pub total_cpu_seconds: f64,
    /// Percent of one core over the interval since the previous snapshot; 0 on cold start.
    pub cpu_utilization: f64,
    pub cpus: u32,
    pub memory_bytes: u64,
    pub version: String,
}

impl SystemStats {
    /// Sets `cpu_utilization` from the delta against the previous snapshot's counters.
    /// Without a previous snapshot there is no rate yet and utilization is 0.
    pub fn set_cpu_utilization(&mut self, previous: Option<&SystemStats>) {
        self.cpu_utilization = match previous {
            None => 0.0,
            Some(prev) => cpu_utilization(
                self.total_cpu_seconds - prev.total_cpu_seconds,
                self.uptime_secs - prev.uptime_secs,
            ),
        };
    }
}

/// 100 * CPU-seconds per wall-clock second. Negative CPU deltas (counter reset) count as 0;
/// a non-positive uptime delta yields 0.
pub fn cpu_utilization(delta_cpu_secs: f64, delta_uptime_secs: f64) -> f64 {
    if delta_uptime_secs.is_nan() || delta_uptime_secs <= 0.0 || !delta_cpu_secs.is_finite() {
        return 0.0;
    }
    100.0 * delta_cpu_secs.max(0.0) / delta_uptime_secs
}

/// One point-in-time capture. Never mutated after it is cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub timestamp: u64,
    pub system: SystemStats,
    pub entities: EntitiesGroup,
}

/// Per-category sums shown next to the entities in the read view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotals {
    pub entities: u64,
    #[serde(rename = "in")]
    pub input: Counters,
    #[serde(rename = "out")]
    pub output: Counters,
}

/// Body of GET /api/snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotView {
    pub timestamp: u64,
    pub system: SystemStats,
    pub entities: EntitiesGroup,
    pub totals: BTreeMap<String, CategoryTotals>,
}

impl From<&Snapshot> for SnapshotView {
    fn from(s: &Snapshot) -> Self {
        let mut totals = BTreeMap::new();
        for category in s.entities.categories() {
            let mut t = CategoryTotals::default();
            for e in s.entities.entities(category) {
                t.entities += 1;
                t.input.add(&e.input);
                t.output.add(&e.output);
            }
            totals.insert(category.to_string(), t);
        }
        Self {
            timestamp: s.timestamp,
            system: s.system.clone(),
            entities: s.entities.clone(),
            totals,
        }
    }
}
