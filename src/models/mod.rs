// Domain models: entities, process stats, snapshots

mod entity;
mod system;

pub use entity::{Counters, EntitiesGroup, Entity, QUEUES_CATEGORY};
pub use system::{CategoryTotals, Snapshot, SnapshotView, SystemStats, cpu_utilization};
