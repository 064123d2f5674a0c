// In-memory entity counters fed by broker code (publishes, deliveries, errors, clients).

use crate::models::{Counters, EntitiesGroup};
use std::sync::Mutex;

/// Direction of recorded traffic relative to the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Default)]
pub struct EntityRecorder {
    group: Mutex<EntitiesGroup>,
}

impl EntityRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `delta` to the entity's counters in the given direction, creating the entity if needed.
    pub fn record(&self, category: &str, name: &str, direction: Direction, delta: &Counters) {
        let Ok(mut group) = self.group.lock() else {
            tracing::warn!(operation = "record", "entity recorder lock poisoned");
            return;
        };
        let entity = group.entity_entry(category, name);
        match direction {
            Direction::In => entity.input.add(delta),
            Direction::Out => entity.output.add(delta),
        }
        entity.last_seen = chrono::Utc::now().timestamp_millis().max(0) as u64;
    }

    pub fn record_message(&self, category: &str, name: &str, direction: Direction, bytes: u64) {
        self.record(
            category,
            name,
            direction,
            &Counters {
                messages: 1,
                volume: bytes,
                ..Default::default()
            },
        );
    }

    pub fn record_error(&self, category: &str, name: &str, direction: Direction) {
        self.record(
            category,
            name,
            direction,
            &Counters {
                errors: 1,
                ..Default::default()
            },
        );
    }

    /// Current counters as an independent copy.
    pub fn entities(&self) -> anyhow::Result<EntitiesGroup> {
        let group = self
            .group
            .lock()
            .map_err(|e| anyhow::anyhow!("entity recorder lock poisoned: {}", e))?;
        Ok(group.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accumulate_per_direction() {
        let r = EntityRecorder::new();
        r.record_message("queues", "q1", Direction::In, 100);
        r.record_message("queues", "q1", Direction::In, 50);
        r.record_message("queues", "q1", Direction::Out, 10);
        r.record_error("channels", "c1", Direction::Out);

        let g = r.entities().unwrap();
        let q1 = g.get_entity("queues", "q1").unwrap();
        assert_eq!(q1.input.messages, 2);
        assert_eq!(q1.input.volume, 150);
        assert_eq!(q1.output.messages, 1);
        assert!(q1.last_seen > 0);
        assert_eq!(g.get_entity("channels", "c1").unwrap().output.errors, 1);
    }
}
