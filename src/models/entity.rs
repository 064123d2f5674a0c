// Entities grouped by category (queues, channels, ...). Right-biased merge over a cloned baseline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use wincode::{SchemaRead, SchemaWrite};

/// Category holding queue entities; its entities receive live queue depth.
pub const QUEUES_CATEGORY: &str = "queues";

/// Traffic counters for one direction of an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub messages: u64,
    pub volume: u64,
    pub responses: u64,
    pub errors: u64,
    /// Queue depth: enqueued but not yet delivered.
    pub waiting: u64,
    pub clients: u64,
}

impl Counters {
    pub fn add(&mut self, other: &Counters) {
        self.messages = self.messages.saturating_add(other.messages);
        self.volume = self.volume.saturating_add(other.volume);
        self.responses = self.responses.saturating_add(other.responses);
        self.errors = self.errors.saturating_add(other.errors);
        self.waiting = self.waiting.saturating_add(other.waiting);
        self.clients = self.clients.saturating_add(other.clients);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    /// Unix ms of the last recorded activity.
    pub last_seen: u64,
    #[serde(rename = "in")]
    pub input: Counters,
    #[serde(rename = "out")]
    pub output: Counters,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Category name -> entity name -> entity.
///
/// `Clone` is a deep copy: the maps own their entities, so a clone shares no
/// mutable state with the group it was cloned from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(transparent)]
pub struct EntitiesGroup {
    groups: BTreeMap<String, BTreeMap<String, Entity>>,
}

impl EntitiesGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Right-biased merge: every entity in `other` replaces or extends `self`;
    /// categories and entities missing from `other` are kept as they are.
    pub fn merge(mut self, other: EntitiesGroup) -> Self {
        for (category, entities) in other.groups {
            match self.groups.entry(category) {
                Entry::Vacant(slot) => {
                    slot.insert(entities);
                }
                Entry::Occupied(mut slot) => slot.get_mut().extend(entities),
            }
        }
        self
    }

    /// Inserts or replaces the entity keyed by its name.
    pub fn add_entity(&mut self, category: &str, entity: Entity) {
        self.groups
            .entry(category.to_string())
            .or_default()
            .insert(entity.name.clone(), entity);
    }

    pub fn get_entity(&self, category: &str, name: &str) -> Option<&Entity> {
        self.groups.get(category)?.get(name)
    }

    pub fn get_entity_mut(&mut self, category: &str, name: &str) -> Option<&mut Entity> {
        self.groups.get_mut(category)?.get_mut(name)
    }

    /// Entity for `name`, created empty if absent. Used by recorders, not by the aggregator.
    pub fn entity_entry(&mut self, category: &str, name: &str) -> &mut Entity {
        self.groups
            .entry(category.to_string())
            .or_default()
            .entry(name.to_string())
            .or_insert_with(|| Entity::new(name))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn entities(&self, category: &str) -> impl Iterator<Item = &Entity> {
        self.groups.get(category).into_iter().flat_map(|m| m.values())
    }

    /// Total number of entities across all categories.
    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
