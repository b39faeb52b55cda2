//! Central entity store
//!
//! An arena keyed by id. Ids are assigned in increasing order, so iterating
//! the `BTreeMap` visits entities in insertion order; the orchestrator relies
//! on that order to decide who wins same-step claims.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::error::{Result, SimError};
use crate::core::types::{EntityId, Vec2};
use crate::entity::{Entity, EntityBody, EntityKind};
use crate::state::EntityState;

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u32,
    /// Removed at the end of the step, after every system has run
    pending_despawn: BTreeSet<EntityId>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
            pending_despawn: BTreeSet::new(),
        }
    }

    pub fn spawn(&mut self, position: Vec2, body: EntityBody, state: Option<EntityState>) -> EntityId {
        let id = EntityId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        let mut entity = Entity::new(id, position, body);
        entity.state = state;
        self.entities.insert(id, entity);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Lookup for host code that treats a missing entity as an error
    pub fn try_get(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(&id).ok_or(SimError::EntityNotFound(id))
    }

    pub fn try_get_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities.get_mut(&id).ok_or(SimError::EntityNotFound(id))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Present, not queued for removal, and not dead or dying
    pub fn is_live(&self, id: EntityId) -> bool {
        !self.pending_despawn.contains(&id) && self.get(id).is_some_and(|e| e.is_live())
    }

    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.get(id).map(|e| e.position)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ids in insertion order (snapshot, safe to hold across mutation)
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn ids_of(&self, kind: EntityKind) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.kind() == kind)
            .map(|e| e.id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.values().filter(|e| e.kind() == kind).count()
    }

    /// Queue an entity for removal at the end of the step
    pub fn despawn(&mut self, id: EntityId) {
        if self.entities.contains_key(&id) {
            self.pending_despawn.insert(id);
        }
    }

    pub fn is_pending_despawn(&self, id: EntityId) -> bool {
        self.pending_despawn.contains(&id)
    }

    /// Remove every queued entity; returns the removed ids in id order
    pub fn flush_despawns(&mut self) -> Vec<EntityId> {
        let pending = std::mem::take(&mut self.pending_despawn);
        pending
            .into_iter()
            .filter(|id| self.entities.remove(id).is_some())
            .collect()
    }

    /// Remove immediately (host-side deletion)
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.pending_despawn.remove(&id);
        self.entities.remove(&id)
    }
}
