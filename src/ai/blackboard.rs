//! Typed blackboard memory
//!
//! Values are stored type-erased, but every access goes through a
//! [`Key<T>`] that fixes the value type, so a read can never observe a
//! value of the wrong type through this API.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use ahash::AHashMap;

use crate::core::types::EntityId;

/// Name plus statically known value type
pub struct Key<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

/// Memory of one owner. Entries live until removed.
#[derive(Default)]
pub struct Blackboard {
    entries: AHashMap<&'static str, Box<dyn Any>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: 'static>(&self, key: Key<T>) -> Option<&T> {
        self.entries.get(key.name).and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: 'static>(&mut self, key: Key<T>) -> Option<&mut T> {
        self.entries.get_mut(key.name).and_then(|v| v.downcast_mut())
    }

    /// Store a value, returning the previous one
    pub fn set<T: 'static>(&mut self, key: Key<T>, value: T) -> Option<T> {
        self.entries
            .insert(key.name, Box::new(value))
            .and_then(|old| old.downcast().ok())
            .map(|old| *old)
    }

    pub fn remove<T: 'static>(&mut self, key: Key<T>) -> Option<T> {
        self.entries
            .remove(key.name)
            .and_then(|old| old.downcast().ok())
            .map(|old| *old)
    }

    pub fn contains<T>(&self, key: Key<T>) -> bool {
        self.entries.contains_key(key.name)
    }

    pub fn get_or_insert_with<T: 'static>(&mut self, key: Key<T>, init: impl FnOnce() -> T) -> &mut T {
        if !self.entries.get(key.name).is_some_and(|v| v.is::<T>()) {
            self.entries.insert(key.name, Box::new(init()));
        }
        match self.entries.get_mut(key.name).and_then(|v| v.downcast_mut()) {
            Some(value) => value,
            None => unreachable!("slot was just filled with a value of this type"),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("Blackboard").field("keys", &keys).finish()
    }
}

/// Per-entity boards and per-coordinator (tribe) boards
#[derive(Debug, Default)]
pub struct BlackboardStore {
    entities: AHashMap<EntityId, Blackboard>,
    coordinators: AHashMap<EntityId, Blackboard>,
}

impl BlackboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Blackboard> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> &mut Blackboard {
        self.entities.entry(id).or_default()
    }

    /// Move an entity's board out for evaluation; pair with [`put_back`](Self::put_back)
    pub fn take(&mut self, id: EntityId) -> Blackboard {
        self.entities.remove(&id).unwrap_or_default()
    }

    pub fn put_back(&mut self, id: EntityId, board: Blackboard) {
        self.entities.insert(id, board);
    }

    pub fn coordinator(&self, id: EntityId) -> Option<&Blackboard> {
        self.coordinators.get(&id)
    }

    pub fn coordinator_mut(&mut self, id: EntityId) -> &mut Blackboard {
        self.coordinators.entry(id).or_default()
    }

    pub fn coordinators_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut Blackboard)> {
        self.coordinators.iter_mut().map(|(id, board)| (*id, board))
    }

    /// Drop boards whose owner no longer exists; returns how many were dropped
    pub fn retain_owners(
        &mut self,
        entity_alive: impl Fn(EntityId) -> bool,
        coordinator_alive: impl Fn(EntityId) -> bool,
    ) -> usize {
        let before = self.entities.len() + self.coordinators.len();
        self.entities.retain(|id, _| entity_alive(*id));
        self.coordinators.retain(|id, _| coordinator_alive(*id));
        before - self.entities.len() - self.coordinators.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn coordinator_count(&self) -> usize {
        self.coordinators.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNT: Key<u32> = Key::new("count");
    const LABEL: Key<String> = Key::new("label");

    #[test]
    fn test_set_returns_previous() {
        let mut bb = Blackboard::new();
        assert_eq!(bb.set(COUNT, 1), None);
        assert_eq!(bb.set(COUNT, 2), Some(1));
        assert_eq!(bb.get(COUNT), Some(&2));
    }

    #[test]
    fn test_get_mut_and_remove() {
        let mut bb = Blackboard::new();
        bb.set(LABEL, "a".to_string());
        if let Some(label) = bb.get_mut(LABEL) {
            label.push('b');
        }
        assert_eq!(bb.remove(LABEL).as_deref(), Some("ab"));
        assert!(!bb.contains(LABEL));
        assert!(bb.is_empty());
    }

    #[test]
    fn test_get_or_insert_with() {
        let mut bb = Blackboard::new();
        *bb.get_or_insert_with(COUNT, || 10) += 1;
        *bb.get_or_insert_with(COUNT, || 0) += 1;
        assert_eq!(bb.get(COUNT), Some(&12));
    }

    #[test]
    fn test_mismatched_key_reads_nothing() {
        const SAME_NAME: Key<String> = Key::new("count");
        let mut bb = Blackboard::new();
        bb.set(COUNT, 3);
        assert_eq!(bb.get(SAME_NAME), None);
    }

    #[test]
    fn test_store_take_put_back_and_retain() {
        let mut store = BlackboardStore::new();
        store.entity_mut(EntityId(1)).set(COUNT, 5);
        let board = store.take(EntityId(1));
        assert_eq!(board.get(COUNT), Some(&5));
        assert!(store.entity(EntityId(1)).is_none());
        store.put_back(EntityId(1), board);

        store.entity_mut(EntityId(2));
        store.coordinator_mut(EntityId(1));
        let dropped = store.retain_owners(|id| id == EntityId(1), |_| false);
        assert_eq!(dropped, 2);
        assert_eq!(store.entity_count(), 1);
        assert_eq!(store.coordinator_count(), 0);
    }
}
