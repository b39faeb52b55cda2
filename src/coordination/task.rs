//! Capacity-limited task records
//!
//! A task is "K actors working on target T". Joining is bounded by the
//! task's capacity, and participants that stop refreshing lose their slot
//! after the timeout, so a member that died mid-task frees its place
//! without anyone having to notice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Hours};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Gather,
    Hunt,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub kind: TaskKind,
    pub target: EntityId,
    /// Participant → last refresh
    pub participants: BTreeMap<EntityId, Hours>,
    pub started_at: Hours,
    pub max_capacity: usize,
}

impl Task {
    fn prune(&mut self, now: Hours, timeout: Hours) -> usize {
        let before = self.participants.len();
        self.participants.retain(|_, last| now - *last <= timeout);
        before - self.participants.len()
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_capacity
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRegistry {
    tasks: BTreeMap<(TaskKind, EntityId), Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join (or stay in) the task on `target`
    ///
    /// Members always succeed and are refreshed. Others get in only while
    /// the task is below `max_capacity` after stale members are pruned.
    pub fn try_join(
        &mut self,
        kind: TaskKind,
        target: EntityId,
        entity: EntityId,
        max_capacity: usize,
        now: Hours,
        timeout: Hours,
    ) -> bool {
        let task = self.tasks.entry((kind, target)).or_insert_with(|| Task {
            kind,
            target,
            participants: BTreeMap::new(),
            started_at: now,
            max_capacity,
        });
        task.max_capacity = max_capacity;
        task.prune(now, timeout);

        let joined = if let Some(last) = task.participants.get_mut(&entity) {
            *last = now;
            true
        } else if !task.is_full() {
            task.participants.insert(entity, now);
            true
        } else {
            false
        };

        if task.participants.is_empty() {
            self.tasks.remove(&(kind, target));
        }
        joined
    }

    pub fn refresh(&mut self, kind: TaskKind, target: EntityId, entity: EntityId, now: Hours) -> bool {
        match self
            .tasks
            .get_mut(&(kind, target))
            .and_then(|t| t.participants.get_mut(&entity))
        {
            Some(last) => {
                *last = now;
                true
            }
            None => false,
        }
    }

    pub fn leave(&mut self, kind: TaskKind, target: EntityId, entity: EntityId) -> bool {
        let Some(task) = self.tasks.get_mut(&(kind, target)) else {
            return false;
        };
        let left = task.participants.remove(&entity).is_some();
        if task.participants.is_empty() {
            self.tasks.remove(&(kind, target));
        }
        left
    }

    pub fn members(&self, kind: TaskKind, target: EntityId) -> Vec<EntityId> {
        self.tasks
            .get(&(kind, target))
            .map(|t| t.participants.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_member(&self, kind: TaskKind, target: EntityId, entity: EntityId) -> bool {
        self.tasks
            .get(&(kind, target))
            .is_some_and(|t| t.participants.contains_key(&entity))
    }

    pub fn get(&self, kind: TaskKind, target: EntityId) -> Option<&Task> {
        self.tasks.get(&(kind, target))
    }

    /// Prune stale participants everywhere; returns how many were dropped
    pub fn cleanup_stale(&mut self, now: Hours, timeout: Hours) -> usize {
        let dropped = self.tasks.values_mut().map(|t| t.prune(now, timeout)).sum();
        self.tasks.retain(|_, t| !t.participants.is_empty());
        dropped
    }

    /// Drop tasks aimed at `target`
    pub fn remove_target(&mut self, target: EntityId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|(_, t), _| *t != target);
        before - self.tasks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: EntityId = EntityId(100);

    #[test]
    fn test_capacity_bound() {
        let mut reg = TaskRegistry::new();
        assert!(reg.try_join(TaskKind::Gather, TARGET, EntityId(1), 2, 0.0, 1.0));
        assert!(reg.try_join(TaskKind::Gather, TARGET, EntityId(2), 2, 0.0, 1.0));
        assert!(!reg.try_join(TaskKind::Gather, TARGET, EntityId(3), 2, 0.5, 1.0));
        // a member rejoining is not a new slot
        assert!(reg.try_join(TaskKind::Gather, TARGET, EntityId(1), 2, 0.5, 1.0));
        assert_eq!(reg.members(TaskKind::Gather, TARGET), vec![EntityId(1), EntityId(2)]);
    }

    #[test]
    fn test_stale_members_are_pruned_on_join() {
        let mut reg = TaskRegistry::new();
        reg.try_join(TaskKind::Hunt, TARGET, EntityId(1), 1, 0.0, 1.0);
        assert!(!reg.try_join(TaskKind::Hunt, TARGET, EntityId(2), 1, 0.9, 1.0));
        assert!(reg.try_join(TaskKind::Hunt, TARGET, EntityId(2), 1, 1.5, 1.0));
        assert!(!reg.is_member(TaskKind::Hunt, TARGET, EntityId(1)));
    }

    #[test]
    fn test_kinds_are_separate() {
        let mut reg = TaskRegistry::new();
        assert!(reg.try_join(TaskKind::Hunt, TARGET, EntityId(1), 1, 0.0, 1.0));
        assert!(reg.try_join(TaskKind::Gather, TARGET, EntityId(2), 1, 0.0, 1.0));
    }

    #[test]
    fn test_leave_removes_empty_task() {
        let mut reg = TaskRegistry::new();
        reg.try_join(TaskKind::Storage, TARGET, EntityId(1), 3, 0.0, 1.0);
        assert!(reg.leave(TaskKind::Storage, TARGET, EntityId(1)));
        assert!(reg.is_empty());
        assert!(!reg.leave(TaskKind::Storage, TARGET, EntityId(1)));
    }

    #[test]
    fn test_refresh_keeps_slot() {
        let mut reg = TaskRegistry::new();
        reg.try_join(TaskKind::Gather, TARGET, EntityId(1), 1, 0.0, 1.0);
        assert!(reg.refresh(TaskKind::Gather, TARGET, EntityId(1), 0.9));
        assert_eq!(reg.cleanup_stale(1.5, 1.0), 0);
        assert_eq!(reg.cleanup_stale(2.0, 1.0), 1);
        assert!(reg.is_empty());
    }
}
