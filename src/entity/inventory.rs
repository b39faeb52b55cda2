//! Bounded per-resource carrying capacity

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::ResourceType;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    items: BTreeMap<ResourceType, u32>,
    capacity: u32,
}

impl Inventory {
    pub fn new(capacity: u32) -> Self {
        Self {
            items: BTreeMap::new(),
            capacity,
        }
    }

    pub fn count(&self, resource: ResourceType) -> u32 {
        self.items.get(&resource).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.items.values().sum()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn free_space(&self) -> u32 {
        self.capacity.saturating_sub(self.total())
    }

    pub fn is_full(&self) -> bool {
        self.free_space() == 0
    }

    /// Add up to `amount`; returns how much was accepted
    pub fn add(&mut self, resource: ResourceType, amount: u32) -> u32 {
        let accepted = amount.min(self.free_space());
        if accepted > 0 {
            *self.items.entry(resource).or_insert(0) += accepted;
        }
        accepted
    }

    /// Take up to `amount`; returns how much was taken
    pub fn take(&mut self, resource: ResourceType, amount: u32) -> u32 {
        let Some(held) = self.items.get_mut(&resource) else {
            return 0;
        };
        let taken = amount.min(*held);
        *held -= taken;
        if *held == 0 {
            self.items.remove(&resource);
        }
        taken
    }
}
