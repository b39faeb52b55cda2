//! Supply registry: where a tribe keeps things others can take

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Hours, ResourceType, Vec2};
use crate::spatial::Metric;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supply {
    pub source: EntityId,
    pub resource: ResourceType,
    pub amount: u32,
    pub location: Vec2,
    pub updated_at: Hours,
}

/// Supplies keyed by `(source, resource)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplyRegistry {
    supplies: BTreeMap<(EntityId, ResourceType), Supply>,
}

impl SupplyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise (or re-advertise) what `source` holds
    pub fn register_supply(
        &mut self,
        source: EntityId,
        resource: ResourceType,
        amount: u32,
        location: Vec2,
        now: Hours,
    ) {
        self.supplies.insert(
            (source, resource),
            Supply {
                source,
                resource,
                amount,
                location,
                updated_at: now,
            },
        );
    }

    /// Take up to `amount` from an advert; returns what was taken
    pub fn withdraw(&mut self, source: EntityId, resource: ResourceType, amount: u32, now: Hours) -> u32 {
        let Some(supply) = self.supplies.get_mut(&(source, resource)) else {
            return 0;
        };
        let taken = amount.min(supply.amount);
        supply.amount -= taken;
        supply.updated_at = now;
        taken
    }

    pub fn remove_supply(&mut self, source: EntityId, resource: ResourceType) -> Option<Supply> {
        self.supplies.remove(&(source, resource))
    }

    pub fn get(&self, source: EntityId, resource: ResourceType) -> Option<&Supply> {
        self.supplies.get(&(source, resource))
    }

    /// Nearest advert with something left
    pub fn best_supply(&self, resource: ResourceType, from: Vec2, metric: &Metric) -> Option<&Supply> {
        self.supplies
            .values()
            .filter(|s| s.resource == resource && s.amount > 0)
            .min_by_key(|s| OrderedFloat(metric.distance(from, s.location)))
    }

    /// Sum of advertised amounts
    pub fn total(&self, resource: ResourceType) -> u32 {
        self.supplies
            .values()
            .filter(|s| s.resource == resource)
            .map(|s| s.amount)
            .sum()
    }

    pub fn cleanup_stale(&mut self, now: Hours, threshold: Hours) -> usize {
        let before = self.supplies.len();
        self.supplies.retain(|_, s| now - s.updated_at <= threshold);
        before - self.supplies.len()
    }

    pub fn remove_involving(&mut self, source: EntityId) -> usize {
        let before = self.supplies.len();
        self.supplies.retain(|(s, _), _| *s != source);
        before - self.supplies.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Supply> {
        self.supplies.values()
    }

    pub fn len(&self) -> usize {
        self.supplies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supplies.is_empty()
    }
}
