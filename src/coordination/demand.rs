//! Demand registry: unmet needs waiting for a deliverer

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Hours, ResourceType, Vec2};

/// One actor asking for one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub requester: EntityId,
    pub resource: ResourceType,
    /// Higher is served first
    pub priority: u32,
    pub location: Vec2,
    pub claimed_by: Option<EntityId>,
    pub claimed_at: Option<Hours>,
    pub created_at: Hours,
    pub updated_at: Hours,
}

impl Demand {
    pub fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }
}

/// Demands keyed by `(requester, resource)`: at most one record per pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandRegistry {
    demands: BTreeMap<(EntityId, ResourceType), Demand>,
}

impl DemandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a demand; returns `true` when it is new
    ///
    /// A refresh keeps `created_at` and any claim, and updates priority,
    /// location and `updated_at`.
    pub fn register_demand(
        &mut self,
        requester: EntityId,
        resource: ResourceType,
        priority: u32,
        location: Vec2,
        now: Hours,
    ) -> bool {
        match self.demands.get_mut(&(requester, resource)) {
            Some(existing) => {
                existing.priority = priority;
                existing.location = location;
                existing.updated_at = now;
                false
            }
            None => {
                self.demands.insert(
                    (requester, resource),
                    Demand {
                        requester,
                        resource,
                        priority,
                        location,
                        claimed_by: None,
                        claimed_at: None,
                        created_at: now,
                        updated_at: now,
                    },
                );
                true
            }
        }
    }

    /// Claim an unclaimed demand; only the first claimant succeeds
    pub fn claim_demand(
        &mut self,
        requester: EntityId,
        resource: ResourceType,
        claimant: EntityId,
        now: Hours,
    ) -> bool {
        match self.demands.get_mut(&(requester, resource)) {
            Some(demand) if demand.claimed_by.is_none() => {
                demand.claimed_by = Some(claimant);
                demand.claimed_at = Some(now);
                demand.updated_at = now;
                true
            }
            _ => false,
        }
    }

    /// Give a claim back; only the current claimant can release it
    pub fn release_claim(&mut self, requester: EntityId, resource: ResourceType, claimant: EntityId) -> bool {
        match self.demands.get_mut(&(requester, resource)) {
            Some(demand) if demand.claimed_by == Some(claimant) => {
                demand.claimed_by = None;
                demand.claimed_at = None;
                true
            }
            _ => false,
        }
    }

    /// Unclaimed demands, highest priority first, oldest first among equals
    pub fn get_unclaimed_demands(&self) -> Vec<&Demand> {
        let mut open: Vec<&Demand> = self.demands.values().filter(|d| !d.is_claimed()).collect();
        open.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.created_at.total_cmp(&b.created_at))
        });
        open
    }

    pub fn get(&self, requester: EntityId, resource: ResourceType) -> Option<&Demand> {
        self.demands.get(&(requester, resource))
    }

    /// Demands currently claimed by `claimant`
    pub fn claimed_by(&self, claimant: EntityId) -> impl Iterator<Item = &Demand> {
        self.demands
            .values()
            .filter(move |d| d.claimed_by == Some(claimant))
    }

    pub fn remove_demand(&mut self, requester: EntityId, resource: ResourceType) -> Option<Demand> {
        self.demands.remove(&(requester, resource))
    }

    /// Drop demands untouched for longer than `threshold`
    pub fn cleanup_stale(&mut self, now: Hours, threshold: Hours) -> usize {
        let before = self.demands.len();
        self.demands.retain(|_, d| now - d.updated_at <= threshold);
        before - self.demands.len()
    }

    /// Free claims held for longer than `threshold`
    ///
    /// A requester keeps refreshing its demand while it waits, so a claim
    /// whose claimant vanished would otherwise never go stale.
    pub fn release_stale_claims(&mut self, now: Hours, threshold: Hours) -> usize {
        let mut released = 0;
        for demand in self.demands.values_mut() {
            if demand.claimed_at.is_some_and(|at| now - at > threshold) {
                demand.claimed_by = None;
                demand.claimed_at = None;
                released += 1;
            }
        }
        released
    }

    /// Drop every demand raised by `requester`
    pub fn remove_involving(&mut self, requester: EntityId) -> usize {
        let before = self.demands.len();
        self.demands.retain(|(r, _), _| *r != requester);
        before - self.demands.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Demand> {
        self.demands.values()
    }

    pub fn len(&self) -> usize {
        self.demands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOOD: ResourceType = ResourceType::Food;

    #[test]
    fn test_register_is_upsert() {
        let mut reg = DemandRegistry::new();
        assert!(reg.register_demand(EntityId(1), FOOD, 5, Vec2::ZERO, 0.0));
        assert!(!reg.register_demand(EntityId(1), FOOD, 7, Vec2::new(1.0, 1.0), 1.0));

        assert_eq!(reg.len(), 1);
        let d = reg.get(EntityId(1), FOOD).unwrap();
        assert_eq!(d.created_at, 0.0);
        assert_eq!(d.updated_at, 1.0);
        assert_eq!(d.priority, 7);
    }

    #[test]
    fn test_only_first_claim_succeeds() {
        let mut reg = DemandRegistry::new();
        reg.register_demand(EntityId(1), FOOD, 5, Vec2::ZERO, 0.0);
        assert!(reg.claim_demand(EntityId(1), FOOD, EntityId(2), 0.5));
        assert!(!reg.claim_demand(EntityId(1), FOOD, EntityId(3), 0.5));
        assert!(!reg.claim_demand(EntityId(9), FOOD, EntityId(3), 0.5));
        assert_eq!(reg.get(EntityId(1), FOOD).unwrap().claimed_by, Some(EntityId(2)));
    }

    #[test]
    fn test_release_only_by_claimant() {
        let mut reg = DemandRegistry::new();
        reg.register_demand(EntityId(1), FOOD, 5, Vec2::ZERO, 0.0);
        reg.claim_demand(EntityId(1), FOOD, EntityId(2), 0.0);
        assert!(!reg.release_claim(EntityId(1), FOOD, EntityId(3)));
        assert!(reg.release_claim(EntityId(1), FOOD, EntityId(2)));
        assert_eq!(reg.get_unclaimed_demands().len(), 1);
    }

    #[test]
    fn test_unclaimed_order() {
        let mut reg = DemandRegistry::new();
        reg.register_demand(EntityId(3), FOOD, 1, Vec2::ZERO, 0.0);
        reg.register_demand(EntityId(2), FOOD, 5, Vec2::ZERO, 2.0);
        reg.register_demand(EntityId(1), FOOD, 5, Vec2::ZERO, 1.0);
        reg.register_demand(EntityId(4), FOOD, 9, Vec2::ZERO, 3.0);
        reg.claim_demand(EntityId(4), FOOD, EntityId(8), 3.0);

        let order: Vec<EntityId> = reg.get_unclaimed_demands().iter().map(|d| d.requester).collect();
        assert_eq!(order, vec![EntityId(1), EntityId(2), EntityId(3)]);
    }

    #[test]
    fn test_cleanup_stale_keeps_fresh() {
        let mut reg = DemandRegistry::new();
        reg.register_demand(EntityId(1), FOOD, 5, Vec2::ZERO, 0.0);
        reg.register_demand(EntityId(2), FOOD, 5, Vec2::ZERO, 8.0);
        assert_eq!(reg.cleanup_stale(10.0, 5.0), 1);
        assert!(reg.get(EntityId(1), FOOD).is_none());
        assert!(reg.get(EntityId(2), FOOD).is_some());
    }

    #[test]
    fn test_stale_claims_are_released() {
        let mut reg = DemandRegistry::new();
        reg.register_demand(EntityId(1), FOOD, 5, Vec2::ZERO, 0.0);
        reg.claim_demand(EntityId(1), FOOD, EntityId(2), 1.0);
        reg.register_demand(EntityId(1), FOOD, 5, Vec2::ZERO, 5.0);
        assert_eq!(reg.release_stale_claims(2.0, 3.0), 0);
        assert_eq!(reg.release_stale_claims(5.0, 3.0), 1);
        assert!(reg.claim_demand(EntityId(1), FOOD, EntityId(3), 5.0));
    }

    #[test]
    fn test_remove_involving_requester() {
        let mut reg = DemandRegistry::new();
        reg.register_demand(EntityId(1), FOOD, 5, Vec2::ZERO, 0.0);
        reg.register_demand(EntityId(1), ResourceType::Wood, 5, Vec2::ZERO, 0.0);
        reg.register_demand(EntityId(2), FOOD, 5, Vec2::ZERO, 0.0);
        assert_eq!(reg.remove_involving(EntityId(1)), 2);
        assert_eq!(reg.len(), 1);
    }
}
