//! Tribe coordination: demands, supplies and capacity-limited tasks
//!
//! Each tribe keeps one [`TribeLedger`] in its coordinator blackboard. The
//! behavior tree reads and writes it during evaluation; the orchestrator
//! sweeps it once per step. Every mutation reports success as a plain
//! `bool` so "did I get it" is always explicit.

pub mod demand;
pub mod supply;
pub mod task;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ai::keys;
use crate::core::types::ResourceType;
use crate::ecs::world::World;
use crate::entity::StructureKind;

pub use demand::{Demand, DemandRegistry};
pub use supply::{Supply, SupplyRegistry};
pub use task::{Task, TaskKind, TaskRegistry};

/// Everything a tribe coordinates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TribeLedger {
    pub demands: DemandRegistry,
    pub supplies: SupplyRegistry,
    pub tasks: TaskRegistry,
}

impl TribeLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

/// What one sweep removed, summed over all tribes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub demands: usize,
    /// Claims freed without removing their demand
    pub claims: usize,
    pub supplies: usize,
    pub task_members: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.demands + self.claims + self.supplies + self.task_members
    }
}

/// Garbage-collect every tribe ledger
///
/// Removes records untouched for longer than their thresholds, demands
/// whose requester is gone, and supplies or tasks whose target is gone. A
/// claim held by a vanished claimant is only released once it is older
/// than the delivery timeout. The tribe's own storages are re-advertised
/// from their real stock first, so a store nobody touched never expires.
pub fn sweep_stale(world: &mut World) -> SweepReport {
    let now = world.now();
    let config = &world.config;
    let entities = &world.entities;
    let mut report = SweepReport::default();

    for (tribe, board) in world.blackboards.coordinators_mut() {
        let Some(ledger) = board.get_mut(keys::TRIBE_LEDGER) else {
            continue;
        };

        let mut demands = ledger.demands.cleanup_stale(now, config.demand_stale_hours);
        let gone: Vec<_> = ledger
            .demands
            .iter()
            .map(|d| d.requester)
            .filter(|id| !entities.is_live(*id))
            .collect();
        for requester in gone {
            demands += ledger.demands.remove_involving(requester);
        }
        let claims = ledger
            .demands
            .release_stale_claims(now, config.delivery_timeout_hours);

        let storages = entities.iter().filter(|e| {
            e.structure()
                .is_some_and(|s| s.kind == StructureKind::Storage && s.tribe == Some(tribe))
        });
        for storage in storages {
            let amount = storage
                .structure()
                .map_or(0, |s| s.stock.count(ResourceType::Food));
            ledger
                .supplies
                .register_supply(storage.id, ResourceType::Food, amount, storage.position, now);
        }

        let mut supplies = ledger.supplies.cleanup_stale(now, config.supply_stale_hours);
        let empty_sources: Vec<_> = ledger
            .supplies
            .iter()
            .map(|s| s.source)
            .filter(|id| !entities.contains(*id))
            .collect();
        for source in empty_sources {
            supplies += ledger.supplies.remove_involving(source);
        }

        let mut task_members = ledger.tasks.cleanup_stale(now, config.task_timeout_hours);
        let lost_targets: Vec<_> = ledger
            .tasks
            .iter()
            .filter(|t| !entities.is_live(t.target))
            .map(|t| (t.target, t.participants.len()))
            .collect();
        for (target, members) in lost_targets {
            ledger.tasks.remove_target(target);
            task_members += members;
        }

        if demands + claims + supplies + task_members > 0 {
            debug!(%tribe, demands, claims, supplies, task_members, "swept coordination records");
        }
        report.demands += demands;
        report.claims += claims;
        report.supplies += supplies;
        report.task_members += task_members;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::Vec2;

    #[test]
    fn test_sweep_drops_demands_of_vanished_requesters() {
        let mut world = World::new(SimulationConfig::default());
        let leader = world.found_tribe(Vec2::new(50.0, 50.0));
        let member = world.spawn_human(Vec2::new(55.0, 50.0), Some(leader));

        let ledger = world.ledger_mut(leader);
        ledger.demands.register_demand(member, ResourceType::Food, 5, Vec2::ZERO, 0.0);
        ledger.demands.register_demand(leader, ResourceType::Food, 5, Vec2::ZERO, 0.0);

        world.entities.remove(member);
        let report = sweep_stale(&mut world);
        assert_eq!(report.demands, 1);
        let ledger = world.ledger(leader).expect("ledger exists");
        assert!(ledger.demands.get(leader, ResourceType::Food).is_some());
    }

    #[test]
    fn test_sweep_drops_tasks_on_vanished_targets() {
        let mut world = World::new(SimulationConfig::default());
        let leader = world.found_tribe(Vec2::new(50.0, 50.0));
        let bush = world.spawn_bush(Vec2::new(60.0, 50.0));
        world
            .ledger_mut(leader)
            .tasks
            .try_join(TaskKind::Gather, bush, leader, 2, 0.0, 1.0);

        world.entities.remove(bush);
        let report = sweep_stale(&mut world);
        assert_eq!(report.task_members, 1);
        assert!(world.ledger(leader).expect("ledger exists").tasks.is_empty());
    }
}
