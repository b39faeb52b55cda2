//! Tribe ledger behavior: demands, claims, tasks and the stale sweep

use tribal_mind::coordination::{sweep_stale, DemandRegistry, TaskKind, TaskRegistry};
use tribal_mind::core::config::SimulationConfig;
use tribal_mind::core::types::{EntityId, ResourceType, Vec2};
use tribal_mind::ecs::World;

fn world() -> World {
    World::new(SimulationConfig::default())
}

#[test]
fn test_demand_refresh_does_not_duplicate() {
    let mut demands = DemandRegistry::new();
    let requester = EntityId(4);

    assert!(demands.register_demand(requester, ResourceType::Food, 5, Vec2::ZERO, 0.0));
    assert!(!demands.register_demand(requester, ResourceType::Food, 5, Vec2::ZERO, 1.0));

    let unclaimed = demands.get_unclaimed_demands();
    assert_eq!(unclaimed.len(), 1);
    assert_eq!(unclaimed[0].updated_at, 1.0);
    assert_eq!(unclaimed[0].created_at, 0.0);
    assert_eq!(demands.len(), 1);
}

#[test]
fn test_same_tick_claims_have_one_winner() {
    let mut demands = DemandRegistry::new();
    let requester = EntityId(1);
    demands.register_demand(requester, ResourceType::Food, 3, Vec2::ZERO, 0.0);

    let results: Vec<bool> = [EntityId(2), EntityId(3), EntityId(4)]
        .into_iter()
        .map(|claimant| demands.claim_demand(requester, ResourceType::Food, claimant, 0.0))
        .collect();

    assert_eq!(results, vec![true, false, false]);
    assert_eq!(
        demands.get(requester, ResourceType::Food).and_then(|d| d.claimed_by),
        Some(EntityId(2))
    );
    assert!(demands.get_unclaimed_demands().is_empty());
}

#[test]
fn test_released_claim_can_be_taken_again() {
    let mut demands = DemandRegistry::new();
    let requester = EntityId(1);
    demands.register_demand(requester, ResourceType::Food, 3, Vec2::ZERO, 0.0);
    assert!(demands.claim_demand(requester, ResourceType::Food, EntityId(2), 0.0));

    // Only the holder may release
    assert!(!demands.release_claim(requester, ResourceType::Food, EntityId(3)));
    assert!(demands.release_claim(requester, ResourceType::Food, EntityId(2)));
    assert!(demands.claim_demand(requester, ResourceType::Food, EntityId(3), 0.5));
}

#[test]
fn test_task_capacity_and_timeout() {
    let mut tasks = TaskRegistry::new();
    let bush = EntityId(10);
    let timeout = 0.5;

    assert!(tasks.try_join(TaskKind::Gather, bush, EntityId(1), 2, 0.0, timeout));
    assert!(tasks.try_join(TaskKind::Gather, bush, EntityId(2), 2, 0.0, timeout));
    assert!(!tasks.try_join(TaskKind::Gather, bush, EntityId(3), 2, 0.1, timeout));
    // Members re-enter freely
    assert!(tasks.try_join(TaskKind::Gather, bush, EntityId(1), 2, 0.2, timeout));

    // #2 never refreshed; once it is stale a newcomer fits
    assert!(tasks.try_join(TaskKind::Gather, bush, EntityId(4), 2, 0.6, timeout));
    let members = tasks.members(TaskKind::Gather, bush);
    assert!(members.contains(&EntityId(1)));
    assert!(members.contains(&EntityId(4)));
    assert!(!members.contains(&EntityId(2)));
}

#[test]
fn test_tasks_are_keyed_by_kind_and_target() {
    let mut tasks = TaskRegistry::new();
    let target = EntityId(10);
    assert!(tasks.try_join(TaskKind::Gather, target, EntityId(1), 1, 0.0, 1.0));
    assert!(tasks.try_join(TaskKind::Hunt, target, EntityId(2), 1, 0.0, 1.0));
    assert!(tasks.try_join(TaskKind::Gather, EntityId(11), EntityId(3), 1, 0.0, 1.0));
    assert_eq!(tasks.len(), 3);
}

#[test]
fn test_sweep_removes_only_stale_demands() {
    let mut world = world();
    let leader = world.found_tribe(Vec2::new(10.0, 10.0));
    let old = world.spawn_human(Vec2::new(20.0, 10.0), Some(leader));
    let fresh = world.spawn_human(Vec2::new(30.0, 10.0), Some(leader));
    let threshold = world.config.demand_stale_hours;

    world
        .ledger_mut(leader)
        .demands
        .register_demand(old, ResourceType::Food, 5, Vec2::ZERO, 0.0);
    world.clock.advance(threshold);
    let now = world.now();
    world
        .ledger_mut(leader)
        .demands
        .register_demand(fresh, ResourceType::Food, 5, Vec2::ZERO, now);
    world.clock.advance(1.0);

    let report = sweep_stale(&mut world);
    assert_eq!(report.demands, 1);

    let demands = &world.ledger(leader).unwrap().demands;
    assert!(demands.get(old, ResourceType::Food).is_none());
    assert!(demands.get(fresh, ResourceType::Food).is_some());
}

#[test]
fn test_sweep_drops_demands_of_the_dead() {
    let mut world = world();
    let leader = world.found_tribe(Vec2::new(10.0, 10.0));
    let member = world.spawn_human(Vec2::new(20.0, 10.0), Some(leader));
    world
        .ledger_mut(leader)
        .demands
        .register_demand(member, ResourceType::Food, 5, Vec2::ZERO, 0.0);

    world.entities.despawn(member);
    world.entities.flush_despawns();

    let report = sweep_stale(&mut world);
    assert_eq!(report.demands, 1);
    assert!(world.ledger(leader).unwrap().demands.is_empty());
}

#[test]
fn test_sweep_frees_abandoned_claims() {
    let mut world = world();
    let leader = world.found_tribe(Vec2::new(10.0, 10.0));
    let member = world.spawn_human(Vec2::new(20.0, 10.0), Some(leader));
    {
        let ledger = world.ledger_mut(leader);
        ledger
            .demands
            .register_demand(member, ResourceType::Food, 5, Vec2::ZERO, 0.0);
        assert!(ledger.demands.claim_demand(member, ResourceType::Food, leader, 0.0));
    }

    let timeout = world.config.delivery_timeout_hours;
    world.clock.advance(timeout + 0.1);
    // The requester kept its demand alive
    let now = world.now();
    world
        .ledger_mut(leader)
        .demands
        .register_demand(member, ResourceType::Food, 5, Vec2::ZERO, now);

    let report = sweep_stale(&mut world);
    assert_eq!(report.claims, 1);
    let demand = world.ledger(leader).unwrap().demands.get(member, ResourceType::Food).cloned();
    assert!(demand.is_some_and(|d| !d.is_claimed()));
}

#[test]
fn test_sweep_keeps_quiet_storages_advertised() {
    let mut world = world();
    let leader = world.found_tribe(Vec2::new(10.0, 10.0));
    let storage = world.spawn_storage(Vec2::new(18.0, 10.0), leader);
    if let Some(s) = world.entities.get_mut(storage).and_then(|e| e.structure_mut()) {
        s.stock.add(ResourceType::Food, 5);
    }
    world
        .ledger_mut(leader)
        .supplies
        .register_supply(storage, ResourceType::Food, 5, Vec2::new(18.0, 10.0), 0.0);

    let stale = world.config.supply_stale_hours;
    world.clock.advance(stale + 1.0);
    let report = sweep_stale(&mut world);
    assert_eq!(report.supplies, 0);

    let supply = world.ledger(leader).unwrap().supplies.get(storage, ResourceType::Food).cloned();
    assert!(supply.is_some_and(|s| s.amount == 5 && s.updated_at == world.now()));
}
