//! Built-in interactions

use tracing::{debug, info};

use crate::actions::catalog::ActionId;
use crate::core::config::SimulationConfig;
use crate::core::types::{EntityId, ResourceType};
use crate::ecs::world::World;
use crate::entity::{ActorData, EffectKind, Entity, EntityKind, Species, StatusEffect, StructureKind};
use crate::interaction::Interaction;

pub(super) fn all() -> Vec<Interaction> {
    vec![
        Interaction {
            name: "harvest",
            source: EntityKind::Actor,
            target: EntityKind::ResourceSource,
            range: |c| c.gather_range,
            checker: can_harvest,
            perform: harvest,
        },
        Interaction {
            name: "strike",
            source: EntityKind::Actor,
            target: EntityKind::Actor,
            range: |c| c.attack_range,
            checker: can_strike,
            perform: strike,
        },
        Interaction {
            name: "hand over",
            source: EntityKind::Actor,
            target: EntityKind::Actor,
            range: |c| c.exchange_range,
            checker: can_hand_over,
            perform: hand_over,
        },
        Interaction {
            name: "deposit",
            source: EntityKind::Actor,
            target: EntityKind::Structure,
            range: |c| c.exchange_range,
            checker: can_deposit,
            perform: deposit,
        },
        Interaction {
            name: "withdraw",
            source: EntityKind::Actor,
            target: EntityKind::Structure,
            range: |c| c.exchange_range,
            checker: can_withdraw,
            perform: withdraw,
        },
        Interaction {
            name: "spear hit",
            source: EntityKind::Projectile,
            target: EntityKind::Actor,
            range: spear_reach,
            checker: can_spear_hit,
            perform: spear_hit,
        },
    ]
}

fn aimed_at(source: &Entity, action: ActionId, target: &Entity) -> bool {
    source.intent.is(action) && source.intent.target_entity() == Some(target.id)
}

fn same_tribe(a: &Entity, b: &Entity) -> bool {
    a.tribe().is_some() && a.tribe() == b.tribe()
}

fn carried_food(entity: &Entity) -> u32 {
    entity
        .actor()
        .map_or(0, |a| a.inventory.count(ResourceType::Food))
}

// === HARVEST ===

fn can_harvest(source: &Entity, target: &Entity, world: &World) -> bool {
    let Some(actor) = source.actor() else {
        return false;
    };
    if !aimed_at(source, ActionId::Gather, target) || !world.is_ripe_bush(target.id) {
        return false;
    }
    if actor.species == Species::Human && actor.inventory.is_full() {
        return false;
    }
    ActorData::cooldown_ready(actor.last_harvest_at, world.now(), world.config.harvest_interval_hours)
}

/// The first contact only starts the harvest timer
fn harvest(source: EntityId, target: EntityId, world: &mut World) {
    let now = world.now();
    let Some(started) = world
        .entities
        .get(source)
        .and_then(|e| e.actor())
        .map(|a| a.last_harvest_at.is_some())
    else {
        return;
    };

    let taken = if started {
        world
            .entities
            .get_mut(target)
            .and_then(|e| e.resource_mut())
            .map_or(0, |r| r.harvest(1))
    } else {
        0
    };

    let config = &world.config;
    let Some(actor) = world.entities.get_mut(source).and_then(|e| e.actor_mut()) else {
        return;
    };
    actor.last_harvest_at = Some(now);
    if taken == 0 {
        return;
    }
    match actor.species {
        // Boars graze on the spot
        Species::Boar => actor.needs.eat(taken, config),
        Species::Human => {
            actor.inventory.add(ResourceType::Food, taken);
        }
    }
}

// === STRIKE ===

fn can_strike(source: &Entity, target: &Entity, world: &World) -> bool {
    let Some(actor) = source.actor() else {
        return false;
    };
    aimed_at(source, ActionId::Attack, target)
        && target.actor().is_some()
        && ActorData::cooldown_ready(actor.last_strike_at, world.now(), world.config.attack_cooldown_hours)
}

fn strike(source: EntityId, target: EntityId, world: &mut World) {
    let now = world.now();
    let Some(damage) = world.entities.get_mut(source).and_then(|e| e.actor_mut()).map(|a| {
        a.last_strike_at = Some(now);
        a.damage
    }) else {
        return;
    };
    let bleed = StatusEffect::new(EffectKind::Bleeding, 1.0, now + world.config.bleed_hours);
    wound(world, target, source, damage, bleed);
}

// === HAND OVER ===

fn can_hand_over(source: &Entity, target: &Entity, world: &World) -> bool {
    if !aimed_at(source, ActionId::Deliver, target) || carried_food(source) == 0 {
        return false;
    }
    if target.actor().map_or(true, |a| a.inventory.is_full()) {
        return false;
    }
    world
        .ledger(world.coordinator_of(source.id))
        .and_then(|l| l.demands.get(target.id, ResourceType::Food))
        .is_some_and(|d| d.claimed_by == Some(source.id))
}

fn hand_over(source: EntityId, target: EntityId, world: &mut World) {
    let given = world
        .entities
        .get_mut(source)
        .and_then(|e| e.actor_mut())
        .map_or(0, |a| a.inventory.take(ResourceType::Food, 1));
    if given == 0 {
        return;
    }
    if let Some(receiver) = world.entities.get_mut(target).and_then(|e| e.actor_mut()) {
        receiver.inventory.add(ResourceType::Food, given);
    }
    let tribe = world.coordinator_of(source);
    if let Some(ledger) = world.ledger_mut_if_exists(tribe) {
        ledger.demands.remove_demand(target, ResourceType::Food);
    }
    debug!(giver = %source, receiver = %target, "food handed over");
}

// === STORAGE ===

fn is_tribe_storage(actor: &Entity, structure: &Entity) -> bool {
    structure
        .structure()
        .is_some_and(|s| s.kind == StructureKind::Storage)
        && same_tribe(actor, structure)
}

fn can_deposit(source: &Entity, target: &Entity, _world: &World) -> bool {
    aimed_at(source, ActionId::Deposit, target)
        && is_tribe_storage(source, target)
        && carried_food(source) > 0
        && target.structure().is_some_and(|s| !s.stock.is_full())
}

fn deposit(source: EntityId, target: EntityId, world: &mut World) {
    let room = world
        .entities
        .get(target)
        .and_then(|e| e.structure())
        .map_or(0, |s| s.stock.free_space());
    let moved = world
        .entities
        .get_mut(source)
        .and_then(|e| e.actor_mut())
        .map_or(0, |a| a.inventory.take(ResourceType::Food, room));
    if moved == 0 {
        return;
    }
    if let Some(stock) = world.entities.get_mut(target).and_then(|e| e.structure_mut()) {
        stock.stock.add(ResourceType::Food, moved);
    }
    advertise(world, source, target);
    debug!(carrier = %source, storage = %target, moved, "food stored");
}

fn can_withdraw(source: &Entity, target: &Entity, _world: &World) -> bool {
    aimed_at(source, ActionId::Withdraw, target)
        && is_tribe_storage(source, target)
        && source.actor().is_some_and(|a| !a.inventory.is_full())
        && target
            .structure()
            .is_some_and(|s| s.stock.count(ResourceType::Food) > 0)
}

fn withdraw(source: EntityId, target: EntityId, world: &mut World) {
    let taken = world
        .entities
        .get_mut(target)
        .and_then(|e| e.structure_mut())
        .map_or(0, |s| s.stock.take(ResourceType::Food, 1));
    if taken == 0 {
        return;
    }
    if let Some(actor) = world.entities.get_mut(source).and_then(|e| e.actor_mut()) {
        actor.inventory.add(ResourceType::Food, taken);
    }
    let now = world.now();
    let tribe = world.coordinator_of(source);
    if let Some(ledger) = world.ledger_mut_if_exists(tribe) {
        ledger.supplies.withdraw(target, ResourceType::Food, taken, now);
    }
    advertise(world, source, target);
}

/// Refresh the supply record of a storage spot from its real stock
fn advertise(world: &mut World, actor: EntityId, storage: EntityId) {
    let Some((amount, location)) = world
        .entities
        .get(storage)
        .and_then(|e| e.structure().map(|s| (s.stock.count(ResourceType::Food), e.position)))
    else {
        return;
    };
    let now = world.now();
    let tribe = world.coordinator_of(actor);
    world
        .ledger_mut(tribe)
        .supplies
        .register_supply(storage, ResourceType::Food, amount, location, now);
}

// === SPEAR ===

/// Half a step of spear flight, so a spear cannot skip past its target
fn spear_reach(config: &SimulationConfig) -> f32 {
    let half_step = config.spear_speed * config.step_hours() as f32 * 0.5;
    config.attack_range.max(half_step)
}

fn can_spear_hit(source: &Entity, target: &Entity, world: &World) -> bool {
    let Some(spear) = source.projectile() else {
        return false;
    };
    if target.id == spear.owner || target.actor().is_none() {
        return false;
    }
    match world.entities.get(spear.owner) {
        Some(owner) => !same_tribe(owner, target),
        None => true,
    }
}

fn spear_hit(source: EntityId, target: EntityId, world: &mut World) {
    let Some((owner, damage)) = world
        .entities
        .get(source)
        .and_then(|e| e.projectile())
        .map(|p| (p.owner, p.damage))
    else {
        return;
    };
    world.entities.despawn(source);
    let now = world.now();
    let slow = StatusEffect::new(EffectKind::Slowed, world.config.spear_slow, now + world.config.slow_hours);
    wound(world, target, owner, damage, slow);
}

/// Damage `target`, remember who did it, and reward a kill
fn wound(world: &mut World, target: EntityId, attacker: EntityId, damage: f32, effect: StatusEffect) {
    let now = world.now();
    let Some(victim) = world.entities.get_mut(target) else {
        return;
    };
    victim.effects.apply(effect);
    let Some(actor) = victim.actor_mut() else {
        return;
    };
    actor.needs.damage(damage);
    actor.last_attacker = Some((attacker, now));
    if !actor.needs.is_dead() {
        return;
    }
    let killed_boar = actor.species == Species::Boar;
    info!(victim = %target, killer = %attacker, "killed");

    if killed_boar {
        let meat = world.config.boar_food_yield;
        let hunter = world
            .entities
            .get_mut(attacker)
            .filter(|e| e.is_live())
            .and_then(|e| e.actor_mut())
            .filter(|a| a.species == Species::Human);
        if let Some(hunter) = hunter {
            hunter.inventory.add(ResourceType::Food, meat);
        }
    }
}
