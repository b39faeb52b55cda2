//! Defend, eat and get-food branches

use crate::actions::catalog::ActionId;
use crate::ai::behaviors::{actor, carried_food, distance_to, set_intent};
use crate::ai::bt::{BehaviorContext, Status};
use crate::core::types::{EntityId, ResourceType};
use crate::entity::Intent;

/// Demand priority of a hungry human, and of a starving one
const HUNGRY_PRIORITY: u32 = 5;
const CRITICAL_PRIORITY: u32 = 10;

fn live_attacker(ctx: &BehaviorContext<'_>) -> Option<EntityId> {
    let attacker = actor(ctx)?.recent_attacker(ctx.now(), ctx.config())?;
    if !ctx.world.entities.is_live(attacker) {
        return None;
    }
    let range = ctx.config().perception_range;
    distance_to(ctx, attacker).filter(|d| *d <= range).map(|_| attacker)
}

pub(super) fn under_attack(ctx: &BehaviorContext<'_>) -> (bool, String) {
    match live_attacker(ctx) {
        Some(attacker) => (true, format!("struck by {}", attacker)),
        None => (false, "no threat".into()),
    }
}

pub(super) fn fight_back(ctx: &mut BehaviorContext<'_>) -> (Status, String) {
    let Some(attacker) = live_attacker(ctx) else {
        return (Status::Success, "threat gone".into());
    };
    set_intent(ctx, Intent::new(ActionId::Attack).with_entity(attacker));
    (Status::Running, format!("fighting {}", attacker))
}

pub(super) fn hungry_with_food(ctx: &BehaviorContext<'_>) -> (bool, String) {
    let hungry = actor(ctx).is_some_and(|a| a.needs.is_hungry(ctx.config()));
    let food = carried_food(ctx);
    (hungry && food > 0, format!("hungry={} food={}", hungry, food))
}

pub(super) fn eat(ctx: &mut BehaviorContext<'_>) -> (Status, String) {
    let me = ctx.entity;
    let tribe = ctx.world.coordinator_of(me);
    if let Some(ledger) = ctx.world.ledger_mut_if_exists(tribe) {
        ledger.demands.remove_demand(me, ResourceType::Food);
    }
    set_intent(ctx, Intent::new(ActionId::Eat));
    (Status::Running, "eating".into())
}

pub(super) fn hungry_empty_handed(ctx: &BehaviorContext<'_>) -> (bool, String) {
    let hungry = actor(ctx).is_some_and(|a| a.needs.is_hungry(ctx.config()));
    (hungry && carried_food(ctx) == 0, format!("hungry={}", hungry))
}

pub(super) fn withdraw_food(ctx: &mut BehaviorContext<'_>) -> (Status, String) {
    let Some(pos) = ctx.me().map(|e| e.position) else {
        return (Status::Failure, "gone".into());
    };
    let tribe = ctx.world.coordinator_of(ctx.entity);
    let metric = ctx.world.metric();
    let storage = ctx
        .world
        .ledger(tribe)
        .and_then(|l| l.supplies.best_supply(ResourceType::Food, pos, &metric))
        .map(|s| s.source)
        .filter(|s| ctx.world.entities.contains(*s));

    match storage {
        Some(storage) => {
            set_intent(ctx, Intent::new(ActionId::Withdraw).with_entity(storage));
            (Status::Running, format!("fetching from {}", storage))
        }
        None => (Status::Failure, "no stored food".into()),
    }
}

pub(super) fn request_food(ctx: &mut BehaviorContext<'_>) -> (Status, String) {
    let Some((pos, hunger)) = ctx
        .me()
        .and_then(|e| e.actor().map(|a| (e.position, a.needs.hunger)))
    else {
        return (Status::Failure, "gone".into());
    };
    let priority = if hunger >= ctx.config().hunger_critical {
        CRITICAL_PRIORITY
    } else {
        HUNGRY_PRIORITY
    };
    let me = ctx.entity;
    let now = ctx.now();
    let tribe = ctx.world.coordinator_of(me);
    let fresh = ctx
        .world
        .ledger_mut(tribe)
        .demands
        .register_demand(me, ResourceType::Food, priority, pos, now);

    set_intent(ctx, Intent::new(ActionId::Rest));
    let reason = if fresh { "asked for food" } else { "waiting for food" };
    (Status::Running, reason.into())
}
