//! Deliver, hunt, gather and store branches

use tracing::debug;

use crate::actions::catalog::ActionId;
use crate::ai::behaviors::{actor, carried_food, distance_to, set_intent, GatherPhase};
use crate::ai::bt::{BehaviorContext, Status};
use crate::ai::keys;
use crate::coordination::TaskKind;
use crate::core::types::{EntityId, ResourceType};
use crate::entity::{ActorData, EntityKind, Intent, Species, StructureKind};
use crate::spatial::Property;
use crate::state::StateId;

// === DELIVER ===

fn open_demand(ctx: &BehaviorContext<'_>) -> Option<EntityId> {
    let me = ctx.entity;
    let tribe = ctx.world.coordinator_of(me);
    ctx.world
        .ledger(tribe)?
        .demands
        .get_unclaimed_demands()
        .into_iter()
        .filter(|d| d.resource == ResourceType::Food)
        .map(|d| d.requester)
        .find(|r| *r != me && ctx.world.entities.is_live(*r))
}

pub(super) fn someone_waiting(ctx: &BehaviorContext<'_>) -> (bool, String) {
    // An accepted job always reaches the action, which finishes or drops it
    if let Some(requester) = ctx.blackboard.get(keys::DELIVERY_TARGET) {
        return (true, format!("delivering to {}", requester));
    }
    if carried_food(ctx) == 0 {
        return (false, "nothing to give".into());
    }
    match open_demand(ctx) {
        Some(requester) => (true, format!("{} is hungry", requester)),
        None => (false, "no open demand".into()),
    }
}

pub(super) fn deliver_food(ctx: &mut BehaviorContext<'_>) -> (Status, String) {
    let me = ctx.entity;
    let now = ctx.now();
    let tribe = ctx.world.coordinator_of(me);

    let Some(requester) = ctx.blackboard.get(keys::DELIVERY_TARGET).copied() else {
        let Some(requester) = open_demand(ctx) else {
            return (Status::Failure, "no open demand".into());
        };
        let claimed = ctx
            .world
            .ledger_mut(tribe)
            .demands
            .claim_demand(requester, ResourceType::Food, me, now);
        if !claimed {
            return (Status::Failure, format!("{} already served", requester));
        }
        ctx.blackboard.set(keys::DELIVERY_TARGET, requester);
        set_intent(ctx, Intent::new(ActionId::Deliver).with_entity(requester));
        return (Status::Running, format!("claimed demand of {}", requester));
    };

    let claim = ctx
        .world
        .ledger(tribe)
        .and_then(|l| l.demands.get(requester, ResourceType::Food))
        .map(|d| d.claimed_by);
    match claim {
        None => {
            ctx.blackboard.remove(keys::DELIVERY_TARGET);
            return (Status::Success, format!("fed {}", requester));
        }
        Some(holder) if holder != Some(me) => {
            ctx.blackboard.remove(keys::DELIVERY_TARGET);
            return (Status::Failure, "claim lost".into());
        }
        Some(_) => {}
    }

    if !ctx.world.entities.is_live(requester) || carried_food(ctx) == 0 {
        abandon_delivery(ctx);
        return (Status::Failure, "delivery no longer possible".into());
    }

    set_intent(ctx, Intent::new(ActionId::Deliver).with_entity(requester));
    (Status::Running, format!("walking to {}", requester))
}

/// Give the claim back and forget the job
pub(super) fn abandon_delivery(ctx: &mut BehaviorContext<'_>) {
    let Some(requester) = ctx.blackboard.remove(keys::DELIVERY_TARGET) else {
        return;
    };
    let me = ctx.entity;
    let tribe = ctx.world.coordinator_of(me);
    if let Some(ledger) = ctx.world.ledger_mut_if_exists(tribe) {
        ledger.demands.release_claim(requester, ResourceType::Food, me);
    }
}

// === HUNT ===

pub(super) fn stores_low(ctx: &BehaviorContext<'_>) -> (bool, String) {
    if actor(ctx).map_or(true, |a| a.inventory.is_full()) {
        return (false, "hands full".into());
    }
    let tribe = ctx.world.coordinator_of(ctx.entity);
    let stock = ctx.world.tribe_food_stock(tribe);
    (stock < ctx.config().tribe_food_low, format!("tribe stock {}", stock))
}

pub(super) fn find_prey(ctx: &mut BehaviorContext<'_>) -> (Status, String) {
    let Some(pos) = ctx.me().map(|e| e.position) else {
        return (Status::Failure, "gone".into());
    };
    let range = ctx.config().perception_range;
    let world = &*ctx.world;
    let prey = world.spatial.nearest_within(EntityKind::Actor, pos, range, |id| {
        world.entities.is_live(id)
            && world
                .entities
                .get(id)
                .and_then(|e| e.actor())
                .is_some_and(|a| a.species == Species::Boar)
    });

    match prey {
        Some(prey) => {
            ctx.blackboard.set(keys::PREY_TARGET, prey);
            (Status::Success, format!("spotted {}", prey))
        }
        None => {
            ctx.blackboard.remove(keys::PREY_TARGET);
            (Status::Failure, "no prey in sight".into())
        }
    }
}

pub(super) fn forget_prey(ctx: &mut BehaviorContext<'_>) {
    ctx.blackboard.remove(keys::PREY_TARGET);
    ctx.blackboard.remove(keys::PREY_SEARCH);
}

pub(super) fn hunt(ctx: &mut BehaviorContext<'_>) -> (Status, String) {
    let Some(prey) = ctx.blackboard.get(keys::PREY_TARGET).copied() else {
        return (Status::Failure, "no prey".into());
    };

    if !ctx.world.entities.is_live(prey) {
        let killed = ctx.world.entities.get(prey).and_then(|e| e.state_id()) == Some(StateId::Dying);
        forget_prey(ctx);
        return if killed {
            (Status::Success, format!("brought down {}", prey))
        } else {
            (Status::Failure, format!("lost {}", prey))
        };
    }

    let Some(distance) = distance_to(ctx, prey) else {
        forget_prey(ctx);
        return (Status::Failure, "prey vanished".into());
    };
    let now = ctx.now();
    let config = ctx.config();
    let (attack_range, throw_range, throw_cooldown) =
        (config.attack_range, config.throw_range, config.throw_cooldown_hours);

    if distance <= attack_range {
        set_intent(ctx, Intent::new(ActionId::Attack).with_entity(prey));
        return (Status::Running, "striking".into());
    }

    let can_throw = actor(ctx).is_some_and(|a| ActorData::cooldown_ready(a.last_throw_at, now, throw_cooldown));
    if distance <= throw_range && can_throw {
        if let Some(spear) = ctx.world.throw_spear(ctx.entity, prey) {
            debug!(hunter = %ctx.entity, %prey, %spear, "spear thrown");
        }
        set_intent(ctx, Intent::new(ActionId::Throw).with_entity(prey));
        return (Status::Running, "threw a spear".into());
    }

    set_intent(ctx, Intent::new(ActionId::MoveTo).with_entity(prey));
    (Status::Running, format!("closing in ({:.0})", distance))
}

// === GATHER ===

pub(super) fn find_bush(ctx: &mut BehaviorContext<'_>) -> (Status, String) {
    let Some(pos) = ctx.me().map(|e| e.position) else {
        return (Status::Failure, "gone".into());
    };
    let me = ctx.entity;
    let range = ctx.config().perception_range;
    let world = &*ctx.world;
    let tribe = world.coordinator_of(me);
    let tasks = world.ledger(tribe).map(|l| &l.tasks);

    let bush = world.spatial.nearest_within(EntityKind::ResourceSource, pos, range, |id| {
        world.is_ripe_bush(id)
            && !tasks.is_some_and(|t| {
                t.get(TaskKind::Gather, id)
                    .is_some_and(|task| task.is_full() && !task.participants.contains_key(&me))
            })
    });

    match bush {
        Some(bush) => {
            ctx.blackboard.set(keys::FOOD_TARGET, bush);
            (Status::Success, format!("found {}", bush))
        }
        None => {
            ctx.blackboard.remove(keys::FOOD_TARGET);
            (Status::Failure, "no ripe bush nearby".into())
        }
    }
}

pub(super) fn forget_bush(ctx: &mut BehaviorContext<'_>) {
    ctx.blackboard.remove(keys::FOOD_TARGET);
    ctx.blackboard.remove(keys::FOOD_SEARCH);
    ctx.blackboard.remove(keys::GATHER_PHASE);
}

pub(super) fn gather(ctx: &mut BehaviorContext<'_>) -> (Status, String) {
    let Some(bush) = ctx.blackboard.get(keys::FOOD_TARGET).copied() else {
        return (Status::Failure, "no bush".into());
    };
    if !ctx.world.is_ripe_bush(bush) {
        forget_bush(ctx);
        return (Status::Failure, format!("{} picked clean", bush));
    }
    if actor(ctx).map_or(true, |a| a.inventory.is_full()) {
        ctx.blackboard.remove(keys::GATHER_PHASE);
        return (Status::Success, "hands full".into());
    }

    let reach = ctx.config().gather_range;
    let in_reach = distance_to(ctx, bush).is_some_and(|d| d <= reach);
    let phase = ctx
        .blackboard
        .get(keys::GATHER_PHASE)
        .copied()
        .unwrap_or(GatherPhase::Approaching);
    let next = match (phase, in_reach) {
        (GatherPhase::Approaching, true) => GatherPhase::Harvesting,
        (GatherPhase::Harvesting, false) => GatherPhase::Approaching,
        (phase, _) => phase,
    };
    ctx.blackboard.set(keys::GATHER_PHASE, next);
    set_intent(ctx, Intent::new(ActionId::Gather).with_entity(bush));

    let reason = match next {
        GatherPhase::Approaching => format!("walking to {}", bush),
        GatherPhase::Harvesting => format!("picking {}", bush),
    };
    (Status::Running, reason)
}

// === STORE ===

pub(super) fn worth_storing(ctx: &BehaviorContext<'_>) -> (bool, String) {
    let food = carried_food(ctx);
    (food >= ctx.config().store_threshold, format!("carrying {}", food))
}

pub(super) fn find_storage(ctx: &mut BehaviorContext<'_>) -> (Status, String) {
    let Some(pos) = ctx.me().map(|e| e.position) else {
        return (Status::Failure, "gone".into());
    };
    let tribe = ctx.world.coordinator_of(ctx.entity);
    let world = &*ctx.world;
    let storage = world.spatial.nearest(EntityKind::Structure, pos, |id| {
        world
            .spatial
            .by_property(EntityKind::Structure, Property::Tribe(tribe))
            .contains(&id)
            && world
                .entities
                .get(id)
                .and_then(|e| e.structure())
                .is_some_and(|s| s.kind == StructureKind::Storage && !s.stock.is_full())
    });

    match storage {
        Some(storage) => {
            ctx.blackboard.set(keys::STORE_TARGET, storage);
            (Status::Success, format!("using {}", storage))
        }
        None => {
            ctx.blackboard.remove(keys::STORE_TARGET);
            (Status::Failure, "tribe has no storage with room".into())
        }
    }
}

pub(super) fn deposit(ctx: &mut BehaviorContext<'_>) -> (Status, String) {
    let Some(storage) = ctx.blackboard.get(keys::STORE_TARGET).copied() else {
        return (Status::Failure, "no storage".into());
    };
    if !ctx.world.entities.contains(storage) {
        ctx.blackboard.remove(keys::STORE_TARGET);
        return (Status::Failure, "storage gone".into());
    }
    if carried_food(ctx) == 0 {
        ctx.blackboard.remove(keys::STORE_TARGET);
        return (Status::Success, "stored".into());
    }
    let full = ctx
        .world
        .entities
        .get(storage)
        .and_then(|e| e.structure())
        .map_or(true, |s| s.stock.is_full());
    if full {
        ctx.blackboard.remove(keys::STORE_TARGET);
        return (Status::Failure, format!("{} is full", storage));
    }
    set_intent(ctx, Intent::new(ActionId::Deposit).with_entity(storage));
    (Status::Running, format!("carrying to {}", storage))
}
