//! Actor states: Idle, Moving, Eating, Gathering, Attacking, Dying
//!
//! The physical mode of an actor follows its intent. Every actor handler
//! starts from [`desired_state`], which maps the current intent and the
//! distance to its target onto a state; handlers differ only in what they
//! do while the state holds.

use tracing::info;

use crate::actions::catalog::ActionId;
use crate::core::types::{ResourceType, Vec2};
use crate::entity::{Entity, Target};
use crate::state::{
    EntityChanges, EntityState, StateContext, StateData, StateHandler, StateId, StateRegistry,
    StateStep,
};

pub(crate) fn register(registry: &mut StateRegistry) {
    registry.register(StateId::Idle, Box::new(IdleState));
    registry.register(StateId::Moving, Box::new(MovingState));
    registry.register(StateId::Eating, Box::new(EatingState));
    registry.register(StateId::Gathering, Box::new(GatheringState));
    registry.register(StateId::Attacking, Box::new(AttackingState));
    registry.register(StateId::Dying, Box::new(DyingState));
}

/// State the intent asks for right now
///
/// A target that no longer resolves to a live entity drops the actor back to
/// Idle; the AI notices on its next evaluation.
pub fn desired_state(entity: &Entity, ctx: &StateContext<'_>) -> StateData {
    let Some(actor) = entity.actor() else {
        return StateData::Idle;
    };
    if actor.needs.is_dead() {
        return StateData::Dying;
    }

    let intent = &entity.intent;
    let Some(action) = intent.active_action else {
        return StateData::Idle;
    };
    match action {
        ActionId::Rest => return StateData::Idle,
        ActionId::Eat if actor.inventory.count(ResourceType::Food) > 0 => return StateData::Eating,
        ActionId::Eat => return StateData::Idle,
        _ => {}
    }

    let destination = match intent.target {
        None => return StateData::Idle,
        Some(Target::Position(pos)) => pos,
        Some(Target::Entity(id)) => {
            if !ctx.entities.is_live(id) {
                return StateData::Idle;
            }
            match ctx.entities.position(id) {
                Some(pos) => pos,
                None => return StateData::Idle,
            }
        }
    };

    if action == ActionId::Flee {
        let mut away = ctx.metric.delta(destination, entity.position).normalize();
        if away == Vec2::ZERO {
            away = Vec2::new(1.0, 0.0);
        }
        let destination = entity.position + away * ctx.config.perception_range;
        return StateData::Moving {
            destination: ctx.metric.wrap_position(destination),
        };
    }

    if ctx.metric.distance(entity.position, destination) > action.reach(ctx.config) {
        return StateData::Moving { destination };
    }

    match (action, intent.target) {
        (ActionId::Gather, Some(Target::Entity(source))) => StateData::Gathering { source },
        (ActionId::Attack | ActionId::Throw, Some(Target::Entity(target))) => {
            StateData::Attacking { target }
        }
        _ => StateData::Idle,
    }
}

pub struct IdleState;

impl StateHandler for IdleState {
    fn update(&self, _state: &EntityState, entity: &Entity, ctx: &StateContext<'_>) -> StateStep {
        StateStep::with(
            desired_state(entity, ctx),
            EntityChanges { halt: true, ..Default::default() },
        )
    }
}

pub struct MovingState;

impl StateHandler for MovingState {
    fn update(&self, _state: &EntityState, entity: &Entity, ctx: &StateContext<'_>) -> StateStep {
        StateStep::to(desired_state(entity, ctx))
    }

    fn on_exit(&self, _state: &EntityState, _entity: &Entity, _ctx: &StateContext<'_>) -> EntityChanges {
        EntityChanges { halt: true, ..Default::default() }
    }
}

/// One meal takes `eat_hours`; leaving early eats nothing
pub struct EatingState;

impl StateHandler for EatingState {
    fn update(&self, state: &EntityState, entity: &Entity, ctx: &StateContext<'_>) -> StateStep {
        let desired = desired_state(entity, ctx);
        if desired != StateData::Eating {
            return StateStep::to(desired);
        }
        if state.elapsed(ctx.now) >= ctx.config.eat_hours {
            return StateStep::with(
                StateData::Idle,
                EntityChanges { eat: 1, halt: true, ..Default::default() },
            );
        }
        StateStep::with(StateData::Eating, EntityChanges { halt: true, ..Default::default() })
    }
}

pub struct GatheringState;

impl StateHandler for GatheringState {
    fn update(&self, _state: &EntityState, entity: &Entity, ctx: &StateContext<'_>) -> StateStep {
        StateStep::with(
            desired_state(entity, ctx),
            EntityChanges { halt: true, ..Default::default() },
        )
    }

    fn on_exit(&self, _state: &EntityState, _entity: &Entity, _ctx: &StateContext<'_>) -> EntityChanges {
        EntityChanges { reset_harvest: true, ..Default::default() }
    }
}

pub struct AttackingState;

impl StateHandler for AttackingState {
    fn update(&self, _state: &EntityState, entity: &Entity, ctx: &StateContext<'_>) -> StateStep {
        StateStep::with(
            desired_state(entity, ctx),
            EntityChanges { halt: true, ..Default::default() },
        )
    }
}

/// Terminal: the entity is removed after `dying_hours`
pub struct DyingState;

impl StateHandler for DyingState {
    fn update(&self, state: &EntityState, _entity: &Entity, ctx: &StateContext<'_>) -> StateStep {
        let despawn = state.elapsed(ctx.now) >= ctx.config.dying_hours;
        StateStep::with(
            StateData::Dying,
            EntityChanges { halt: true, despawn, ..Default::default() },
        )
    }

    fn on_enter(
        &self,
        _next: &StateData,
        previous: &EntityState,
        entity: &Entity,
        ctx: &StateContext<'_>,
    ) -> Option<EntityState> {
        info!(entity = %entity.id, from = ?previous.id(), at = ctx.now, "actor died");
        None
    }
}
