//! Entity state machine
//!
//! Every stateful entity carries exactly one [`EntityState`]. Each step the
//! orchestrator asks the [`StateRegistry`] for the entity's next state:
//!
//! 1. look up the handler registered for the current [`StateId`]
//! 2. call its `update`, which returns the next state plus the
//!    [`EntityChanges`] to apply
//! 3. if the id changed, run the old handler's `on_exit` and then the new
//!    handler's `on_enter`; a self-transition runs neither
//!
//! Handlers never mutate anything. They read the entity and a
//! [`StateContext`] snapshot and describe what should happen, so the same
//! inputs always produce the same [`StateOutcome`].

pub mod actor;
pub mod passive;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::config::SimulationConfig;
use crate::core::types::{EntityId, Hours, ResourceType, Vec2};
use crate::entity::{Entity, EntityStore};
use crate::spatial::Metric;

/// Closed set of state ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StateId {
    Idle,
    Moving,
    Eating,
    Gathering,
    Attacking,
    Dying,
    Flying,
    Ripe,
    Depleted,
    Fading,
}

impl StateId {
    pub const ALL: [StateId; 10] = [
        StateId::Idle,
        StateId::Moving,
        StateId::Eating,
        StateId::Gathering,
        StateId::Attacking,
        StateId::Dying,
        StateId::Flying,
        StateId::Ripe,
        StateId::Depleted,
        StateId::Fading,
    ];
}

/// State payload, one variant per [`StateId`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateData {
    Idle,
    Moving { destination: Vec2 },
    /// Finishes `eat_hours` after it was entered
    Eating,
    Gathering { source: EntityId },
    Attacking { target: EntityId },
    /// Removed `dying_hours` after it was entered
    Dying,
    Flying,
    Ripe,
    Depleted,
    Fading { expires_at: Option<Hours> },
}

impl StateData {
    pub fn id(&self) -> StateId {
        match self {
            StateData::Idle => StateId::Idle,
            StateData::Moving { .. } => StateId::Moving,
            StateData::Eating => StateId::Eating,
            StateData::Gathering { .. } => StateId::Gathering,
            StateData::Attacking { .. } => StateId::Attacking,
            StateData::Dying => StateId::Dying,
            StateData::Flying => StateId::Flying,
            StateData::Ripe => StateId::Ripe,
            StateData::Depleted => StateId::Depleted,
            StateData::Fading { .. } => StateId::Fading,
        }
    }
}

/// The active state of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub data: StateData,
    pub entered_at: Hours,
    pub previous: Option<StateId>,
}

impl EntityState {
    pub fn new(data: StateData, now: Hours) -> Self {
        Self {
            data,
            entered_at: now,
            previous: None,
        }
    }

    pub fn id(&self) -> StateId {
        self.data.id()
    }

    pub fn elapsed(&self, now: Hours) -> Hours {
        now - self.entered_at
    }
}

/// Read-only view handed to state handlers
#[derive(Clone, Copy)]
pub struct StateContext<'a> {
    pub now: Hours,
    pub dt: Hours,
    pub config: &'a SimulationConfig,
    pub entities: &'a EntityStore,
    pub metric: &'a Metric,
}

/// Mutations a handler asks the orchestrator to apply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityChanges {
    pub hunger: f32,
    pub hitpoints: f32,
    /// Food units consumed from the inventory and eaten
    pub eat: u32,
    /// Amount added back to a resource source, capped at its maximum
    pub regrow: f32,
    /// Zero the velocity
    pub halt: bool,
    /// Restart the harvest timer
    pub reset_harvest: bool,
    pub despawn: bool,
}

impl EntityChanges {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn merge(mut self, other: EntityChanges) -> Self {
        self.hunger += other.hunger;
        self.hitpoints += other.hitpoints;
        self.eat += other.eat;
        self.regrow += other.regrow;
        self.halt |= other.halt;
        self.reset_harvest |= other.reset_harvest;
        self.despawn |= other.despawn;
        self
    }

    /// Apply everything except `despawn`, which needs the store
    pub fn apply(&self, entity: &mut Entity, config: &SimulationConfig) {
        if self.halt {
            entity.velocity = Vec2::ZERO;
        }
        if let Some(actor) = entity.actor_mut() {
            actor.needs.hunger = (actor.needs.hunger + self.hunger).clamp(0.0, config.hunger_death);
            if self.hitpoints > 0.0 {
                actor.needs.heal(self.hitpoints);
            } else if self.hitpoints < 0.0 {
                actor.needs.damage(-self.hitpoints);
            }
            if self.eat > 0 {
                let eaten = actor.inventory.take(ResourceType::Food, self.eat);
                actor.needs.eat(eaten, config);
            }
            if self.reset_harvest {
                actor.last_harvest_at = None;
            }
        }
        if let Some(resource) = entity.resource_mut() {
            if self.regrow > 0.0 {
                resource.amount = (resource.amount + self.regrow).min(resource.max_amount);
            }
        }
    }
}

/// Result of one handler `update`
#[derive(Debug, Clone, PartialEq)]
pub struct StateStep {
    pub next: StateData,
    pub changes: EntityChanges,
}

impl StateStep {
    pub fn to(next: StateData) -> Self {
        Self {
            next,
            changes: EntityChanges::none(),
        }
    }

    pub fn with(next: StateData, changes: EntityChanges) -> Self {
        Self { next, changes }
    }
}

/// Behavior of one state id
pub trait StateHandler {
    /// Decide the next state. Must depend only on its arguments.
    fn update(&self, state: &EntityState, entity: &Entity, ctx: &StateContext<'_>) -> StateStep;

    /// Called once when entering; `Some` replaces the default carried state
    fn on_enter(
        &self,
        _next: &StateData,
        _previous: &EntityState,
        _entity: &Entity,
        _ctx: &StateContext<'_>,
    ) -> Option<EntityState> {
        None
    }

    /// Called once when leaving
    fn on_exit(&self, _state: &EntityState, _entity: &Entity, _ctx: &StateContext<'_>) -> EntityChanges {
        EntityChanges::none()
    }
}

/// What a transition produced for one entity
#[derive(Debug, Clone, PartialEq)]
pub struct StateOutcome {
    pub state: EntityState,
    pub changes: EntityChanges,
    /// `(from, to)` when the state id changed
    pub transitioned: Option<(StateId, StateId)>,
}

/// Handlers keyed by state id
#[derive(Default)]
pub struct StateRegistry {
    handlers: AHashMap<StateId, Box<dyn StateHandler>>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in handler
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        actor::register(&mut registry);
        passive::register(&mut registry);
        registry
    }

    pub fn register(&mut self, id: StateId, handler: Box<dyn StateHandler>) {
        self.handlers.insert(id, handler);
    }

    pub fn unregister(&mut self, id: StateId) -> bool {
        self.handlers.remove(&id).is_some()
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.handlers.contains_key(&id)
    }

    /// Compute the entity's next state
    ///
    /// `None` when the entity has no state or no handler is registered for
    /// its current id; in both cases the entity keeps its state.
    pub fn transition(&self, entity: &Entity, ctx: &StateContext<'_>) -> Option<StateOutcome> {
        let current = entity.state.as_ref()?;
        let current_id = current.id();
        let Some(handler) = self.handlers.get(&current_id) else {
            warn!(entity = %entity.id, state = ?current_id, "no handler registered for state");
            return None;
        };

        let step = handler.update(current, entity, ctx);
        let next_id = step.next.id();

        if next_id == current_id {
            return Some(StateOutcome {
                state: EntityState {
                    data: step.next,
                    entered_at: current.entered_at,
                    previous: current.previous,
                },
                changes: step.changes,
                transitioned: None,
            });
        }

        let exit_changes = handler.on_exit(current, entity, ctx);
        let entered = self
            .handlers
            .get(&next_id)
            .and_then(|h| h.on_enter(&step.next, current, entity, ctx));
        let state = entered.unwrap_or_else(|| EntityState {
            data: step.next,
            entered_at: ctx.now,
            previous: Some(current_id),
        });

        Some(StateOutcome {
            state,
            changes: step.changes.merge(exit_changes),
            transitioned: Some((current_id, next_id)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::catalog::ActionId;
    use crate::entity::{ActorData, EntityBody, Intent};

    fn actor_entity(config: &SimulationConfig, state: StateData) -> Entity {
        let mut e = Entity::new(
            EntityId(1),
            Vec2::new(10.0, 10.0),
            EntityBody::Actor(ActorData::human(config, None)),
        );
        e.state = Some(EntityState::new(state, 0.0));
        e
    }

    fn ctx<'a>(config: &'a SimulationConfig, store: &'a EntityStore, metric: &'a Metric, now: Hours) -> StateContext<'a> {
        StateContext {
            now,
            dt: config.step_hours(),
            config,
            entities: store,
            metric,
        }
    }

    #[test]
    fn test_self_transition_keeps_entered_at() {
        let config = SimulationConfig::default();
        let store = EntityStore::new();
        let metric = Metric::from_config(&config);
        let registry = StateRegistry::with_defaults();

        let entity = actor_entity(&config, StateData::Idle);
        let outcome = registry
            .transition(&entity, &ctx(&config, &store, &metric, 5.0))
            .expect("idle has a handler");
        assert_eq!(outcome.state.id(), StateId::Idle);
        assert_eq!(outcome.state.entered_at, 0.0);
        assert_eq!(outcome.transitioned, None);
    }

    #[test]
    fn test_transition_sets_previous_and_entered_at() {
        let config = SimulationConfig::default();
        let store = EntityStore::new();
        let metric = Metric::from_config(&config);
        let registry = StateRegistry::with_defaults();

        let mut entity = actor_entity(&config, StateData::Idle);
        entity.intent = Intent::new(ActionId::MoveTo).with_position(Vec2::new(100.0, 10.0));
        let outcome = registry
            .transition(&entity, &ctx(&config, &store, &metric, 3.0))
            .expect("idle has a handler");
        assert_eq!(outcome.state.data, StateData::Moving { destination: Vec2::new(100.0, 10.0) });
        assert_eq!(outcome.state.entered_at, 3.0);
        assert_eq!(outcome.state.previous, Some(StateId::Idle));
        assert_eq!(outcome.transitioned, Some((StateId::Idle, StateId::Moving)));
    }

    #[test]
    fn test_missing_handler_holds_state() {
        let config = SimulationConfig::default();
        let store = EntityStore::new();
        let metric = Metric::from_config(&config);
        let mut registry = StateRegistry::with_defaults();
        assert!(registry.unregister(StateId::Idle));

        let entity = actor_entity(&config, StateData::Idle);
        assert!(registry.transition(&entity, &ctx(&config, &store, &metric, 1.0)).is_none());
    }

    #[test]
    fn test_transition_is_repeatable() {
        let config = SimulationConfig::default();
        let store = EntityStore::new();
        let metric = Metric::from_config(&config);
        let registry = StateRegistry::with_defaults();

        let mut entity = actor_entity(&config, StateData::Idle);
        entity.intent = Intent::new(ActionId::MoveTo).with_position(Vec2::new(50.0, 50.0));
        let c = ctx(&config, &store, &metric, 2.0);
        assert_eq!(registry.transition(&entity, &c), registry.transition(&entity, &c));
    }

    #[test]
    fn test_on_enter_and_exit_run_once_per_transition() {
        use std::cell::Cell;
        use std::rc::Rc;

        struct Counting {
            next: StateData,
            enters: Rc<Cell<u32>>,
            exits: Rc<Cell<u32>>,
        }

        impl StateHandler for Counting {
            fn update(&self, _: &EntityState, _: &Entity, _: &StateContext<'_>) -> StateStep {
                StateStep::to(self.next.clone())
            }
            fn on_enter(&self, _: &StateData, _: &EntityState, _: &Entity, _: &StateContext<'_>) -> Option<EntityState> {
                self.enters.set(self.enters.get() + 1);
                None
            }
            fn on_exit(&self, _: &EntityState, _: &Entity, _: &StateContext<'_>) -> EntityChanges {
                self.exits.set(self.exits.get() + 1);
                EntityChanges::none()
            }
        }

        let enters = Rc::new(Cell::new(0));
        let exits = Rc::new(Cell::new(0));
        let mut registry = StateRegistry::new();
        registry.register(
            StateId::Idle,
            Box::new(Counting { next: StateData::Ripe, enters: enters.clone(), exits: exits.clone() }),
        );
        registry.register(
            StateId::Ripe,
            Box::new(Counting { next: StateData::Ripe, enters: enters.clone(), exits: exits.clone() }),
        );

        let config = SimulationConfig::default();
        let store = EntityStore::new();
        let metric = Metric::from_config(&config);
        let c = ctx(&config, &store, &metric, 1.0);

        let mut entity = actor_entity(&config, StateData::Idle);
        let outcome = registry.transition(&entity, &c).expect("registered");
        assert_eq!((enters.get(), exits.get()), (1, 1));

        entity.state = Some(outcome.state);
        registry.transition(&entity, &c).expect("registered");
        assert_eq!((enters.get(), exits.get()), (1, 1));
    }

    #[test]
    fn test_changes_apply_eat_and_clamp() {
        let config = SimulationConfig::default();
        let mut entity = actor_entity(&config, StateData::Idle);
        if let Some(actor) = entity.actor_mut() {
            actor.needs.hunger = 50.0;
            actor.inventory.add(ResourceType::Food, 1);
        }
        let changes = EntityChanges { eat: 1, hitpoints: -500.0, ..Default::default() };
        changes.apply(&mut entity, &config);
        let actor = entity.actor().expect("actor");
        assert_eq!(actor.inventory.count(ResourceType::Food), 0);
        assert!((actor.needs.hunger - 20.0).abs() < 1e-4);
        assert!(actor.needs.is_dead());
    }
}
