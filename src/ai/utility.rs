//! Goal/utility selector - flat decision layer for simple actors
//!
//! Two arg-max passes: every registered goal is scored, the best one wins
//! (first registered on ties), then every registered action is scored
//! against that goal alone. An action scoring 0 for the active goal never
//! runs, whatever it would score elsewhere. When nothing scores above 0 the
//! actor idles for the step.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::actions::catalog::ActionId;
use crate::core::types::EntityId;
use crate::ecs::world::World;
use crate::entity::{Entity, EntityKind, Intent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalKind {
    SatisfyHunger,
    MaintainHealth,
    GatherFood,
    Flee,
    Roam,
}

/// Scores how pressing a goal is, in [0, 1]
pub type GoalScorer = fn(&Entity, &World) -> f32;

/// Scores an action against the active goal, in [0, 1]
pub type ActionUtility = fn(&Entity, &World, GoalKind) -> f32;

/// Writes intent (and only intent) for the chosen action
pub type ActionExecute = fn(EntityId, &mut World);

#[derive(Clone, Copy)]
pub struct Goal {
    pub kind: GoalKind,
    pub scorer: GoalScorer,
}

#[derive(Clone, Copy)]
pub struct UtilityAction {
    pub name: &'static str,
    pub utility: ActionUtility,
    pub execute: ActionExecute,
}

/// Outcome of one selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub goal: GoalKind,
    pub goal_score: f32,
    /// `None` when no action scored above 0
    pub action: Option<&'static str>,
    pub action_score: f32,
}

/// Clamp a raw score into [0, 1]; NaN counts as 0
pub fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[derive(Default)]
pub struct UtilitySelector {
    goals: Vec<Goal>,
    actions: Vec<UtilityAction>,
}

impl UtilitySelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_goal(&mut self, kind: GoalKind, scorer: GoalScorer) {
        self.goals.push(Goal { kind, scorer });
    }

    pub fn register_action(&mut self, name: &'static str, utility: ActionUtility, execute: ActionExecute) {
        self.actions.push(UtilityAction { name, utility, execute });
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn actions(&self) -> &[UtilityAction] {
        &self.actions
    }

    /// Pick a goal and an action without touching the world
    ///
    /// `None` only when no goal is registered.
    pub fn select(&self, entity: &Entity, world: &World) -> Option<Decision> {
        let (goal, goal_score) = arg_max(self.goals.iter().map(|g| (g.kind, (g.scorer)(entity, world))))?;

        let best = arg_max(
            self.actions
                .iter()
                .map(|a| (a.name, (a.utility)(entity, world, goal))),
        )
        .filter(|(_, score)| *score > 0.0);

        Some(Decision {
            goal,
            goal_score,
            action: best.map(|(name, _)| name),
            action_score: best.map_or(0.0, |(_, score)| score),
        })
    }

    /// Select and execute for `id`
    ///
    /// An idle decision clears the actor's intent.
    pub fn run(&self, id: EntityId, world: &mut World) -> Option<Decision> {
        let decision = {
            let entity = world.entities.get(id)?;
            self.select(entity, world)?
        };

        let chosen = decision
            .action
            .and_then(|name| self.actions.iter().find(|a| a.name == name));
        match chosen {
            Some(action) => (action.execute)(id, world),
            None => {
                if let Some(e) = world.entities.get_mut(id) {
                    e.intent.clear();
                }
            }
        }
        trace!(entity = %id, goal = ?decision.goal, action = ?decision.action, "utility decision");
        Some(decision)
    }

    /// Goals and actions of a wild boar
    pub fn boar_defaults() -> Self {
        let mut selector = Self::new();
        selector.register_goal(GoalKind::SatisfyHunger, boar::hunger_goal);
        selector.register_goal(GoalKind::MaintainHealth, boar::health_goal);
        selector.register_goal(GoalKind::GatherFood, boar::gather_goal);
        selector.register_goal(GoalKind::Flee, boar::flee_goal);
        selector.register_goal(GoalKind::Roam, boar::roam_goal);

        selector.register_action("eat", boar::eat_utility, boar::eat);
        selector.register_action("forage", boar::forage_utility, boar::forage);
        selector.register_action("rest", boar::rest_utility, boar::rest);
        selector.register_action("flee", boar::flee_utility, boar::flee);
        selector.register_action("gore", boar::gore_utility, boar::gore);
        selector.register_action("roam", boar::roam_utility, boar::roam);
        selector
    }
}

/// Highest score wins; the earlier candidate keeps ties
fn arg_max<T>(candidates: impl Iterator<Item = (T, f32)>) -> Option<(T, f32)> {
    let mut best: Option<(T, f32)> = None;
    for (item, score) in candidates {
        let score = clamp_score(score);
        if best.as_ref().map_or(true, |(_, top)| score > *top) {
            best = Some((item, score));
        }
    }
    best
}

mod boar {
    use super::*;
    use crate::entity::Target;

    fn ripe_bush_within(entity: &Entity, world: &World, radius: f32) -> Option<EntityId> {
        world
            .spatial
            .nearest_within(EntityKind::ResourceSource, entity.position, radius, |id| {
                world.is_ripe_bush(id)
            })
    }

    fn live_attacker(entity: &Entity, world: &World) -> Option<EntityId> {
        let attacker = entity.actor()?.recent_attacker(world.now(), &world.config)?;
        let within = world
            .distance_between(entity.id, attacker)
            .is_some_and(|d| d <= world.config.perception_range);
        (world.entities.is_live(attacker) && within).then_some(attacker)
    }

    fn set_intent(id: EntityId, world: &mut World, intent: Intent) {
        if let Some(e) = world.entities.get_mut(id) {
            e.intent = intent;
        }
    }

    // === GOALS ===

    pub(super) fn hunger_goal(entity: &Entity, world: &World) -> f32 {
        entity
            .actor()
            .map_or(0.0, |a| a.needs.hunger / world.config.hunger_death)
    }

    pub(super) fn health_goal(entity: &Entity, _world: &World) -> f32 {
        entity.actor().map_or(0.0, |a| a.needs.injury())
    }

    pub(super) fn gather_goal(entity: &Entity, world: &World) -> f32 {
        if ripe_bush_within(entity, world, world.config.perception_range).is_none() {
            return 0.0;
        }
        0.25 * (1.0 - hunger_goal(entity, world))
    }

    pub(super) fn flee_goal(entity: &Entity, world: &World) -> f32 {
        if live_attacker(entity, world).is_some() {
            0.9
        } else {
            0.0
        }
    }

    pub(super) fn roam_goal(_entity: &Entity, _world: &World) -> f32 {
        0.1
    }

    // === ACTIONS ===

    pub(super) fn eat_utility(entity: &Entity, world: &World, goal: GoalKind) -> f32 {
        if ripe_bush_within(entity, world, world.config.gather_range).is_none() {
            return 0.0;
        }
        match goal {
            GoalKind::SatisfyHunger => 1.0,
            GoalKind::GatherFood => 0.9,
            _ => 0.0,
        }
    }

    pub(super) fn eat(id: EntityId, world: &mut World) {
        let Some(entity) = world.entities.get(id) else {
            return;
        };
        if let Some(bush) = ripe_bush_within(entity, world, world.config.gather_range) {
            set_intent(id, world, Intent::new(ActionId::Gather).with_entity(bush));
        }
    }

    pub(super) fn forage_utility(entity: &Entity, world: &World, goal: GoalKind) -> f32 {
        if ripe_bush_within(entity, world, world.config.perception_range).is_none() {
            return 0.0;
        }
        match goal {
            GoalKind::SatisfyHunger => 0.8,
            GoalKind::GatherFood => 0.6,
            _ => 0.0,
        }
    }

    pub(super) fn forage(id: EntityId, world: &mut World) {
        let Some(entity) = world.entities.get(id) else {
            return;
        };
        if let Some(bush) = ripe_bush_within(entity, world, world.config.perception_range) {
            set_intent(id, world, Intent::new(ActionId::MoveTo).with_entity(bush));
        }
    }

    pub(super) fn rest_utility(_entity: &Entity, _world: &World, goal: GoalKind) -> f32 {
        match goal {
            GoalKind::MaintainHealth => 1.0,
            GoalKind::Roam => 0.2,
            _ => 0.0,
        }
    }

    pub(super) fn rest(id: EntityId, world: &mut World) {
        set_intent(id, world, Intent::new(ActionId::Rest));
    }

    pub(super) fn flee_utility(entity: &Entity, world: &World, goal: GoalKind) -> f32 {
        if goal != GoalKind::Flee || live_attacker(entity, world).is_none() {
            return 0.0;
        }
        0.5 + 0.5 * health_goal(entity, world)
    }

    pub(super) fn flee(id: EntityId, world: &mut World) {
        let Some(attacker) = world.entities.get(id).and_then(|e| live_attacker(e, world)) else {
            return;
        };
        set_intent(id, world, Intent::new(ActionId::Flee).with_entity(attacker));
    }

    /// Turn on an attacker that is already close
    pub(super) fn gore_utility(entity: &Entity, world: &World, goal: GoalKind) -> f32 {
        if goal != GoalKind::Flee {
            return 0.0;
        }
        let Some(attacker) = live_attacker(entity, world) else {
            return 0.0;
        };
        let close = world
            .distance_between(entity.id, attacker)
            .is_some_and(|d| d <= world.config.attack_range * 2.0);
        if close {
            0.8 * (1.0 - health_goal(entity, world))
        } else {
            0.0
        }
    }

    pub(super) fn gore(id: EntityId, world: &mut World) {
        let Some(attacker) = world.entities.get(id).and_then(|e| live_attacker(e, world)) else {
            return;
        };
        set_intent(id, world, Intent::new(ActionId::Attack).with_entity(attacker));
    }

    pub(super) fn roam_utility(_entity: &Entity, _world: &World, goal: GoalKind) -> f32 {
        if goal == GoalKind::Roam {
            0.5
        } else {
            0.0
        }
    }

    /// Keep walking to the current point until it is reached
    pub(super) fn roam(id: EntityId, world: &mut World) {
        let Some((pos, current)) = world.entities.get(id).map(|e| (e.position, e.intent.clone())) else {
            return;
        };
        let arrival = world.config.arrival_range;
        let metric = world.metric();
        let ongoing = match current.target {
            Some(Target::Position(target)) if current.is(ActionId::Wander) => {
                metric.distance(pos, target) > arrival
            }
            _ => false,
        };
        if ongoing {
            return;
        }
        let radius = world.config.wander_radius;
        let target = world.random_point_near(pos, radius);
        set_intent(id, world, Intent::new(ActionId::Wander).with_position(target));
    }
}
