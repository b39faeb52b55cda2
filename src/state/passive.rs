//! States of non-actor entities: spears, bushes, markers

use crate::entity::Entity;
use crate::state::{
    EntityChanges, EntityState, StateContext, StateData, StateHandler, StateId, StateRegistry,
    StateStep,
};

pub(crate) fn register(registry: &mut StateRegistry) {
    registry.register(StateId::Flying, Box::new(FlyingState));
    registry.register(StateId::Ripe, Box::new(RipeState));
    registry.register(StateId::Depleted, Box::new(DepletedState));
    registry.register(StateId::Fading, Box::new(FadingState));
}

/// A thrown spear; removed once it has flown its range
pub struct FlyingState;

impl StateHandler for FlyingState {
    fn update(&self, _state: &EntityState, entity: &Entity, ctx: &StateContext<'_>) -> StateStep {
        let Some(spear) = entity.projectile() else {
            return StateStep::to(StateData::Flying);
        };
        let travelled = ctx.metric.distance(spear.origin, entity.position);
        let expired = travelled >= spear.max_range || entity.velocity.length() <= f32::EPSILON;
        StateStep::with(
            StateData::Flying,
            EntityChanges { despawn: expired, ..Default::default() },
        )
    }
}

fn regrowth(entity: &Entity, ctx: &StateContext<'_>) -> (f32, f32, f32) {
    match entity.resource() {
        Some(res) => {
            let regrow = (ctx.config.bush_regrow_per_hour * ctx.dt as f32).min(res.max_amount - res.amount);
            (res.amount, res.max_amount, regrow.max(0.0))
        }
        None => (0.0, 0.0, 0.0),
    }
}

/// Harvestable; drops to Depleted below one whole unit
pub struct RipeState;

impl StateHandler for RipeState {
    fn update(&self, _state: &EntityState, entity: &Entity, ctx: &StateContext<'_>) -> StateStep {
        let (amount, _, regrow) = regrowth(entity, ctx);
        let next = if amount + regrow < 1.0 {
            StateData::Depleted
        } else {
            StateData::Ripe
        };
        StateStep::with(next, EntityChanges { regrow, ..Default::default() })
    }
}

/// Regrowing; ripe again once full
pub struct DepletedState;

impl StateHandler for DepletedState {
    fn update(&self, _state: &EntityState, entity: &Entity, ctx: &StateContext<'_>) -> StateStep {
        let (amount, max, regrow) = regrowth(entity, ctx);
        let next = if amount + regrow >= max {
            StateData::Ripe
        } else {
            StateData::Depleted
        };
        StateStep::with(next, EntityChanges { regrow, ..Default::default() })
    }
}

pub struct FadingState;

impl StateHandler for FadingState {
    fn update(&self, state: &EntityState, _entity: &Entity, ctx: &StateContext<'_>) -> StateStep {
        let despawn = match state.data {
            StateData::Fading { expires_at: Some(at) } => ctx.now >= at,
            _ => false,
        };
        StateStep::with(state.data.clone(), EntityChanges { despawn, ..Default::default() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::{EntityId, Vec2};
    use crate::entity::{EntityBody, EntityStore, MarkerData, MarkerKind, ProjectileData, ResourceData};
    use crate::spatial::Metric;

    fn ctx<'a>(config: &'a SimulationConfig, store: &'a EntityStore, metric: &'a Metric, now: f64) -> StateContext<'a> {
        StateContext { now, dt: 1.0, config, entities: store, metric }
    }

    #[test]
    fn test_bush_cycle() {
        let config = SimulationConfig::default();
        let store = EntityStore::new();
        let metric = Metric::from_config(&config);
        let mut bush = Entity::new(
            EntityId(1),
            Vec2::ZERO,
            EntityBody::ResourceSource(ResourceData::berry_bush(&config)),
        );
        if let Some(res) = bush.resource_mut() {
            res.amount = 0.2;
        }
        let ripe = EntityState::new(StateData::Ripe, 0.0);
        let step = RipeState.update(&ripe, &bush, &ctx(&config, &store, &metric, 1.0));
        assert_eq!(step.next, StateData::Depleted);
        assert!((step.changes.regrow - config.bush_regrow_per_hour).abs() < 1e-4);

        if let Some(res) = bush.resource_mut() {
            res.amount = res.max_amount - 0.1;
        }
        let depleted = EntityState::new(StateData::Depleted, 0.0);
        let step = DepletedState.update(&depleted, &bush, &ctx(&config, &store, &metric, 2.0));
        assert_eq!(step.next, StateData::Ripe);
        assert!((step.changes.regrow - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_spear_expires_past_range() {
        let config = SimulationConfig::default();
        let store = EntityStore::new();
        let metric = Metric::from_config(&config);
        let mut spear = Entity::new(
            EntityId(1),
            Vec2::new(10.0, 0.0),
            EntityBody::Projectile(ProjectileData {
                owner: EntityId(2),
                origin: Vec2::ZERO,
                damage: 10.0,
                max_range: 50.0,
            }),
        );
        spear.velocity = Vec2::new(100.0, 0.0);
        let flying = EntityState::new(StateData::Flying, 0.0);
        assert!(!FlyingState.update(&flying, &spear, &ctx(&config, &store, &metric, 0.1)).changes.despawn);

        spear.position = Vec2::new(50.0, 0.0);
        assert!(FlyingState.update(&flying, &spear, &ctx(&config, &store, &metric, 0.2)).changes.despawn);
    }

    #[test]
    fn test_marker_fades_at_expiry() {
        let config = SimulationConfig::default();
        let store = EntityStore::new();
        let metric = Metric::from_config(&config);
        let marker = Entity::new(
            EntityId(1),
            Vec2::ZERO,
            EntityBody::Marker(MarkerData { kind: MarkerKind::Notice, owner: None, expires_at: Some(3.0) }),
        );
        let state = EntityState::new(StateData::Fading { expires_at: Some(3.0) }, 0.0);
        assert!(!FadingState.update(&state, &marker, &ctx(&config, &store, &metric, 2.0)).changes.despawn);
        assert!(FadingState.update(&state, &marker, &ctx(&config, &store, &metric, 3.0)).changes.despawn);

        let forever = EntityState::new(StateData::Fading { expires_at: None }, 0.0);
        assert!(!FadingState.update(&forever, &marker, &ctx(&config, &store, &metric, 1e6)).changes.despawn);
    }
}
