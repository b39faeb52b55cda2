//! Physical step: needs, timed effects and a minimal movement integrator

use crate::core::config::SimulationConfig;
use crate::core::types::{Hours, Vec2};
use crate::entity::{EffectKind, Entity};
use crate::spatial::Metric;
use crate::state::StateData;

/// Advance hunger, health and effects of one entity by `dt`
pub fn update_body(entity: &mut Entity, now: Hours, dt: Hours, config: &SimulationConfig) {
    let hunger_scale = entity.effects.hunger_multiplier();
    let bleeding = entity.effects.magnitude(EffectKind::Bleeding);
    if let Some(actor) = entity.actor_mut() {
        if !actor.needs.is_dead() {
            actor.needs.decay_with(dt, hunger_scale, config);
            if bleeding > 0.0 {
                actor
                    .needs
                    .damage(config.bleed_damage_per_hour * bleeding * dt as f32);
            }
        }
    }
    entity.effects.expire(now);
}

/// Move an entity according to its state
///
/// Actors in `Moving` walk toward the destination without overshooting;
/// spears keep their velocity. Positions are wrapped (or clamped) after.
pub fn integrate(entity: &mut Entity, dt: Hours, metric: &Metric) {
    let dt = dt as f32;
    match entity.state.as_ref().map(|s| &s.data) {
        Some(StateData::Moving { destination }) => {
            let destination = *destination;
            let speed = entity
                .actor()
                .map_or(0.0, |a| a.speed)
                * entity.effects.speed_multiplier();
            let delta = metric.delta(entity.position, destination);
            let distance = delta.length();
            let heading = delta.normalize();
            let stride = speed * dt;

            if distance <= stride {
                entity.position = destination;
                entity.velocity = Vec2::ZERO;
            } else {
                entity.position = entity.position + heading * stride;
                entity.velocity = heading * speed;
            }
            if heading != Vec2::ZERO {
                entity.direction = heading;
                entity.intent.direction = heading;
            }
        }
        Some(StateData::Flying) => {
            entity.position = entity.position + entity.velocity * dt;
        }
        _ => {}
    }
    entity.position = metric.wrap_position(entity.position);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EntityId;
    use crate::entity::{ActorData, EntityBody, StatusEffect};
    use crate::state::EntityState;

    fn walker(config: &SimulationConfig, from: Vec2, to: Vec2) -> Entity {
        let mut e = Entity::new(EntityId(1), from, EntityBody::Actor(ActorData::human(config, None)));
        e.state = Some(EntityState::new(StateData::Moving { destination: to }, 0.0));
        e
    }

    #[test]
    fn test_walks_toward_destination() {
        let config = SimulationConfig::default();
        let metric = Metric::from_config(&config);
        let mut e = walker(&config, Vec2::new(10.0, 10.0), Vec2::new(100.0, 10.0));
        integrate(&mut e, 0.1, &metric);
        assert!((e.position.x - (10.0 + config.human_speed * 0.1)).abs() < 1e-3);
        assert!(e.velocity.x > 0.0);
    }

    #[test]
    fn test_does_not_overshoot() {
        let config = SimulationConfig::default();
        let metric = Metric::from_config(&config);
        let mut e = walker(&config, Vec2::new(10.0, 10.0), Vec2::new(12.0, 10.0));
        integrate(&mut e, 1.0, &metric);
        assert_eq!(e.position, Vec2::new(12.0, 10.0));
        assert_eq!(e.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_takes_short_way_round_on_torus() {
        let config = SimulationConfig::default();
        let metric = Metric::from_config(&config);
        let mut e = walker(&config, Vec2::new(1.0, 10.0), Vec2::new(395.0, 10.0));
        integrate(&mut e, 0.05, &metric);
        assert!(e.position.x > 390.0);
    }

    #[test]
    fn test_slowed_walker_is_slower() {
        let config = SimulationConfig::default();
        let metric = Metric::from_config(&config);
        let mut e = walker(&config, Vec2::new(10.0, 10.0), Vec2::new(100.0, 10.0));
        e.effects.apply(StatusEffect::new(EffectKind::Slowed, 0.5, 10.0));
        integrate(&mut e, 0.1, &metric);
        assert!((e.position.x - (10.0 + config.human_speed * 0.05)).abs() < 1e-3);
    }

    #[test]
    fn test_bleeding_hurts_and_expires() {
        let config = SimulationConfig::default();
        let mut e = walker(&config, Vec2::ZERO, Vec2::ZERO);
        e.effects.apply(StatusEffect::new(EffectKind::Bleeding, 1.0, 0.5));
        update_body(&mut e, 0.25, 0.25, &config);
        let hp = e.actor().unwrap().needs.hitpoints;
        assert!(hp < config.human_max_hitpoints);

        update_body(&mut e, 0.5, 0.25, &config);
        assert!(e.effects.is_empty());
    }
}
