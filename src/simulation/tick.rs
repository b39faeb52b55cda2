//! Tick orchestrator - fixed-step driver of every system
//!
//! One step runs, in order:
//!
//! 1. rebuild the spatial index
//! 2. per entity (insertion order): needs and effects, state machine,
//!    movement
//! 3. AI per live actor: behavior tree or utility selector by species
//! 4. interaction pass
//! 5. coordination sweep, despawn flush, blackboard cleanup
//! 6. advance the clock
//! 7. terminal check (player death)
//!
//! `tick` feeds real elapsed time through an accumulator so every step sees
//! the same delta.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::ai::behaviors::human_tree;
use crate::ai::bt::{run_tree, BoxedNode};
use crate::ai::utility::UtilitySelector;
use crate::coordination::{sweep_stale, SweepReport};
use crate::core::config::SimulationConfig;
use crate::core::types::{EntityId, Tick};
use crate::ecs::world::World;
use crate::entity::{DecisionStrategy, EffectKind, StatusEffect};
use crate::interaction::InteractionTable;
use crate::simulation::movement;
use crate::state::{StateContext, StateId, StateRegistry};

/// Well-fed halves hunger gain
const WELL_FED_MAGNITUDE: f32 = 0.5;

/// Events generated during a tick, in the order they happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationEvent {
    StateChanged {
        entity: EntityId,
        from: StateId,
        to: StateId,
    },
    Despawned(EntityId),
    /// Coordination records removed by the stale sweep
    DemandsSwept(SweepReport),
    /// The player-controlled actor died
    GameOver { tick: Tick },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Fixed steps run by this call
    pub steps: u32,
    pub events: Vec<SimulationEvent>,
    pub game_over: bool,
}

/// Registries and trees shared by every entity
pub struct Systems {
    pub states: StateRegistry,
    pub utility: UtilitySelector,
    pub human_tree: BoxedNode,
    pub interactions: InteractionTable,
}

impl Systems {
    pub fn with_defaults(config: &SimulationConfig) -> Self {
        Self {
            states: StateRegistry::with_defaults(),
            utility: UtilitySelector::boar_defaults(),
            human_tree: human_tree(config),
            interactions: InteractionTable::with_defaults(),
        }
    }
}

pub struct Simulation {
    pub world: World,
    pub systems: Systems,
    /// Real seconds not yet consumed by a step
    accumulator: f32,
}

impl Simulation {
    pub fn new(world: World) -> Self {
        let systems = Systems::with_defaults(&world.config);
        Self::with_systems(world, systems)
    }

    pub fn with_systems(world: World, systems: Systems) -> Self {
        Self {
            world,
            systems,
            accumulator: 0.0,
        }
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Consume `real_dt` seconds of wall time in fixed steps
    ///
    /// `real_dt` is clamped to `max_frame_seconds` and at most
    /// `max_steps_per_tick` steps run; whatever is left carries over. A
    /// non-finite frame counts as no time at all.
    pub fn tick(&mut self, real_dt: f32) -> TickReport {
        let mut report = TickReport::default();
        if self.world.game_over {
            report.game_over = true;
            return report;
        }

        let step = self.world.config.fixed_step_seconds;
        let max_steps = self.world.config.max_steps_per_tick;
        let real_dt = if real_dt.is_finite() { real_dt } else { 0.0 };
        let real_dt = real_dt.clamp(0.0, self.world.config.max_frame_seconds);
        self.accumulator += real_dt;

        while self.accumulator >= step && report.steps < max_steps {
            self.accumulator -= step;
            report.steps += 1;
            run_step(&mut self.world, &self.systems, &mut report.events);
            if self.world.game_over {
                break;
            }
        }
        // Never bank more than one step's worth behind
        if report.steps == max_steps {
            self.accumulator = self.accumulator.min(step);
        }

        report.game_over = self.world.game_over;
        report
    }

    /// Run exactly one fixed step, ignoring the accumulator
    pub fn step(&mut self) -> Vec<SimulationEvent> {
        let mut events = Vec::new();
        if !self.world.game_over {
            run_step(&mut self.world, &self.systems, &mut events);
        }
        events
    }

    /// Run fixed steps until `hours` of simulated time have passed
    pub fn run_for_hours(&mut self, hours: f64) -> TickReport {
        let mut report = TickReport::default();
        let end = self.world.now() + hours;
        while self.world.now() < end && !self.world.game_over {
            report.events.extend(self.step());
            report.steps += 1;
        }
        report.game_over = self.world.game_over;
        report
    }
}

/// One fixed step over the whole world
#[instrument(skip_all, fields(tick = world.clock.current_tick()))]
pub fn run_step(world: &mut World, systems: &Systems, events: &mut Vec<SimulationEvent>) {
    let dt = world.config.step_hours();

    world.spatial.rebuild(&world.entities);
    physical_step(world, systems, dt, events);
    decide(world, systems);
    systems.interactions.run(world);
    cleanup(world, events);
    world.clock.advance(dt);
    check_terminal(world, events);
}

fn physical_step(world: &mut World, systems: &Systems, dt: f64, events: &mut Vec<SimulationEvent>) {
    let now = world.now();
    let metric = world.metric();

    for id in world.entities.ids() {
        if world.entities.is_pending_despawn(id) {
            continue;
        }
        if let Some(entity) = world.entities.get_mut(id) {
            movement::update_body(entity, now, dt, &world.config);
        }

        let outcome = {
            let Some(entity) = world.entities.get(id) else {
                continue;
            };
            let ctx = StateContext {
                now,
                dt,
                config: &world.config,
                entities: &world.entities,
                metric: &metric,
            };
            systems.states.transition(entity, &ctx)
        };

        let Some(entity) = world.entities.get_mut(id) else {
            continue;
        };
        let mut despawn = false;
        if let Some(outcome) = outcome {
            outcome.changes.apply(entity, &world.config);
            if outcome.changes.eat > 0 {
                entity.effects.apply(StatusEffect::new(
                    EffectKind::WellFed,
                    WELL_FED_MAGNITUDE,
                    now + world.config.well_fed_hours,
                ));
            }
            entity.state = Some(outcome.state);
            if let Some((from, to)) = outcome.transitioned {
                events.push(SimulationEvent::StateChanged { entity: id, from, to });
            }
            despawn = outcome.changes.despawn;
        }
        movement::integrate(entity, dt, &metric);
        if despawn {
            world.entities.despawn(id);
        }
    }
}

fn decide(world: &mut World, systems: &Systems) {
    for id in world.entities.ids() {
        if !world.entities.is_live(id) {
            continue;
        }
        let Some(strategy) = world
            .entities
            .get(id)
            .and_then(|e| e.actor())
            .filter(|a| !a.is_player)
            .map(|a| a.species.strategy())
        else {
            continue;
        };
        match strategy {
            DecisionStrategy::BehaviorTree => {
                run_tree(systems.human_tree.as_ref(), id, world);
            }
            DecisionStrategy::Utility => {
                systems.utility.run(id, world);
            }
        }
    }
}

fn cleanup(world: &mut World, events: &mut Vec<SimulationEvent>) {
    let swept = sweep_stale(world);
    if swept.total() > 0 {
        events.push(SimulationEvent::DemandsSwept(swept));
    }

    for id in world.entities.flush_despawns() {
        debug!(%id, "despawned");
        events.push(SimulationEvent::Despawned(id));
    }

    let entities = &world.entities;
    // A tribe's board lives as long as any member can still act
    let dropped = world.blackboards.retain_owners(
        |id| entities.contains(id),
        |tribe| {
            entities
                .iter()
                .any(|e| e.is_live() && e.actor().is_some_and(|a| a.tribe == Some(tribe)))
        },
    );
    if dropped > 0 {
        debug!(dropped, "blackboards released");
    }
}

fn check_terminal(world: &mut World, events: &mut Vec<SimulationEvent>) {
    let Some(player) = world.player else {
        return;
    };
    if world.game_over || world.entities.is_live(player) {
        return;
    }
    world.game_over = true;
    let tick = world.clock.current_tick();
    info!(%player, tick, "player died, game over");
    events.push(SimulationEvent::GameOver { tick });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;

    fn config() -> SimulationConfig {
        SimulationConfig::default()
    }

    #[test]
    fn test_large_frame_is_clamped() {
        let mut sim = Simulation::new(World::new(config()));
        let report = sim.tick(10.0);
        let cfg = &sim.world.config;
        let expected = (cfg.max_frame_seconds / cfg.fixed_step_seconds).floor() as u32;
        assert!(report.steps <= expected.min(cfg.max_steps_per_tick));
        assert!(report.steps >= 1);
    }

    #[test]
    fn test_leftover_time_carries_over() {
        let mut sim = Simulation::new(World::new(config()));
        let step = sim.world.config.fixed_step_seconds;
        assert_eq!(sim.tick(step * 0.6).steps, 0);
        assert_eq!(sim.tick(step * 0.6).steps, 1);
        assert!(sim.accumulator() < step);
    }

    #[test]
    fn test_non_finite_frame_is_ignored() {
        let mut sim = Simulation::new(World::new(config()));
        assert_eq!(sim.tick(f32::NAN).steps, 0);
        assert_eq!(sim.tick(f32::INFINITY).steps, 0);
        assert_eq!(sim.accumulator(), 0.0);

        let step = sim.world.config.fixed_step_seconds;
        assert_eq!(sim.tick(step * 2.5).steps, 2);
    }

    #[test]
    fn test_step_count_is_bounded() {
        let cfg = SimulationConfig {
            max_steps_per_tick: 2,
            ..config()
        };
        let mut sim = Simulation::new(World::new(cfg));
        assert_eq!(sim.tick(0.25).steps, 2);
    }

    #[test]
    fn test_clock_advances_per_step() {
        let mut sim = Simulation::new(World::new(config()));
        sim.step();
        sim.step();
        assert_eq!(sim.world.clock.current_tick(), 2);
        assert!((sim.world.now() - 2.0 * sim.world.config.step_hours()).abs() < 1e-9);
    }

    #[test]
    fn test_player_death_ends_game() {
        let mut world = World::new(config());
        let player = world.spawn_human(Vec2::new(10.0, 10.0), None);
        world.set_player(player).unwrap();
        world
            .entities
            .get_mut(player)
            .and_then(|e| e.actor_mut())
            .unwrap()
            .needs
            .hitpoints = 0.0;

        let mut sim = Simulation::new(world);
        let events = sim.step();
        assert!(sim.world.game_over);
        assert!(events.iter().any(|e| matches!(e, SimulationEvent::GameOver { .. })));
        assert!(sim.tick(1.0).game_over);
        assert_eq!(sim.tick(1.0).steps, 0);
    }

    #[test]
    fn test_player_is_not_driven_by_ai() {
        let mut world = World::new(config());
        let player = world.spawn_human(Vec2::new(10.0, 10.0), None);
        world.set_player(player).unwrap();
        let mut sim = Simulation::new(world);
        sim.step();
        assert!(sim.world.entities.get(player).unwrap().intent.is_idle());
    }

    #[test]
    fn test_bush_regrows_to_ripe() {
        let mut world = World::new(config());
        let bush = world.spawn_bush(Vec2::new(50.0, 50.0));
        world
            .entities
            .get_mut(bush)
            .and_then(|e| e.resource_mut())
            .unwrap()
            .amount = 0.0;
        let mut sim = Simulation::new(world);
        sim.step();
        assert_eq!(
            sim.world.entities.get(bush).unwrap().state_id(),
            Some(StateId::Depleted)
        );

        let hours = sim.world.config.bush_max_food as f64 / sim.world.config.bush_regrow_per_hour as f64;
        sim.run_for_hours(hours + 0.5);
        assert_eq!(sim.world.entities.get(bush).unwrap().state_id(), Some(StateId::Ripe));
    }
}
