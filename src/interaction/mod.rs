//! Interaction pass: in-range pairs acting on each other
//!
//! Interactions are grouped by `(source kind, target kind)`. For every source
//! entity, in insertion order, candidates come from the spatial index; the
//! exact range is re-checked against current positions (movement has run
//! since the index was built), then the pure `checker` decides and the
//! `perform` step applies side effects.

mod builtin;

use std::collections::BTreeMap;

use tracing::trace;

use crate::core::config::SimulationConfig;
use crate::core::types::EntityId;
use crate::ecs::world::World;
use crate::entity::{Entity, EntityKind};

pub type RangeFn = fn(&SimulationConfig) -> f32;
pub type Checker = fn(&Entity, &Entity, &World) -> bool;
pub type Performer = fn(EntityId, EntityId, &mut World);

#[derive(Clone, Copy)]
pub struct Interaction {
    pub name: &'static str,
    pub source: EntityKind,
    pub target: EntityKind,
    pub range: RangeFn,
    pub checker: Checker,
    pub perform: Performer,
}

/// Record of one performed interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Performed {
    pub name: &'static str,
    pub source: EntityId,
    pub target: EntityId,
}

#[derive(Default)]
pub struct InteractionTable {
    groups: BTreeMap<(EntityKind, EntityKind), Vec<Interaction>>,
}

impl InteractionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Harvest, strike, deposit, withdraw, hand-over and spear hit
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for interaction in builtin::all() {
            table.register(interaction);
        }
        table
    }

    pub fn register(&mut self, interaction: Interaction) {
        self.groups
            .entry((interaction.source, interaction.target))
            .or_default()
            .push(interaction);
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn for_source(&self, kind: EntityKind) -> impl Iterator<Item = &Interaction> {
        self.groups
            .iter()
            .filter(move |((source, _), _)| *source == kind)
            .flat_map(|(_, list)| list.iter())
    }

    /// Run every interaction once over the world
    pub fn run(&self, world: &mut World) -> Vec<Performed> {
        let slack = travel_slack(&world.config);
        let metric = world.metric();
        let mut performed = Vec::new();

        for source in world.entities.ids() {
            let Some(kind) = world.entities.get(source).map(|e| e.kind()) else {
                continue;
            };
            for interaction in self.for_source(kind) {
                let range = (interaction.range)(&world.config);
                let Some(origin) = world.entities.position(source) else {
                    break;
                };
                let candidates = world
                    .spatial
                    .by_radius(interaction.target, origin, range + slack);

                for target in candidates {
                    if target == source || !world.entities.is_live(source) {
                        continue;
                    }
                    if !world.entities.is_live(target) {
                        continue;
                    }
                    let (Some(src), Some(dst)) = (world.entities.get(source), world.entities.get(target)) else {
                        continue;
                    };
                    if metric.distance(src.position, dst.position) > range {
                        continue;
                    }
                    if !(interaction.checker)(src, dst, world) {
                        continue;
                    }
                    (interaction.perform)(source, target, world);
                    trace!(interaction = interaction.name, %source, %target, "performed");
                    performed.push(Performed {
                        name: interaction.name,
                        source,
                        target,
                    });
                }
            }
        }
        performed
    }
}

/// Farthest anything moves in one step
fn travel_slack(config: &SimulationConfig) -> f32 {
    let fastest = config.human_speed.max(config.boar_speed).max(config.spear_speed);
    fastest * config.step_hours() as f32
}
