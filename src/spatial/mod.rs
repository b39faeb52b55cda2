//! Spatial index: per-kind partitions rebuilt once per step
//!
//! Each entity kind gets its own partition holding insertion-ordered ids, a
//! sparse hash grid for radius queries, and a property index for equality
//! lookups. Query results are always returned in insertion order.

pub mod sparse_hash;

use ahash::AHashMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::{EntityId, ResourceType, Vec2};
use crate::entity::{Entity, EntityBody, EntityKind, EntityStore, MarkerKind, Species, StructureKind};
use crate::state::StateId;

pub use sparse_hash::SparseHashGrid;

/// Distance rules of the map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    pub width: f32,
    pub height: f32,
    pub toroidal: bool,
}

impl Metric {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            width: config.world_width,
            height: config.world_height,
            toroidal: config.toroidal,
        }
    }

    pub fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        if self.toroidal {
            a.wrapped_distance(&b, self.width, self.height)
        } else {
            a.distance(&b)
        }
    }

    /// Shortest vector from `from` to `to`
    pub fn delta(&self, from: Vec2, to: Vec2) -> Vec2 {
        if self.toroidal {
            from.wrapped_delta(&to, self.width, self.height)
        } else {
            to - from
        }
    }

    /// Wrap onto the torus, or clamp to the edges of a bounded map
    pub fn wrap_position(&self, pos: Vec2) -> Vec2 {
        if self.toroidal {
            pos.wrap(self.width, self.height)
        } else {
            pos.clamp_to(self.width, self.height)
        }
    }
}

/// Indexed equality properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Property {
    Tribe(EntityId),
    Species(Species),
    Resource(ResourceType),
    Structure(StructureKind),
    Marker(MarkerKind),
    State(StateId),
    Owner(EntityId),
}

impl Property {
    /// Every indexed property of an entity
    pub fn of(entity: &Entity) -> Vec<Property> {
        let mut props = Vec::with_capacity(3);
        match &entity.body {
            EntityBody::Actor(actor) => {
                props.push(Property::Species(actor.species));
                if let Some(tribe) = actor.tribe {
                    props.push(Property::Tribe(tribe));
                }
            }
            EntityBody::ResourceSource(res) => props.push(Property::Resource(res.resource)),
            EntityBody::Structure(s) => {
                props.push(Property::Structure(s.kind));
                if let Some(tribe) = s.tribe {
                    props.push(Property::Tribe(tribe));
                }
            }
            EntityBody::Projectile(p) => props.push(Property::Owner(p.owner)),
            EntityBody::Marker(m) => {
                props.push(Property::Marker(m.kind));
                if let Some(owner) = m.owner {
                    props.push(Property::Owner(owner));
                }
            }
        }
        if let Some(state) = entity.state_id() {
            props.push(Property::State(state));
        }
        props
    }
}

#[derive(Debug, Clone)]
struct Partition {
    ids: Vec<EntityId>,
    grid: SparseHashGrid,
    properties: AHashMap<Property, Vec<EntityId>>,
}

impl Partition {
    fn new(cell_size: f32, metric: &Metric) -> Self {
        Self {
            ids: Vec::new(),
            grid: SparseHashGrid::new(cell_size, metric),
            properties: AHashMap::new(),
        }
    }

    fn clear(&mut self) {
        self.ids.clear();
        self.grid.clear();
        self.properties.clear();
    }
}

/// Per-step snapshot of where everything is
///
/// Entities queued for despawn are left out. Liveness (dying actors) is the
/// caller's concern; the index only answers "what is there".
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    metric: Metric,
    cell_size: f32,
    partitions: AHashMap<EntityKind, Partition>,
    positions: AHashMap<EntityId, Vec2>,
}

impl SpatialIndex {
    pub fn new(config: &SimulationConfig) -> Self {
        let metric = Metric::from_config(config);
        let cell_size = config.grid_cell_size;
        let partitions = EntityKind::ALL
            .iter()
            .map(|kind| (*kind, Partition::new(cell_size, &metric)))
            .collect();
        Self {
            metric,
            cell_size,
            partitions,
            positions: AHashMap::new(),
        }
    }

    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Replace the snapshot with the current contents of `store`
    pub fn rebuild(&mut self, store: &EntityStore) {
        for partition in self.partitions.values_mut() {
            partition.clear();
        }
        self.positions.clear();

        for entity in store.iter() {
            if store.is_pending_despawn(entity.id) {
                continue;
            }
            let Some(partition) = self.partitions.get_mut(&entity.kind()) else {
                continue;
            };
            partition.ids.push(entity.id);
            partition.grid.insert(entity.id, entity.position);
            for prop in Property::of(entity) {
                partition.properties.entry(prop).or_default().push(entity.id);
            }
            self.positions.insert(entity.id, entity.position);
        }
    }

    /// Every indexed entity of `kind`, in insertion order
    pub fn all(&self, kind: EntityKind) -> &[EntityId] {
        self.partitions
            .get(&kind)
            .map(|p| p.ids.as_slice())
            .unwrap_or(&[])
    }

    /// Entities of `kind` within `radius` of `point` (inclusive), insertion order
    pub fn by_radius(&self, kind: EntityKind, point: Vec2, radius: f32) -> Vec<EntityId> {
        let Some(partition) = self.partitions.get(&kind) else {
            return Vec::new();
        };
        let mut found = partition.grid.query_radius(point, radius, &self.metric);
        found.sort_unstable();
        found
    }

    /// Entities of `kind` carrying `property`, insertion order
    pub fn by_property(&self, kind: EntityKind, property: Property) -> &[EntityId] {
        self.partitions
            .get(&kind)
            .and_then(|p| p.properties.get(&property))
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.all(kind).len()
    }

    /// Position at the time of the last rebuild
    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.positions.get(&id).copied()
    }

    /// Closest entity of `kind` accepted by `filter`; ties go to the older id
    pub fn nearest<F>(&self, kind: EntityKind, point: Vec2, filter: F) -> Option<EntityId>
    where
        F: Fn(EntityId) -> bool,
    {
        self.all(kind)
            .iter()
            .copied()
            .filter(|id| filter(*id))
            .filter_map(|id| self.position(id).map(|pos| (id, pos)))
            .min_by_key(|(_, pos)| OrderedFloat(self.metric.distance(point, *pos)))
            .map(|(id, _)| id)
    }

    /// Like [`nearest`](Self::nearest), restricted to `radius`
    pub fn nearest_within<F>(
        &self,
        kind: EntityKind,
        point: Vec2,
        radius: f32,
        filter: F,
    ) -> Option<EntityId>
    where
        F: Fn(EntityId) -> bool,
    {
        self.by_radius(kind, point, radius)
            .into_iter()
            .filter(|id| filter(*id))
            .filter_map(|id| self.position(id).map(|pos| (id, pos)))
            .min_by_key(|(_, pos)| OrderedFloat(self.metric.distance(point, *pos)))
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ActorData, ResourceData};

    fn setup() -> (SimulationConfig, EntityStore) {
        let config = SimulationConfig::default();
        (config, EntityStore::new())
    }

    #[test]
    fn test_metric_wraps_only_when_toroidal() {
        let wrapped = Metric { width: 100.0, height: 100.0, toroidal: true };
        let bounded = Metric { toroidal: false, ..wrapped };
        let a = Vec2::new(1.0, 50.0);
        let b = Vec2::new(99.0, 50.0);
        assert!((wrapped.distance(a, b) - 2.0).abs() < 1e-4);
        assert!((bounded.distance(a, b) - 98.0).abs() < 1e-4);
        assert!((wrapped.delta(a, b).x + 2.0).abs() < 1e-4);
        assert_eq!(bounded.wrap_position(Vec2::new(-5.0, 120.0)), Vec2::new(0.0, 100.0));
        assert_eq!(wrapped.wrap_position(Vec2::new(-5.0, 120.0)), Vec2::new(95.0, 20.0));
    }

    #[test]
    fn test_by_radius_in_insertion_order() {
        let (config, mut store) = setup();
        let far = store.spawn(Vec2::new(10.0, 10.0), EntityBody::Actor(ActorData::boar(&config)), None);
        let b = store.spawn(Vec2::new(55.0, 50.0), EntityBody::Actor(ActorData::boar(&config)), None);
        let a = store.spawn(Vec2::new(50.0, 50.0), EntityBody::Actor(ActorData::boar(&config)), None);
        let bush = store.spawn(
            Vec2::new(50.0, 50.0),
            EntityBody::ResourceSource(ResourceData::berry_bush(&config)),
            None,
        );

        let mut index = SpatialIndex::new(&config);
        index.rebuild(&store);

        let found = index.by_radius(EntityKind::Actor, Vec2::new(50.0, 50.0), 5.0);
        assert_eq!(found, vec![b, a]);
        assert!(!found.contains(&far));
        assert_eq!(index.by_radius(EntityKind::ResourceSource, Vec2::new(50.0, 50.0), 0.0), vec![bush]);
        assert_eq!(index.count(EntityKind::Actor), 3);
        assert_eq!(index.all(EntityKind::Marker), &[] as &[EntityId]);
    }

    #[test]
    fn test_by_property() {
        let (config, mut store) = setup();
        let leader = store.spawn(Vec2::ZERO, EntityBody::Actor(ActorData::human(&config, None)), None);
        if let Some(actor) = store.get_mut(leader).and_then(|e| e.actor_mut()) {
            actor.tribe = Some(leader);
        }
        let member = store.spawn(
            Vec2::ZERO,
            EntityBody::Actor(ActorData::human(&config, Some(leader))),
            None,
        );
        let boar = store.spawn(Vec2::ZERO, EntityBody::Actor(ActorData::boar(&config)), None);

        let mut index = SpatialIndex::new(&config);
        index.rebuild(&store);

        assert_eq!(index.by_property(EntityKind::Actor, Property::Tribe(leader)), &[leader, member]);
        assert_eq!(index.by_property(EntityKind::Actor, Property::Species(Species::Boar)), &[boar]);
        assert!(index
            .by_property(EntityKind::Structure, Property::Tribe(leader))
            .is_empty());
    }

    #[test]
    fn test_pending_despawn_is_not_indexed() {
        let (config, mut store) = setup();
        let a = store.spawn(Vec2::ZERO, EntityBody::Actor(ActorData::boar(&config)), None);
        store.despawn(a);
        let mut index = SpatialIndex::new(&config);
        index.rebuild(&store);
        assert_eq!(index.count(EntityKind::Actor), 0);
    }

    #[test]
    fn test_nearest_prefers_older_on_tie() {
        let (config, mut store) = setup();
        let first = store.spawn(Vec2::new(10.0, 0.0), EntityBody::Actor(ActorData::boar(&config)), None);
        let second = store.spawn(Vec2::new(-10.0, 0.0), EntityBody::Actor(ActorData::boar(&config)), None);
        let mut index = SpatialIndex::new(&config);
        index.rebuild(&store);

        assert_eq!(index.nearest(EntityKind::Actor, Vec2::ZERO, |_| true), Some(first));
        assert_eq!(index.nearest(EntityKind::Actor, Vec2::ZERO, |id| id != first), Some(second));
        assert_eq!(index.nearest_within(EntityKind::Actor, Vec2::ZERO, 5.0, |_| true), None);
    }
}
