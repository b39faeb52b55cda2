//! World - owns every entity and the shared decision state

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::ai::blackboard::BlackboardStore;
use crate::ai::keys;
use crate::coordination::TribeLedger;
use crate::core::calendar::Calendar;
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{EntityId, Hours, ResourceType, Vec2};
use crate::entity::body::STORAGE_CAPACITY;
use crate::entity::{
    ActorData, EntityBody, EntityKind, EntityStore, Inventory, MarkerData, MarkerKind,
    ProjectileData, ResourceData, StructureData, StructureKind,
};
use crate::spatial::{Metric, Property, SpatialIndex};
use crate::state::{EntityState, StateData, StateId};

/// The simulated world
///
/// Configuration travels with the world; nothing reads it from a global.
pub struct World {
    pub config: SimulationConfig,
    pub clock: Calendar,
    pub entities: EntityStore,
    pub spatial: SpatialIndex,
    pub blackboards: BlackboardStore,
    pub rng: ChaCha8Rng,
    /// Actor driven by the host instead of the AI
    pub player: Option<EntityId>,
    pub game_over: bool,
}

impl World {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let spatial = SpatialIndex::new(&config);
        Self {
            config,
            clock: Calendar::new(),
            entities: EntityStore::new(),
            spatial,
            blackboards: BlackboardStore::new(),
            rng,
            player: None,
            game_over: false,
        }
    }

    pub fn now(&self) -> Hours {
        self.clock.now()
    }

    pub fn metric(&self) -> Metric {
        *self.spatial.metric()
    }

    // === SPAWNING ===

    pub fn spawn_human(&mut self, pos: Vec2, tribe: Option<EntityId>) -> EntityId {
        let body = EntityBody::Actor(ActorData::human(&self.config, tribe));
        self.spawn_stateful(pos, body, StateData::Idle)
    }

    pub fn spawn_boar(&mut self, pos: Vec2) -> EntityId {
        let body = EntityBody::Actor(ActorData::boar(&self.config));
        self.spawn_stateful(pos, body, StateData::Idle)
    }

    pub fn spawn_bush(&mut self, pos: Vec2) -> EntityId {
        let body = EntityBody::ResourceSource(ResourceData::berry_bush(&self.config));
        self.spawn_stateful(pos, body, StateData::Ripe)
    }

    pub fn spawn_storage(&mut self, pos: Vec2, tribe: EntityId) -> EntityId {
        let pos = self.metric().wrap_position(pos);
        self.entities.spawn(
            pos,
            EntityBody::Structure(StructureData {
                kind: StructureKind::Storage,
                tribe: Some(tribe),
                stock: Inventory::new(STORAGE_CAPACITY),
            }),
            None,
        )
    }

    pub fn spawn_bonfire(&mut self, pos: Vec2, tribe: EntityId) -> EntityId {
        let pos = self.metric().wrap_position(pos);
        self.entities.spawn(
            pos,
            EntityBody::Structure(StructureData {
                kind: StructureKind::Bonfire,
                tribe: Some(tribe),
                stock: Inventory::new(0),
            }),
            None,
        )
    }

    pub fn spawn_marker(
        &mut self,
        kind: MarkerKind,
        pos: Vec2,
        owner: Option<EntityId>,
        expires_at: Option<Hours>,
    ) -> EntityId {
        let body = EntityBody::Marker(MarkerData { kind, owner, expires_at });
        self.spawn_stateful(pos, body, StateData::Fading { expires_at })
    }

    /// Spawn a human that leads a new tribe (its own id is the tribe id)
    pub fn found_tribe(&mut self, pos: Vec2) -> EntityId {
        let leader = self.spawn_human(pos, None);
        if let Some(actor) = self.entities.get_mut(leader).and_then(|e| e.actor_mut()) {
            actor.tribe = Some(leader);
        }
        self.blackboards
            .coordinator_mut(leader)
            .set(keys::TRIBE_LEDGER, TribeLedger::new());
        info!(%leader, "tribe founded");
        leader
    }

    /// Hand an actor to the host
    pub fn set_player(&mut self, id: EntityId) -> Result<()> {
        let actor = self
            .entities
            .try_get_mut(id)?
            .actor_mut()
            .ok_or(SimError::NotAnActor(id))?;
        actor.is_player = true;
        self.player = Some(id);
        Ok(())
    }

    /// Launch a spear from `owner` toward `target`
    ///
    /// Returns `None` when either end is missing or they overlap.
    pub fn throw_spear(&mut self, owner: EntityId, target: EntityId) -> Option<EntityId> {
        let from = self.entities.position(owner)?;
        let to = self.entities.position(target)?;
        let heading = self.metric().delta(from, to).normalize();
        if heading == Vec2::ZERO {
            return None;
        }

        let now = self.now();
        self.entities
            .get_mut(owner)
            .and_then(|e| e.actor_mut())?
            .last_throw_at = Some(now);

        let body = EntityBody::Projectile(ProjectileData {
            owner,
            origin: from,
            damage: self.config.spear_damage,
            max_range: self.config.spear_range,
        });
        let spear = self.spawn_stateful(from, body, StateData::Flying);
        if let Some(e) = self.entities.get_mut(spear) {
            e.velocity = heading * self.config.spear_speed;
            e.direction = heading;
        }
        Some(spear)
    }

    fn spawn_stateful(&mut self, pos: Vec2, body: EntityBody, state: StateData) -> EntityId {
        let pos = self.metric().wrap_position(pos);
        let state = EntityState::new(state, self.now());
        let id = self.entities.spawn(pos, body, Some(state));
        debug!(%id, ?pos, "spawned");
        id
    }

    // === COORDINATION ===

    /// Blackboard owner for `id`'s shared records: its tribe, else itself
    pub fn coordinator_of(&self, id: EntityId) -> EntityId {
        self.entities
            .get(id)
            .and_then(|e| e.tribe())
            .unwrap_or(id)
    }

    pub fn ledger(&self, coordinator: EntityId) -> Option<&TribeLedger> {
        self.blackboards
            .coordinator(coordinator)?
            .get(keys::TRIBE_LEDGER)
    }

    pub fn ledger_mut(&mut self, coordinator: EntityId) -> &mut TribeLedger {
        self.blackboards
            .coordinator_mut(coordinator)
            .get_or_insert_with(keys::TRIBE_LEDGER, TribeLedger::new)
    }

    /// Like [`World::ledger_mut`] but never creates a board
    pub fn ledger_mut_if_exists(&mut self, coordinator: EntityId) -> Option<&mut TribeLedger> {
        self.blackboards.coordinator(coordinator)?;
        self.blackboards
            .coordinator_mut(coordinator)
            .get_mut(keys::TRIBE_LEDGER)
    }

    /// Food held in the tribe's storage spots
    pub fn tribe_food_stock(&self, tribe: EntityId) -> u32 {
        self.spatial
            .by_property(EntityKind::Structure, Property::Tribe(tribe))
            .iter()
            .filter_map(|id| self.entities.get(*id)?.structure())
            .filter(|s| s.kind == StructureKind::Storage)
            .map(|s| s.stock.count(ResourceType::Food))
            .sum()
    }

    /// Members of a tribe still able to act
    pub fn tribe_has_members(&self, tribe: EntityId) -> bool {
        self.entities
            .iter()
            .any(|e| e.is_live() && e.actor().is_some_and(|a| a.tribe == Some(tribe)))
    }

    // === QUERIES ===

    pub fn distance_between(&self, a: EntityId, b: EntityId) -> Option<f32> {
        let pa = self.entities.position(a)?;
        let pb = self.entities.position(b)?;
        Some(self.metric().distance(pa, pb))
    }

    /// Live bush with at least one whole unit to pick
    pub fn is_ripe_bush(&self, id: EntityId) -> bool {
        self.entities.get(id).is_some_and(|e| {
            e.state_id() == Some(StateId::Ripe)
                && e.resource().is_some_and(|r| r.available_units() >= 1)
        })
    }

    /// Uniform point within `radius` of `center`, wrapped onto the map
    pub fn random_point_near(&mut self, center: Vec2, radius: f32) -> Vec2 {
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let dist = radius * self.rng.gen::<f32>().sqrt();
        let offset = Vec2::new(angle.cos(), angle.sin()) * dist;
        self.metric().wrap_position(center + offset)
    }

    /// Uniform point anywhere on the map
    pub fn random_point(&mut self) -> Vec2 {
        Vec2::new(
            self.rng.gen_range(0.0..self.config.world_width),
            self.rng.gen_range(0.0..self.config.world_height),
        )
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}
