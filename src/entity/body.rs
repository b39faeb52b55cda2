//! Per-kind entity payloads
//!
//! The body variant decides the entity's kind. Cross references (tribe,
//! owner) are ids into the entity store, never borrowed entities.

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::{EntityId, Hours, ResourceType, Vec2};
use crate::entity::inventory::Inventory;
use crate::entity::needs::Needs;

/// Storage spots hold far more than a pair of hands
pub const STORAGE_CAPACITY: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Species {
    Human,
    Boar,
}

/// Which decision layer runs an actor each step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionStrategy {
    /// Flat goal → action scoring
    Utility,
    /// Shared behavior tree plus blackboard memory
    BehaviorTree,
}

impl Species {
    pub fn strategy(&self) -> DecisionStrategy {
        match self {
            Species::Human => DecisionStrategy::BehaviorTree,
            Species::Boar => DecisionStrategy::Utility,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorData {
    pub species: Species,
    pub needs: Needs,
    /// Leader id of the actor's tribe; the leader is its own tribe
    pub tribe: Option<EntityId>,
    pub inventory: Inventory,
    /// Player-controlled actors are skipped by the AI; the host writes intent
    pub is_player: bool,
    pub speed: f32,
    pub damage: f32,
    pub last_strike_at: Option<Hours>,
    pub last_harvest_at: Option<Hours>,
    pub last_throw_at: Option<Hours>,
    /// Most recent attacker and when it struck
    pub last_attacker: Option<(EntityId, Hours)>,
}

impl ActorData {
    pub fn human(config: &SimulationConfig, tribe: Option<EntityId>) -> Self {
        Self {
            species: Species::Human,
            needs: Needs::new(config.human_max_hitpoints),
            tribe,
            inventory: Inventory::new(config.inventory_capacity),
            is_player: false,
            speed: config.human_speed,
            damage: config.human_attack_damage,
            last_strike_at: None,
            last_harvest_at: None,
            last_throw_at: None,
            last_attacker: None,
        }
    }

    pub fn boar(config: &SimulationConfig) -> Self {
        Self {
            species: Species::Boar,
            needs: Needs::new(config.boar_max_hitpoints),
            tribe: None,
            inventory: Inventory::new(1),
            is_player: false,
            speed: config.boar_speed,
            damage: config.boar_attack_damage,
            last_strike_at: None,
            last_harvest_at: None,
            last_throw_at: None,
            last_attacker: None,
        }
    }

    /// Attacker that struck within the threat memory window
    pub fn recent_attacker(&self, now: Hours, config: &SimulationConfig) -> Option<EntityId> {
        self.last_attacker
            .filter(|(_, at)| now - at <= config.threat_memory_hours)
            .map(|(id, _)| id)
    }

    pub fn cooldown_ready(last: Option<Hours>, now: Hours, cooldown: Hours) -> bool {
        last.map_or(true, |t| now - t >= cooldown)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    pub resource: ResourceType,
    pub amount: f32,
    pub max_amount: f32,
}

impl ResourceData {
    pub fn berry_bush(config: &SimulationConfig) -> Self {
        Self {
            resource: ResourceType::Food,
            amount: config.bush_max_food,
            max_amount: config.bush_max_food,
        }
    }

    /// Whole units that can be harvested right now
    pub fn available_units(&self) -> u32 {
        self.amount.max(0.0).floor() as u32
    }

    pub fn harvest(&mut self, units: u32) -> u32 {
        let taken = units.min(self.available_units());
        self.amount -= taken as f32;
        taken
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    Storage,
    Bonfire,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureData {
    pub kind: StructureKind,
    pub tribe: Option<EntityId>,
    pub stock: Inventory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileData {
    pub owner: EntityId,
    pub origin: Vec2,
    pub damage: f32,
    pub max_range: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    /// Where a tribe gathers when idle
    Waypoint,
    /// Purely informational (host annotations)
    Notice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerData {
    pub kind: MarkerKind,
    pub owner: Option<EntityId>,
    pub expires_at: Option<Hours>,
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityBody {
    Actor(ActorData),
    ResourceSource(ResourceData),
    Structure(StructureData),
    Projectile(ProjectileData),
    Marker(MarkerData),
}
