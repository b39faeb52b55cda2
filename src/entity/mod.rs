//! Entities: identity, kinematics, timed effects, state and intent
//!
//! Every entity is owned by the [`store::EntityStore`]; anything that needs
//! to refer to another entity holds its [`EntityId`].

pub mod body;
pub mod effects;
pub mod intent;
pub mod inventory;
pub mod needs;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Vec2};
use crate::state::{EntityState, StateId};

pub use body::{
    ActorData, DecisionStrategy, EntityBody, MarkerData, MarkerKind, ProjectileData,
    ResourceData, Species, StructureData, StructureKind,
};
pub use effects::{EffectKind, Effects, StatusEffect};
pub use intent::{Intent, Target};
pub use inventory::Inventory;
pub use needs::Needs;
pub use store::EntityStore;

/// Closed set of entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Actor,
    ResourceSource,
    Structure,
    Projectile,
    Marker,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Actor,
        EntityKind::ResourceSource,
        EntityKind::Structure,
        EntityKind::Projectile,
        EntityKind::Marker,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Facing, kept when the entity stops
    pub direction: Vec2,
    pub acceleration: Vec2,
    pub effects: Effects,
    /// Absent for passive entities (structures)
    pub state: Option<EntityState>,
    pub intent: Intent,
    pub body: EntityBody,
}

impl Entity {
    pub fn new(id: EntityId, position: Vec2, body: EntityBody) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            direction: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            effects: Effects::new(),
            state: None,
            intent: Intent::default(),
            body,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self.body {
            EntityBody::Actor(_) => EntityKind::Actor,
            EntityBody::ResourceSource(_) => EntityKind::ResourceSource,
            EntityBody::Structure(_) => EntityKind::Structure,
            EntityBody::Projectile(_) => EntityKind::Projectile,
            EntityBody::Marker(_) => EntityKind::Marker,
        }
    }

    pub fn state_id(&self) -> Option<StateId> {
        self.state.as_ref().map(|s| s.id())
    }

    /// Alive for the purpose of being targeted or acting
    pub fn is_live(&self) -> bool {
        match &self.body {
            EntityBody::Actor(actor) => {
                !actor.needs.is_dead() && self.state_id() != Some(StateId::Dying)
            }
            _ => true,
        }
    }

    pub fn actor(&self) -> Option<&ActorData> {
        match &self.body {
            EntityBody::Actor(a) => Some(a),
            _ => None,
        }
    }

    pub fn actor_mut(&mut self) -> Option<&mut ActorData> {
        match &mut self.body {
            EntityBody::Actor(a) => Some(a),
            _ => None,
        }
    }

    pub fn resource(&self) -> Option<&ResourceData> {
        match &self.body {
            EntityBody::ResourceSource(r) => Some(r),
            _ => None,
        }
    }

    pub fn resource_mut(&mut self) -> Option<&mut ResourceData> {
        match &mut self.body {
            EntityBody::ResourceSource(r) => Some(r),
            _ => None,
        }
    }

    pub fn structure(&self) -> Option<&StructureData> {
        match &self.body {
            EntityBody::Structure(s) => Some(s),
            _ => None,
        }
    }

    pub fn structure_mut(&mut self) -> Option<&mut StructureData> {
        match &mut self.body {
            EntityBody::Structure(s) => Some(s),
            _ => None,
        }
    }

    pub fn projectile(&self) -> Option<&ProjectileData> {
        match &self.body {
            EntityBody::Projectile(p) => Some(p),
            _ => None,
        }
    }

    pub fn marker(&self) -> Option<&MarkerData> {
        match &self.body {
            EntityBody::Marker(m) => Some(m),
            _ => None,
        }
    }

    /// Tribe the entity belongs to (actors, structures, owned markers)
    pub fn tribe(&self) -> Option<EntityId> {
        match &self.body {
            EntityBody::Actor(a) => a.tribe,
            EntityBody::Structure(s) => s.tribe,
            EntityBody::Marker(m) => m.owner,
            _ => None,
        }
    }
}
