//! Intent fields written by the AI layer
//!
//! Intent is the only channel from decision-making to the physical layers:
//! the state machine, the movement integrator and the interaction pass all
//! read it, none of them write it back except to clear it.

use serde::{Deserialize, Serialize};

use crate::actions::catalog::ActionId;
use crate::core::types::{EntityId, Vec2};

/// What an action is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Target {
    Entity(EntityId),
    Position(Vec2),
}

impl Target {
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Target::Entity(id) => Some(*id),
            Target::Position(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub active_action: Option<ActionId>,
    pub target: Option<Target>,
    /// Desired heading, recomputed by the movement step from the target
    pub direction: Vec2,
}

impl Intent {
    pub fn new(action: ActionId) -> Self {
        Self {
            active_action: Some(action),
            target: None,
            direction: Vec2::ZERO,
        }
    }

    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.target = Some(Target::Entity(entity));
        self
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.target = Some(Target::Position(pos));
        self
    }

    pub fn is(&self, action: ActionId) -> bool {
        self.active_action == Some(action)
    }

    pub fn target_entity(&self) -> Option<EntityId> {
        self.target.and_then(|t| t.entity())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_idle(&self) -> bool {
        self.active_action.is_none()
    }
}
