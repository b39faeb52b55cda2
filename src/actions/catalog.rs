//! Action definitions and catalog
//!
//! An `ActionId` is what the AI layer writes into an entity's intent. The
//! state machine reads it to pick a physical mode, the interaction pass reads
//! it to decide which checker applies.

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;

/// Unique action identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionId {
    Wander,
    MoveTo,
    Flee,
    Rest,
    Eat,
    Gather,
    Deposit,
    Withdraw,
    Deliver,
    Attack,
    Throw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Movement,
    Survival,
    Work,
    Social,
    Combat,
}

impl ActionId {
    pub fn category(&self) -> ActionCategory {
        match self {
            ActionId::Wander | ActionId::MoveTo | ActionId::Flee => ActionCategory::Movement,
            ActionId::Rest | ActionId::Eat => ActionCategory::Survival,
            ActionId::Gather | ActionId::Deposit | ActionId::Withdraw => ActionCategory::Work,
            ActionId::Deliver => ActionCategory::Social,
            ActionId::Attack | ActionId::Throw => ActionCategory::Combat,
        }
    }

    /// Distance to the target at which the action can be performed.
    ///
    /// Movement actions use the arrival range; the rest use the range of the
    /// interaction they feed.
    pub fn reach(&self, config: &SimulationConfig) -> f32 {
        match self {
            ActionId::Wander | ActionId::MoveTo | ActionId::Rest | ActionId::Eat => {
                config.arrival_range
            }
            ActionId::Flee => 0.0,
            ActionId::Gather => config.gather_range,
            ActionId::Deposit | ActionId::Withdraw | ActionId::Deliver => config.exchange_range,
            ActionId::Attack => config.attack_range,
            ActionId::Throw => config.throw_range,
        }
    }

    /// Whether reaching the target ends the movement phase.
    ///
    /// Fleeing never "arrives": the target is what to run away from.
    pub fn approaches_target(&self) -> bool {
        !matches!(self, ActionId::Flee | ActionId::Rest | ActionId::Eat)
    }

    pub fn is_interruptible(&self) -> bool {
        !matches!(self, ActionId::Attack | ActionId::Throw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(ActionId::Gather.category(), ActionCategory::Work);
        assert_eq!(ActionId::Throw.category(), ActionCategory::Combat);
        assert_eq!(ActionId::Flee.category(), ActionCategory::Movement);
    }

    #[test]
    fn test_reach_uses_config_ranges() {
        let config = SimulationConfig::default();
        assert_eq!(ActionId::Gather.reach(&config), config.gather_range);
        assert_eq!(ActionId::Throw.reach(&config), config.throw_range);
        assert!(ActionId::Throw.reach(&config) > ActionId::Attack.reach(&config));
    }

    #[test]
    fn test_flee_never_approaches() {
        assert!(!ActionId::Flee.approaches_target());
        assert!(ActionId::Gather.approaches_target());
    }
}
