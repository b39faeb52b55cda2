//! Survival needs that drive actor behavior

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::Hours;

/// Hunger and health of an actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    /// 0.0 = sated, `hunger_death` = starving (damage every hour)
    pub hunger: f32,
    pub hitpoints: f32,
    pub max_hitpoints: f32,
}

impl Needs {
    pub fn new(max_hitpoints: f32) -> Self {
        Self {
            hunger: 0.0,
            hitpoints: max_hitpoints,
            max_hitpoints,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hitpoints <= 0.0
    }

    pub fn is_hungry(&self, config: &SimulationConfig) -> bool {
        self.hunger >= config.hunger_hungry
    }

    pub fn is_starving(&self, config: &SimulationConfig) -> bool {
        self.hunger >= config.hunger_death
    }

    /// 0.0 at full health, 1.0 at zero hitpoints
    pub fn injury(&self) -> f32 {
        if self.max_hitpoints <= 0.0 {
            return 1.0;
        }
        (1.0 - self.hitpoints / self.max_hitpoints).clamp(0.0, 1.0)
    }

    /// Advance needs by `dt` hours (called every step)
    ///
    /// Hunger rises; at `hunger_death` the actor loses hitpoints, below
    /// `hunger_hungry` it slowly heals.
    pub fn decay(&mut self, dt: Hours, config: &SimulationConfig) {
        self.decay_with(dt, 1.0, config);
    }

    /// [`decay`](Self::decay) with hunger gain scaled by `hunger_scale`
    pub fn decay_with(&mut self, dt: Hours, hunger_scale: f32, config: &SimulationConfig) {
        let dt = dt as f32;
        let gain = config.hunger_per_hour * hunger_scale.max(0.0) * dt;
        self.hunger = (self.hunger + gain).min(config.hunger_death);

        if self.is_starving(config) {
            self.damage(config.starvation_damage_per_hour * dt);
        } else if !self.is_hungry(config) && !self.is_dead() {
            self.heal(config.health_regen_per_hour * dt);
        }
    }

    /// Eat `units` of food
    pub fn eat(&mut self, units: u32, config: &SimulationConfig) {
        self.hunger = (self.hunger - units as f32 * config.food_nutrition).max(0.0);
    }

    pub fn damage(&mut self, amount: f32) {
        self.hitpoints = (self.hitpoints - amount).max(0.0);
    }

    pub fn heal(&mut self, amount: f32) {
        self.hitpoints = (self.hitpoints + amount).min(self.max_hitpoints);
    }
}
