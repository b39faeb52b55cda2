//! Simulation configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other. Distances are world units, rates
//! are per simulated hour unless stated otherwise.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::Hours;

/// Configuration for the simulation systems
///
/// Loaded from TOML (every field optional, missing fields take the default)
/// and carried inside the `World`, never read through a global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === WORLD ===
    /// Seed for the world RNG (wander targets, scenario spawning)
    pub seed: u64,
    pub world_width: f32,
    pub world_height: f32,
    /// Whether the map wraps at its edges (distances and movement wrap too)
    pub toroidal: bool,

    // === SPATIAL SYSTEM ===
    /// Size of each cell in the spatial hash grid
    ///
    /// Radius queries scan every cell overlapping the query circle, so a cell
    /// of roughly 1/5 of the common query radius keeps per-query work small.
    pub grid_cell_size: f32,

    /// How far actors look for threats, prey and food
    pub perception_range: f32,

    // === TIME STEP ===
    /// Real seconds consumed by one fixed simulation step
    pub fixed_step_seconds: f32,

    /// Largest real delta accepted per `tick` call
    ///
    /// Slow frames are clamped to this so a hitch never produces a burst of
    /// sub-steps that would let entities skip through each other.
    pub max_frame_seconds: f32,

    /// Upper bound on sub-steps run by one `tick` call
    pub max_steps_per_tick: u32,

    /// Game speed: simulated hours per real second
    pub hours_per_second: f64,

    // === NEEDS ===
    /// Hunger gained per hour
    ///
    /// At 4.0 an actor goes from sated to `hunger_death` (100) in 25 hours.
    pub hunger_per_hour: f32,

    /// Hunger at which an actor starts taking starvation damage
    pub hunger_death: f32,

    /// Hunger above which actors look for food
    pub hunger_hungry: f32,

    /// Hunger above which a food request is raised at high priority
    pub hunger_critical: f32,

    pub starvation_damage_per_hour: f32,

    /// Hitpoints regained per hour while below `hunger_hungry`
    pub health_regen_per_hour: f32,

    pub human_max_hitpoints: f32,
    pub boar_max_hitpoints: f32,

    /// Hunger removed by eating one unit of food
    pub food_nutrition: f32,

    /// How long one meal takes
    pub eat_hours: Hours,

    /// Food units a human can carry
    pub inventory_capacity: u32,

    /// Carried food at which a human walks to storage to deposit
    pub store_threshold: u32,

    // === MOVEMENT ===
    pub human_speed: f32,
    pub boar_speed: f32,
    pub spear_speed: f32,

    /// Distance a thrown spear flies before it is removed
    pub spear_range: f32,

    /// Distance at which a move-to counts as arrived
    pub arrival_range: f32,

    // === INTERACTION RANGES ===
    pub gather_range: f32,
    pub attack_range: f32,
    pub throw_range: f32,
    pub exchange_range: f32,

    // === COMBAT ===
    pub human_attack_damage: f32,
    pub boar_attack_damage: f32,
    pub spear_damage: f32,
    pub attack_cooldown_hours: Hours,
    pub throw_cooldown_hours: Hours,

    /// How long an attacker stays "recent" for defend/flee decisions
    pub threat_memory_hours: Hours,

    /// Time spent in the Dying state before the entity is removed
    pub dying_hours: Hours,

    /// Food units a hunter collects from a boar it kills
    pub boar_food_yield: u32,

    /// Bleeding left by a melee strike (hitpoints per hour, duration)
    pub bleed_damage_per_hour: f32,
    pub bleed_hours: Hours,

    /// A spear hit slows the target by this fraction for `slow_hours`
    pub spear_slow: f32,
    pub slow_hours: Hours,

    /// Finishing a meal halves hunger gain for this long
    pub well_fed_hours: Hours,

    // === RESOURCES ===
    /// Time between two food units harvested from a bush
    pub harvest_interval_hours: Hours,
    pub bush_max_food: f32,
    pub bush_regrow_per_hour: f32,

    // === COORDINATION ===
    /// Demands untouched for longer than this are swept
    pub demand_stale_hours: Hours,

    /// Supply adverts untouched for longer than this are swept
    pub supply_stale_hours: Hours,

    /// Task participants not refreshed within this window lose their slot
    pub task_timeout_hours: Hours,

    pub max_gatherers_per_source: usize,
    pub max_hunters_per_prey: usize,

    /// Humans walking to one storage spot at the same time
    pub max_storage_users: usize,

    /// Tribe-wide stored food below which hunters go out
    pub tribe_food_low: u32,

    // === BEHAVIOR TUNING ===
    /// Cooldown of the cached nearest-bush search
    pub food_search_cooldown_hours: Hours,

    /// Cooldown of the cached prey search
    pub prey_search_cooldown_hours: Hours,

    pub gather_timeout_hours: Hours,
    pub hunt_timeout_hours: Hours,
    pub delivery_timeout_hours: Hours,

    /// How far idle actors stray from their anchor
    pub wander_radius: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            world_width: 400.0,
            world_height: 400.0,
            toroidal: true,

            // Spatial (perception_range / 6 = cell_size)
            grid_cell_size: 20.0,
            perception_range: 120.0,

            // 30 steps per real second, one simulated hour per real second
            fixed_step_seconds: 1.0 / 30.0,
            max_frame_seconds: 0.25,
            max_steps_per_tick: 16,
            hours_per_second: 1.0,

            // Needs
            hunger_per_hour: 4.0,
            hunger_death: 100.0,
            hunger_hungry: 40.0,
            hunger_critical: 75.0,
            starvation_damage_per_hour: 10.0,
            health_regen_per_hour: 2.0,
            human_max_hitpoints: 100.0,
            boar_max_hitpoints: 60.0,
            food_nutrition: 30.0,
            eat_hours: 0.25,
            inventory_capacity: 6,
            store_threshold: 5,

            // Movement
            human_speed: 60.0,
            boar_speed: 50.0,
            spear_speed: 400.0,
            spear_range: 120.0,
            arrival_range: 4.0,

            // Ranges
            gather_range: 6.0,
            attack_range: 5.0,
            throw_range: 60.0,
            exchange_range: 6.0,

            // Combat
            human_attack_damage: 12.0,
            boar_attack_damage: 10.0,
            spear_damage: 25.0,
            attack_cooldown_hours: 0.1,
            throw_cooldown_hours: 0.5,
            threat_memory_hours: 1.0,
            dying_hours: 1.0,
            boar_food_yield: 4,
            bleed_damage_per_hour: 6.0,
            bleed_hours: 0.5,
            spear_slow: 0.5,
            slow_hours: 0.5,
            well_fed_hours: 2.0,

            // Resources
            harvest_interval_hours: 0.1,
            bush_max_food: 10.0,
            bush_regrow_per_hour: 0.5,

            // Coordination
            demand_stale_hours: 12.0,
            supply_stale_hours: 24.0,
            task_timeout_hours: 2.0,
            max_gatherers_per_source: 2,
            max_hunters_per_prey: 3,
            max_storage_users: 3,
            tribe_food_low: 10,

            // Behavior tuning
            food_search_cooldown_hours: 1.0,
            prey_search_cooldown_hours: 0.5,
            gather_timeout_hours: 6.0,
            hunt_timeout_hours: 4.0,
            delivery_timeout_hours: 6.0,
            wander_radius: 40.0,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) TOML document and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Simulated hours covered by one fixed step
    pub fn step_hours(&self) -> Hours {
        self.fixed_step_seconds as f64 * self.hours_per_second
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.world_width <= 0.0 || self.world_height <= 0.0 {
            return Err(SimError::InvalidConfig(
                "world dimensions must be positive".into(),
            ));
        }

        if self.grid_cell_size <= 0.0 {
            return Err(SimError::InvalidConfig(
                "grid_cell_size must be positive".into(),
            ));
        }

        if self.fixed_step_seconds <= 0.0 {
            return Err(SimError::InvalidConfig(
                "fixed_step_seconds must be positive".into(),
            ));
        }

        // A clamp smaller than one step would never run a step
        if self.max_frame_seconds < self.fixed_step_seconds {
            return Err(SimError::InvalidConfig(format!(
                "max_frame_seconds ({}) should be >= fixed_step_seconds ({})",
                self.max_frame_seconds, self.fixed_step_seconds
            )));
        }

        if self.max_steps_per_tick == 0 {
            return Err(SimError::InvalidConfig(
                "max_steps_per_tick must be at least 1".into(),
            ));
        }

        // Thresholds should be ordered
        if !(self.hunger_hungry < self.hunger_critical
            && self.hunger_critical <= self.hunger_death)
        {
            return Err(SimError::InvalidConfig(format!(
                "hunger thresholds must satisfy hungry ({}) < critical ({}) <= death ({})",
                self.hunger_hungry, self.hunger_critical, self.hunger_death
            )));
        }

        if self.max_gatherers_per_source == 0
            || self.max_hunters_per_prey == 0
            || self.max_storage_users == 0
        {
            return Err(SimError::InvalidConfig(
                "task capacities must be at least 1".into(),
            ));
        }

        if self.store_threshold == 0 || self.store_threshold > self.inventory_capacity {
            return Err(SimError::InvalidConfig(format!(
                "store_threshold ({}) must be in 1..={}",
                self.store_threshold, self.inventory_capacity
            )));
        }

        let cooldowns = [
            self.food_search_cooldown_hours,
            self.prey_search_cooldown_hours,
            self.task_timeout_hours,
            self.demand_stale_hours,
            self.supply_stale_hours,
            self.attack_cooldown_hours,
            self.throw_cooldown_hours,
            self.harvest_interval_hours,
        ];
        if cooldowns.iter().any(|c| *c < 0.0) {
            return Err(SimError::InvalidConfig(
                "cooldowns and stale thresholds must not be negative".into(),
            ));
        }

        Ok(())
    }
}
