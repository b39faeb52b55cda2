//! Blackboard keys shared by the behaviors and the orchestrator

use crate::ai::behaviors::GatherPhase;
use crate::ai::blackboard::Key;
use crate::ai::bt::{CacheEntry, RunningSince};
use crate::coordination::TribeLedger;
use crate::core::types::{EntityId, Vec2};

/// Trace of the last tree evaluation (entity board)
pub const LAST_TRACE: Key<Vec<String>> = Key::new("last_trace");

/// Demands, supplies and tasks of a tribe (coordinator board)
pub const TRIBE_LEDGER: Key<TribeLedger> = Key::new("tribe_ledger");

// Targets
pub const FOOD_TARGET: Key<EntityId> = Key::new("food_target");
pub const PREY_TARGET: Key<EntityId> = Key::new("prey_target");
pub const STORE_TARGET: Key<EntityId> = Key::new("store_target");
pub const DELIVERY_TARGET: Key<EntityId> = Key::new("delivery_target");
pub const WANDER_TARGET: Key<Vec2> = Key::new("wander_target");

pub const GATHER_PHASE: Key<GatherPhase> = Key::new("gather_phase");

// Cached searches
pub const FOOD_SEARCH: Key<CacheEntry> = Key::new("food_search");
pub const PREY_SEARCH: Key<CacheEntry> = Key::new("prey_search");

// Running-since timers
pub const GATHER_STARTED: Key<RunningSince> = Key::new("gather_started");
pub const HUNT_STARTED: Key<RunningSince> = Key::new("hunt_started");
pub const DELIVERY_STARTED: Key<RunningSince> = Key::new("delivery_started");
