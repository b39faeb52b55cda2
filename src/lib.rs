//! Tribal Mind - deterministic decision core for a tribal survival simulation
//!
//! Humans run a shared behavior tree and coordinate through their tribe's
//! ledger of demands, supplies and tasks; boars run a utility selector.
//! [`simulation::Simulation`] drives everything at a fixed step.

pub mod actions;
pub mod ai;
pub mod coordination;
pub mod core;
pub mod ecs;
pub mod entity;
pub mod interaction;
pub mod simulation;
pub mod spatial;
pub mod state;
