//! Simulation driver: the physical step and the fixed-step tick loop

pub mod movement;
pub mod tick;

pub use tick::{run_step, Simulation, SimulationEvent, Systems, TickReport};
