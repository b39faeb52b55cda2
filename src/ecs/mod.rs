//! World container and scenario setup

pub mod scenario;
pub mod world;

pub use scenario::Scenario;
pub use world::World;
