//! Decision layer: behavior trees, utility scoring and blackboard memory
//!
//! Both strategies read the world and write only intent (plus coordination
//! records); the physical layers act on that intent afterwards.

pub mod behaviors;
pub mod blackboard;
pub mod bt;
pub mod keys;
pub mod utility;

pub use blackboard::{Blackboard, BlackboardStore, Key};
pub use bt::{run_tree, BehaviorContext, BehaviorNode, BoxedNode, Status};
pub use utility::{Decision, GoalKind, UtilitySelector};
