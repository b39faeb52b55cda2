//! Behavior tree engine
//!
//! Trees are built once and shared by every actor of a species. A node
//! holds no per-entity state: anything that has to survive between steps
//! (targets, phases, cached results, timers) lives in the entity's
//! blackboard, which the runner hands to the tree through
//! [`BehaviorContext`].
//!
//! Multi-step work is expressed by returning [`Status::Running`]; the next
//! step evaluates the tree from the root again and the action resumes from
//! whatever phase it stored.

pub mod composite;
pub mod decorator;
pub mod leaf;

use serde::{Deserialize, Serialize};

use crate::ai::blackboard::Blackboard;
use crate::ai::keys;
use crate::core::config::SimulationConfig;
use crate::core::types::{EntityId, Hours};
use crate::ecs::world::World;
use crate::entity::Entity;

pub use composite::{Selector, Sequence};
pub use decorator::{
    CacheEntry, CachingNode, CapacityLimiter, Inverter, RunningSince, Succeeder, TimeoutNode,
};
pub use leaf::{ActionNode, ConditionNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Success,
    Failure,
    Running,
    NotEvaluated,
}

/// Everything a node may read or change while evaluating one entity
pub struct BehaviorContext<'a> {
    pub entity: EntityId,
    pub world: &'a mut World,
    pub blackboard: &'a mut Blackboard,
    pub trace: &'a mut Vec<String>,
}

impl<'a> BehaviorContext<'a> {
    pub fn now(&self) -> Hours {
        self.world.now()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.world.config
    }

    /// The evaluated entity; `None` once it is gone
    pub fn me(&self) -> Option<&Entity> {
        self.world.entities.get(self.entity)
    }

    pub fn me_mut(&mut self) -> Option<&mut Entity> {
        self.world.entities.get_mut(self.entity)
    }

    pub fn record(&mut self, node: &str, status: Status, reason: impl AsRef<str>) {
        self.trace.push(format!("{}: {:?} ({})", node, status, reason.as_ref()));
    }
}

pub trait BehaviorNode {
    fn name(&self) -> &str;
    fn execute(&self, ctx: &mut BehaviorContext<'_>) -> Status;
}

pub type BoxedNode = Box<dyn BehaviorNode>;

/// Evaluate `tree` for `entity`, storing the trace in its blackboard
pub fn run_tree(tree: &dyn BehaviorNode, entity: EntityId, world: &mut World) -> Status {
    let mut board = world.blackboards.take(entity);
    let mut trace = Vec::new();
    let status = {
        let mut ctx = BehaviorContext {
            entity,
            world: &mut *world,
            blackboard: &mut board,
            trace: &mut trace,
        };
        tree.execute(&mut ctx)
    };
    board.set(keys::LAST_TRACE, trace);
    world.blackboards.put_back(entity, board);
    status
}
