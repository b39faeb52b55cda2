//! Decorators: wrap one child and reshape or gate its result
//!
//! The stateful decorators (cache, timeout, capacity) keep their memory in
//! the entity blackboard under a key given at construction, so one tree
//! instance can serve every actor.

use serde::{Deserialize, Serialize};

use crate::ai::blackboard::Key;
use crate::ai::bt::{BehaviorContext, BehaviorNode, BoxedNode, Status};
use crate::coordination::TaskKind;
use crate::core::types::{EntityId, Hours};

/// Success ↔ Failure; everything else passes through
pub struct Inverter {
    child: BoxedNode,
}

impl Inverter {
    pub fn new(child: BoxedNode) -> Self {
        Self { child }
    }
}

impl BehaviorNode for Inverter {
    fn name(&self) -> &str {
        "Inverter"
    }

    fn execute(&self, ctx: &mut BehaviorContext<'_>) -> Status {
        match self.child.execute(ctx) {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
            other => other,
        }
    }
}

/// Runs the child for its side effects and always succeeds
pub struct Succeeder {
    child: BoxedNode,
}

impl Succeeder {
    pub fn new(child: BoxedNode) -> Self {
        Self { child }
    }
}

impl BehaviorNode for Succeeder {
    fn name(&self) -> &str {
        "Succeeder"
    }

    fn execute(&self, ctx: &mut BehaviorContext<'_>) -> Status {
        self.child.execute(ctx);
        Status::Success
    }
}

/// A remembered result and when it was computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub status: Status,
    pub computed_at: Hours,
}

/// Replays the child's last finished result until `cooldown` has passed
///
/// Running is never cached: an unfinished child is re-evaluated every step.
pub struct CachingNode {
    name: String,
    cooldown: Hours,
    key: Key<CacheEntry>,
    child: BoxedNode,
}

impl CachingNode {
    pub fn new(name: impl Into<String>, cooldown: Hours, key: Key<CacheEntry>, child: BoxedNode) -> Self {
        Self {
            name: name.into(),
            cooldown,
            key,
            child,
        }
    }
}

impl BehaviorNode for CachingNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: &mut BehaviorContext<'_>) -> Status {
        let now = ctx.now();
        if let Some(entry) = ctx.blackboard.get(self.key).copied() {
            if now - entry.computed_at < self.cooldown {
                ctx.record(&self.name, entry.status, "cached");
                return entry.status;
            }
        }

        let status = self.child.execute(ctx);
        if status == Status::Running {
            ctx.blackboard.remove(self.key);
        } else {
            ctx.blackboard.set(
                self.key,
                CacheEntry {
                    status,
                    computed_at: now,
                },
            );
        }
        status
    }
}

pub type TimeoutCleanup = fn(&mut BehaviorContext<'_>);

/// When a Running stretch began and when it was last seen Running
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunningSince {
    pub started: Hours,
    pub last_seen: Hours,
}

/// Fails a child that has been Running for longer than `duration`
///
/// Only continuous running counts. If the node was not evaluated on the
/// previous step (a higher-priority branch took over), the clock restarts.
pub struct TimeoutNode {
    name: String,
    duration: Hours,
    key: Key<RunningSince>,
    child: BoxedNode,
    on_timeout: Option<TimeoutCleanup>,
}

impl TimeoutNode {
    pub fn new(name: impl Into<String>, duration: Hours, key: Key<RunningSince>, child: BoxedNode) -> Self {
        Self {
            name: name.into(),
            duration,
            key,
            child,
            on_timeout: None,
        }
    }

    /// Run `cleanup` when the timeout fires, to drop the child's progress
    pub fn with_cleanup(mut self, cleanup: TimeoutCleanup) -> Self {
        self.on_timeout = Some(cleanup);
        self
    }
}

impl BehaviorNode for TimeoutNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: &mut BehaviorContext<'_>) -> Status {
        let now = ctx.now();
        let max_gap = ctx.config().step_hours() * 1.5;
        let status = self.child.execute(ctx);
        if status != Status::Running {
            ctx.blackboard.remove(self.key);
            return status;
        }

        let started = match ctx.blackboard.get(self.key).copied() {
            Some(since) if now - since.last_seen <= max_gap => since.started,
            _ => now,
        };
        if now - started > self.duration {
            ctx.blackboard.remove(self.key);
            if let Some(cleanup) = self.on_timeout {
                cleanup(ctx);
            }
            ctx.record(&self.name, Status::Failure, format!("running since {:.2}h", started));
            return Status::Failure;
        }
        ctx.blackboard.set(self.key, RunningSince { started, last_seen: now });
        status
    }
}

/// Lets at most `max_capacity` tribe members run the child on one target
///
/// The target id comes from the blackboard. Membership is registered in
/// the tribe's task registry before the child runs, refreshed while it is
/// Running and released when it finishes.
pub struct CapacityLimiter {
    name: String,
    kind: TaskKind,
    target_key: Key<EntityId>,
    max_capacity: usize,
    child: BoxedNode,
}

impl CapacityLimiter {
    pub fn new(
        name: impl Into<String>,
        kind: TaskKind,
        target_key: Key<EntityId>,
        max_capacity: usize,
        child: BoxedNode,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            target_key,
            max_capacity,
            child,
        }
    }
}

impl BehaviorNode for CapacityLimiter {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: &mut BehaviorContext<'_>) -> Status {
        let Some(target) = ctx.blackboard.get(self.target_key).copied() else {
            ctx.record(&self.name, Status::Failure, "no target");
            return Status::Failure;
        };

        let now = ctx.now();
        let timeout = ctx.config().task_timeout_hours;
        let me = ctx.entity;
        let coordinator = ctx.world.coordinator_of(me);

        let joined = ctx
            .world
            .ledger_mut(coordinator)
            .tasks
            .try_join(self.kind, target, me, self.max_capacity, now, timeout);
        if !joined {
            ctx.record(&self.name, Status::Failure, format!("{:?} on {} is full", self.kind, target));
            return Status::Failure;
        }

        let status = self.child.execute(ctx);
        let tasks = &mut ctx.world.ledger_mut(coordinator).tasks;
        match status {
            Status::Running => {
                tasks.refresh(self.kind, target, me, now);
            }
            _ => {
                tasks.leave(self.kind, target, me);
            }
        }
        status
    }
}
