//! Leaf nodes wrapping closures

use crate::ai::bt::{BehaviorContext, BehaviorNode, Status};

type ActionFn = Box<dyn Fn(&mut BehaviorContext<'_>) -> (Status, String)>;
type ConditionFn = Box<dyn Fn(&BehaviorContext<'_>) -> (bool, String)>;

/// Does something; returns a status plus a reason for the trace
pub struct ActionNode {
    name: String,
    run: ActionFn,
}

impl ActionNode {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut BehaviorContext<'_>) -> (Status, String) + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(run),
        }
    }
}

impl BehaviorNode for ActionNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: &mut BehaviorContext<'_>) -> Status {
        let (status, reason) = (self.run)(ctx);
        ctx.record(&self.name, status, reason);
        status
    }
}

/// Read-only test: `true` is Success, `false` is Failure
pub struct ConditionNode {
    name: String,
    check: ConditionFn,
}

impl ConditionNode {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&BehaviorContext<'_>) -> (bool, String) + 'static,
    {
        Self {
            name: name.into(),
            check: Box::new(check),
        }
    }
}

impl BehaviorNode for ConditionNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: &mut BehaviorContext<'_>) -> Status {
        let (passed, reason) = (self.check)(ctx);
        let status = if passed { Status::Success } else { Status::Failure };
        ctx.record(&self.name, status, reason);
        status
    }
}
