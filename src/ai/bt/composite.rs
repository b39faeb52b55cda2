//! Sequence and Selector

use crate::ai::bt::{BehaviorContext, BehaviorNode, BoxedNode, Status};

/// Runs children in order until one does not succeed
pub struct Sequence {
    name: String,
    children: Vec<BoxedNode>,
}

impl Sequence {
    pub fn new(name: impl Into<String>, children: Vec<BoxedNode>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

impl BehaviorNode for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: &mut BehaviorContext<'_>) -> Status {
        for child in &self.children {
            match child.execute(ctx) {
                Status::Success => continue,
                other => return other,
            }
        }
        Status::Success
    }
}

/// Runs children in order until one does not fail
pub struct Selector {
    name: String,
    children: Vec<BoxedNode>,
}

impl Selector {
    pub fn new(name: impl Into<String>, children: Vec<BoxedNode>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

impl BehaviorNode for Selector {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: &mut BehaviorContext<'_>) -> Status {
        for child in &self.children {
            match child.execute(ctx) {
                Status::Failure => continue,
                other => return other,
            }
        }
        Status::Failure
    }
}
