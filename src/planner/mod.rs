// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

//! The logical plan and its operator nodes.
//!
//! Plans are stored in an arena: [`LogicalPlan`] owns every operator and
//! hands out stable [`PlanNodeId`]s, operators refer to their children by
//! id. The join-order optimizer rewrites a plan by detaching child ids
//! and appending new operators; nodes that drop out of the tree simply
//! become unreachable from the root.

mod operator;

pub use self::operator::*;

/// Stable index of an operator in the [`LogicalPlan`] arena.
pub type PlanNodeId = usize;

/// An arena of logical operators plus the id of the root.
#[derive(Debug, Default, Clone)]
pub struct LogicalPlan {
    nodes: Vec<LogicalOperator>,
    root: PlanNodeId,
}

impl LogicalPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operator and return its id.
    pub fn add(&mut self, op: LogicalOperator) -> PlanNodeId {
        self.nodes.push(op);
        self.nodes.len() - 1
    }

    pub fn node(&self, id: PlanNodeId) -> &LogicalOperator {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: PlanNodeId) -> &mut LogicalOperator {
        &mut self.nodes[id]
    }

    pub fn root(&self) -> PlanNodeId {
        self.root
    }

    pub fn set_root(&mut self, id: PlanNodeId) {
        self.root = id;
    }

    /// Remove `child` from `parent`'s child list. Returns the detached id,
    /// or `None` if `child` is not a child of `parent`.
    pub fn detach_child(&mut self, parent: PlanNodeId, child: PlanNodeId) -> Option<PlanNodeId> {
        let children = &mut self.nodes[parent].children;
        let position = children.iter().position(|&c| c == child)?;
        children.remove(position);
        Some(child)
    }

    /// Estimated output cardinality of the subtree rooted at `id`.
    ///
    /// Base relations report their stored estimate; the rest of the rule
    /// follows the shape of the operator. This is deliberately not a
    /// statistics subsystem.
    pub fn estimate_cardinality(&self, id: PlanNodeId) -> u64 {
        let op = self.node(id);
        let child = |index: usize| self.estimate_cardinality(op.children[index]);
        match &op.kind {
            LogicalOperatorKind::Get(get) => get.estimated_cardinality,
            LogicalOperatorKind::TableFunction(func) => func.estimated_cardinality,
            LogicalOperatorKind::Join(_) => child(0).max(child(1)),
            LogicalOperatorKind::CrossProduct => child(0).saturating_mul(child(1)),
            LogicalOperatorKind::Union => child(0).saturating_add(child(1)),
            _ if !op.children.is_empty() => child(0),
            _ => 1,
        }
    }

    /// Write explain string of the subtree rooted at `id`.
    pub fn explain(
        &self,
        id: PlanNodeId,
        level: usize,
        f: &mut dyn std::fmt::Write,
    ) -> std::fmt::Result {
        let op = self.node(id);
        writeln!(f, "{}{}", " ".repeat(level * 2), op)?;
        for &child in &op.children {
            self.explain(child, level + 1, f)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.explain(self.root, 0, f)
    }
}
