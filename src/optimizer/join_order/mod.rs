// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

//! Cost-based join-order selection.
//!
//! The optimizer collects the relations and predicates of a reorderable
//! join region, turns the predicates into edges of a query graph, and
//! searches for the cheapest join tree with the CSG-CMP dynamic
//! programming enumeration of Moerkotte and Neumann ("Dynamic Programming
//! Strikes Back"). When the pair budget runs out the search degrades to
//! greedy operator ordering. The winning tree replaces the original join
//! subtree; predicates are re-attached as join conditions or residual
//! filters without ever crossing a non-inner join, an aggregation or a
//! set operation.

pub mod query_graph;
pub mod relation_set;

mod enumerator;
mod rewriter;

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use bit_set::BitSet;
use tracing::debug;

use self::query_graph::QueryGraph;
use self::relation_set::{Relation, RelationSet, RelationSetManager};
use self::rewriter::resolve_join_conditions;
use crate::binder::BoundExpr;
use crate::optimizer::expr_utils::conjunctions;
use crate::planner::{JoinType, LogicalOperatorKind, LogicalPlan, PlanNodeId};

/// The error type of join-order optimization. Every variant is a
/// structural invariant violation; recoverable conditions (exploding
/// search space, disjoint query graphs, non-reorderable subtrees) are
/// handled internally and never surface.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum OptimizeError {
    #[error("relation not found under its recorded parent operator")]
    RelationNotFound,
    #[error("join filter matches neither orientation of the join children")]
    FilterOrientation,
    #[error("no join plan covers the complete relation set")]
    IncompletePlan,
}

/// Tuning knobs of the join-order search.
#[derive(Debug, Clone, Copy)]
pub struct JoinOrderConfig {
    /// How many CSG-CMP pairs the exact enumeration may emit before the
    /// search falls back to greedy operator ordering.
    pub pair_limit: usize,
    /// Place the side with the smaller cardinality as the right (build)
    /// child of every join.
    pub swap_build_side: bool,
}

impl Default for JoinOrderConfig {
    fn default() -> Self {
        JoinOrderConfig {
            pair_limit: 10_000,
            swap_build_side: true,
        }
    }
}

/// Per-predicate bookkeeping: the relations the whole predicate touches
/// and, for comparisons, the relations of each operand. The predicate
/// expression itself stays in the optimizer's filter table until it is
/// moved into the rewritten plan exactly once.
pub struct FilterInfo {
    pub filter_index: usize,
    pub set: Arc<RelationSet>,
    pub left_set: Option<Arc<RelationSet>>,
    pub right_set: Option<Arc<RelationSet>>,
}

/// A node of the dynamic-programming join tree. Leaves have no children
/// and cost zero; internal nodes remember the filter edges that connect
/// their inputs.
pub struct JoinNode {
    pub set: Arc<RelationSet>,
    /// Indices into the filter-info table, empty for a cross product.
    pub filters: Vec<usize>,
    pub left: Option<Arc<JoinNode>>,
    pub right: Option<Arc<JoinNode>>,
    pub cardinality: u64,
    pub cost: u64,
}

impl JoinNode {
    fn leaf(set: Arc<RelationSet>, cardinality: u64) -> Self {
        JoinNode {
            set,
            filters: vec![],
            left: None,
            right: None,
            cardinality,
            cost: 0,
        }
    }
}

/// Reorders the inner joins of one logical subplan.
///
/// An optimizer instance is cheap to build and must not be reused: all of
/// its tables are keyed to the relations discovered in one invocation.
/// `optimize` therefore consumes `self`.
pub struct JoinOrderOptimizer {
    config: JoinOrderConfig,
    /// The leaf participants, indexed by relation index.
    relations: Vec<Relation>,
    /// Binder table index to relation index.
    relation_mapping: HashMap<u32, usize>,
    /// Owning slots for the collected predicates; a slot is emptied when
    /// its predicate moves into the rewritten plan.
    filters: Vec<Option<BoundExpr>>,
    filter_infos: Vec<FilterInfo>,
    set_manager: RelationSetManager,
    query_graph: QueryGraph,
    /// Best join tree found so far for each exact relation set.
    plans: HashMap<Arc<RelationSet>, Arc<JoinNode>>,
    /// CSG-CMP pairs emitted so far, checked against the pair limit.
    pairs: usize,
}

impl Default for JoinOrderOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl JoinOrderOptimizer {
    pub fn new() -> Self {
        Self::with_config(JoinOrderConfig::default())
    }

    pub fn with_config(config: JoinOrderConfig) -> Self {
        JoinOrderOptimizer {
            config,
            relations: vec![],
            relation_mapping: HashMap::new(),
            filters: vec![],
            filter_infos: vec![],
            set_manager: RelationSetManager::default(),
            query_graph: QueryGraph::default(),
            plans: HashMap::new(),
            pairs: 0,
        }
    }

    /// Rewrite the plan so that its inner joins are ordered by estimated
    /// cost. The arena root is replaced with the rewritten subtree.
    pub fn optimize(mut self, plan: &mut LogicalPlan) -> Result<(), OptimizeError> {
        let root = plan.root();
        let new_root = self.optimize_subtree(plan, root)?;
        plan.set_root(new_root);
        Ok(())
    }

    fn sub_optimizer(&self) -> JoinOrderOptimizer {
        JoinOrderOptimizer::with_config(self.config)
    }

    fn optimize_subtree(
        &mut self,
        plan: &mut LogicalPlan,
        root: PlanNodeId,
    ) -> Result<PlanNodeId, OptimizeError> {
        debug_assert!(self.filters.is_empty() && self.relations.is_empty());
        // collect the relations to be joined and the operators whose
        // predicates may be redistributed
        let mut filter_operators = vec![];
        if !self.extract_join_relations(plan, root, None, &mut filter_operators)? {
            // this plan shape cannot be reordered
            return Ok(resolve_join_conditions(plan, root));
        }
        if self.relations.len() <= 1 {
            // at most one relation, nothing to reorder
            return Ok(resolve_join_conditions(plan, root));
        }
        debug!(relations = self.relations.len(), "reordering join region");
        // reordering will happen: take ownership of the predicates
        for op in filter_operators {
            for expr in mem::take(&mut plan.node_mut(op).expressions) {
                for conjunct in conjunctions(expr) {
                    self.filters.push(Some(conjunct));
                }
            }
        }
        self.build_query_graph();
        // seed the plans table with the single-relation leaves
        for index in 0..self.relations.len() {
            let set = self.set_manager.singleton(index);
            let cardinality = plan.estimate_cardinality(self.relations[index].op);
            self.plans
                .insert(set.clone(), Arc::new(JoinNode::leaf(set, cardinality)));
        }
        self.solve_join_order();
        let mut all = BitSet::new();
        for index in 0..self.relations.len() {
            all.insert(index);
        }
        let total_set = self.set_manager.from_bindings(&all);
        if !self.plans.contains_key(&total_set) {
            // the query graph is disjoint: connect every pair of
            // relations with cross-product edges and search again
            debug!("query graph is disjoint, generating cross products");
            self.generate_cross_products();
            self.solve_join_order();
        }
        let node = self
            .plans
            .get(&total_set)
            .cloned()
            .ok_or(OptimizeError::IncompletePlan)?;
        debug!(
            cost = node.cost,
            cardinality = node.cardinality,
            "join order selected"
        );
        self.rewrite_plan(plan, root, &node)
    }

    /// Walk the plan from `input_op` and record every relation of the
    /// reorderable region, together with the filter and inner-join
    /// operators whose predicates are redistribution candidates. Returns
    /// `false` when the region cannot be reordered; barriers (aggregates,
    /// set operations) and opaque blocks (non-inner joins, subqueries)
    /// have been optimized in place by then.
    fn extract_join_relations(
        &mut self,
        plan: &mut LogicalPlan,
        input_op: PlanNodeId,
        parent: Option<PlanNodeId>,
        filter_operators: &mut Vec<PlanNodeId>,
    ) -> Result<bool, OptimizeError> {
        let mut op = input_op;
        // prune through single-child wrappers
        loop {
            if plan.node(op).children.len() != 1
                || matches!(plan.node(op).kind, LogicalOperatorKind::Subquery(_))
            {
                break;
            }
            if matches!(plan.node(op).kind, LogicalOperatorKind::Filter) {
                // candidate join conditions
                filter_operators.push(op);
            }
            if matches!(plan.node(op).kind, LogicalOperatorKind::Aggregate) {
                // don't push predicates through aggregate and group by
                let child = plan.node(op).children[0];
                let new_child = self.sub_optimizer().optimize_subtree(plan, child)?;
                plan.node_mut(op).children[0] = new_child;
                return Ok(false);
            }
            op = plan.node(op).children[0];
        }
        if matches!(
            plan.node(op).kind,
            LogicalOperatorKind::Union | LogicalOperatorKind::Except | LogicalOperatorKind::Intersect
        ) {
            // set operation, optimize separately in children
            for index in 0..plan.node(op).children.len() {
                let child = plan.node(op).children[index];
                let new_child = self.sub_optimizer().optimize_subtree(plan, child)?;
                plan.node_mut(op).children[index] = new_child;
            }
            return Ok(false);
        }

        let join_type = match &plan.node(op).kind {
            LogicalOperatorKind::Join(join) => Some(join.join_type),
            _ => None,
        };
        match join_type {
            Some(JoinType::Inner) => {
                // extract join conditions from inner join
                filter_operators.push(op);
            }
            Some(_) => {
                // Non-inner joins are not reordered, and predicates must
                // not move through them: a pushed-down condition could see
                // NULL rows the join has not generated yet. Optimize both
                // children on their own and treat the whole join as one
                // opaque relation of the enclosing region.
                for index in 0..2 {
                    let child = plan.node(op).children[index];
                    let new_child = self.sub_optimizer().optimize_subtree(plan, child)?;
                    plan.node_mut(op).children[index] = new_child;
                }
                let mut bindings = BitSet::new();
                rewriter::get_table_references(plan, op, &mut bindings);
                for table_index in bindings.iter() {
                    self.relation_mapping
                        .insert(table_index as u32, self.relations.len());
                }
                self.relations.push(Relation {
                    op: input_op,
                    parent,
                });
                return Ok(true);
            }
            None => {}
        }

        if join_type.is_some() || matches!(plan.node(op).kind, LogicalOperatorKind::CrossProduct) {
            // inner join or cross product, expand the region into both sides
            let left = plan.node(op).children[0];
            let right = plan.node(op).children[1];
            if !self.extract_join_relations(plan, left, Some(op), filter_operators)? {
                return Ok(false);
            }
            if !self.extract_join_relations(plan, right, Some(op), filter_operators)? {
                return Ok(false);
            }
            return Ok(true);
        }

        if let Some(table_index) = plan.node(op).table_index() {
            if matches!(plan.node(op).kind, LogicalOperatorKind::Subquery(_)) {
                // the join order within the subquery is solved on its own
                let child = plan.node(op).children[0];
                let new_child = self.sub_optimizer().optimize_subtree(plan, child)?;
                plan.node_mut(op).children[0] = new_child;
            }
            self.relation_mapping
                .insert(table_index, self.relations.len());
            self.relations.push(Relation {
                op: input_op,
                parent,
            });
            return Ok(true);
        }
        Ok(false)
    }

    /// Collect the relation indices referenced by an expression into
    /// `bindings`. Returns `false` and leaves `bindings` empty when the
    /// expression must not participate in reordering: correlated column
    /// references, already-resolved positional slots, correlated
    /// subqueries, and references outside the binding map.
    fn extract_bindings(&self, expr: &BoundExpr, bindings: &mut BitSet) -> bool {
        match expr {
            BoundExpr::ColumnRef(column) => {
                if column.depth > 0 {
                    bindings.clear();
                    return false;
                }
                match self.relation_mapping.get(&column.table_index) {
                    Some(&relation) => {
                        bindings.insert(relation);
                        true
                    }
                    None => {
                        bindings.clear();
                        false
                    }
                }
            }
            BoundExpr::InputRef(_) => {
                bindings.clear();
                false
            }
            BoundExpr::Subquery(subquery) => {
                if subquery.is_correlated {
                    bindings.clear();
                    return false;
                }
                true
            }
            BoundExpr::Constant(_) => true,
            BoundExpr::BinaryOp(expr) => {
                self.extract_bindings(&expr.left_expr, bindings)
                    && self.extract_bindings(&expr.right_expr, bindings)
            }
            BoundExpr::UnaryOp(expr) => self.extract_bindings(&expr.expr, bindings),
        }
    }

    /// Turn every collected predicate into a [`FilterInfo`] and, where it
    /// is a comparison connecting two different relation sets, into edges
    /// of the query graph.
    fn build_query_graph(&mut self) {
        for index in 0..self.filters.len() {
            let mut bindings = BitSet::new();
            let mut sides = None;
            {
                let filter = self.filters[index]
                    .as_ref()
                    .expect("filter table slot consumed during analysis");
                self.extract_bindings(filter, &mut bindings);
                if let BoundExpr::BinaryOp(comparison) = filter {
                    if comparison.is_comparison() {
                        let mut left_bindings = BitSet::new();
                        let mut right_bindings = BitSet::new();
                        self.extract_bindings(&comparison.left_expr, &mut left_bindings);
                        self.extract_bindings(&comparison.right_expr, &mut right_bindings);
                        sides = Some((left_bindings, right_bindings));
                    }
                }
            }
            let set = self.set_manager.from_bindings(&bindings);
            self.filter_infos.push(FilterInfo {
                filter_index: index,
                set,
                left_set: None,
                right_set: None,
            });
            let info = self.filter_infos.len() - 1;
            let Some((left_bindings, right_bindings)) = sides else {
                continue;
            };
            if left_bindings.is_empty() || right_bindings.is_empty() {
                // one side is constant or unusable, keep as residual filter
                continue;
            }
            let left_set = self.set_manager.from_bindings(&left_bindings);
            let right_set = self.set_manager.from_bindings(&right_bindings);
            self.filter_infos[info].left_set = Some(left_set.clone());
            self.filter_infos[info].right_set = Some(right_set.clone());
            if Arc::ptr_eq(&left_set, &right_set) {
                // both sides touch exactly the same relations, useless as
                // a graph edge
                continue;
            }
            if left_bindings.is_disjoint(&right_bindings) {
                self.query_graph
                    .create_edge(left_set.clone(), right_set.clone(), Some(info));
                self.query_graph.create_edge(right_set, left_set, Some(info));
            } else {
                // overlapping sides, e.g. `a.x = a.x + b.y`: connect each
                // side with the part of the other side it does not cover,
                // so no self-loop appears
                let left_difference = self.set_manager.difference(&left_set, &right_set);
                let right_difference = self.set_manager.difference(&right_set, &left_set);
                if !right_difference.is_empty() {
                    self.query_graph
                        .create_edge(left_set.clone(), right_difference.clone(), Some(info));
                    self.query_graph
                        .create_edge(right_difference, left_set.clone(), Some(info));
                }
                if !left_difference.is_empty() {
                    self.query_graph
                        .create_edge(left_difference.clone(), right_set.clone(), Some(info));
                    self.query_graph
                        .create_edge(right_set, left_difference, Some(info));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
