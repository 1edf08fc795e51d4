// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

//! Plan reconstruction: detach the leaves of the original join subtree,
//! build the chosen join tree, re-attach predicates, and normalize join
//! conditions everywhere.

use std::mem;
use std::sync::Arc;

use bit_set::BitSet;

use super::relation_set::RelationSet;
use super::{JoinNode, JoinOrderOptimizer, OptimizeError};
use crate::binder::{BoundExpr, BoundUnaryOp};
use crate::optimizer::expr_utils::{flip_comparison, negate_comparison};
use crate::parser::UnaryOperator;
use crate::planner::{
    JoinCondition, JoinType, LogicalJoin, LogicalOperator, LogicalOperatorKind, LogicalPlan,
    PlanNodeId,
};

impl JoinOrderOptimizer {
    /// Replace the original join subtree under `root` with the tree
    /// described by `node`, and push every predicate that did not become
    /// a join condition back into the plan.
    pub(super) fn rewrite_plan(
        &mut self,
        plan: &mut LogicalPlan,
        root: PlanNodeId,
        node: &JoinNode,
    ) -> Result<PlanNodeId, OptimizeError> {
        let root_is_join = plan.node(root).children.len() > 1;

        // take ownership of every relation's subplan
        let mut extracted_relations: Vec<Option<PlanNodeId>> = Vec::new();
        for index in 0..self.relations.len() {
            let relation = self.relations[index];
            let parent = relation.parent.ok_or(OptimizeError::RelationNotFound)?;
            let detached = plan
                .detach_child(parent, relation.op)
                .ok_or(OptimizeError::RelationNotFound)?;
            extracted_relations.push(Some(detached));
        }

        let (_, mut join_tree) = self.generate_joins(plan, &mut extracted_relations, node)?;

        // any predicate still unconsumed lands in a filter above the
        // rebuilt subtree, so nothing is ever dropped
        for index in 0..self.filters.len() {
            if let Some(expr) = self.filters[index].take() {
                join_tree = push_filter(plan, join_tree, expr);
            }
        }

        if root_is_join {
            // the region started at the root, the rebuilt tree is the plan
            return Ok(resolve_join_conditions(plan, join_tree));
        }
        // descend the wrapper chain to the first join or cross product and
        // replace it with the rebuilt tree
        let mut op = root;
        loop {
            debug_assert_eq!(plan.node(op).children.len(), 1);
            let child = plan.node(op).children[0];
            if matches!(
                plan.node(child).kind,
                LogicalOperatorKind::Join(_) | LogicalOperatorKind::CrossProduct
            ) {
                plan.node_mut(op).children[0] = join_tree;
                break;
            }
            op = child;
        }
        Ok(resolve_join_conditions(plan, root))
    }

    /// Build the operator tree for one [`JoinNode`], returning the set of
    /// relations it covers and the root of the built subtree. Consumed
    /// predicates are moved out of the filter table; predicates covered
    /// by the subtree that did not become join conditions are pushed down
    /// here, as close to the relations they touch as possible.
    fn generate_joins(
        &mut self,
        plan: &mut LogicalPlan,
        extracted_relations: &mut [Option<PlanNodeId>],
        node: &JoinNode,
    ) -> Result<(Arc<RelationSet>, PlanNodeId), OptimizeError> {
        let result_relation;
        let mut result_operator;
        if let (Some(left), Some(right)) = (&node.left, &node.right) {
            let (left_set, left_op) = self.generate_joins(plan, extracted_relations, left)?;
            let (right_set, right_op) = self.generate_joins(plan, extracted_relations, right)?;

            if node.filters.is_empty() {
                // no filters, create a cross product
                result_operator = plan.add(LogicalOperator::with_children(
                    LogicalOperatorKind::CrossProduct,
                    vec![left_op, right_op],
                ));
            } else {
                let mut conditions = vec![];
                for &filter in &node.filters {
                    let info = &self.filter_infos[filter];
                    let condition = self.filters[info.filter_index]
                        .take()
                        .expect("join predicate consumed twice");
                    let left_filter_set = info
                        .left_set
                        .as_ref()
                        .expect("join predicate without operand sets");
                    let right_filter_set = info
                        .right_set
                        .as_ref()
                        .expect("join predicate without operand sets");
                    // orient the condition after the children: the side
                    // covering the filter's left operand becomes the
                    // condition's left expression
                    let invert = if left_filter_set.is_subset_of(&left_set)
                        && right_filter_set.is_subset_of(&right_set)
                    {
                        false
                    } else if right_filter_set.is_subset_of(&left_set)
                        && left_filter_set.is_subset_of(&right_set)
                    {
                        true
                    } else {
                        return Err(OptimizeError::FilterOrientation);
                    };
                    let BoundExpr::BinaryOp(comparison) = condition else {
                        unreachable!("graph edges only annotate comparisons")
                    };
                    let (left_expr, right_expr, operator) = if invert {
                        (
                            *comparison.right_expr,
                            *comparison.left_expr,
                            flip_comparison(comparison.op),
                        )
                    } else {
                        (*comparison.left_expr, *comparison.right_expr, comparison.op)
                    };
                    conditions.push(JoinCondition {
                        left: left_expr,
                        right: right_expr,
                        comparison: operator,
                    });
                }
                result_operator = plan.add(LogicalOperator::with_children(
                    LogicalOperatorKind::Join(LogicalJoin {
                        join_type: JoinType::Inner,
                        conditions,
                    }),
                    vec![left_op, right_op],
                ));
            }
            result_relation = self.set_manager.union(&left_set, &right_set);
        } else {
            // leaf node, take the extracted subplan for this relation
            debug_assert_eq!(node.set.count(), 1);
            result_relation = node.set.clone();
            result_operator = extracted_relations[node.set.relations()[0]]
                .take()
                .expect("relation placed twice in the join tree");
        }

        // any remaining predicate that is fully covered by this subtree
        // will never connect it to anything else, push it here; constant
        // predicates (empty set) wait for the final residual pass
        for index in 0..self.filter_infos.len() {
            let (filter_index, applies) = {
                let info = &self.filter_infos[index];
                (
                    info.filter_index,
                    !info.set.is_empty() && info.set.is_subset_of(&result_relation),
                )
            };
            if !applies {
                continue;
            }
            let Some(filter_expr) = self.filters[filter_index].take() else {
                continue;
            };
            // comparisons prefer the nearest join's expression list; the
            // resolve pass will normalize them into conditions
            if filter_expr.is_comparison() {
                if matches!(
                    plan.node(result_operator).kind,
                    LogicalOperatorKind::Join(_)
                ) {
                    plan.node_mut(result_operator).expressions.push(filter_expr);
                } else if matches!(plan.node(result_operator).kind, LogicalOperatorKind::Filter) {
                    let child = plan.node(result_operator).children[0];
                    if matches!(plan.node(child).kind, LogicalOperatorKind::Join(_)) {
                        plan.node_mut(child).expressions.push(filter_expr);
                    } else {
                        plan.node_mut(result_operator).expressions.push(filter_expr);
                    }
                } else {
                    result_operator = push_filter(plan, result_operator, filter_expr);
                }
            } else {
                result_operator = push_filter(plan, result_operator, filter_expr);
            }
        }
        Ok((result_relation, result_operator))
    }
}

/// Push an expression into a filter over `node`, reusing the filter that
/// is already there if any.
pub(super) fn push_filter(
    plan: &mut LogicalPlan,
    node: PlanNodeId,
    expr: BoundExpr,
) -> PlanNodeId {
    let filter = if matches!(plan.node(node).kind, LogicalOperatorKind::Filter) {
        node
    } else {
        plan.add(LogicalOperator::with_children(
            LogicalOperatorKind::Filter,
            vec![node],
        ))
    };
    plan.node_mut(filter).expressions.push(expr);
    filter
}

/// Collect the binder table indices produced by the subtree under `id`.
pub(super) fn get_table_references(plan: &LogicalPlan, id: PlanNodeId, bindings: &mut BitSet) {
    if let Some(table_index) = plan.node(id).table_index() {
        bindings.insert(table_index as usize);
    } else {
        for index in 0..plan.node(id).children.len() {
            get_table_references(plan, plan.node(id).children[index], bindings);
        }
    }
}

/// Which side of a join an expression's references fall on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinSide {
    None,
    Left,
    Right,
    Both,
}

fn combine_join_side(left: JoinSide, right: JoinSide) -> JoinSide {
    if left == JoinSide::None {
        return right;
    }
    if right == JoinSide::None {
        return left;
    }
    if left != right {
        return JoinSide::Both;
    }
    left
}

fn join_side(expr: &BoundExpr, left_bindings: &BitSet, right_bindings: &BitSet) -> JoinSide {
    match expr {
        BoundExpr::ColumnRef(column) => {
            if column.depth > 0 {
                // correlated column reference, we can't join on this
                return JoinSide::Both;
            }
            if left_bindings.contains(column.table_index as usize) {
                JoinSide::Left
            } else if right_bindings.contains(column.table_index as usize) {
                JoinSide::Right
            } else {
                JoinSide::Both
            }
        }
        BoundExpr::InputRef(_) => JoinSide::None,
        BoundExpr::Subquery(_) => JoinSide::Both,
        BoundExpr::Constant(_) => JoinSide::None,
        BoundExpr::BinaryOp(expr) => combine_join_side(
            join_side(&expr.left_expr, left_bindings, right_bindings),
            join_side(&expr.right_expr, left_bindings, right_bindings),
        ),
        BoundExpr::UnaryOp(expr) => join_side(&expr.expr, left_bindings, right_bindings),
    }
}

/// Normalize the remaining predicate expressions of every join into
/// structured conditions. One-sided predicates become filters below the
/// join, clean comparisons become conditions (flipped so the left
/// expression references the left input), `NOT` over a comparison is
/// negated away, and anything else becomes a filter above the join.
/// Returns the new top of the subtree, which differs from `id` when a
/// filter was placed above the join.
pub(super) fn resolve_join_conditions(plan: &mut LogicalPlan, id: PlanNodeId) -> PlanNodeId {
    for index in 0..plan.node(id).children.len() {
        let child = plan.node(id).children[index];
        let new_child = resolve_join_conditions(plan, child);
        plan.node_mut(id).children[index] = new_child;
    }
    if !matches!(plan.node(id).kind, LogicalOperatorKind::Join(_))
        || plan.node(id).expressions.is_empty()
    {
        return id;
    }
    let expressions = mem::take(&mut plan.node_mut(id).expressions);
    let mut left_bindings = BitSet::new();
    let mut right_bindings = BitSet::new();
    get_table_references(plan, plan.node(id).children[0], &mut left_bindings);
    get_table_references(plan, plan.node(id).children[1], &mut right_bindings);
    let mut result = id;
    for expr in expressions {
        result = create_join_condition(plan, result, id, expr, &left_bindings, &right_bindings);
    }
    result
}

/// Attach one predicate to the join at `join`. `result` is the current
/// top of the subtree (the join or a filter already placed above it);
/// the possibly updated top is returned.
fn create_join_condition(
    plan: &mut LogicalPlan,
    result: PlanNodeId,
    join: PlanNodeId,
    expr: BoundExpr,
    left_bindings: &BitSet,
    right_bindings: &BitSet,
) -> PlanNodeId {
    let total_side = join_side(&expr, left_bindings, right_bindings);
    if total_side != JoinSide::Both {
        // the predicate does not reference both sides, filter the side it
        // does reference
        let push_side = if total_side == JoinSide::Left { 0 } else { 1 };
        let child = plan.node(join).children[push_side];
        let new_child = push_filter(plan, child, expr);
        plan.node_mut(join).children[push_side] = new_child;
        return result;
    }
    match expr {
        BoundExpr::BinaryOp(comparison) if comparison.is_comparison() => {
            let left_side = join_side(&comparison.left_expr, left_bindings, right_bindings);
            let right_side = join_side(&comparison.right_expr, left_bindings, right_bindings);
            if left_side != JoinSide::Both && right_side != JoinSide::Both {
                // the comparison divides into a left and a right operand
                let (left, right, operator) = if left_side == JoinSide::Right {
                    (
                        *comparison.right_expr,
                        *comparison.left_expr,
                        flip_comparison(comparison.op),
                    )
                } else {
                    (*comparison.left_expr, *comparison.right_expr, comparison.op)
                };
                if let LogicalOperatorKind::Join(join_kind) = &mut plan.node_mut(join).kind {
                    join_kind.conditions.push(JoinCondition {
                        left,
                        right,
                        comparison: operator,
                    });
                }
                return result;
            }
            // some operand mixes both sides, keep it as a filter above
            push_filter(plan, result, BoundExpr::BinaryOp(comparison))
        }
        BoundExpr::UnaryOp(not_expr) if not_expr.op == UnaryOperator::Not => {
            // `ON NOT (x = 3)` is `ON (x <> 3)`: negating the comparison
            // keeps the condition usable for an equi-style join
            let BoundUnaryOp {
                op,
                expr: inner,
                return_type,
            } = not_expr;
            match *inner {
                BoundExpr::BinaryOp(mut comparison) => match negate_comparison(&comparison.op) {
                    Some(negated) => {
                        comparison.op = negated;
                        create_join_condition(
                            plan,
                            result,
                            join,
                            BoundExpr::BinaryOp(comparison),
                            left_bindings,
                            right_bindings,
                        )
                    }
                    None => push_filter(
                        plan,
                        result,
                        BoundExpr::UnaryOp(BoundUnaryOp {
                            op,
                            expr: Box::new(BoundExpr::BinaryOp(comparison)),
                            return_type,
                        }),
                    ),
                },
                other => push_filter(
                    plan,
                    result,
                    BoundExpr::UnaryOp(BoundUnaryOp {
                        op,
                        expr: Box::new(other),
                        return_type,
                    }),
                ),
            }
        }
        // two-sided but in no recognized shape, keep it as a filter above
        // the join
        other => push_filter(plan, result, other),
    }
}
