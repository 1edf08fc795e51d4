// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

use super::*;
use crate::binder::BoundExpr;
use crate::parser::BinaryOperator;
use crate::planner::{LogicalGet, LogicalOperator, LogicalPlan};
use crate::types::{DataTypeExt, DataTypeKind};

fn table(plan: &mut LogicalPlan, table_index: u32, cardinality: u64) -> PlanNodeId {
    plan.add(LogicalOperator::new(LogicalOperatorKind::Get(LogicalGet {
        table_index,
        estimated_cardinality: cardinality,
    })))
}

fn eq(left_table: u32, right_table: u32) -> BoundExpr {
    BoundExpr::comparison(
        BinaryOperator::Eq,
        BoundExpr::column_ref(left_table, 0),
        BoundExpr::column_ref(right_table, 0),
    )
}

/// `n` relations, a predicate between every pair, all cross-producted
/// under one filter.
fn clique(n: u32) -> LogicalPlan {
    let mut plan = LogicalPlan::new();
    let mut region = table(&mut plan, 0, 100);
    for index in 1..n {
        let next = table(&mut plan, index, 100 + index as u64);
        region = plan.add(LogicalOperator::with_children(
            LogicalOperatorKind::CrossProduct,
            vec![region, next],
        ));
    }
    let filter = plan.add(LogicalOperator::with_children(
        LogicalOperatorKind::Filter,
        vec![region],
    ));
    for left in 0..n {
        for right in left + 1..n {
            plan.node_mut(filter).expressions.push(eq(left, right));
        }
    }
    let root = plan.add(LogicalOperator::with_children(
        LogicalOperatorKind::Projection,
        vec![filter],
    ));
    plan.set_root(root);
    plan
}

fn count_leaves(plan: &LogicalPlan, id: PlanNodeId) -> usize {
    if matches!(plan.node(id).kind, LogicalOperatorKind::Get(_)) {
        return 1;
    }
    plan.node(id)
        .children
        .iter()
        .map(|&child| count_leaves(plan, child))
        .sum()
}

fn count_predicates(plan: &LogicalPlan, id: PlanNodeId) -> usize {
    let op = plan.node(id);
    let mut count = op.expressions.len();
    if let LogicalOperatorKind::Join(join) = &op.kind {
        count += join.conditions.len();
    }
    count
        + op.children
            .iter()
            .map(|&child| count_predicates(plan, child))
            .sum::<usize>()
}

/// `n` relations with a predicate between each consecutive pair.
fn chain(n: u32) -> LogicalPlan {
    let mut plan = LogicalPlan::new();
    let mut region = table(&mut plan, 0, 100);
    for index in 1..n {
        let next = table(&mut plan, index, 100 + index as u64);
        region = plan.add(LogicalOperator::with_children(
            LogicalOperatorKind::CrossProduct,
            vec![region, next],
        ));
    }
    let filter = plan.add(LogicalOperator::with_children(
        LogicalOperatorKind::Filter,
        vec![region],
    ));
    for index in 0..n - 1 {
        plan.node_mut(filter).expressions.push(eq(index, index + 1));
    }
    let root = plan.add(LogicalOperator::with_children(
        LogicalOperatorKind::Projection,
        vec![filter],
    ));
    plan.set_root(root);
    plan
}

#[test]
fn ten_relation_chain_stays_within_pair_budget() {
    let mut plan = chain(10);
    let root = plan.root();
    let mut optimizer = JoinOrderOptimizer::new();
    let new_root = optimizer.optimize_subtree(&mut plan, root).unwrap();
    // the exact phase finished, the greedy fallback never ran
    assert!(optimizer.pairs < optimizer.config.pair_limit);
    assert_eq!(count_leaves(&plan, new_root), 10);
    assert_eq!(count_predicates(&plan, new_root), 9);
}

#[test]
fn twelve_clique_falls_back_to_greedy() {
    let mut plan = clique(12);
    let root = plan.root();
    let mut optimizer = JoinOrderOptimizer::new();
    let new_root = optimizer.optimize_subtree(&mut plan, root).unwrap();
    assert!(optimizer.pairs >= optimizer.config.pair_limit);
    // the greedy phase still produces a complete plan with every
    // relation and every predicate in place
    assert_eq!(count_leaves(&plan, new_root), 12);
    assert_eq!(count_predicates(&plan, new_root), 12 * 11 / 2);
}

#[test]
fn tiny_pair_limit_forces_greedy() {
    let mut plan = clique(4);
    let root = plan.root();
    let mut optimizer = JoinOrderOptimizer::with_config(JoinOrderConfig {
        pair_limit: 2,
        ..JoinOrderConfig::default()
    });
    let new_root = optimizer.optimize_subtree(&mut plan, root).unwrap();
    assert_eq!(count_leaves(&plan, new_root), 4);
    assert_eq!(count_predicates(&plan, new_root), 6);
}

#[test]
fn overlapping_comparison_sides_are_a_structural_error() {
    // a.x = a.x + b.y connects the two relations in the graph, but the
    // predicate itself cannot be oriented over the join
    let mut plan = LogicalPlan::new();
    let t0 = table(&mut plan, 0, 100);
    let t1 = table(&mut plan, 1, 10);
    let join = plan.add(LogicalOperator::with_children(
        crate::planner::LogicalJoin::inner(),
        vec![t0, t1],
    ));
    let sum = BoundExpr::BinaryOp(crate::binder::BoundBinaryOp {
        op: BinaryOperator::Plus,
        left_expr: Box::new(BoundExpr::column_ref(0, 0)),
        right_expr: Box::new(BoundExpr::column_ref(1, 0)),
        return_type: DataTypeKind::Int32.nullable(),
    });
    plan.node_mut(join).expressions.push(BoundExpr::comparison(
        BinaryOperator::Eq,
        BoundExpr::column_ref(0, 0),
        sum,
    ));
    let root = plan.add(LogicalOperator::with_children(
        LogicalOperatorKind::Projection,
        vec![join],
    ));
    plan.set_root(root);

    let result = JoinOrderOptimizer::new().optimize(&mut plan);
    assert_eq!(result, Err(OptimizeError::FilterOrientation));
}

#[test]
fn bound_refs_and_correlated_subqueries_block_reordering() {
    use crate::binder::{BoundInputRef, BoundSubquery};

    let mut optimizer = JoinOrderOptimizer::new();
    optimizer.relation_mapping.insert(0, 0);

    let mut bindings = BitSet::new();
    assert!(optimizer.extract_bindings(&BoundExpr::column_ref(0, 0), &mut bindings));
    assert!(bindings.contains(0));

    // a resolved positional slot wipes everything collected so far
    let input_ref = BoundExpr::InputRef(BoundInputRef {
        index: 0,
        return_type: DataTypeKind::Int32.nullable(),
    });
    assert!(!optimizer.extract_bindings(&input_ref, &mut bindings));
    assert!(bindings.is_empty());

    let correlated = BoundExpr::Subquery(BoundSubquery {
        is_correlated: true,
        return_type: DataTypeKind::Int32.nullable(),
    });
    let mut bindings = BitSet::new();
    assert!(!optimizer.extract_bindings(
        &BoundExpr::comparison(BinaryOperator::Eq, BoundExpr::column_ref(0, 0), correlated),
        &mut bindings
    ));
    assert!(bindings.is_empty());

    // an uncorrelated subquery references no relations at all
    let uncorrelated = BoundExpr::Subquery(BoundSubquery {
        is_correlated: false,
        return_type: DataTypeKind::Int32.nullable(),
    });
    let mut bindings = BitSet::new();
    assert!(optimizer.extract_bindings(&uncorrelated, &mut bindings));
    assert!(bindings.is_empty());
}

#[test]
fn optimizer_counts_relations_through_wrappers() {
    // a filter wrapped around one side of the join is walked through and
    // its predicate is collected
    let mut plan = LogicalPlan::new();
    let t0 = table(&mut plan, 0, 100);
    let inner_filter = plan.add(LogicalOperator::with_children(
        LogicalOperatorKind::Filter,
        vec![t0],
    ));
    plan.node_mut(inner_filter).expressions.push(eq(0, 1));
    let t1 = table(&mut plan, 1, 10);
    let join = plan.add(LogicalOperator::with_children(
        LogicalOperatorKind::CrossProduct,
        vec![inner_filter, t1],
    ));
    let root = plan.add(LogicalOperator::with_children(
        LogicalOperatorKind::Projection,
        vec![join],
    ));
    plan.set_root(root);

    let root = plan.root();
    let mut optimizer = JoinOrderOptimizer::new();
    let new_root = optimizer.optimize_subtree(&mut plan, root).unwrap();
    assert_eq!(optimizer.relations.len(), 2);
    assert_eq!(count_leaves(&plan, new_root), 2);
    assert_eq!(count_predicates(&plan, new_root), 1);
}
