// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

//! Join-order search: exact CSG-CMP enumeration with a greedy fallback.
//!
//! The exact phase signals an exhausted pair budget by returning `false`
//! up the recursion; the partially filled plans table is kept and the
//! greedy phase completes it.

use std::sync::Arc;

use bit_set::BitSet;
use smallvec::SmallVec;
use tracing::debug;

use super::query_graph::NeighborInfo;
use super::relation_set::RelationSet;
use super::{JoinNode, JoinOrderOptimizer};

impl JoinOrderOptimizer {
    pub(super) fn solve_join_order(&mut self) {
        if !self.solve_exactly() {
            self.solve_approximately();
        }
    }

    /// Dynamic programming over connected subgraph / complement pairs.
    /// `false` means the pair budget ran out before the search finished.
    fn solve_exactly(&mut self) -> bool {
        // every relation is considered as the start node once, from the
        // highest index down; the exclusion set keeps lower-numbered
        // start nodes out of each other's subgraphs
        for index in (0..self.relations.len()).rev() {
            let start_node = self.set_manager.singleton(index);
            if !self.emit_csg(start_node.clone()) {
                return false;
            }
            let mut exclusion_set = BitSet::new();
            for smaller in 0..index {
                exclusion_set.insert(smaller);
            }
            if !self.enumerate_csg_recursive(&start_node, &exclusion_set) {
                return false;
            }
        }
        true
    }

    /// Enumerate the complements of the connected subgraph `node`.
    fn emit_csg(&mut self, node: Arc<RelationSet>) -> bool {
        // exclude everything inside the subgraph and every relation below
        // its smallest member
        let mut exclusion_set = BitSet::new();
        for index in 0..node.relations()[0] {
            exclusion_set.insert(index);
        }
        for &index in node.relations() {
            exclusion_set.insert(index);
        }
        let neighbors = self.query_graph.neighbors(&node, &exclusion_set);
        for &neighbor in &neighbors {
            // the neighbor list only carries the smallest member of each
            // neighboring set, so the singleton may not be connected on
            // its own; check before emitting
            let neighbor_relation = self.set_manager.singleton(neighbor);
            if let Some(connection) = self.query_graph.connection(&node, &neighbor_relation) {
                if !self.try_emit_pair(&node, &neighbor_relation, &connection) {
                    return false;
                }
            }
            if !self.enumerate_cmp_recursive(&node, neighbor_relation, &exclusion_set) {
                return false;
            }
        }
        true
    }

    /// Grow the complement `right` of the subgraph `left` by one neighbor
    /// at a time, emitting every pair for which both sides already have a
    /// plan.
    fn enumerate_cmp_recursive(
        &mut self,
        left: &Arc<RelationSet>,
        right: Arc<RelationSet>,
        exclusion_set: &BitSet,
    ) -> bool {
        let neighbors = self.query_graph.neighbors(&right, exclusion_set);
        if neighbors.is_empty() {
            return true;
        }
        let mut union_sets: SmallVec<[Arc<RelationSet>; 8]> = SmallVec::new();
        for &neighbor in &neighbors {
            let neighbor_relation = self.set_manager.singleton(neighbor);
            let combined_set = self.set_manager.union(&right, &neighbor_relation);
            if self.plans.contains_key(&combined_set) {
                if let Some(connection) = self.query_graph.connection(left, &combined_set) {
                    if !self.try_emit_pair(left, &combined_set, &connection) {
                        return false;
                    }
                }
            }
            union_sets.push(combined_set);
        }
        for (index, &neighbor) in neighbors.iter().enumerate() {
            let mut new_exclusion_set = exclusion_set.clone();
            new_exclusion_set.insert(neighbor);
            if !self.enumerate_cmp_recursive(left, union_sets[index].clone(), &new_exclusion_set) {
                return false;
            }
        }
        true
    }

    /// Grow the connected subgraph `node` by one neighbor at a time,
    /// enumerating complements of every grown subgraph that has a plan.
    fn enumerate_csg_recursive(&mut self, node: &Arc<RelationSet>, exclusion_set: &BitSet) -> bool {
        let neighbors = self.query_graph.neighbors(node, exclusion_set);
        if neighbors.is_empty() {
            return true;
        }
        let mut union_sets: SmallVec<[Arc<RelationSet>; 8]> = SmallVec::new();
        for &neighbor in &neighbors {
            let neighbor_relation = self.set_manager.singleton(neighbor);
            let new_set = self.set_manager.union(node, &neighbor_relation);
            if self.plans.contains_key(&new_set) && !self.emit_csg(new_set.clone()) {
                return false;
            }
            union_sets.push(new_set);
        }
        for (index, &neighbor) in neighbors.iter().enumerate() {
            let mut new_exclusion_set = exclusion_set.clone();
            new_exclusion_set.insert(neighbor);
            if !self.enumerate_csg_recursive(&union_sets[index], &new_exclusion_set) {
                return false;
            }
        }
        true
    }

    /// Emit one pair unless the budget is exhausted.
    fn try_emit_pair(
        &mut self,
        left: &Arc<RelationSet>,
        right: &Arc<RelationSet>,
        info: &NeighborInfo,
    ) -> bool {
        self.pairs += 1;
        if self.pairs >= self.config.pair_limit {
            return false;
        }
        self.emit_pair(left, right, info);
        true
    }

    /// Cost the join of `left` and `right` and store it in the plans
    /// table when it beats the best plan known for the combined set.
    pub(super) fn emit_pair(
        &mut self,
        left: &Arc<RelationSet>,
        right: &Arc<RelationSet>,
        info: &NeighborInfo,
    ) -> Arc<JoinNode> {
        let left_plan = self
            .plans
            .get(left)
            .expect("no plan for the left side of an emitted pair")
            .clone();
        let right_plan = self
            .plans
            .get(right)
            .expect("no plan for the right side of an emitted pair")
            .clone();
        let new_set = self.set_manager.union(left, right);
        let new_plan = Arc::new(self.create_join_tree(new_set.clone(), info, left_plan, right_plan));
        let replace = self
            .plans
            .get(&new_set)
            .map_or(true, |existing| new_plan.cost < existing.cost);
        if replace {
            self.plans.insert(new_set, new_plan.clone());
            new_plan
        } else {
            self.plans[&new_set].clone()
        }
    }

    /// Combine two plans into a join node, costed by the foreign-key
    /// assumption: a join keeps the larger input's cardinality, a cross
    /// product multiplies.
    fn create_join_tree(
        &self,
        set: Arc<RelationSet>,
        info: &NeighborInfo,
        left: Arc<JoinNode>,
        right: Arc<JoinNode>,
    ) -> JoinNode {
        // the right side becomes the build side, which should be the
        // smaller input; equal cardinalities keep the given order
        if self.config.swap_build_side && left.cardinality < right.cardinality {
            return self.create_join_tree(set, info, right, left);
        }
        let expected_cardinality = if info.filters.is_empty() {
            left.cardinality.saturating_mul(right.cardinality)
        } else {
            left.cardinality.max(right.cardinality)
        };
        let cost = expected_cardinality
            .saturating_add(left.cost)
            .saturating_add(right.cost);
        JoinNode {
            set,
            filters: info.filters.clone(),
            left: Some(left),
            right: Some(right),
            cardinality: expected_cardinality,
            cost,
        }
    }

    /// Greedy operator ordering over whatever the exact phase left in the
    /// plans table: repeatedly join the connected pair with the cheapest
    /// result, inserting a cross product between the two smallest sets
    /// when nothing is connected.
    pub(super) fn solve_approximately(&mut self) {
        debug!(
            pairs = self.pairs,
            "pair budget exhausted, falling back to greedy operator ordering"
        );
        let mut remaining: Vec<Arc<RelationSet>> = (0..self.relations.len())
            .map(|index| self.set_manager.singleton(index))
            .collect();
        while remaining.len() > 1 {
            let mut best: Option<(usize, usize, Arc<JoinNode>)> = None;
            for left_index in 0..remaining.len() {
                for right_index in left_index + 1..remaining.len() {
                    let left = remaining[left_index].clone();
                    let right = remaining[right_index].clone();
                    let Some(connection) = self.query_graph.connection(&left, &right) else {
                        continue;
                    };
                    let node = self.emit_pair(&left, &right, &connection);
                    if best
                        .as_ref()
                        .map_or(true, |(_, _, best_node)| node.cost < best_node.cost)
                    {
                        best = Some((left_index, right_index, node));
                    }
                }
            }
            let (best_left, best_right, best_node) = match best {
                Some(best) => best,
                None => {
                    // nothing is connected: cross product between the two
                    // smallest relations
                    let mut indices: Vec<usize> = (0..remaining.len()).collect();
                    indices.sort_by_key(|&index| self.plans[&remaining[index]].cardinality);
                    let (first, second) = (indices[0], indices[1]);
                    let left = remaining[first].clone();
                    let right = remaining[second].clone();
                    self.query_graph.create_edge(left.clone(), right.clone(), None);
                    let connection = self
                        .query_graph
                        .connection(&left, &right)
                        .expect("cross product edge was just created");
                    let node = self.emit_pair(&left, &right, &connection);
                    (first.min(second), first.max(second), node)
                }
            };
            // remove the larger index first so the smaller stays valid
            remaining.remove(best_right);
            remaining.remove(best_left);
            remaining.push(best_node.set.clone());
        }
    }

    /// Connect every pair of relations with cross-product edges, for
    /// query graphs that turned out disjoint.
    pub(super) fn generate_cross_products(&mut self) {
        for left_index in 0..self.relations.len() {
            let left = self.set_manager.singleton(left_index);
            for right_index in 0..self.relations.len() {
                if left_index != right_index {
                    let right = self.set_manager.singleton(right_index);
                    self.query_graph.create_edge(left.clone(), right.clone(), None);
                    self.query_graph.create_edge(right, left.clone(), None);
                }
            }
        }
    }
}
