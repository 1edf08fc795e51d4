// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

use std::collections::HashMap;
use std::sync::Arc;

use bit_set::BitSet;
use itertools::Itertools;

use crate::planner::PlanNodeId;

/// A leaf participant of the reorderable join region: a base table, a
/// table function, a subquery root, or a whole non-inner-join subtree
/// treated as one opaque block.
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    /// The relation's subplan, including any single-child wrappers above
    /// the producing leaf.
    pub op: PlanNodeId,
    /// The operator the subplan hangs under, for detachment. The root of
    /// the optimized region has no parent.
    pub parent: Option<PlanNodeId>,
}

/// An interned, sorted, duplicate-free set of relation indices.
///
/// Sets are only created through the [`RelationSetManager`], which
/// guarantees that equal index sequences share one allocation, so
/// `Arc::ptr_eq` is equivalent to value equality.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RelationSet {
    relations: Box<[usize]>,
}

impl RelationSet {
    pub fn relations(&self) -> &[usize] {
        &self.relations
    }

    pub fn count(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// True iff every index of `self` appears in `other`. Linear in the
    /// combined length, relying on the sorted order.
    pub fn is_subset_of(&self, other: &RelationSet) -> bool {
        let mut iter = other.relations.iter();
        self.relations
            .iter()
            .all(|index| iter.any(|other_index| other_index == index))
    }

    /// True iff `self` and `other` share no index.
    pub fn is_disjoint_with(&self, other: &RelationSet) -> bool {
        let (mut left, mut right) = (0, 0);
        while left < self.relations.len() && right < other.relations.len() {
            match self.relations[left].cmp(&other.relations[right]) {
                std::cmp::Ordering::Less => left += 1,
                std::cmp::Ordering::Greater => right += 1,
                std::cmp::Ordering::Equal => return false,
            }
        }
        true
    }

    /// True iff some index of `self` is a member of `set`.
    pub fn intersects(&self, set: &BitSet) -> bool {
        self.relations.iter().any(|&index| set.contains(index))
    }
}

impl std::fmt::Display for RelationSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.relations.iter().format(", "))
    }
}

#[derive(Default)]
struct TrieNode {
    set: Option<Arc<RelationSet>>,
    children: HashMap<usize, TrieNode>,
}

/// Interns [`RelationSet`]s in a prefix trie keyed on the sorted index
/// sequence, so that every distinct set of indices has exactly one
/// canonical allocation.
#[derive(Default)]
pub struct RelationSetManager {
    root: TrieNode,
}

impl RelationSetManager {
    /// The set containing only `index`.
    pub fn singleton(&mut self, index: usize) -> Arc<RelationSet> {
        self.intern([index])
    }

    /// The set of all indices present in `bindings`.
    pub fn from_bindings(&mut self, bindings: &BitSet) -> Arc<RelationSet> {
        self.intern(bindings.iter())
    }

    /// The union of two sets, merging the sorted sequences.
    pub fn union(&mut self, a: &RelationSet, b: &RelationSet) -> Arc<RelationSet> {
        self.intern(a.relations.iter().merge(b.relations.iter()).copied())
    }

    /// The set of indices of `a` that are not in `b`.
    pub fn difference(&mut self, a: &RelationSet, b: &RelationSet) -> Arc<RelationSet> {
        let mut removed = BitSet::new();
        for &index in b.relations.iter() {
            removed.insert(index);
        }
        self.intern(
            a.relations
                .iter()
                .copied()
                .filter(|index| !removed.contains(*index)),
        )
    }

    /// Walk the trie along `indices` (ascending, possibly with duplicates
    /// from a union of overlapping sets) and return the canonical set.
    fn intern(&mut self, indices: impl IntoIterator<Item = usize>) -> Arc<RelationSet> {
        let mut collected = vec![];
        let mut node = &mut self.root;
        for index in indices {
            debug_assert!(collected.last().map_or(true, |&last| last <= index));
            if collected.last() == Some(&index) {
                continue;
            }
            collected.push(index);
            node = node.children.entry(index).or_default();
        }
        node.set
            .get_or_insert_with(|| {
                Arc::new(RelationSet {
                    relations: collected.into_boxed_slice(),
                })
            })
            .clone()
    }
}
