// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

use std::collections::HashMap;
use std::sync::Arc;

use bit_set::BitSet;
use smallvec::SmallVec;

use super::relation_set::RelationSet;

/// The filters connecting two relation sets, aggregated over every edge
/// between them. An empty filter list is still a connection: it stands
/// for a cross-product edge.
#[derive(Debug, Default)]
pub struct NeighborInfo {
    /// Indices into the optimizer's filter-info table.
    pub filters: Vec<usize>,
}

struct QueryEdge {
    neighbor: Arc<RelationSet>,
    filters: Vec<usize>,
}

/// Adjacency between relation sets, labeled with predicate edges.
///
/// Edges are indexed by their left set so that neighbor enumeration only
/// scans edges whose origin can be part of the probing set.
#[derive(Default)]
pub struct QueryGraph {
    edges: HashMap<Arc<RelationSet>, Vec<QueryEdge>>,
}

impl QueryGraph {
    /// Add a directed edge `left -> right`. `filter` is an index into the
    /// filter-info table, or `None` for a cross-product edge.
    pub fn create_edge(
        &mut self,
        left: Arc<RelationSet>,
        right: Arc<RelationSet>,
        filter: Option<usize>,
    ) {
        let edges = self.edges.entry(left).or_default();
        let position = match edges
            .iter()
            .position(|edge| Arc::ptr_eq(&edge.neighbor, &right))
        {
            Some(position) => position,
            None => {
                edges.push(QueryEdge {
                    neighbor: right,
                    filters: vec![],
                });
                edges.len() - 1
            }
        };
        if let Some(filter) = filter {
            edges[position].filters.push(filter);
        }
    }

    /// The neighbors of `set` outside `exclusion_set`: for every edge
    /// `(left, right)` with `left ⊆ set`, `right ∩ set = ∅` and
    /// `right ∩ exclusion_set = ∅`, the smallest index of `right` is
    /// emitted. Returned ascending and deduplicated; the
    /// smallest-representative contract keeps the CSG-CMP enumeration
    /// free of duplicates.
    pub fn neighbors(&self, set: &RelationSet, exclusion_set: &BitSet) -> SmallVec<[usize; 8]> {
        let mut result: SmallVec<[usize; 8]> = SmallVec::new();
        for (left, edges) in &self.edges {
            if !left.is_subset_of(set) {
                continue;
            }
            for edge in edges {
                let Some(&representative) = edge.neighbor.relations().first() else {
                    continue;
                };
                if edge.neighbor.is_disjoint_with(set) && !edge.neighbor.intersects(exclusion_set) {
                    result.push(representative);
                }
            }
        }
        result.sort_unstable();
        result.dedup();
        result
    }

    /// The aggregated connection between `left` and `right`: the union of
    /// the filters of every edge `(l, r)` with `l ⊆ left` and `r ⊆ right`.
    /// `None` means the sets are not connected and joining them requires
    /// a cross product.
    pub fn connection(&self, left: &RelationSet, right: &RelationSet) -> Option<NeighborInfo> {
        let mut connected = false;
        let mut info = NeighborInfo::default();
        for (edge_left, edges) in &self.edges {
            if !edge_left.is_subset_of(left) {
                continue;
            }
            for edge in edges {
                if edge.neighbor.is_subset_of(right) {
                    connected = true;
                    info.filters.extend_from_slice(&edge.filters);
                }
            }
        }
        connected.then_some(info)
    }
}
