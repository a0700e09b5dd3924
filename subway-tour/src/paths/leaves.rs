//! Leaf stations and the dead-end branches leading to them.

use crate::graph::{LinkKind, TransitGraph};

use super::PathLengthMatrix;

/// The dead-end branch ending at a leaf station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafBranch {
    pub leaf: usize,
    /// First station on the way in with three or more adjacent stations.
    pub junction: usize,
    /// Travel time from the junction out to the leaf.
    pub length: f64,
}

/// Leaf stations and their branches, derived once per graph.
#[derive(Debug, Clone, Default)]
pub struct LeafIndex {
    leaves: Vec<usize>,
    branches: Vec<LeafBranch>,
}

impl LeafIndex {
    /// Find leaves and measure their branches.
    ///
    /// A leaf has exactly one distinct outgoing neighbour. A branch is
    /// measured only for stations adjacent (in either direction) to a single
    /// station, by walking the corridor of two-way stations inwards. A
    /// corridor that dead-ends at both ends has no junction and so no
    /// branch, and neither does a station that some express passes through.
    pub fn derive(graph: &TransitGraph, matrix: &PathLengthMatrix) -> Self {
        let n = graph.len();
        let leaves = (0..n).filter(|&i| graph.neighbor_count(i) == 1).collect();

        let mut passed_through = vec![false; n];
        for i in 0..n {
            for link in graph.links(i) {
                if let LinkKind::Train { intermediates } = &link.kind {
                    for &station in intermediates {
                        passed_through[station] = true;
                    }
                }
            }
        }

        let branches = (0..n)
            .filter(|&leaf| !passed_through[leaf])
            .filter_map(|leaf| {
                let junction = find_junction(graph, leaf)?;
                Some(LeafBranch {
                    leaf,
                    junction,
                    length: matrix.distance(junction, leaf),
                })
            })
            .collect();

        Self { leaves, branches }
    }

    /// Leaf stations in index order.
    pub fn leaves(&self) -> &[usize] {
        &self.leaves
    }

    pub fn is_leaf(&self, station: usize) -> bool {
        self.leaves.binary_search(&station).is_ok()
    }

    /// Branches in leaf index order.
    pub fn branches(&self) -> &[LeafBranch] {
        &self.branches
    }

    pub fn branch(&self, leaf: usize) -> Option<&LeafBranch> {
        self.branches
            .binary_search_by_key(&leaf, |b| b.leaf)
            .ok()
            .map(|i| &self.branches[i])
    }
}

fn find_junction(graph: &TransitGraph, leaf: usize) -> Option<usize> {
    let [first] = graph.adjacent(leaf) else {
        return None;
    };

    let mut previous = leaf;
    let mut current = *first;
    for _ in 0..graph.len() {
        match graph.adjacent(current) {
            [_] => return None,
            &[a, b] => {
                let next = if a == previous { b } else { a };
                previous = current;
                current = next;
            }
            _ => return Some(current),
        }
    }
    None
}
