//! The immutable bundle the solvers run against.

use crate::graph::{Link, TransitGraph};
use crate::paths::{LeafIndex, PathLengthMatrix};

/// The cheapest way to get a station covered from somewhere else.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cover {
    cost: f64,
    /// Boarding station and position of the covering link in its links.
    via: Option<(usize, usize)>,
}

const UNCOVERABLE: Cover = Cover {
    cost: f64::INFINITY,
    via: None,
};

/// Graph, distance matrix and the indices derived from them.
///
/// Built once, in order, by `derive`; nothing here changes afterwards.
#[derive(Debug, Clone)]
pub struct TourIndex {
    graph: TransitGraph,
    matrix: PathLengthMatrix,
    leaves: LeafIndex,
    cover: Vec<Cover>,
}

impl TourIndex {
    /// Derive the leaf index and coverage table.
    ///
    /// `cover(i, j)` is the cheapest travel from `i` ending with a train
    /// link that covers `j`: ride to the link's boarding station `a`, then
    /// take it, for `d(i, a) + w`. Transfers never cover.
    pub fn derive(graph: TransitGraph, matrix: PathLengthMatrix) -> Self {
        let n = graph.len();
        let leaves = LeafIndex::derive(&graph, &matrix);

        let mut cover = vec![UNCOVERABLE; n * n];
        for a in 0..n {
            for (k, link) in graph.links(a).iter().enumerate() {
                if !link.is_train() {
                    continue;
                }
                for j in link.covered() {
                    for i in 0..n {
                        let cost = matrix.distance(i, a) + link.cost;
                        let cell = &mut cover[i * n + j];
                        if cost < cell.cost {
                            *cell = Cover {
                                cost,
                                via: Some((a, k)),
                            };
                        }
                    }
                }
            }
        }

        Self {
            graph,
            matrix,
            leaves,
            cover,
        }
    }

    pub fn graph(&self) -> &TransitGraph {
        &self.graph
    }

    pub fn matrix(&self) -> &PathLengthMatrix {
        &self.matrix
    }

    pub fn leaves(&self) -> &LeafIndex {
        &self.leaves
    }

    /// Number of stations.
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Cheapest cost from `from` until `station` is covered. Infinite if no
    /// train link covers it.
    pub fn cover(&self, from: usize, station: usize) -> f64 {
        self.cover[from * self.graph.len() + station].cost
    }

    /// The boarding station and link achieving `cover(from, station)`.
    pub fn cover_via(&self, from: usize, station: usize) -> Option<(usize, &Link)> {
        let (a, k) = self.cover[from * self.graph.len() + station].via?;
        Some((a, &self.graph.links(a)[k]))
    }

    /// Stations a tour may start from, in index order.
    ///
    /// Leaves when restricted and there are any, otherwise every station.
    pub fn start_candidates(&self, restrict_to_leaves: bool) -> Vec<usize> {
        let leaves = self.leaves.leaves();
        if restrict_to_leaves && !leaves.is_empty() {
            leaves.to_vec()
        } else {
            (0..self.graph.len()).collect()
        }
    }
}
