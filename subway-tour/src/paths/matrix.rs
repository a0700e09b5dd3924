//! Floyd–Warshall distance table.

use std::time::Instant;

use tracing::info;

use crate::domain::StationId;
use crate::graph::{Link, StationSet, TransitGraph};

use super::PathError;

/// Relative tolerance when matching summed link costs against distances.
const ROUTE_TOLERANCE: f64 = 1e-9;

/// Shortest travel time between every ordered pair of stations.
///
/// Rows and columns use the graph's dense station indices. Every entry is
/// finite: construction fails on the first unreachable pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PathLengthMatrix {
    ids: Vec<StationId>,
    distances: Vec<f64>,
}

impl PathLengthMatrix {
    /// Compute the matrix by triple-loop relaxation.
    ///
    /// The direct weight between adjacent stations is the cheaper of the
    /// edge duration and the transfer time.
    pub fn compute(graph: &TransitGraph) -> Result<Self, PathError> {
        let started = Instant::now();
        let n = graph.len();

        let mut d = vec![f64::INFINITY; n * n];
        for i in 0..n {
            d[i * n + i] = 0.0;
            for link in graph.links(i) {
                let cell = &mut d[i * n + link.to];
                if link.cost < *cell {
                    *cell = link.cost;
                }
            }
        }

        for k in 0..n {
            for i in 0..n {
                let through = d[i * n + k];
                if through.is_infinite() {
                    continue;
                }
                for j in 0..n {
                    let candidate = through + d[k * n + j];
                    if candidate < d[i * n + j] {
                        d[i * n + j] = candidate;
                    }
                }
            }
        }

        let matrix = Self::from_parts(station_ids(graph), d)?;

        info!(
            stations = n,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "computed path length matrix"
        );

        Ok(matrix)
    }

    /// Assemble a matrix from row-major distances, rejecting unreachable
    /// pairs.
    pub(super) fn from_parts(ids: Vec<StationId>, distances: Vec<f64>) -> Result<Self, PathError> {
        let n = ids.len();
        debug_assert_eq!(distances.len(), n * n);

        if let Some(position) = distances.iter().position(|d| !d.is_finite()) {
            return Err(PathError::DisconnectedGraph {
                from: ids[position / n].clone(),
                to: ids[position % n].clone(),
            });
        }

        Ok(Self { ids, distances })
    }

    /// Number of stations (rows).
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Distance between two dense station indices.
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances[from * self.ids.len() + to]
    }

    pub fn distance_between(&self, from: &StationId, to: &StationId) -> Option<f64> {
        let i = self.ids.binary_search(from).ok()?;
        let j = self.ids.binary_search(to).ok()?;
        Some(self.distance(i, j))
    }

    /// Every `(from, to, distance)` entry in row-major order.
    pub fn triples(&self) -> impl Iterator<Item = (&StationId, &StationId, f64)> + '_ {
        let n = self.ids.len();
        self.distances
            .iter()
            .enumerate()
            .map(move |(position, &d)| (&self.ids[position / n], &self.ids[position % n], d))
    }

    /// Links of one shortest path from `from` to `to`, in travel order.
    ///
    /// At each station the first link (by target index, trains before
    /// transfers) lying on a shortest path is taken. Returns `None` if the
    /// matrix was not computed for this graph.
    pub fn route<'g>(&self, graph: &'g TransitGraph, from: usize, to: usize) -> Option<Vec<&'g Link>> {
        let mut route = Vec::new();
        let mut seen = StationSet::empty(self.len());
        seen.insert(from);

        let mut current = from;
        while current != to {
            let remaining = self.distance(current, to);
            let tolerance = ROUTE_TOLERANCE * remaining.max(1.0);
            let link = graph.links(current).iter().find(|link| {
                !seen.contains(link.to)
                    && (link.cost + self.distance(link.to, to) - remaining).abs() <= tolerance
            })?;
            seen.insert(link.to);
            route.push(link);
            current = link.to;
        }

        Some(route)
    }
}

pub(super) fn station_ids(graph: &TransitGraph) -> Vec<StationId> {
    graph.stations().iter().map(|s| s.id.clone()).collect()
}
