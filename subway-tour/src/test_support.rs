//! Shared fixtures for unit tests.

use proptest::prelude::*;

use crate::domain::{Coordinate, Edge, Station, StationId, Transfer};
use crate::graph::TransitGraph;

pub fn id(s: &str) -> StationId {
    StationId::parse(s).unwrap()
}

pub fn station(s: &str) -> Station {
    Station::new(id(s), format!("Station {s}"), Coordinate::new(40.7, -74.0))
}

/// Edges in both directions with the same duration.
pub fn both_ways(a: &str, b: &str, duration: f64) -> [Edge; 2] {
    [
        Edge::new(id(a), id(b), duration),
        Edge::new(id(b), id(a), duration),
    ]
}

/// A line graph over the given stations with uniform edge duration.
pub fn line_graph(names: &[&str], duration: f64, transfers: Vec<Transfer>) -> TransitGraph {
    let edges: Vec<Edge> = names
        .windows(2)
        .flat_map(|pair| both_ways(pair[0], pair[1], duration))
        .collect();
    TransitGraph::new(names.iter().map(|n| station(n)), edges, transfers).unwrap()
}

/// Symmetric connected graph description: station count, undirected edges
/// with integer durations, and undirected transfers.
#[derive(Debug, Clone)]
pub struct GraphSpec {
    pub size: usize,
    pub edges: Vec<(usize, usize, u32)>,
    pub transfers: Vec<(usize, usize, u32)>,
}

impl GraphSpec {
    pub fn name(i: usize) -> String {
        format!("S{i:02}")
    }

    pub fn build(&self) -> TransitGraph {
        let stations = (0..self.size).map(|i| station(&Self::name(i)));
        let edges: Vec<Edge> = self
            .edges
            .iter()
            .flat_map(|&(a, b, w)| both_ways(&Self::name(a), &Self::name(b), f64::from(w)))
            .collect();
        let transfers: Vec<Transfer> = self
            .transfers
            .iter()
            .flat_map(|&(a, b, w)| {
                [
                    Transfer::new(id(&Self::name(a)), id(&Self::name(b)), w),
                    Transfer::new(id(&Self::name(b)), id(&Self::name(a)), w),
                ]
            })
            .collect();
        TransitGraph::new(stations, edges, transfers).unwrap()
    }
}

/// Random connected graphs: a random spanning tree plus a few extra edges
/// and transfers, all between distinct stations.
pub fn connected_graph(max_size: usize) -> impl Strategy<Value = GraphSpec> {
    (2..=max_size).prop_flat_map(|size| {
        let tree = proptest::collection::vec((any::<proptest::sample::Index>(), 1u32..100), size - 1);
        let extra = proptest::collection::vec((0..size, 0..size, 1u32..100), 0..size);
        let transfers = proptest::collection::vec((0..size, 0..size, 1u32..60), 0..2);
        (Just(size), tree, extra, transfers).prop_map(|(size, tree, extra, transfers)| {
            let mut edges: Vec<(usize, usize, u32)> = tree
                .into_iter()
                .enumerate()
                .map(|(i, (parent, w))| (parent.index(i + 1), i + 1, w))
                .collect();
            edges.extend(extra.into_iter().filter(|(a, b, _)| a != b));
            let transfers = transfers.into_iter().filter(|(a, b, _)| a != b).collect();
            GraphSpec {
                size,
                edges,
                transfers,
            }
        })
    })
}
