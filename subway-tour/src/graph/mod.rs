//! Consolidated transit graph.
//!
//! Stations are addressed by `StationId` at the API surface and by a dense
//! index (position in identifier order) internally, which the path-length
//! matrix and the search use for their tables and bitsets.

mod station_set;

pub use station_set::StationSet;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::{Edge, Station, StationId, Transfer};

/// Error constructing a graph from inconsistent parts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    /// An edge, transfer or intermediate names a station that is not in the graph
    #[error("{kind} {from} -> {to} references unknown station {missing}")]
    UnknownStation {
        kind: &'static str,
        from: StationId,
        to: StationId,
        missing: StationId,
    },

    /// An edge starts and ends at the same station
    #[error("edge {0} -> {0} is a self loop")]
    SelfLoop(StationId),
}

/// How a link moves the traveller.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkKind {
    /// Riding a train. Covers the destination and every intermediate station.
    Train { intermediates: Vec<usize> },
    /// Walking an in-station transfer. Covers nothing.
    Transfer,
}

/// One outgoing neighbour of a station.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub to: usize,
    pub cost: f64,
    pub kind: LinkKind,
}

impl Link {
    /// Stations this link marks as visited when traversed.
    pub fn covered(&self) -> impl Iterator<Item = usize> + '_ {
        let (to, intermediates): (Option<usize>, &[usize]) = match &self.kind {
            LinkKind::Train { intermediates } => (Some(self.to), intermediates.as_slice()),
            LinkKind::Transfer => (None, &[]),
        };
        to.into_iter().chain(intermediates.iter().copied())
    }

    pub fn is_train(&self) -> bool {
        matches!(self.kind, LinkKind::Train { .. })
    }
}

/// The consolidated transit network.
///
/// Every station in the graph is touched by at least one edge or transfer
/// record; isolated stations are dropped at construction.
#[derive(Debug, Clone)]
pub struct TransitGraph {
    stations: Vec<Station>,
    index: HashMap<StationId, usize>,
    edges: BTreeMap<(StationId, StationId), Edge>,
    transfers: BTreeMap<(StationId, StationId), Transfer>,
    /// Outgoing links per station, ordered by target index (trains first).
    links: Vec<Vec<Link>>,
    /// Distinct stations adjacent in either direction.
    adjacent: Vec<Vec<usize>>,
}

impl TransitGraph {
    /// Build a graph from consolidated stations, edges and transfers.
    ///
    /// Later edges or transfers for the same ordered pair replace earlier
    /// ones. Stations touched by no edge and no transfer are dropped.
    pub fn new(
        stations: impl IntoIterator<Item = Station>,
        edges: impl IntoIterator<Item = Edge>,
        transfers: impl IntoIterator<Item = Transfer>,
    ) -> Result<Self, GraphError> {
        let candidates: BTreeMap<StationId, Station> = stations
            .into_iter()
            .map(|station| (station.id.clone(), station))
            .collect();

        let mut edge_map = BTreeMap::new();
        for edge in edges {
            if edge.from == edge.to {
                return Err(GraphError::SelfLoop(edge.from));
            }
            for id in [&edge.from, &edge.to].into_iter().chain(&edge.intermediates) {
                if !candidates.contains_key(id) {
                    return Err(unknown("edge", &edge.from, &edge.to, id));
                }
            }
            edge_map.insert((edge.from.clone(), edge.to.clone()), edge);
        }

        let mut transfer_map = BTreeMap::new();
        for transfer in transfers {
            for id in [&transfer.from, &transfer.to] {
                if !candidates.contains_key(id) {
                    return Err(unknown("transfer", &transfer.from, &transfer.to, id));
                }
            }
            transfer_map.insert((transfer.from.clone(), transfer.to.clone()), transfer);
        }

        let touched: BTreeSet<&StationId> = edge_map
            .keys()
            .chain(transfer_map.keys())
            .flat_map(|(from, to)| [from, to])
            .collect();

        let stations: Vec<Station> = candidates
            .into_values()
            .filter(|station| touched.contains(&station.id))
            .collect();
        let index: HashMap<StationId, usize> = stations
            .iter()
            .enumerate()
            .map(|(i, station)| (station.id.clone(), i))
            .collect();

        // Intermediate stations must be linked in their own right.
        let mut links = vec![Vec::new(); stations.len()];
        for edge in edge_map.values() {
            let intermediates = edge
                .intermediates
                .iter()
                .map(|id| {
                    index
                        .get(id)
                        .copied()
                        .ok_or_else(|| unknown("edge", &edge.from, &edge.to, id))
                })
                .collect::<Result<Vec<_>, _>>()?;
            links[index[&edge.from]].push(Link {
                to: index[&edge.to],
                cost: edge.duration,
                kind: LinkKind::Train { intermediates },
            });
        }
        for transfer in transfer_map.values().filter(|t| !t.is_self()) {
            links[index[&transfer.from]].push(Link {
                to: index[&transfer.to],
                cost: f64::from(transfer.min_transfer_time),
                kind: LinkKind::Transfer,
            });
        }
        for station_links in &mut links {
            station_links.sort_by_key(|link| (link.to, !link.is_train()));
        }

        let mut adjacent = vec![BTreeSet::new(); stations.len()];
        for (from, station_links) in links.iter().enumerate() {
            for link in station_links {
                adjacent[from].insert(link.to);
                adjacent[link.to].insert(from);
            }
        }
        let adjacent = adjacent
            .into_iter()
            .map(|set| set.into_iter().collect())
            .collect();

        Ok(Self {
            stations,
            index,
            edges: edge_map,
            transfers: transfer_map,
            links,
            adjacent,
        })
    }

    /// Number of consolidated stations.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Stations in identifier order; a station's position is its index.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.index_of(id).map(|i| &self.stations[i])
    }

    pub fn index_of(&self, id: &StationId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Identifier of the station at a dense index.
    ///
    /// Panics if the index is out of bounds.
    pub fn id_at(&self, index: usize) -> &StationId {
        &self.stations[index].id
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn edge(&self, from: &StationId, to: &StationId) -> Option<&Edge> {
        self.edges.get(&(from.clone(), to.clone()))
    }

    /// Every transfer record, including same-station transfers.
    pub fn transfers(&self) -> impl Iterator<Item = &Transfer> {
        self.transfers.values()
    }

    pub fn transfer(&self, from: &StationId, to: &StationId) -> Option<&Transfer> {
        self.transfers.get(&(from.clone(), to.clone()))
    }

    /// Outgoing links (edges and non-self transfers) of a station index.
    pub fn links(&self, index: usize) -> &[Link] {
        &self.links[index]
    }

    /// Outgoing links of a station; empty if the station is unknown.
    pub fn neighbors(&self, id: &StationId) -> &[Link] {
        self.index_of(id).map(|i| self.links(i)).unwrap_or(&[])
    }

    /// Number of distinct stations reachable in one link.
    pub fn neighbor_count(&self, index: usize) -> usize {
        let mut count = 0;
        let mut last = None;
        for link in &self.links[index] {
            if last != Some(link.to) {
                count += 1;
                last = Some(link.to);
            }
        }
        count
    }

    /// Distinct stations linked to or from a station.
    pub fn adjacent(&self, index: usize) -> &[usize] {
        &self.adjacent[index]
    }

    /// Cheapest single-link weight between two stations, if linked.
    pub fn direct_weight(&self, from: usize, to: usize) -> Option<f64> {
        self.links[from]
            .iter()
            .filter(|link| link.to == to)
            .map(|link| link.cost)
            .min_by(f64::total_cmp)
    }
}

fn unknown(kind: &'static str, from: &StationId, to: &StationId, missing: &StationId) -> GraphError {
    GraphError::UnknownStation {
        kind,
        from: from.clone(),
        to: to.clone(),
        missing: missing.clone(),
    }
}
