//! Best-first search for a minimum-cost walk covering every station.
//!
//! States are (current station, unvisited stations). Nodes are ordered by
//! estimated total cost; the first node popped with nothing left unvisited
//! is optimal because the heuristic never overestimates.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;

use tracing::{debug, info, trace};

use crate::graph::{Link, StationSet};

use super::config::SearchConfig;
use super::heuristic::estimate;
use super::index::TourIndex;

/// Error from tour search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The queue ran dry before any node covered every station
    #[error("search exhausted after {expanded} expansions without covering every station")]
    SearchExhausted { expanded: usize },

    /// The configured expansion budget ran out
    #[error("search gave up after {expanded} expansions")]
    BudgetExceeded { expanded: usize },
}

/// Where the traveller is and what is still to be covered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchState {
    pub station: usize,
    pub unvisited: StationSet,
}

/// Stations visited so far, newest first, shared between nodes.
#[derive(Debug)]
struct Trail {
    station: usize,
    len: usize,
    previous: Option<Rc<Trail>>,
}

impl Trail {
    fn start(station: usize) -> Rc<Self> {
        Rc::new(Self {
            station,
            len: 1,
            previous: None,
        })
    }

    fn push(self: &Rc<Self>, station: usize) -> Rc<Self> {
        Rc::new(Self {
            station,
            len: self.len + 1,
            previous: Some(Rc::clone(self)),
        })
    }

    fn to_vec(&self) -> Vec<usize> {
        let mut stations = Vec::with_capacity(self.len);
        let mut cursor = Some(self);
        while let Some(trail) = cursor {
            stations.push(trail.station);
            cursor = trail.previous.as_deref();
        }
        stations.reverse();
        stations
    }
}

/// A search state plus how it was reached.
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub state: SearchState,
    /// Travel time so far.
    pub path_cost: f64,
    /// `path_cost` plus the heuristic.
    pub estimated_cost: f64,
    trail: Rc<Trail>,
    sequence: u64,
}

impl SearchNode {
    /// Stations in the order they were stopped at.
    pub fn path(&self) -> Vec<usize> {
        self.trail.to_vec()
    }

    pub fn path_len(&self) -> usize {
        self.trail.len
    }

    pub fn is_complete(&self) -> bool {
        self.state.unvisited.is_empty()
    }
}

// Max-heap order: lowest estimate first, then the deepest path, then the
// oldest node.
impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimated_cost
            .total_cmp(&self.estimated_cost)
            .then_with(|| self.path_cost.total_cmp(&other.path_cost))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchNode {}

/// A finished tour.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Station indices in stop order.
    pub path: Vec<usize>,
    pub cost: f64,
    pub expanded: usize,
    pub pruned: usize,
}

/// Exact tour search over one `TourIndex`.
pub struct TourSearch<'a> {
    index: &'a TourIndex,
    config: &'a SearchConfig,
}

/// Queue and history for one run.
struct Frontier {
    queue: BinaryHeap<SearchNode>,
    /// Best estimated cost seen per state.
    history: HashMap<SearchState, f64>,
    next_sequence: u64,
    pruned: usize,
}

impl Frontier {
    fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            history: HashMap::new(),
            next_sequence: 0,
            pruned: 0,
        }
    }

    /// Enqueue a node unless its state already has an equal or better one.
    fn offer(&mut self, mut node: SearchNode) {
        match self.history.entry(node.state.clone()) {
            Entry::Occupied(best) if *best.get() <= node.estimated_cost => {
                self.pruned += 1;
                return;
            }
            Entry::Occupied(mut best) => {
                best.insert(node.estimated_cost);
            }
            Entry::Vacant(slot) => {
                slot.insert(node.estimated_cost);
            }
        }
        node.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue.push(node);
    }

    /// Pop the best live node, skipping ones superseded since they were queued.
    fn pop(&mut self) -> Option<SearchNode> {
        while let Some(node) = self.queue.pop() {
            let superseded = self
                .history
                .get(&node.state)
                .is_some_and(|&best| best < node.estimated_cost);
            if superseded {
                self.pruned += 1;
                continue;
            }
            return Some(node);
        }
        None
    }
}

impl<'a> TourSearch<'a> {
    pub fn new(index: &'a TourIndex, config: &'a SearchConfig) -> Self {
        Self { index, config }
    }

    /// Find a minimum-cost tour covering every station.
    pub fn run(&self) -> Result<SearchOutcome, SearchError> {
        let mut frontier = Frontier::new();
        let mut expanded = 0;

        for start in self.index.start_candidates(self.config.restrict_starts_to_leaves) {
            if let Some(node) = self.start(start) {
                frontier.offer(node);
            }
        }
        debug!(
            starts = frontier.queue.len(),
            stations = self.index.len(),
            "seeded tour search"
        );

        while let Some(node) = frontier.pop() {
            if node.is_complete() {
                info!(
                    expanded,
                    pruned = frontier.pruned,
                    cost = node.path_cost,
                    stops = node.path_len(),
                    "tour search complete"
                );
                return Ok(SearchOutcome {
                    path: node.path(),
                    cost: node.path_cost,
                    expanded,
                    pruned: frontier.pruned,
                });
            }

            if self.config.max_expansions.is_some_and(|limit| expanded >= limit) {
                return Err(SearchError::BudgetExceeded { expanded });
            }
            expanded += 1;

            if self.config.progress_interval > 0 && expanded % self.config.progress_interval == 0 {
                debug!(
                    expanded,
                    path_len = node.path_len(),
                    path_cost = node.path_cost,
                    remaining = node.state.unvisited.len(),
                    queued = frontier.queue.len(),
                    pruned = frontier.pruned,
                    "tour search progress"
                );
            }

            for link in self.candidate_moves(&node.state) {
                let Some(child) = self.advance(&node, link) else {
                    frontier.pruned += 1;
                    continue;
                };
                let child = if self.config.collapse_forced_moves {
                    match self.follow_forced(child) {
                        Some(child) => child,
                        None => {
                            frontier.pruned += 1;
                            continue;
                        }
                    }
                } else {
                    child
                };
                frontier.offer(child);
            }
        }

        info!(expanded, pruned = frontier.pruned, "tour search exhausted");
        Err(SearchError::SearchExhausted { expanded })
    }

    fn start(&self, station: usize) -> Option<SearchNode> {
        let mut unvisited = StationSet::full(self.index.len());
        unvisited.remove(station);
        let heuristic = estimate(self.index, station, &unvisited);
        if heuristic.is_infinite() {
            return None;
        }
        Some(SearchNode {
            state: SearchState { station, unvisited },
            path_cost: 0.0,
            estimated_cost: heuristic,
            trail: Trail::start(station),
            sequence: 0,
        })
    }

    /// Moves worth considering from a state.
    ///
    /// While some link would cover an unvisited station, links that would
    /// not are dropped. A transfer never covers, so it only survives when
    /// nothing nearby is left to cover.
    pub fn candidate_moves(&self, state: &SearchState) -> Vec<&'a Link> {
        let links = self.index.graph().links(state.station);
        let fresh: Vec<&Link> = links
            .iter()
            .filter(|link| link.covered().any(|s| state.unvisited.contains(s)))
            .collect();
        if fresh.is_empty() {
            links.iter().collect()
        } else {
            fresh
        }
    }

    /// Take one link. `None` if the result can never be completed.
    fn advance(&self, node: &SearchNode, link: &Link) -> Option<SearchNode> {
        let mut unvisited = node.state.unvisited.clone();
        for station in link.covered() {
            unvisited.remove(station);
        }

        let path_cost = node.path_cost + link.cost;
        let heuristic = estimate(self.index, link.to, &unvisited);
        if heuristic.is_infinite() {
            return None;
        }

        Some(SearchNode {
            state: SearchState {
                station: link.to,
                unvisited,
            },
            path_cost,
            estimated_cost: path_cost + heuristic,
            trail: node.trail.push(link.to),
            sequence: 0,
        })
    }

    /// Follow single-choice moves until there is a real choice.
    ///
    /// Stops at a complete tour, at a state with several candidate moves,
    /// or before a move that would cover nothing new.
    fn follow_forced(&self, mut node: SearchNode) -> Option<SearchNode> {
        let mut forced = 0;
        while !node.is_complete() {
            let moves = self.candidate_moves(&node.state);
            let [link] = moves.as_slice() else {
                break;
            };
            if !link.covered().any(|s| node.state.unvisited.contains(s)) {
                break;
            }
            node = self.advance(&node, link)?;
            forced += 1;
        }
        if forced > 0 {
            trace!(
                station = node.state.station,
                forced,
                remaining = node.state.unvisited.len(),
                "collapsed forced moves"
            );
        }
        Some(node)
    }
}
