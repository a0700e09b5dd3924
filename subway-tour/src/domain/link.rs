//! Edges and transfers between consolidated stations.

use std::hash::{Hash, Hasher};

use super::StationId;

/// An in-station transfer between two consolidated stations.
///
/// Identity is the ordered `(from, to)` pair.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub from: StationId,
    pub to: StationId,
    /// Minimum transfer time in seconds.
    pub min_transfer_time: u32,
}

impl Transfer {
    pub fn new(from: StationId, to: StationId, min_transfer_time: u32) -> Self {
        Self {
            from,
            to,
            min_transfer_time,
        }
    }

    /// Returns true if the transfer starts and ends at the same station.
    pub fn is_self(&self) -> bool {
        self.from == self.to
    }
}

impl PartialEq for Transfer {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl Eq for Transfer {}

impl Hash for Transfer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.from.hash(state);
        self.to.hash(state);
    }
}

/// A directed, timed train connection between two consolidated stations.
///
/// Identity is the ordered `(from, to)` pair.
#[derive(Debug, Clone)]
pub struct Edge {
    pub from: StationId,
    pub to: StationId,
    /// Mean traversal time in seconds over every observed trip segment.
    pub duration: f64,
    /// Stations passed through without stopping (express service), in
    /// travel order.
    pub intermediates: Vec<StationId>,
}

impl Edge {
    pub fn new(from: StationId, to: StationId, duration: f64) -> Self {
        Self {
            from,
            to,
            duration,
            intermediates: Vec::new(),
        }
    }

    /// Set the intermediate stations.
    pub fn with_intermediates(mut self, intermediates: Vec<StationId>) -> Self {
        self.intermediates = intermediates;
        self
    }

    /// Build an edge whose duration is the mean of the given samples (seconds).
    ///
    /// Returns `None` when there are no samples.
    pub fn from_samples(from: StationId, to: StationId, samples: &[i64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let total: i64 = samples.iter().sum();
        Some(Self::new(from, to, total as f64 / samples.len() as f64))
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.from.hash(state);
        self.to.hash(state);
    }
}
