//! The result surface handed to renderers.

use std::fmt;

use serde::Serialize;

use crate::domain::StationId;
use crate::graph::TransitGraph;

use super::config::TourMode;
use super::search::SearchOutcome;

/// A finished tour with station identifiers and display names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourResult {
    pub mode: TourMode,
    pub path: Vec<StationId>,
    pub names: Vec<String>,
    /// Total travel time in seconds.
    pub cost: f64,
    pub expanded: usize,
    pub pruned: usize,
}

impl TourResult {
    pub fn new(mode: TourMode, outcome: SearchOutcome, graph: &TransitGraph) -> Self {
        let stations = graph.stations();
        let path: Vec<StationId> = outcome
            .path
            .iter()
            .map(|&i| stations[i].id.clone())
            .collect();
        let names = outcome
            .path
            .iter()
            .map(|&i| stations[i].name.clone())
            .collect();

        Self {
            mode,
            path,
            names,
            cost: outcome.cost,
            expanded: outcome.expanded,
            pruned: outcome.pruned,
        }
    }

    /// Total travel time.
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::milliseconds((self.cost * 1000.0).round() as i64)
    }

    pub fn stops(&self) -> impl Iterator<Item = (&StationId, &str)> {
        self.path.iter().zip(self.names.iter().map(String::as_str))
    }
}

impl fmt::Display for TourResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (id, name)) in self.stops().enumerate() {
            writeln!(f, "{:>4}. {name} ({id})", i + 1)?;
        }
        let total = self.duration().num_seconds();
        write!(
            f,
            "{} stops, {}:{:02}:{:02} ({:.2} hours, {} search)",
            self.path.len(),
            total / 3600,
            total / 60 % 60,
            total % 60,
            self.cost / 3600.0,
            self.mode
        )
    }
}
