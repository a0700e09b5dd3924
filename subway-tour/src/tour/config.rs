//! Search configuration for the tour solver.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Which solver produces the tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TourMode {
    /// Best-first search; the result is optimal.
    #[default]
    Exact,
    /// Greedy nearest-unvisited walk; fast, not optimal.
    Approximate,
}

impl FromStr for TourMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "approximate" | "approx" => Ok(Self::Approximate),
            other => Err(format!(
                "unknown tour mode {other:?} (expected \"exact\" or \"approximate\")"
            )),
        }
    }
}

impl fmt::Display for TourMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Approximate => write!(f, "approximate"),
        }
    }
}

/// Configuration parameters for tour search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Follow runs of single-choice moves before enqueueing a node.
    pub collapse_forced_moves: bool,

    /// Start only from leaf stations when the graph has any.
    pub restrict_starts_to_leaves: bool,

    /// Give up after this many node expansions (greedy steps in
    /// approximate mode).
    pub max_expansions: Option<usize>,

    /// Emit a progress event every this many expansions.
    pub progress_interval: usize,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        collapse_forced_moves: bool,
        restrict_starts_to_leaves: bool,
        max_expansions: Option<usize>,
        progress_interval: usize,
    ) -> Self {
        Self {
            collapse_forced_moves,
            restrict_starts_to_leaves,
            max_expansions,
            progress_interval,
        }
    }

    /// Set the expansion budget.
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = Some(max_expansions);
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            collapse_forced_moves: true,
            restrict_starts_to_leaves: true,
            max_expansions: None,
            progress_interval: 1000,
        }
    }
}
