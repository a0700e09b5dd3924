//! Greedy nearest-unvisited tour.
//!
//! From each start candidate, repeatedly ride to whichever unvisited
//! station is cheapest to cover, along real links, and keep the cheapest
//! finished walk. Not optimal, but linear in the number of stations per
//! start.

use tracing::{debug, info};

use crate::graph::StationSet;

use super::config::SearchConfig;
use super::index::TourIndex;
use super::search::{SearchError, SearchOutcome};

struct Walk {
    path: Vec<usize>,
    cost: f64,
}

/// Run the greedy walk from every start candidate.
///
/// `max_expansions` bounds the total number of greedy steps.
pub fn approximate(index: &TourIndex, config: &SearchConfig) -> Result<SearchOutcome, SearchError> {
    let mut steps = 0;
    let mut failed = 0;
    let mut best: Option<Walk> = None;

    for start in index.start_candidates(config.restrict_starts_to_leaves) {
        match greedy_walk(index, start, config.max_expansions, &mut steps)? {
            Some(walk) => {
                debug!(start, cost = walk.cost, stops = walk.path.len(), "greedy walk");
                if best.as_ref().is_none_or(|b| walk.cost < b.cost) {
                    best = Some(walk);
                }
            }
            None => failed += 1,
        }
    }

    let best = best.ok_or(SearchError::SearchExhausted { expanded: steps })?;
    info!(steps, failed, cost = best.cost, stops = best.path.len(), "approximate tour complete");
    Ok(SearchOutcome {
        path: best.path,
        cost: best.cost,
        expanded: steps,
        pruned: failed,
    })
}

/// One greedy walk. `None` if some station cannot be covered from `start`.
fn greedy_walk(
    index: &TourIndex,
    start: usize,
    budget: Option<usize>,
    steps: &mut usize,
) -> Result<Option<Walk>, SearchError> {
    let graph = index.graph();
    let mut unvisited = StationSet::full(index.len());
    unvisited.remove(start);

    let mut walk = Walk {
        path: vec![start],
        cost: 0.0,
    };
    let mut current = start;

    while !unvisited.is_empty() {
        if budget.is_some_and(|limit| *steps >= limit) {
            return Err(SearchError::BudgetExceeded { expanded: *steps });
        }
        *steps += 1;

        // Ties go to the lowest station index.
        let Some(target) = unvisited
            .iter()
            .min_by(|&a, &b| index.cover(current, a).total_cmp(&index.cover(current, b)))
        else {
            break;
        };
        let Some((boarding, covering)) = index.cover_via(current, target) else {
            return Ok(None);
        };
        let Some(approach) = index.matrix().route(graph, current, boarding) else {
            return Ok(None);
        };

        for link in approach.into_iter().chain([covering]) {
            walk.cost += link.cost;
            walk.path.push(link.to);
            for station in link.covered() {
                unvisited.remove(station);
            }
            current = link.to;
        }
    }

    Ok(Some(walk))
}
