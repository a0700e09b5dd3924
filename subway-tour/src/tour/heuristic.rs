//! Lower bounds on the remaining cost of a tour.
//!
//! Both bounds are admissible: neither exceeds the cheapest way to cover
//! every unvisited station from the current one.

use crate::graph::StationSet;

use super::index::TourIndex;

/// Largest coverage distance to any unvisited station.
///
/// Every unvisited station has to be covered eventually, each one at least
/// `cover(current, station)` away. Infinite if some station can never be
/// covered.
pub fn farthest_cover(index: &TourIndex, current: usize, unvisited: &StationSet) -> f64 {
    unvisited
        .iter()
        .map(|station| index.cover(current, station))
        .fold(0.0, f64::max)
}

/// Sum of the dead-end branches still to be walked.
///
/// Each unvisited leaf with a branch needs its own trip down its corridor,
/// and corridors do not overlap. When the traveller is already inside a
/// corridor the remaining approach may be shorter than the whole branch,
/// so the coverage distance caps each term.
pub fn leaf_branches(index: &TourIndex, current: usize, unvisited: &StationSet) -> f64 {
    index
        .leaves()
        .branches()
        .iter()
        .filter(|branch| unvisited.contains(branch.leaf))
        .map(|branch| branch.length.min(index.cover(current, branch.leaf)))
        .sum()
}

/// The tighter of the two bounds.
pub fn estimate(index: &TourIndex, current: usize, unvisited: &StationSet) -> f64 {
    farthest_cover(index, current, unvisited).max(leaf_branches(index, current, unvisited))
}
