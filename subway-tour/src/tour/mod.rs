//! Tour search: the shortest walk that covers every station.
//!
//! The exact solver is an A* search over (station, unvisited set) states
//! with dominance pruning and forced-move collapsing. The approximate
//! solver is a greedy nearest-station walk for when the exact one is too
//! slow.

mod approximate;
mod config;
pub mod heuristic;
mod index;
mod result;
mod search;


pub use approximate::approximate;
pub use config::{SearchConfig, TourMode};
pub use index::TourIndex;
pub use result::TourResult;
pub use search::{SearchError, SearchNode, SearchOutcome, SearchState, TourSearch};
