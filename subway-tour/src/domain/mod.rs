//! Domain types for the subway tour planner.
//!
//! Value types shared by every stage of the pipeline. Identity of stations,
//! edges and transfers comes from their key fields only.

mod link;
mod station;
mod time;

pub use link::{Edge, Transfer};
pub use station::{Coordinate, InvalidStationId, Station, StationId};
pub use time::{ServiceTime, TimeError};
