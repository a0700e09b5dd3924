//! Minimum-time subway coverage tours.
//!
//! Builds a consolidated transit graph from timetable feed files, computes
//! all-pairs travel times over it, and searches for the shortest walk that
//! rides through every station at least once.

pub mod config;
pub mod domain;
pub mod feed;
pub mod graph;
pub mod paths;
pub mod pipeline;
pub mod tour;

#[cfg(test)]
mod test_support;
