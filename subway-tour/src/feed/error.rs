//! Feed loading and graph building errors.

use std::path::PathBuf;

use crate::domain::StationId;
use crate::graph::GraphError;

/// Errors raised while reading the raw record set or building the graph.
///
/// All of these are fatal: a bad record halts the build.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A feed file could not be opened
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV layer failed (bad quoting, invalid UTF-8, I/O)
    #[error("failed to read {file}: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },

    /// A record has the wrong column count or an unparseable field
    #[error("malformed record in {file} at line {line}: {reason}")]
    MalformedRecord {
        file: &'static str,
        line: u64,
        reason: String,
    },

    /// A record refers to a trip, route or station that was never defined
    #[error("unknown {kind} {id} referenced in {file} at line {line}")]
    UnknownReference {
        file: &'static str,
        line: u64,
        kind: &'static str,
        id: String,
    },

    /// Following parent stations from this station never ends
    #[error("parent station chain starting at {station} contains a cycle")]
    ParentCycle { station: StationId },

    /// The consolidated parts did not form a valid graph
    #[error("invalid graph: {0}")]
    Graph(#[from] GraphError),
}
