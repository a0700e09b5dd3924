//! All-pairs shortest paths over the transit graph and the indices derived
//! from them.

mod cache;
mod leaves;
mod matrix;

pub use cache::{MatrixCache, graph_fingerprint};
pub use leaves::{LeafBranch, LeafIndex};
pub use matrix::PathLengthMatrix;

use std::path::PathBuf;

use crate::domain::StationId;

/// Errors from computing or persisting the path length matrix.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Some station cannot be reached from another
    #[error("graph is disconnected: no path from {from} to {to}")]
    DisconnectedGraph { from: StationId, to: StationId },

    /// The cache file could not be read or written
    #[error("path length cache {path}: {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file exists but does not describe this graph
    #[error("malformed path length cache {path} at line {line}: {reason}")]
    CacheMalformed {
        path: PathBuf,
        line: u64,
        reason: String,
    },
}
