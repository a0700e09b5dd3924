//! Persisted path length matrices, keyed by a fingerprint of the graph.
//!
//! The file holds one headerless `from_id,to_id,distance` line per ordered
//! station pair. Its name embeds a SHA-256 digest of the graph's stations
//! and links, so a changed feed never picks up a stale matrix.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::info;

use crate::graph::TransitGraph;

use super::PathError;
use super::matrix::{PathLengthMatrix, station_ids};

/// Hex characters of the fingerprint used in file names.
const FINGERPRINT_LEN: usize = 16;

/// Hex SHA-256 digest of everything the matrix depends on.
pub fn graph_fingerprint(graph: &TransitGraph) -> String {
    let mut hasher = Sha256::new();

    for station in graph.stations() {
        hasher.update(b"S");
        hasher.update(station.id.as_str().as_bytes());
        hasher.update([0u8]);
    }
    for edge in graph.edges() {
        hasher.update(b"E");
        hasher.update(edge.from.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(edge.to.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(edge.duration.to_le_bytes());
        for station in &edge.intermediates {
            hasher.update(station.as_str().as_bytes());
            hasher.update([0u8]);
        }
    }
    for transfer in graph.transfers() {
        hasher.update(b"T");
        hasher.update(transfer.from.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(transfer.to.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(transfer.min_transfer_time.to_le_bytes());
    }

    format!("{:x}", hasher.finalize())
}

/// Directory of persisted matrices.
#[derive(Debug, Clone)]
pub struct MatrixCache {
    dir: PathBuf,
}

impl MatrixCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where the matrix for this graph lives.
    pub fn path_for(&self, graph: &TransitGraph) -> PathBuf {
        let fingerprint = graph_fingerprint(graph);
        self.dir
            .join(format!("path-lengths-{}.csv", &fingerprint[..FINGERPRINT_LEN]))
    }

    /// Load the persisted matrix for this graph, if there is one.
    pub fn load(&self, graph: &TransitGraph) -> Result<Option<PathLengthMatrix>, PathError> {
        let path = self.path_for(graph);
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path).map_err(|source| PathError::CacheIo {
            path: path.clone(),
            source,
        })?;
        read_matrix(&path, file, graph).map(Some)
    }

    /// Write the matrix for this graph, replacing any earlier file.
    pub fn store(&self, graph: &TransitGraph, matrix: &PathLengthMatrix) -> Result<PathBuf, PathError> {
        let path = self.path_for(graph);
        let cache_io = |source: std::io::Error| PathError::CacheIo {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(cache_io)?;

        // Written beside the target and renamed so readers never see half a file.
        let partial = path.with_extension("csv.partial");
        let file = File::create(&partial).map_err(cache_io)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for (from, to, distance) in matrix.triples() {
            writer
                .write_record([from.as_str(), to.as_str(), distance.to_string().as_str()])
                .map_err(|e| cache_io(e.into()))?;
        }
        let mut file = writer
            .into_inner()
            .map_err(|e| cache_io(e.into_error()))?;
        file.flush().map_err(cache_io)?;
        std::fs::rename(&partial, &path).map_err(cache_io)?;

        Ok(path)
    }

    /// Reuse the persisted matrix for this graph or compute and persist it.
    pub fn load_or_compute(&self, graph: &TransitGraph) -> Result<PathLengthMatrix, PathError> {
        if let Some(matrix) = self.load(graph)? {
            info!(path = %self.path_for(graph).display(), "path length cache hit");
            return Ok(matrix);
        }

        info!(path = %self.path_for(graph).display(), "path length cache miss");
        let matrix = PathLengthMatrix::compute(graph)?;
        let path = self.store(graph, &matrix)?;
        info!(path = %path.display(), "wrote path length cache");
        Ok(matrix)
    }
}

fn read_matrix(
    path: &Path,
    source: impl std::io::Read,
    graph: &TransitGraph,
) -> Result<PathLengthMatrix, PathError> {
    let malformed = |line: u64, reason: String| PathError::CacheMalformed {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let n = graph.len();
    let mut distances = vec![f64::NAN; n * n];
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or_default();
            malformed(line, e.to_string())
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let [from, to, distance] = [0, 1, 2].map(|i| record.get(i));
        let (Some(from), Some(to), Some(distance)) = (from, to, distance) else {
            return Err(malformed(line, format!("expected 3 columns, found {}", record.len())));
        };

        let index = |id: &str| {
            graph
                .stations()
                .binary_search_by(|s| s.id.as_str().cmp(id))
                .map_err(|_| malformed(line, format!("unknown station {id}")))
        };
        let (i, j) = (index(from)?, index(to)?);

        let distance: f64 = distance
            .parse()
            .map_err(|e| malformed(line, format!("invalid distance {distance:?}: {e}")))?;
        if !(distance.is_finite() && distance >= 0.0) {
            return Err(malformed(line, format!("invalid distance {distance}")));
        }
        distances[i * n + j] = distance;
    }

    if let Some(position) = distances.iter().position(|d| d.is_nan()) {
        return Err(malformed(
            0,
            format!(
                "missing distance from {} to {}",
                graph.id_at(position / n),
                graph.id_at(position % n)
            ),
        ));
    }

    PathLengthMatrix::from_parts(station_ids(graph), distances)
}
