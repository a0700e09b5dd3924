//! One tour run, from feed directory to result.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use crate::config::TourConfig;
use crate::feed::{BuildOptions, FeedError, GraphBuilder, RawFeed};
use crate::graph::TransitGraph;
use crate::paths::{MatrixCache, PathError, PathLengthMatrix};
use crate::tour::{SearchConfig, SearchError, TourIndex, TourMode, TourResult, TourSearch, approximate};

/// Error from any stage of a run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Paths(#[from] PathError),

    #[error(transparent)]
    Search(#[from] SearchError),

    /// The result could not be written
    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load the feed files and build the consolidated graph.
pub fn build_graph(feed_dir: &Path, options: &BuildOptions) -> Result<TransitGraph, FeedError> {
    let feed = RawFeed::load(feed_dir)?;
    GraphBuilder::new(&feed).with_options(options.clone()).build()
}

/// All-pairs path lengths, through the cache when one is configured.
pub fn path_lengths(
    graph: &TransitGraph,
    cache_dir: Option<&Path>,
) -> Result<PathLengthMatrix, PathError> {
    match cache_dir {
        Some(dir) => MatrixCache::new(dir).load_or_compute(graph),
        None => PathLengthMatrix::compute(graph),
    }
}

/// Search for a tour over a graph and its path lengths.
pub fn solve(
    graph: TransitGraph,
    matrix: PathLengthMatrix,
    mode: TourMode,
    config: &SearchConfig,
) -> Result<TourResult, SearchError> {
    let index = TourIndex::derive(graph, matrix);
    let started = Instant::now();
    let outcome = match mode {
        TourMode::Exact => TourSearch::new(&index, config).run()?,
        TourMode::Approximate => approximate(&index, config)?,
    };
    info!(
        %mode,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "tour found"
    );
    Ok(TourResult::new(mode, outcome, index.graph()))
}

/// Run every stage for one configuration.
pub fn run(config: &TourConfig) -> Result<TourResult, PipelineError> {
    let graph = build_graph(&config.feed_dir, &config.build)?;
    let matrix = path_lengths(&graph, config.cache_dir.as_deref())?;
    let result = solve(graph, matrix, config.mode, &config.search)?;

    if let Some(path) = &config.output {
        write_json(&result, path)?;
        info!(path = %path.display(), "wrote tour");
    }
    Ok(result)
}

/// Write a result as pretty-printed JSON.
pub fn write_json(result: &TourResult, path: &Path) -> Result<(), PipelineError> {
    let output = |source: std::io::Error| PipelineError::Output {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(output)?);
    serde_json::to_writer_pretty(&mut writer, result).map_err(|e| output(e.into()))?;
    writer.write_all(b"\n").map_err(output)?;
    writer.flush().map_err(output)
}
