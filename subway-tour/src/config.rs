//! Run configuration read from the environment.

use std::path::PathBuf;

use crate::feed::BuildOptions;
use crate::tour::{SearchConfig, TourMode};

pub const FEED_DIR: &str = "SUBWAY_TOUR_FEED_DIR";
pub const CACHE_DIR: &str = "SUBWAY_TOUR_CACHE_DIR";
pub const MODE: &str = "SUBWAY_TOUR_MODE";
pub const EXCLUDE: &str = "SUBWAY_TOUR_EXCLUDE";
pub const OUTPUT: &str = "SUBWAY_TOUR_OUTPUT";
pub const MAX_EXPANSIONS: &str = "SUBWAY_TOUR_MAX_EXPANSIONS";

/// Error from reading the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable is set to something unusable
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct TourConfig {
    /// Directory holding the feed files.
    pub feed_dir: PathBuf,
    /// Where the path length matrix is cached. No caching when `None`.
    pub cache_dir: Option<PathBuf>,
    pub mode: TourMode,
    pub build: BuildOptions,
    pub search: SearchConfig,
    /// Where to write the result as JSON.
    pub output: Option<PathBuf>,
}

impl TourConfig {
    pub fn new(feed_dir: impl Into<PathBuf>) -> Self {
        Self {
            feed_dir: feed_dir.into(),
            cache_dir: None,
            mode: TourMode::default(),
            build: BuildOptions::default(),
            search: SearchConfig::default(),
            output: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let feed_dir = var(FEED_DIR).ok_or(ConfigError::Missing(FEED_DIR))?;
        let mut config = Self::new(feed_dir);
        config.cache_dir = var(CACHE_DIR).map(PathBuf::from);
        config.output = var(OUTPUT).map(PathBuf::from);

        if let Some(mode) = var(MODE) {
            config.mode = mode.parse().map_err(|reason| ConfigError::Invalid {
                name: MODE,
                reason,
            })?;
        }

        if let Some(prefixes) = var(EXCLUDE) {
            config.build = BuildOptions::excluding(
                prefixes
                    .split(',')
                    .map(str::trim)
                    .filter(|prefix| !prefix.is_empty()),
            );
        }

        if let Some(limit) = var(MAX_EXPANSIONS) {
            let limit: usize = limit.parse().map_err(|e| ConfigError::Invalid {
                name: MAX_EXPANSIONS,
                reason: format!("{limit:?}: {e}"),
            })?;
            config.search = config.search.with_max_expansions(limit);
        }

        Ok(config)
    }
}
