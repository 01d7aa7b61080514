//! Error taxonomy for a feed cycle.
//!
//! Every variant aborts the cycle before the feed file is touched.

use std::path::PathBuf;
use std::time::Duration;

/// Failures while driving the browser against the listing site.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("browser session could not be started: {0}")]
    Launch(String),
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("{url} did not finish loading within {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("no listing elements matching `{selector}` appeared on {url}")]
    NoListings { url: String, selector: String },
    #[error("browser session did not shut down cleanly: {0}")]
    Shutdown(String),
}

/// Top-level error for every stage of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("listing page {url} has content but no job rows could be located")]
    Parse { url: String },
    #[error("feed cannot be serialized: {0}")]
    Serialization(String),
    #[error("persisted feed is not a valid RSS document: {0}")]
    Deserialization(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FeedError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable tag for JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch_error",
            Self::Parse { .. } => "parse_error",
            Self::Serialization(_) => "serialization_error",
            Self::Deserialization(_) => "deserialization_error",
            Self::Configuration(_) => "configuration_error",
            Self::Io { .. } => "io_error",
        }
    }
}

pub type Result<T, E = FeedError> = std::result::Result<T, E>;
