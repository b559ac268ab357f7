//! Crate-wide error types.
//!
//! Propagation policy: failures local to one article or one image never
//! abort the run; page-level fetch failures are retried and then degrade to
//! early termination with partial results; configuration-level failures
//! (category not found, unreachable site) are fatal and surface before any
//! output directory exists.

use crate::sources::SourceError;
use thiserror::Error;

/// Top-level error for a scraping run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The configured category label is absent from the site. Fatal, raised
    /// before any page fetching begins.
    #[error("category '{0}' not found on the site")]
    CategoryNotFound(String),

    /// Navigation or page fetching failed.
    #[error("page fetch failed: {0}")]
    PageFetch(#[from] SourceError),

    /// The run configuration could not be resolved.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Filesystem trouble with the output directory or its files.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The tabular dataset could not be written.
    #[error("failed to write dataset: {0}")]
    Sink(#[from] csv::Error),
}
