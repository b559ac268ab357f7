//! Page source abstraction and implementations.
//!
//! The DOM-reading source is inherently a stateful, side-effecting external
//! dependency. Hiding it behind the [`PageSource`] capability trait lets the
//! pipeline run against a fake in-memory source producing scripted record
//! batches, so pipeline tests need no live site.
//!
//! # Implementations
//!
//! | Source | Module | Notes |
//! |--------|--------|-------|
//! | HTTP result feed | [`http`] | reqwest + scraper, `?page=N` pagination |
//!
//! Each implementation maps the site's own loading scheme (classic
//! pagination or scroll-triggered batches) onto `next_batch`, so the
//! pipeline stays source-agnostic.

use crate::models::Batch;
use async_trait::async_trait;
use thiserror::Error;

pub mod http;

/// Errors raised by a page source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Navigation to a URL failed outright.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A network operation exceeded its timeout.
    #[error("page fetch timed out")]
    Timeout,

    /// The site answered with a non-success status.
    #[error("unexpected response status {0}")]
    Status(u16),

    /// A URL could not be parsed or resolved.
    #[error("bad url: {0}")]
    BadUrl(String),

    /// The source was used out of order (e.g. `next_batch` before
    /// `navigate`).
    #[error("source not ready: {0}")]
    NotReady(&'static str),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout
        } else if let Some(status) = e.status() {
            SourceError::Status(status.as_u16())
        } else {
            SourceError::Navigation {
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
                reason: e.to_string(),
            }
        }
    }
}

/// Capability interface over the stateful browsing session.
///
/// Call order is `navigate`, then optionally `select_category` and `search`,
/// then `next_batch` repeatedly until it reports `has_more = false` (or the
/// driver decides to stop earlier).
#[async_trait]
pub trait PageSource {
    /// Open the site at the given URL.
    async fn navigate(&mut self, url: &str) -> Result<(), SourceError>;

    /// Apply a category filter. Returns `false` when the label is absent
    /// from the site, which the caller treats as fatal.
    async fn select_category(&mut self, name: &str) -> Result<bool, SourceError>;

    /// Submit the search phrase. An empty phrase resets to the unfiltered
    /// feed.
    async fn search(&mut self, phrase: &str) -> Result<(), SourceError>;

    /// Fetch the next batch of raw records.
    async fn next_batch(&mut self) -> Result<Batch, SourceError>;
}
