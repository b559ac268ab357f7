//! Data models for the extraction pipeline.
//!
//! This module defines the core data structures flowing through the pipeline:
//! - [`RawRecord`]: unprocessed per-article data as read from the source page
//! - [`Batch`]: one unit of fetched results (a page or a scroll-triggered load)
//! - [`Article`]: the canonical entity every output row conforms to
//! - [`PipelineState`]: run state owned by the pagination driver
//! - [`ImageFetchResult`]: the outcome of one image acquisition
//!
//! `RawRecord`s are ephemeral; each one is consumed by a single normalization
//! call. `Article`s are created once per unique article and are immutable
//! until the assembler annotates them with their local image path.

use chrono::NaiveDate;
use std::collections::HashSet;

/// A raw article record as read from the source page, before normalization.
///
/// Field contents are free-form: titles and snippets may carry stray
/// whitespace and HTML entities, the date may be absolute or a relative
/// phrase ("3 hours ago"), and the image URL may be absent.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// The article headline text.
    pub title: String,
    /// The article summary/snippet text.
    pub snippet: String,
    /// The article image URL, if the source element carried one.
    pub image_url: Option<String>,
    /// The publication date text, absolute or relative, if present.
    pub date_text: Option<String>,
    /// The category label read alongside this record.
    pub category: String,
    /// Identity of the source element, for diagnostics only.
    pub element_id: String,
}

/// One unit of fetched results from the source.
///
/// A batch is either a classic results page or one scroll-triggered load;
/// the pipeline does not distinguish between the two.
#[derive(Debug)]
pub struct Batch {
    /// The raw records found in this batch.
    pub records: Vec<RawRecord>,
    /// Whether the source believes further batches exist.
    pub has_more: bool,
}

/// The canonical article entity produced by normalization.
///
/// `identity` is a deterministic hash over the lowercased trimmed title and
/// the published date (or `"unknown"`), used as the dedup key across pages.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Stable dedup key derived from title and publication date.
    pub identity: String,
    /// Cleaned headline text.
    pub title: String,
    /// Cleaned summary text.
    pub description: String,
    /// Parsed publication date; `None` when the date text was unparseable.
    pub published_at: Option<NaiveDate>,
    /// The remote image URL, if any.
    pub image_url: Option<String>,
    /// The locally materialized image path, filled in by the assembler.
    pub local_image_path: Option<String>,
    /// Non-overlapping case-insensitive occurrences of the search phrase
    /// in title + description.
    pub phrase_count: usize,
    /// Whether title or description contains a currency-amount pattern.
    pub has_money_mention: bool,
}

/// Run state owned exclusively by one pagination driver instance.
#[derive(Debug, Default)]
pub struct PipelineState {
    /// Identities of every article admitted so far.
    pub seen_identities: HashSet<String>,
    /// Admitted articles, in first-seen order. This order is canonical for
    /// the tabular output.
    pub collected: Vec<Article>,
    /// Number of batches fetched so far.
    pub pages_fetched: usize,
    /// Number of consecutive batches that yielded zero admissions.
    pub consecutive_empty_pages: usize,
}

/// Outcome of acquiring one article's image.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The image was stored at the given local path, or the article had no
    /// image to begin with (`None`, which is not a failure).
    Success(Option<String>),
    /// The download failed permanently or exhausted its retries.
    Failed(String),
}

/// The result of one image acquisition, keyed back to its article.
#[derive(Debug)]
pub struct ImageFetchResult {
    /// Identity of the article this image belongs to.
    pub article_identity: String,
    /// Success with an optional local path, or a failure reason.
    pub outcome: FetchOutcome,
    /// Human-readable retry events recorded during acquisition, for the
    /// run log.
    pub retry_notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_state_starts_empty() {
        let state = PipelineState::default();
        assert!(state.seen_identities.is_empty());
        assert!(state.collected.is_empty());
        assert_eq!(state.pages_fetched, 0);
        assert_eq!(state.consecutive_empty_pages, 0);
    }

    #[test]
    fn test_fetch_outcome_success_without_image() {
        let outcome = FetchOutcome::Success(None);
        assert_eq!(outcome, FetchOutcome::Success(None));
        assert_ne!(outcome, FetchOutcome::Failed("timeout".to_string()));
    }
}
