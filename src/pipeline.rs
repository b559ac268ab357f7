//! The fetch → normalize → dedup pagination loop.
//!
//! [`PaginationDriver`] walks the source batch by batch, runs every raw
//! record through the normalizer and the deduplicator, and decides when to
//! stop: two consecutive batches with zero admissions, the configured page
//! cap, or the source reporting no further pages. A single all-duplicate
//! batch is tolerated because overlapping results during scroll-style
//! loading are transient, not a signal that the feed is exhausted.
//!
//! Pagination is strictly sequential: each batch must be fully filtered
//! before the driver can decide whether to ask for the next one, and the
//! source is a single stateful session anyway. All run state lives in one
//! [`PipelineState`] owned by the driver, so independent runs never
//! interfere.

use crate::error::ScrapeError;
use crate::models::{Article, Batch, PipelineState};
use crate::normalize::{normalize, NormalizeContext};
use crate::outputs::report::RunLog;
use crate::retry::RetryPolicy;
use crate::sources::PageSource;
use crate::utils::truncate_for_log;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Consecutive zero-admission batches tolerated before stopping.
const MAX_EMPTY_PAGES: usize = 2;

/// Admit an article into the run, returning `true` when it is new.
///
/// Rejects repeats of an identity already seen, and, when the search
/// phrase is non-empty, articles with a zero phrase count. The phrase
/// filter runs here, after normalization, so identity computation is
/// unaffected by it. Calling this again with the same article is idempotent
/// with respect to `collected`.
pub fn admit(article: Article, state: &mut PipelineState, search_phrase: &str) -> bool {
    if state.seen_identities.contains(&article.identity) {
        debug!(identity = %article.identity, "duplicate article dropped");
        return false;
    }
    if !search_phrase.is_empty() && article.phrase_count == 0 {
        debug!(identity = %article.identity, title = %article.title, "article dropped by phrase filter");
        return false;
    }
    state.seen_identities.insert(article.identity.clone());
    state.collected.push(article);
    true
}

/// Open the browsing session: navigate, apply the category filter, submit
/// the search phrase.
///
/// A missing category is fatal and surfaces before any batch is fetched, so
/// the caller can bail out without creating an output directory.
pub async fn open_source<S: PageSource + Send>(
    source: &mut S,
    site_url: &str,
    category: &str,
    search_phrase: &str,
) -> Result<(), ScrapeError> {
    source.navigate(site_url).await?;
    if !category.is_empty() {
        if !source.select_category(category).await? {
            return Err(ScrapeError::CategoryNotFound(category.to_string()));
        }
        info!(category, "category filter applied");
    }
    source.search(search_phrase).await?;
    Ok(())
}

/// Drives repeated fetch → normalize → dedup cycles over one source.
pub struct PaginationDriver<S> {
    source: S,
    ctx: NormalizeContext,
    max_pages: usize,
    policy: RetryPolicy,
}

impl<S: PageSource + Send> PaginationDriver<S> {
    pub fn new(source: S, ctx: NormalizeContext, max_pages: usize, policy: RetryPolicy) -> Self {
        Self {
            source,
            ctx,
            max_pages,
            policy,
        }
    }

    /// Run the loop to completion and return the final pipeline state.
    ///
    /// Page fetch errors are retried per the policy; when retries are
    /// exhausted the driver stops early and the articles collected so far
    /// are still emitted.
    #[instrument(level = "info", skip_all, fields(max_pages = self.max_pages))]
    pub async fn run(mut self, log: &mut RunLog) -> PipelineState {
        let mut state = PipelineState::default();

        loop {
            let batch = match self.fetch_with_retry(log).await {
                Some(batch) => batch,
                None => {
                    warn!(
                        pages = state.pages_fetched,
                        collected = state.collected.len(),
                        "page fetch retries exhausted; emitting partial results"
                    );
                    break;
                }
            };

            state.pages_fetched += 1;
            let before = state.collected.len();
            for raw in &batch.records {
                match normalize(raw, &self.ctx) {
                    Ok(article) => {
                        admit(article, &mut state, &self.ctx.search_phrase);
                    }
                    Err(rejection) => {
                        debug!(
                            element = %raw.element_id,
                            snippet = %truncate_for_log(&raw.snippet, 120),
                            reason = %rejection,
                            "record rejected"
                        );
                    }
                }
            }
            let admitted = state.collected.len() - before;

            info!(
                page = state.pages_fetched,
                records = batch.records.len(),
                admitted,
                total = state.collected.len(),
                "batch filtered"
            );
            log.note(format!(
                "page {}: admitted {} of {} records",
                state.pages_fetched,
                admitted,
                batch.records.len()
            ));

            if admitted == 0 {
                state.consecutive_empty_pages += 1;
            } else {
                state.consecutive_empty_pages = 0;
            }

            if state.consecutive_empty_pages >= MAX_EMPTY_PAGES {
                info!(pages = state.pages_fetched, "no new articles in consecutive batches; stopping");
                log.note("stopped: two consecutive batches without new articles");
                break;
            }
            if state.pages_fetched >= self.max_pages {
                info!(pages = state.pages_fetched, "page cap reached; stopping");
                log.note(format!("stopped: page cap of {} reached", self.max_pages));
                break;
            }
            if !batch.has_more {
                info!(pages = state.pages_fetched, "source reports no more pages; stopping");
                log.note("stopped: source reports no more pages");
                break;
            }
        }

        state
    }

    /// Fetch one batch, retrying per the policy. `None` means the retries
    /// were exhausted.
    async fn fetch_with_retry(&mut self, log: &mut RunLog) -> Option<Batch> {
        let mut attempt = 0usize;
        loop {
            match self.source.next_batch().await {
                Ok(batch) => return Some(batch),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.policy.max_retries {
                        warn!(attempt, error = %e, "page fetch exhausted retries");
                        log.note(format!("page fetch abandoned after {attempt} attempts: {e}"));
                        return None;
                    }
                    let delay = self.policy.delay_for(attempt);
                    warn!(attempt, ?delay, error = %e, "page fetch failed; backing off");
                    log.note(format!("page fetch retry {attempt} after error: {e}"));
                    sleep(delay).await;
                }
            }
        }
    }
}
