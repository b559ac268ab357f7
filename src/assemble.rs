//! Final assembly of the collected articles.
//!
//! Joins the ordered article sequence with the image fetch results, keyed by
//! article identity. First-seen order across pagination is preserved; that
//! order is canonical for the tabular sink. Articles whose image failed stay
//! in the output with no local path.

use crate::models::{Article, FetchOutcome, ImageFetchResult};
use std::collections::HashMap;
use tracing::debug;

/// Annotate `collected` with local image paths from `results`, in place of
/// order.
pub fn assemble(mut collected: Vec<Article>, results: Vec<ImageFetchResult>) -> Vec<Article> {
    let mut outcomes: HashMap<String, FetchOutcome> = results
        .into_iter()
        .map(|r| (r.article_identity, r.outcome))
        .collect();

    for article in &mut collected {
        article.local_image_path = match outcomes.remove(&article.identity) {
            Some(FetchOutcome::Success(path)) => path,
            Some(FetchOutcome::Failed(reason)) => {
                debug!(identity = %article.identity, %reason, "article kept without image");
                None
            }
            None => None,
        };
    }

    collected
}
