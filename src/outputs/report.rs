//! Human-readable run log.
//!
//! Every run writes a plain-text report next to the dataset: the run
//! configuration, per-page admission counts, retry events (page fetches and
//! image downloads), per-image outcomes, and a summary of every extracted
//! article. Events accumulate in memory during the run and are flushed once
//! at the end.

use crate::config::RunConfig;
use crate::models::{Article, FetchOutcome, ImageFetchResult};
use chrono::Utc;
use std::fmt::Write as _;
use std::io;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Accumulates run events for the final report.
#[derive(Debug, Default)]
pub struct RunLog {
    header: Vec<String>,
    events: Vec<String>,
}

impl RunLog {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            header: vec![
                format!("URL: {}", config.site_url),
                format!("Category: {}", config.category),
                format!("Search Phrase: {}", config.search_phrase),
            ],
            events: Vec::new(),
        }
    }

    /// Record one run event.
    pub fn note(&mut self, line: impl Into<String>) {
        let line = line.into();
        debug!(event = %line, "run log");
        self.events.push(line);
    }

    /// Record the outcome of one image acquisition, including any retry
    /// events collected along the way.
    pub fn note_image(&mut self, result: &ImageFetchResult) {
        for retry in &result.retry_notes {
            self.note(retry.clone());
        }
        match &result.outcome {
            FetchOutcome::Success(Some(path)) => {
                self.note(format!("image for {} stored at {path}", result.article_identity));
            }
            FetchOutcome::Success(None) => {
                self.note(format!("article {} has no image", result.article_identity));
            }
            FetchOutcome::Failed(reason) => {
                self.note(format!("image for {} failed: {reason}", result.article_identity));
            }
        }
    }

    /// Events recorded so far, oldest first.
    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Write the report to `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn write(
        &self,
        path: &Path,
        articles: &[Article],
        dataset_path: &Path,
    ) -> io::Result<()> {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Scraping Report - {}\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        for line in &self.header {
            let _ = writeln!(out, "{line}");
        }
        let _ = writeln!(out, "Dataset: {}\n", dataset_path.display());

        let _ = writeln!(out, "Events:");
        for event in &self.events {
            let _ = writeln!(out, "- {event}");
        }

        let _ = writeln!(out, "\nExtracted News Articles:");
        for article in articles {
            let _ = writeln!(out, "- Title: {}", article.title);
            let _ = writeln!(out, "  Description: {}", article.description);
            let _ = writeln!(
                out,
                "  Date: {}",
                article
                    .published_at
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            );
            let _ = writeln!(
                out,
                "  Picture: {}",
                article.local_image_path.as_deref().unwrap_or("none")
            );
            let _ = writeln!(out, "  Search Phrase Count: {}", article.phrase_count);
            let _ = writeln!(out, "  Money Mention: {}\n", article.has_money_mention);
        }

        std::fs::write(path, out)?;
        info!("run log written");
        Ok(())
    }
}
