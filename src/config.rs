//! Run configuration: work-item file merged with CLI flags.
//!
//! A run is described by a small JSON work item (the same shape an RPA
//! work-item queue would hand over):
//!
//! ```json
//! {
//!   "site_url": "https://news.example.com",
//!   "search_phrase": "Trump",
//!   "category": "Politics",
//!   "headless": true,
//!   "max_pages": 10,
//!   "output_dir": "output"
//! }
//! ```
//!
//! Any field given as a CLI flag overrides the file value. Only `site_url`
//! is mandatory.

use crate::cli::Cli;
use crate::error::ScrapeError;
use crate::utils::{category_prefix, ensure_writable_dir, session_timestamp};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Resolved configuration for one scraping run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// The URL of the news site to scrape.
    pub site_url: String,
    /// The phrase to search for within the news articles. Empty disables
    /// the phrase filter.
    pub search_phrase: String,
    /// The category of news to filter by. Empty admits every category.
    pub category: String,
    /// Whether the page source should run headless.
    pub headless: bool,
    /// Maximum number of result pages to walk.
    pub max_pages: usize,
    /// Directory that receives the dataset, run log, and images.
    pub output_dir: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            search_phrase: String::new(),
            category: String::new(),
            headless: true,
            max_pages: 10,
            output_dir: "output".to_string(),
        }
    }
}

impl RunConfig {
    /// Merge the optional work-item file with CLI flags. Flags win.
    pub fn resolve(cli: Cli) -> Result<Self, ScrapeError> {
        let mut config = match &cli.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let parsed: RunConfig = serde_json::from_str(&raw)
                    .map_err(|e| ScrapeError::Config(format!("{path}: {e}")))?;
                info!(path = %path, "loaded work-item configuration");
                parsed
            }
            None => RunConfig::default(),
        };

        if let Some(v) = cli.site_url {
            config.site_url = v;
        }
        if let Some(v) = cli.search_phrase {
            config.search_phrase = v;
        }
        if let Some(v) = cli.category {
            config.category = v;
        }
        if let Some(v) = cli.headless {
            config.headless = v;
        }
        if let Some(v) = cli.max_pages {
            config.max_pages = v;
        }
        if let Some(v) = cli.output_dir {
            config.output_dir = v;
        }

        if config.site_url.trim().is_empty() {
            return Err(ScrapeError::Config(
                "site_url is required (flag or work item)".to_string(),
            ));
        }
        if config.max_pages == 0 {
            return Err(ScrapeError::Config("max_pages must be at least 1".to_string()));
        }

        Ok(config)
    }
}

/// The materialized output layout of one run.
#[derive(Debug)]
pub struct RunPaths {
    /// The run's root directory.
    pub root: PathBuf,
    /// Directory receiving downloaded images.
    pub images_dir: PathBuf,
    /// The tabular dataset file.
    pub dataset_path: PathBuf,
    /// The human-readable run log file.
    pub log_path: PathBuf,
}

impl RunPaths {
    /// Lay out the paths without touching the filesystem.
    pub fn plan(config: &RunConfig) -> Self {
        let prefix = category_prefix(&config.category);
        let timestamp = session_timestamp();
        let root = Path::new(&config.output_dir).to_path_buf();
        Self {
            images_dir: root.join("images"),
            dataset_path: root.join(format!("{prefix}_articles_{timestamp}.csv")),
            log_path: root.join(format!("{prefix}_run_log_{timestamp}.txt")),
            root,
        }
    }

    /// Create the run directories and verify they are writable.
    ///
    /// Called only after the pre-flight (navigation, category selection)
    /// has succeeded, so a fatal configuration error leaves no partial
    /// output directory behind.
    pub async fn prepare(config: &RunConfig) -> Result<Self, ScrapeError> {
        let paths = Self::plan(config);
        ensure_writable_dir(&paths.root)
            .await
            .map_err(|e| ScrapeError::Config(format!("output dir: {e}")))?;
        tokio::fs::create_dir_all(&paths.images_dir).await?;
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["newsreel"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_missing_site_url_is_rejected() {
        let result = RunConfig::resolve(cli(&["--category", "Politics"]));
        assert!(matches!(result, Err(ScrapeError::Config(_))));
    }

    #[test]
    fn test_flags_fill_defaults() {
        let config =
            RunConfig::resolve(cli(&["--site-url", "https://news.example.com"])).unwrap();
        assert_eq!(config.site_url, "https://news.example.com");
        assert_eq!(config.search_phrase, "");
        assert_eq!(config.max_pages, 10);
        assert!(config.headless);
    }

    #[test]
    fn test_flags_override_work_item_file() {
        let dir = std::env::temp_dir().join(format!("newsreel-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("work-item.json");
        std::fs::write(
            &path,
            r#"{"site_url": "https://file.example.com", "search_phrase": "economy", "max_pages": 3}"#,
        )
        .unwrap();

        let config = RunConfig::resolve(cli(&[
            "--config",
            path.to_str().unwrap(),
            "--search-phrase",
            "Trump",
        ]))
        .unwrap();

        assert_eq!(config.site_url, "https://file.example.com");
        assert_eq!(config.search_phrase, "Trump");
        assert_eq!(config.max_pages, 3);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_run_paths_layout() {
        let config = RunConfig {
            site_url: "https://news.example.com".to_string(),
            category: "World News".to_string(),
            output_dir: "out".to_string(),
            ..RunConfig::default()
        };
        let paths = RunPaths::plan(&config);
        assert_eq!(paths.images_dir, Path::new("out/images"));
        let dataset = paths.dataset_path.file_name().unwrap().to_string_lossy();
        assert!(dataset.starts_with("WORLD_NEWS_articles_"));
        assert!(dataset.ends_with(".csv"));
    }
}
