//! # Newsreel
//!
//! A news-scraping pipeline that walks a site's paginated result feed,
//! filters articles by category and search phrase, normalizes them into a
//! canonical schema, downloads their images, and emits a tabular dataset
//! plus a human-readable run log.
//!
//! ## Usage
//!
//! ```sh
//! newsreel --site-url https://news.example.com -s Trump --category Politics -o ./output
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Pre-flight**: open the site, apply the category filter, submit the
//!    search phrase (category-not-found is fatal here, before any output
//!    directory exists)
//! 2. **Pagination**: fetch → normalize → dedup, batch by batch, until the
//!    feed is exhausted, the page cap is hit, or two consecutive batches
//!    yield nothing new
//! 3. **Images**: download article images concurrently (4 at a time),
//!    isolating failures per article
//! 4. **Output**: assemble the annotated article sequence, write the CSV
//!    dataset and the run log

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod assemble;
mod cli;
mod config;
mod error;
mod images;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod retry;
mod sources;
mod utils;

use cli::Cli;
use config::{RunConfig, RunPaths};
use normalize::NormalizeContext;
use outputs::report::RunLog;
use outputs::table;
use pipeline::{open_source, PaginationDriver};
use retry::RetryPolicy;
use sources::http::HttpPageSource;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newsreel starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");
    let config = RunConfig::resolve(args)?;
    info!(
        site_url = %config.site_url,
        search_phrase = %config.search_phrase,
        category = %config.category,
        headless = config.headless,
        max_pages = config.max_pages,
        "Run configuration resolved"
    );

    let client = reqwest::Client::builder()
        .user_agent(concat!("newsreel/", env!("CARGO_PKG_VERSION")))
        .build()?;

    // ---- Pre-flight: open the site and position the session ----
    // Fatal failures here (unreachable site, missing category) must leave
    // no partial output directory behind.
    let mut source = HttpPageSource::new(client.clone());
    if let Err(e) = open_source(
        &mut source,
        &config.site_url,
        &config.category,
        &config.search_phrase,
    )
    .await
    {
        error!(error = %e, "pre-flight failed; no output produced");
        return Err(e.into());
    }

    let paths = RunPaths::prepare(&config).await?;
    info!(root = %paths.root.display(), "output directory ready");

    // ---- Pagination: fetch, normalize, dedup ----
    let mut log = RunLog::new(&config);
    let ctx = NormalizeContext {
        search_phrase: config.search_phrase.clone(),
        category: config.category.clone(),
        today: chrono::Utc::now().date_naive(),
    };
    let driver = PaginationDriver::new(source, ctx, config.max_pages, RetryPolicy::page_fetch());
    let state = driver.run(&mut log).await;
    info!(
        pages = state.pages_fetched,
        collected = state.collected.len(),
        "pagination complete"
    );

    // ---- Images: concurrent, failure-isolated ----
    let fetch_results = images::acquire_all(
        &client,
        &state.collected,
        &paths.images_dir,
        &RetryPolicy::image_download(),
    )
    .await;
    for result in &fetch_results {
        log.note_image(result);
    }

    // ---- Output: dataset and run log ----
    let articles = assemble::assemble(state.collected, fetch_results);
    table::write_dataset(&articles, &paths.dataset_path)?;
    log.note(format!("dataset written with {} rows", articles.len()));

    info!(events = log.events().len(), "writing run log");
    if let Err(e) = log.write(&paths.log_path, &articles, &paths.dataset_path) {
        // The dataset is already on disk; a missing log is not worth
        // failing the run over.
        error!(path = %paths.log_path.display(), error = %e, "failed to write run log");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = articles.len(),
        dataset = %paths.dataset_path.display(),
        "Execution complete"
    );

    Ok(())
}
