//! Command-line interface definitions.
//!
//! All options can come from flags, from environment variables, or from a
//! JSON work-item file (`--config`); explicit flags win over file values.
//! The merge lives in [`crate::config`].

use clap::Parser;

/// Command-line arguments for the newsreel scraper.
///
/// # Examples
///
/// ```sh
/// # Everything on the command line
/// newsreel --site-url https://news.example.com -s Trump --category Politics -o ./output
///
/// # From a work-item file, overriding the phrase
/// newsreel -c workitems/election.json -s "ballot measure"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a JSON work-item file with the run configuration
    #[arg(short, long, env = "NEWSREEL_CONFIG")]
    pub config: Option<String>,

    /// URL of the news site to scrape
    #[arg(long, env = "NEWSREEL_SITE_URL")]
    pub site_url: Option<String>,

    /// Phrase to search for within the news articles
    #[arg(short, long)]
    pub search_phrase: Option<String>,

    /// Category label to filter by (omit to keep every category)
    #[arg(long)]
    pub category: Option<String>,

    /// Whether the page source runs headless (kept for work-item
    /// compatibility)
    #[arg(long)]
    pub headless: Option<bool>,

    /// Maximum number of result pages to walk
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Directory that receives the dataset, run log, and images
    #[arg(short, long)]
    pub output_dir: Option<String>,
}
