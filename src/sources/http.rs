//! HTTP result-feed page source.
//!
//! Fetches the configured site's result pages over plain HTTP with
//! `reqwest` and reads the per-article DOM fragments with `scraper`. The
//! site's scroll-triggered loading is mapped onto classic `?page=N`
//! pagination, so each `next_batch` call fetches one results page.
//!
//! # Selectors
//!
//! | Fragment | Selector |
//! |----------|----------|
//! | Result item | `li.stream-item` |
//! | Title | `h3.stream-item-title` |
//! | Summary | `p[data-test-locator='stream-item-summary']` |
//! | Category label | `[data-test-locator='stream-item-category']` |
//! | Image | `img` |
//! | Date | `time` |
//!
//! All DOM parsing happens in synchronous helpers so no parsed document is
//! ever held across an await point.

use super::{PageSource, SourceError};
use crate::models::{Batch, RawRecord};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Per-page network timeout.
const PAGE_TIMEOUT: Duration = Duration::from_secs(20);

static SEL_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li.stream-item").unwrap());
static SEL_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3.stream-item-title").unwrap());
static SEL_SUMMARY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p[data-test-locator='stream-item-summary']").unwrap());
static SEL_CATEGORY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[data-test-locator='stream-item-category']").unwrap());
static SEL_IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static SEL_DATE: Lazy<Selector> = Lazy::new(|| Selector::parse("time").unwrap());
static SEL_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// A stateful browsing session over one news site.
pub struct HttpPageSource {
    client: Client,
    base: Option<Url>,
    results: Option<Url>,
    home_html: String,
    selected_category: String,
    next_page: u32,
}

impl HttpPageSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base: None,
            results: None,
            home_html: String::new(),
            selected_category: String::new(),
            next_page: 1,
        }
    }

    async fn get_text(&self, url: Url) -> Result<String, SourceError> {
        let response = self
            .client
            .get(url)
            .timeout(PAGE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    #[instrument(level = "info", skip(self))]
    async fn navigate(&mut self, url: &str) -> Result<(), SourceError> {
        let base = Url::parse(url).map_err(|e| SourceError::BadUrl(format!("{url}: {e}")))?;
        self.home_html = self.get_text(base.clone()).await?;
        info!(bytes = self.home_html.len(), "site opened");
        self.results = Some(base.clone());
        self.base = Some(base);
        self.selected_category.clear();
        self.next_page = 1;
        Ok(())
    }

    #[instrument(level = "info", skip(self))]
    async fn select_category(&mut self, name: &str) -> Result<bool, SourceError> {
        let base = self
            .base
            .clone()
            .ok_or(SourceError::NotReady("navigate before selecting a category"))?;

        let Some(href) = find_category_href(&self.home_html, name) else {
            return Ok(false);
        };
        let category_url = base
            .join(&href)
            .map_err(|e| SourceError::BadUrl(format!("{href}: {e}")))?;

        // Fetching the category page both validates the link and positions
        // the session on the filtered feed.
        self.get_text(category_url.clone()).await?;
        debug!(url = %category_url, "category page loaded");
        self.results = Some(category_url);
        self.selected_category = name.to_string();
        self.next_page = 1;
        Ok(true)
    }

    #[instrument(level = "info", skip(self))]
    async fn search(&mut self, phrase: &str) -> Result<(), SourceError> {
        let mut url = self
            .results
            .clone()
            .ok_or(SourceError::NotReady("navigate before searching"))?;

        if !phrase.is_empty() {
            let q = format!("q={}", urlencoding::encode(phrase));
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{q}"),
                _ => q,
            };
            url.set_query(Some(&query));
            self.results = Some(url);
        }
        self.next_page = 1;
        Ok(())
    }

    #[instrument(level = "info", skip(self), fields(page = self.next_page))]
    async fn next_batch(&mut self) -> Result<Batch, SourceError> {
        let results = self
            .results
            .clone()
            .ok_or(SourceError::NotReady("navigate before fetching batches"))?;

        let page = self.next_page;
        let mut url = results;
        let page_param = format!("page={page}");
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{page_param}"),
            _ => page_param,
        };
        url.set_query(Some(&query));

        let html = self.get_text(url.clone()).await?;
        let records = parse_records(&html, &self.selected_category, page, &url);
        self.next_page += 1;

        debug!(page, count = records.len(), "parsed result batch");
        // The feed exposes no explicit page count; an empty page is the
        // end-of-feed signal.
        let has_more = !records.is_empty();
        Ok(Batch { records, has_more })
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

/// Find the href of the navigation link whose text matches the category
/// label (case-insensitive exact match).
fn find_category_href(html: &str, name: &str) -> Option<String> {
    let document = Html::parse_document(html);
    for link in document.select(&SEL_LINK) {
        let text = element_text(link);
        if text.trim().eq_ignore_ascii_case(name.trim()) {
            return link.value().attr("href").map(str::to_string);
        }
    }
    None
}

/// Read every result item on the page into a raw record.
fn parse_records(html: &str, fallback_category: &str, page: u32, page_url: &Url) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();

    for (i, item) in document.select(&SEL_ITEM).enumerate() {
        let title = item
            .select(&SEL_TITLE)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let snippet = item
            .select(&SEL_SUMMARY)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let image_url = item
            .select(&SEL_IMAGE)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| page_url.join(src).ok())
            .map(|u| u.to_string());
        let date_text = item
            .select(&SEL_DATE)
            .next()
            .map(element_text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let category = item
            .select(&SEL_CATEGORY)
            .next()
            .map(element_text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| fallback_category.to_string());
        let element_id = item
            .value()
            .attr("id")
            .map(str::to_string)
            .unwrap_or_else(|| format!("p{page}-r{i}"));

        records.push(RawRecord {
            title,
            snippet,
            image_url,
            date_text,
            category,
            element_id,
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <nav>
            <a href="/politics"><span>Politics</span></a>
            <a href="/sports">Sports</a>
        </nav>
        <ul>
            <li class="stream-item" id="item-1">
                <h3 class="stream-item-title">First headline</h3>
                <p data-test-locator="stream-item-summary">A summary &amp; more</p>
                <span data-test-locator="stream-item-category">Politics</span>
                <img src="/media/pic1.jpg">
                <time>3 hours ago</time>
            </li>
            <li class="stream-item">
                <h3 class="stream-item-title">Second headline</h3>
                <p data-test-locator="stream-item-summary">Another summary</p>
            </li>
        </ul>
        </body></html>
    "#;

    #[test]
    fn test_parse_records_reads_all_fields() {
        let url = Url::parse("https://news.example.com/politics?page=1").unwrap();
        let records = parse_records(PAGE, "Politics", 1, &url);

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.title.trim(), "First headline");
        assert_eq!(first.snippet.trim(), "A summary & more");
        assert_eq!(first.category, "Politics");
        assert_eq!(first.element_id, "item-1");
        assert_eq!(
            first.image_url.as_deref(),
            Some("https://news.example.com/media/pic1.jpg")
        );
        assert_eq!(first.date_text.as_deref(), Some("3 hours ago"));
    }

    #[test]
    fn test_parse_records_fills_defaults_for_sparse_items() {
        let url = Url::parse("https://news.example.com/").unwrap();
        let records = parse_records(PAGE, "Top", 2, &url);

        let second = &records[1];
        assert_eq!(second.category, "Top");
        assert_eq!(second.image_url, None);
        assert_eq!(second.date_text, None);
        assert_eq!(second.element_id, "p2-r1");
    }

    #[test]
    fn test_find_category_href_matches_link_text_case_insensitively() {
        assert_eq!(find_category_href(PAGE, "politics"), Some("/politics".to_string()));
        assert_eq!(find_category_href(PAGE, "SPORTS"), Some("/sports".to_string()));
        assert_eq!(find_category_href(PAGE, "Finance"), None);
    }
}
