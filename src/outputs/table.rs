//! Tabular dataset output.
//!
//! One row per article, in first-seen order, with a fixed column order:
//! title, description, published_at, phrase_count, has_money_mention,
//! local_image_path. Identity is a diagnostics-only key and stays out of
//! the dataset.

use crate::error::ScrapeError;
use crate::models::Article;
use std::path::Path;
use tracing::{info, instrument};

/// Fixed header for the dataset.
pub const COLUMNS: [&str; 6] = [
    "title",
    "description",
    "published_at",
    "phrase_count",
    "has_money_mention",
    "local_image_path",
];

/// Write the assembled articles as a CSV file at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = articles.len()))]
pub fn write_dataset(articles: &[Article], path: &Path) -> Result<(), ScrapeError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(COLUMNS)?;

    for article in articles {
        let published = article
            .published_at
            .map(|d| d.to_string())
            .unwrap_or_default();
        writer.write_record([
            article.title.as_str(),
            article.description.as_str(),
            published.as_str(),
            article.phrase_count.to_string().as_str(),
            if article.has_money_mention { "true" } else { "false" },
            article.local_image_path.as_deref().unwrap_or(""),
        ])?;
    }

    writer.flush().map_err(ScrapeError::Io)?;
    info!("dataset written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::identity_hash;
    use chrono::NaiveDate;

    fn article(title: &str) -> Article {
        Article {
            identity: identity_hash(title, NaiveDate::from_ymd_opt(2025, 5, 6)),
            title: title.to_string(),
            description: "A description, with a comma".to_string(),
            published_at: NaiveDate::from_ymd_opt(2025, 5, 6),
            image_url: None,
            local_image_path: Some("out/images/0.jpg".to_string()),
            phrase_count: 2,
            has_money_mention: true,
        }
    }

    #[test]
    fn test_dataset_has_header_and_one_row_per_article() {
        let dir = std::env::temp_dir().join(format!("newsreel-table-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("articles.csv");

        write_dataset(&[article("First"), article("Second")], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], COLUMNS.join(","));
        assert!(lines[1].starts_with("First,"));
        assert!(lines[1].contains("2025-05-06"));
        assert!(lines[1].contains("true"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
