//! Normalization of raw source records into canonical articles.
//!
//! [`normalize`] is a pure function of its inputs: it cleans text, parses
//! absolute and relative dates, counts search-phrase occurrences, flags
//! monetary mentions, and derives the dedup identity hash. Records with an
//! empty title or a mismatched category are rejected; an unparseable date is
//! not a rejection, it just leaves `published_at` empty.

use crate::models::{Article, RawRecord};
use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fmt;

/// Inputs the normalizer needs besides the record itself.
///
/// `today` anchors relative date phrases so normalization stays
/// deterministic; the caller captures it once per run.
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    /// The configured search phrase. Empty disables the phrase filter.
    pub search_phrase: String,
    /// The configured category label. Empty admits every category.
    pub category: String,
    /// Reference date for resolving "3 hours ago" and friends.
    pub today: NaiveDate,
}

/// Why a raw record was excluded from the pipeline.
///
/// Rejections are logged at debug level and never fatal.
#[derive(Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The title was empty after trimming.
    EmptyTitle,
    /// The record's category label did not match the configured filter.
    CategoryMismatch { wanted: String, got: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::EmptyTitle => write!(f, "empty title"),
            Rejection::CategoryMismatch { wanted, got } => {
                write!(f, "category '{got}' does not match '{wanted}'")
            }
        }
    }
}

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// Symbol or ISO code followed by digits, or digits followed by a currency
// word. Thousands separators and decimal fractions allowed.
static RE_MONEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        (?: [$\u{20AC}\u{00A3}\u{00A5}] | \b (?:usd|eur|gbp) \b ) \s* \d [\d,]* (?: \.\d+ )?
        | \b \d [\d,]* (?: \.\d+ )? \s* (?: dollars? | euros? | pounds? | cents? | usd | eur | gbp ) \b
        ",
    )
    .unwrap()
});

static RE_RELATIVE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\s*(min(?:ute)?|hr|hour|day|week|month)s?\s+ago$").unwrap()
});

/// Convert one raw record into a canonical [`Article`].
///
/// Returns a [`Rejection`] when the title is empty after cleaning or when
/// the record's category label does not match the configured filter
/// (case-insensitive exact match). No side effects.
pub fn normalize(raw: &RawRecord, ctx: &NormalizeContext) -> Result<Article, Rejection> {
    let title = clean_text(&raw.title);
    if title.is_empty() {
        return Err(Rejection::EmptyTitle);
    }

    if !ctx.category.is_empty() {
        let got = raw.category.trim();
        if !got.eq_ignore_ascii_case(ctx.category.trim()) {
            return Err(Rejection::CategoryMismatch {
                wanted: ctx.category.clone(),
                got: got.to_string(),
            });
        }
    }

    let description = clean_text(&raw.snippet);
    let published_at = raw
        .date_text
        .as_deref()
        .and_then(|text| parse_date(text, ctx.today));

    let haystack = format!("{} {}", title, description);
    let phrase_count = phrase_count(&haystack, &ctx.search_phrase);
    let has_money_mention = RE_MONEY.is_match(&haystack);
    let identity = identity_hash(&title, published_at);

    Ok(Article {
        identity,
        title,
        description,
        published_at,
        image_url: raw.image_url.clone().filter(|u| !u.trim().is_empty()),
        local_image_path: None,
        phrase_count,
        has_money_mention,
    })
}

/// Decode HTML entities, collapse consecutive whitespace, and trim.
pub fn clean_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    RE_WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

/// Count non-overlapping case-insensitive occurrences of `phrase` in
/// `haystack`. An empty phrase counts as zero.
pub fn phrase_count(haystack: &str, phrase: &str) -> usize {
    if phrase.is_empty() {
        return 0;
    }
    haystack
        .to_lowercase()
        .matches(&phrase.to_lowercase())
        .count()
}

/// Parse an absolute date or a relative phrase.
///
/// Relative phrases under a day ("20 minutes ago", "3 hours ago") resolve to
/// `today`; coarser units subtract whole days (months approximated as 30).
/// Returns `None` when nothing matches.
pub fn parse_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();
    match lower.as_str() {
        "today" | "just now" | "now" => return Some(today),
        "yesterday" => return Some(today - Duration::days(1)),
        _ => {}
    }

    if let Some(caps) = RE_RELATIVE_DATE.captures(&lower) {
        let n: i64 = caps[1].parse().ok()?;
        let unit = &caps[2];
        let days = if unit.starts_with("min") || unit.starts_with("h") {
            0
        } else if unit.starts_with("day") {
            n
        } else if unit.starts_with("week") {
            n * 7
        } else {
            n * 30
        };
        return Some(today - Duration::days(days));
    }

    const FORMATS: [&str; 5] = ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%m/%d/%Y", "%d %B %Y"];
    for fmt in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }

    None
}

/// Deterministic identity hash over (lowercased trimmed title, published
/// date or "unknown"). Two records with identical hashes are the same
/// article regardless of which page they came from.
pub fn identity_hash(title: &str, published_at: Option<NaiveDate>) -> String {
    let date = published_at
        .map(|d| d.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut hasher = Sha256::new();
    hasher.update(title.trim().to_lowercase().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(date.as_bytes());

    hasher.finalize()[..8]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(phrase: &str, category: &str) -> NormalizeContext {
        NormalizeContext {
            search_phrase: phrase.to_string(),
            category: category.to_string(),
            today: NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
        }
    }

    fn record(title: &str, snippet: &str) -> RawRecord {
        RawRecord {
            title: title.to_string(),
            snippet: snippet.to_string(),
            image_url: None,
            date_text: None,
            category: "Politics".to_string(),
            element_id: "item-1".to_string(),
        }
    }

    #[test]
    fn test_empty_title_is_rejected() {
        let raw = record("   \t ", "some snippet");
        assert_eq!(normalize(&raw, &ctx("", "")), Err(Rejection::EmptyTitle));
    }

    #[test]
    fn test_category_mismatch_is_rejected() {
        let raw = record("A headline", "snippet");
        let result = normalize(&raw, &ctx("", "Sports"));
        assert!(matches!(result, Err(Rejection::CategoryMismatch { .. })));
    }

    #[test]
    fn test_category_match_is_case_insensitive() {
        let raw = record("A headline", "snippet");
        assert!(normalize(&raw, &ctx("", "poLiTics")).is_ok());
    }

    #[test]
    fn test_empty_category_filter_admits_everything() {
        let raw = record("A headline", "snippet");
        assert!(normalize(&raw, &ctx("", "")).is_ok());
    }

    #[test]
    fn test_clean_text_collapses_whitespace_and_decodes_entities() {
        assert_eq!(clean_text("  Fed &amp; Treasury \n\t split  "), "Fed & Treasury split");
    }

    #[test]
    fn test_phrase_count_is_case_insensitive_and_non_overlapping() {
        assert_eq!(phrase_count("AAAA", "aa"), 2);
        assert_eq!(phrase_count("Trump meets trump", "TRUMP"), 2);
        assert_eq!(phrase_count("anything", ""), 0);
    }

    #[test]
    fn test_unparseable_date_does_not_reject() {
        let mut raw = record("A headline", "snippet");
        raw.date_text = Some("sometime soon".to_string());
        let article = normalize(&raw, &ctx("", "")).unwrap();
        assert_eq!(article.published_at, None);
    }

    #[test]
    fn test_parse_date_absolute_formats() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 8, 19).unwrap();
        assert_eq!(parse_date("2024-08-19", today), Some(expected));
        assert_eq!(parse_date("August 19, 2024", today), Some(expected));
        assert_eq!(parse_date("Aug 19, 2024", today), Some(expected));
        assert_eq!(parse_date("08/19/2024", today), Some(expected));
    }

    #[test]
    fn test_parse_date_relative_phrases() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        assert_eq!(parse_date("3 hours ago", today), Some(today));
        assert_eq!(parse_date("20 minutes ago", today), Some(today));
        assert_eq!(parse_date("Yesterday", today), Some(today - Duration::days(1)));
        assert_eq!(parse_date("2 days ago", today), Some(today - Duration::days(2)));
        assert_eq!(parse_date("1 week ago", today), Some(today - Duration::days(7)));
    }

    #[test]
    fn test_money_mention_symbol_then_digits() {
        let raw = record("Budget passes", "The plan allocates $4.5 billion in funding");
        let article = normalize(&raw, &ctx("", "")).unwrap();
        assert!(article.has_money_mention);
    }

    #[test]
    fn test_money_mention_digits_then_currency_word() {
        let raw = record("Fine announced", "Company must pay 250,000 dollars");
        let article = normalize(&raw, &ctx("", "")).unwrap();
        assert!(article.has_money_mention);

        let raw = record("ISO code", "Deal worth USD 12 million closed");
        let article = normalize(&raw, &ctx("", "")).unwrap();
        assert!(article.has_money_mention);
    }

    #[test]
    fn test_no_money_mention_for_plain_numbers() {
        let raw = record("Election results", "Turnout was 54 percent across 3 states");
        let article = normalize(&raw, &ctx("", "")).unwrap();
        assert!(!article.has_money_mention);
    }

    #[test]
    fn test_identity_ignores_case_and_surrounding_whitespace() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 6);
        assert_eq!(identity_hash("Big Story", date), identity_hash("  big story ", date));
        assert_ne!(identity_hash("Big Story", date), identity_hash("Big Story", None));
    }

    #[test]
    fn test_phrase_count_spans_title_and_description() {
        let raw = record("Trump speaks", "Critics respond to Trump");
        let article = normalize(&raw, &ctx("Trump", "")).unwrap();
        assert_eq!(article.phrase_count, 2);
    }
}
