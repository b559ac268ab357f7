//! Resilient image acquisition.
//!
//! Each article's image URL is resolved to a file under the run's `images/`
//! directory. Transient failures (timeouts, connection resets, 5xx) retry
//! with linear backoff; permanent failures (malformed URL, 4xx, non-image
//! content) fail immediately. A failed acquisition is recorded and skipped;
//! it never aborts the run and never blocks other images.
//!
//! Acquisitions for distinct articles share no mutable state, so they run
//! concurrently up to [`IMAGE_WORKERS`] at a time; each writes its own
//! `<n>.<ext>` filename so there is no write contention.

use crate::models::{Article, FetchOutcome, ImageFetchResult};
use crate::retry::RetryPolicy;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Bounded concurrency for image downloads.
pub const IMAGE_WORKERS: usize = 4;

/// Per-download network timeout.
const IMAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// A classified download failure.
#[derive(Debug)]
struct ImageError {
    transient: bool,
    reason: String,
}

/// Map a response content type to a file extension, with a generic fallback
/// when the type is missing or unrecognized.
pub fn ext_for_content_type(content_type: &str) -> &'static str {
    match content_type.split(';').next().unwrap_or("").trim() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "img",
    }
}

fn classify_reqwest(e: &reqwest::Error) -> bool {
    // Builder errors are malformed requests; everything else network-shaped
    // (timeout, connect, reset mid-body) is worth retrying.
    !e.is_builder()
}

/// Acquire one article's image into `dest_dir` as `<index>.<ext>`.
///
/// An absent image URL is a success with no path, not a failure. Retry
/// events are collected on the result so the run log can show them.
#[instrument(level = "debug", skip_all, fields(index, identity = %article.identity))]
pub async fn acquire(
    client: &Client,
    index: usize,
    article: &Article,
    dest_dir: &Path,
    policy: &RetryPolicy,
) -> ImageFetchResult {
    let Some(url) = article.image_url.as_deref().filter(|u| !u.is_empty()) else {
        debug!("article has no image; nothing to fetch");
        return ImageFetchResult {
            article_identity: article.identity.clone(),
            outcome: FetchOutcome::Success(None),
            retry_notes: Vec::new(),
        };
    };

    let mut retry_notes = Vec::new();
    let mut attempt = 0usize;
    loop {
        match fetch_image(client, url).await {
            Ok((bytes, ext)) => {
                let path = dest_dir.join(format!("{index}.{ext}"));
                return match tokio::fs::write(&path, &bytes).await {
                    Ok(()) => {
                        info!(path = %path.display(), bytes = bytes.len(), "image stored");
                        ImageFetchResult {
                            article_identity: article.identity.clone(),
                            outcome: FetchOutcome::Success(Some(path.to_string_lossy().into_owned())),
                            retry_notes,
                        }
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "image write failed");
                        ImageFetchResult {
                            article_identity: article.identity.clone(),
                            outcome: FetchOutcome::Failed(format!("write failed: {e}")),
                            retry_notes,
                        }
                    }
                };
            }
            Err(e) if !e.transient => {
                warn!(%url, reason = %e.reason, "permanent image failure; not retrying");
                return ImageFetchResult {
                    article_identity: article.identity.clone(),
                    outcome: FetchOutcome::Failed(e.reason),
                    retry_notes,
                };
            }
            Err(e) => {
                attempt += 1;
                if attempt > policy.max_retries {
                    warn!(%url, attempt, reason = %e.reason, "image download exhausted retries");
                    return ImageFetchResult {
                        article_identity: article.identity.clone(),
                        outcome: FetchOutcome::Failed(e.reason),
                        retry_notes,
                    };
                }
                let delay = policy.delay_for(attempt);
                warn!(%url, attempt, ?delay, reason = %e.reason, "transient image failure; backing off");
                retry_notes.push(format!("image {index}: retry {attempt} after {}", e.reason));
                sleep(delay).await;
            }
        }
    }
}

/// Download one image, classifying failures as transient or permanent.
async fn fetch_image(client: &Client, url: &str) -> Result<(Vec<u8>, &'static str), ImageError> {
    let parsed = Url::parse(url).map_err(|e| ImageError {
        transient: false,
        reason: format!("malformed url: {e}"),
    })?;

    let response = client
        .get(parsed)
        .timeout(IMAGE_TIMEOUT)
        .send()
        .await
        .map_err(|e| ImageError {
            transient: classify_reqwest(&e),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ImageError {
            transient: status.is_server_error(),
            reason: format!("response status {status}"),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !content_type.is_empty() && !content_type.starts_with("image/") {
        return Err(ImageError {
            transient: false,
            reason: format!("unsupported content type '{content_type}'"),
        });
    }
    let ext = ext_for_content_type(&content_type);

    let bytes = response.bytes().await.map_err(|e| ImageError {
        transient: true,
        reason: format!("body read failed: {e}"),
    })?;

    Ok((bytes.to_vec(), ext))
}

/// Acquire images for every collected article, [`IMAGE_WORKERS`] at a time.
///
/// Results come back in completion order; the assembler re-keys them by
/// article identity, so ordering here does not matter.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn acquire_all(
    client: &Client,
    articles: &[Article],
    dest_dir: &Path,
    policy: &RetryPolicy,
) -> Vec<ImageFetchResult> {
    let results: Vec<ImageFetchResult> = stream::iter(articles.iter().enumerate())
        .map(|(index, article)| {
            let client = client.clone();
            async move { acquire(&client, index, article, dest_dir, policy).await }
        })
        .buffer_unordered(IMAGE_WORKERS)
        .collect()
        .await;

    let failed = results
        .iter()
        .filter(|r| matches!(r.outcome, FetchOutcome::Failed(_)))
        .count();
    info!(total = results.len(), failed, "image acquisition complete");
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::identity_hash;

    fn article_without_image() -> Article {
        Article {
            identity: identity_hash("No picture here", None),
            title: "No picture here".to_string(),
            description: String::new(),
            published_at: None,
            image_url: None,
            local_image_path: None,
            phrase_count: 0,
            has_money_mention: false,
        }
    }

    #[test]
    fn test_ext_for_content_type_known_and_fallback() {
        assert_eq!(ext_for_content_type("image/jpeg"), "jpg");
        assert_eq!(ext_for_content_type("image/png; charset=binary"), "png");
        assert_eq!(ext_for_content_type("image/webp"), "webp");
        assert_eq!(ext_for_content_type(""), "img");
        assert_eq!(ext_for_content_type("application/octet-stream"), "img");
    }

    #[tokio::test]
    async fn test_acquire_without_image_url_never_touches_the_network() {
        let client = Client::new();
        let article = article_without_image();
        let result = acquire(
            &client,
            0,
            &article,
            Path::new("/nonexistent"),
            &RetryPolicy::image_download(),
        )
        .await;

        assert_eq!(result.outcome, FetchOutcome::Success(None));
        assert!(result.retry_notes.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_url_fails_permanently_without_retry() {
        let client = Client::new();
        let mut article = article_without_image();
        article.image_url = Some("not a url at all".to_string());

        let result = acquire(
            &client,
            3,
            &article,
            Path::new("/nonexistent"),
            &RetryPolicy::image_download(),
        )
        .await;

        assert!(matches!(result.outcome, FetchOutcome::Failed(_)));
        assert!(result.retry_notes.is_empty(), "permanent failures must not retry");
    }

    #[tokio::test]
    async fn test_transient_failures_retry_then_store_the_image() {
        use crate::retry::Backoff;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Reset the first two connections, then serve the image.
            for _ in 0..2 {
                let (socket, _) = listener.accept().await.unwrap();
                drop(socket);
            }
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let body = b"png-bytes";
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
        });

        let dir = std::env::temp_dir().join(format!("newsreel-images-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut article = article_without_image();
        article.image_url = Some(format!("http://{addr}/pic.png"));

        let client = Client::new();
        let policy = RetryPolicy::new(
            2,
            Duration::from_millis(1),
            Duration::from_millis(2),
            Backoff::Linear,
            false,
        );
        let result = acquire(&client, 0, &article, &dir, &policy).await;

        assert_eq!(result.retry_notes.len(), 2, "both resets must be logged: {:?}", result.retry_notes);
        assert!(result.retry_notes[0].contains("retry 1"));
        assert!(result.retry_notes[1].contains("retry 2"));
        match &result.outcome {
            FetchOutcome::Success(Some(path)) => {
                assert!(path.ends_with("0.png"), "unexpected path {path}");
                assert_eq!(std::fs::read(path).unwrap(), b"png-bytes");
            }
            other => panic!("expected a stored image, got {other:?}"),
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
