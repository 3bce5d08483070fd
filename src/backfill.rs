//! Like-count backfill from the public watch page.
//!
//! The Data API reports `likeCount` as absent or zero for some videos even
//! though the watch page shows a like label. When asked to, the annual
//! aggregation falls back to scraping that label and feeding it to
//! [`parse_count`].

use crate::headers::with_page_headers;
use crate::labels::parse_count;
use crate::transport::{fetch_text, HttpRequest, Transport};
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Label locations, in priority order: the accessibility attribute, the
/// structured accessibility text field, then any generic label field.
static LABEL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"aria-label="([^"]{1,200})""#).expect("valid aria-label pattern"),
        Regex::new(r#""accessibilityText"\s*:\s*"([^"]{1,200})""#)
            .expect("valid accessibilityText pattern"),
        Regex::new(r#""label"\s*:\s*"([^"]{1,200})""#).expect("valid label pattern"),
    ]
});

static LIKE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\blikes?\b").expect("valid like word pattern"));

/// Outcome of one scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeScrape {
    /// The label the count was parsed from, if one was found
    pub label: Option<String>,
    pub likes: u64,
}

/// Serialized, throttled like-label scraper.
///
/// Scrapes run one at a time with at least `pause` between consecutive
/// requests, to stay clear of bulk-request blocking.
pub struct LikeBackfill {
    transport: Arc<dyn Transport>,
    web_base: String,
    pause: Duration,
    last_scrape: Mutex<Option<Instant>>,
}

impl LikeBackfill {
    pub fn new(transport: Arc<dyn Transport>, web_base: &str, pause: Duration) -> Self {
        Self {
            transport,
            web_base: web_base.trim_end_matches('/').to_string(),
            pause,
            last_scrape: Mutex::new(None),
        }
    }

    /// Scrape the like count for `video_id`, or `0` on any failure.
    pub async fn backfill_likes(&self, video_id: &str) -> u64 {
        self.scrape(video_id).await.likes
    }

    /// Scrape the like label for `video_id`, degrading failures to an empty result.
    pub async fn scrape(&self, video_id: &str) -> LikeScrape {
        match self.try_scrape(video_id).await {
            Ok(scrape) => scrape,
            Err(e) => {
                log::debug!("Like backfill failed for {video_id}: {e}");
                LikeScrape {
                    label: None,
                    likes: 0,
                }
            }
        }
    }

    pub async fn try_scrape(&self, video_id: &str) -> Result<LikeScrape> {
        // holding the lock for the whole request serializes scrapes
        let mut last = self.last_scrape.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.pause {
                tokio::time::sleep(self.pause - elapsed).await;
            }
        }

        let url = format!(
            "{}/watch?v={}",
            self.web_base,
            urlencoding::encode(video_id)
        );
        let result = fetch_text(self.transport.as_ref(), with_page_headers(HttpRequest::get(url))).await;
        *last = Some(Instant::now());
        let page = result?;

        let label = find_like_label(&page);
        let likes = label.as_deref().map(parse_count).unwrap_or(0);
        log::debug!("Backfilled {video_id}: {label:?} -> {likes}");
        Ok(LikeScrape { label, likes })
    }
}

/// First like label on the page: mentions "like"/"likes" and has a digit.
pub fn find_like_label(page: &str) -> Option<String> {
    LABEL_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures_iter(page)
            .map(|caps| caps[1].to_string())
            .find(|label| is_like_label(label))
    })
}

fn is_like_label(label: &str) -> bool {
    LIKE_WORD.is_match(label) && label.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpResponse, MockTransport};

    #[test]
    fn test_aria_label_has_priority() {
        let page = r#"
            <button aria-label="Share"></button>
            <button aria-label="like this video along with 12,345 other people"></button>
            {"accessibilityText":"99 likes"}
        "#;
        assert_eq!(
            find_like_label(page).as_deref(),
            Some("like this video along with 12,345 other people")
        );
    }

    #[test]
    fn test_structured_fields_as_fallback() {
        let page = r#"{"accessibilityText":"Dislike"},{"accessibilityText":"1.3K likes"}"#;
        assert_eq!(find_like_label(page).as_deref(), Some("1.3K likes"));

        let page = r#"{"label":"Like"},{"label":"862 likes"}"#;
        assert_eq!(find_like_label(page).as_deref(), Some("862 likes"));
    }

    #[test]
    fn test_no_label_found() {
        assert_eq!(find_like_label(r#"<div aria-label="Subscribe"></div>"#), None);
        assert_eq!(find_like_label(r#"{"label":"unlikely 3"}"#), None);
    }

    #[tokio::test]
    async fn test_scrape_parses_label() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.url == "https://yt.test/watch?v=abc123")
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"<button aria-label="1.3M likes"></button>"#,
                ))
            });

        let backfill = LikeBackfill::new(Arc::new(transport), "https://yt.test/", Duration::ZERO);
        let scrape = backfill.scrape("abc123").await;
        assert_eq!(scrape.likes, 1_300_000);
        assert_eq!(scrape.label.as_deref(), Some("1.3M likes"));
    }

    #[tokio::test]
    async fn test_scrape_failure_is_zero() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(HttpResponse::new(429, "slow down")));

        let backfill = LikeBackfill::new(Arc::new(transport), "https://yt.test", Duration::ZERO);
        assert_eq!(backfill.backfill_likes("abc").await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_scrapes_are_paced() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(2)
            .returning(|_| Ok(HttpResponse::new(200, "")));

        let backfill =
            LikeBackfill::new(Arc::new(transport), "https://yt.test", Duration::from_millis(500));
        let start = tokio::time::Instant::now();
        backfill.backfill_likes("a").await;
        backfill.backfill_likes("b").await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
