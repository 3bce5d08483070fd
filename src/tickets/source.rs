use crate::headers::with_json_headers;
use crate::transport::{fetch_json, HttpRequest, Transport};
use crate::{Result, StatsError};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// WordPress REST endpoints for the 2023 year-end article, tried in order.
pub const DEFAULT_ARTICLE_URLS: &[&str] = &[
    "https://touringdata.org/wp-json/wp/v2/posts?slug=2023-top-touring-artists&per_page=1",
    "https://touringdata.wordpress.com/wp-json/wp/v2/posts?slug=2023-top-touring-artists&per_page=1",
];

/// Where the ticket article comes from.
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// Fetch the article body as HTML.
    async fn fetch_document(&self) -> Result<String>;
}

/// Article fetched from a WordPress posts endpoint.
pub struct WordPressSource {
    transport: Arc<dyn Transport>,
    urls: Vec<String>,
}

#[derive(Deserialize)]
struct WpPost {
    #[serde(default)]
    content: WpRendered,
}

#[derive(Deserialize, Default)]
struct WpRendered {
    #[serde(default)]
    rendered: String,
}

impl WordPressSource {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_urls(
            transport,
            DEFAULT_ARTICLE_URLS.iter().map(|u| u.to_string()).collect(),
        )
    }

    pub fn with_urls(transport: Arc<dyn Transport>, urls: Vec<String>) -> Self {
        Self { transport, urls }
    }

    async fn fetch_from(&self, url: &str) -> Result<String> {
        let posts: Vec<WpPost> =
            fetch_json(self.transport.as_ref(), with_json_headers(HttpRequest::get(url))).await?;
        posts
            .into_iter()
            .next()
            .map(|post| post.content.rendered)
            .filter(|html| !html.trim().is_empty())
            .ok_or_else(|| StatsError::NotFound(format!("No article content at {url}")))
    }
}

#[async_trait]
impl TicketSource for WordPressSource {
    async fn fetch_document(&self) -> Result<String> {
        for url in &self.urls {
            match self.fetch_from(url).await {
                Ok(html) => {
                    log::debug!("Fetched ticket article from {url} ({} chars)", html.len());
                    return Ok(html);
                }
                Err(e) => log::debug!("Ticket article source {url} failed: {e}"),
            }
        }
        Err(StatsError::NotFound(
            "No ticket article available from any source".to_string(),
        ))
    }
}
