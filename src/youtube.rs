use crate::backfill::LikeBackfill;
use crate::headers::with_json_headers;
use crate::identifiers::{canonical_youtube_channel, split_inputs, PlatformIdentifier};
use crate::transport::{fetch_json, HttpRequest, Transport};
use crate::types::{lenient_count, AnnualStats, LabelSample, YouTubeLifetimeStats};
use crate::{ClientConfig, Credentials, Result, StatsError};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// Earliest year accepted for annual aggregation.
pub const MIN_YEAR: i32 = 2005;
/// Latest year accepted for annual aggregation.
pub const MAX_YEAR: i32 = 2100;

/// Items per page for listings and per batch for statistics lookups.
const PAGE_SIZE: usize = 50;

/// Parameters of an annual aggregation.
///
/// # Examples
///
/// ```rust
/// use artist_conversions::youtube::AnnualQuery;
///
/// let query = AnnualQuery::new(2023).with_comments(true).with_max_videos(100);
/// assert_eq!(query.year, 2023);
/// assert!(!query.verify_likes);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnualQuery {
    pub year: i32,
    pub include_comments: bool,
    /// Scrape the watch page when the API reports no likes
    pub verify_likes: bool,
    /// Overrides [`ClientConfig::max_videos`] when set
    pub max_videos: Option<usize>,
}

impl AnnualQuery {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            include_comments: false,
            verify_likes: false,
            max_videos: None,
        }
    }

    pub fn with_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }

    pub fn with_like_verification(mut self, verify: bool) -> Self {
        self.verify_likes = verify;
        self
    }

    pub fn with_max_videos(mut self, max_videos: usize) -> Self {
        self.max_videos = Some(max_videos);
        self
    }
}

/// Inclusive UTC window `[Jan 1 00:00:00, Dec 31 23:59:59]` of `year`.
///
/// Returns `None` outside [`MIN_YEAR`]`..=`[`MAX_YEAR`].
///
/// ```rust
/// use artist_conversions::youtube::year_window;
///
/// let (start, end) = year_window(2023).unwrap();
/// assert_eq!(start.to_rfc3339(), "2023-01-01T00:00:00+00:00");
/// assert_eq!(end.to_rfc3339(), "2023-12-31T23:59:59+00:00");
/// assert!(year_window(1999).is_none());
/// ```
pub fn year_window(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return None;
    }
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
    let end = Utc.with_ymd_and_hms(year, 12, 31, 23, 59, 59).single()?;
    Some((start, end))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: SearchItemId,
    #[serde(default)]
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    channel_id: Option<String>,
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    channel_id: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    #[serde(default)]
    statistics: ChannelStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    #[serde(default, deserialize_with = "lenient_count")]
    view_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    subscriber_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    video_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    #[serde(default, deserialize_with = "lenient_count")]
    view_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    like_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    comment_count: Option<u64>,
}

/// Video ids enumerated for one channel and year.
#[derive(Debug, Default)]
struct VideoListing {
    ids: Vec<String>,
    truncated: bool,
}

/// YouTube Data API client: channel resolution, lifetime channel totals and
/// per-year video aggregation.
///
/// Every operation comes in two forms. The `try_*` form reports why it
/// failed; the plain form logs the failure and degrades to zero stats (or
/// `None` for resolution), which is what the report layer uses.
///
/// Without an API key every fetch degrades immediately and no request is
/// made.
pub struct YouTubeClient {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    config: ClientConfig,
    backfill: LikeBackfill,
}

impl YouTubeClient {
    pub fn new(transport: Arc<dyn Transport>, credentials: Credentials, config: ClientConfig) -> Self {
        let backfill = LikeBackfill::new(
            Arc::clone(&transport),
            &config.youtube_web_base,
            config.scrape_pause,
        );
        Self {
            transport,
            credentials,
            config,
            backfill,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.has_youtube()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str> {
        self.credentials
            .youtube_api_key
            .as_deref()
            .ok_or_else(|| StatsError::NotConfigured("YouTube API key".to_string()))
    }

    /// `{api_base}/{endpoint}?{params}&key={key}` with every value encoded.
    fn api_url(&self, endpoint: &str, params: &[(&str, &str)], key: &str) -> String {
        let mut query: Vec<String> = params
            .iter()
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
            .collect();
        query.push(format!("key={}", urlencoding::encode(key)));
        format!(
            "{}/{endpoint}?{}",
            self.config.youtube_api_base.trim_end_matches('/'),
            query.join("&")
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T> {
        fetch_json(self.transport.as_ref(), with_json_headers(HttpRequest::get(url))).await
    }

    /// Resolve a channel id, channel URL, `@handle` or artist name to a channel id.
    ///
    /// Canonical ids and channel URLs are returned without a network call,
    /// even when no API key is configured. Anything else takes the top
    /// result of a channel search.
    pub async fn try_resolve(&self, input: &str) -> Result<String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(StatsError::NotFound("empty channel input".to_string()));
        }
        if let Some(id) = canonical_youtube_channel(input) {
            return Ok(id);
        }

        let key = self.api_key()?;
        log::debug!("Searching for YouTube channel '{input}'");
        let url = self.api_url(
            "search",
            &[
                ("part", "snippet"),
                ("q", input),
                ("type", "channel"),
                ("maxResults", "1"),
            ],
            key,
        );
        let response: SearchResponse = self.get_json(url).await?;
        response
            .items
            .into_iter()
            .next()
            .and_then(|item| {
                item.id
                    .channel_id
                    .or_else(|| item.snippet.and_then(|s| s.channel_id))
            })
            .ok_or_else(|| StatsError::NotFound(format!("no YouTube channel for '{input}'")))
    }

    /// [`try_resolve`](Self::try_resolve), with every failure mapped to `None`.
    pub async fn resolve(&self, input: &str) -> Option<PlatformIdentifier> {
        match self.try_resolve(input).await {
            Ok(id) => Some(PlatformIdentifier::YouTubeChannel(id)),
            Err(e) => {
                log::debug!("YouTube channel '{input}' not resolved: {e}");
                None
            }
        }
    }

    /// Lifetime totals for a channel.
    pub async fn try_fetch_lifetime(&self, input: &str) -> Result<YouTubeLifetimeStats> {
        let key = self.api_key()?;
        let channel_id = self.try_resolve(input).await?;

        let url = self.api_url("channels", &[("part", "statistics"), ("id", &channel_id)], key);
        let response: ListResponse<ChannelItem> = self.get_json(url).await?;
        let channel = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| StatsError::NotFound(format!("channel {channel_id}")))?;

        let stats = YouTubeLifetimeStats {
            views: channel.statistics.view_count.unwrap_or(0),
            subscribers: channel.statistics.subscriber_count.unwrap_or(0),
            video_count: channel.statistics.video_count.unwrap_or(0),
        };
        log::debug!("Lifetime stats for {channel_id}: {stats:?}");
        Ok(stats)
    }

    /// Lifetime totals, or all zeros on any failure.
    pub async fn fetch_lifetime(&self, input: &str) -> YouTubeLifetimeStats {
        self.try_fetch_lifetime(input).await.unwrap_or_else(|e| {
            degrade_log("lifetime stats", input, &e);
            YouTubeLifetimeStats::default()
        })
    }

    /// Sum per-video statistics over the videos a channel published in `query.year`.
    ///
    /// At most `max_videos` videos are examined. Reaching the cap is not an
    /// error; the result is marked [`truncated`](AnnualStats::truncated)
    /// when more videos were available. Statistics batches that fail are
    /// skipped and contribute nothing.
    pub async fn try_fetch_annual(&self, input: &str, query: &AnnualQuery) -> Result<AnnualStats> {
        let key = self.api_key()?;
        let (start, end) = year_window(query.year).ok_or_else(|| {
            StatsError::NotFound(format!(
                "year {} outside {MIN_YEAR}..={MAX_YEAR}",
                query.year
            ))
        })?;
        let channel_id = self.try_resolve(input).await?;
        let max_videos = query.max_videos.unwrap_or(self.config.max_videos);

        let listing = self
            .list_video_ids(&channel_id, start, end, max_videos, key)
            .await?;
        if listing.truncated {
            log::warn!(
                "Stopped listing {channel_id} videos for {} at the cap of {max_videos}; totals are partial",
                query.year
            );
        }

        let mut stats = self.sum_video_stats(&listing.ids, query, key).await;
        stats.video_count = listing.ids.len() as u64;
        stats.truncated = listing.truncated;
        log::debug!(
            "Annual stats for {channel_id} in {}: {} videos, {} views, {} likes",
            query.year,
            stats.video_count,
            stats.views,
            stats.likes
        );
        Ok(stats)
    }

    /// Annual totals, or all zeros on any failure.
    pub async fn fetch_annual(&self, input: &str, query: &AnnualQuery) -> AnnualStats {
        self.try_fetch_annual(input, query).await.unwrap_or_else(|e| {
            degrade_log("annual stats", input, &e);
            AnnualStats::default()
        })
    }

    /// Annual totals summed over a comma-separated list of channels.
    ///
    /// Each channel is resolved and fetched on its own; one failing
    /// contributes zeros. Label samples are kept from the first channels
    /// only, up to [`ClientConfig::max_label_samples`].
    pub async fn fetch_annual_multi(&self, inputs: &str, query: &AnnualQuery) -> AnnualStats {
        let mut total = AnnualStats::default();
        for input in split_inputs(inputs) {
            total += self.fetch_annual(input, query).await;
            total.samples.truncate(self.config.max_label_samples);
        }
        total
    }

    async fn list_video_ids(
        &self,
        channel_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        max_videos: usize,
        key: &str,
    ) -> Result<VideoListing> {
        let published_after = start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let published_before = end.to_rfc3339_opts(SecondsFormat::Secs, true);
        let page_size = PAGE_SIZE.to_string();

        let mut listing = VideoListing::default();
        if max_videos == 0 {
            return Ok(listing);
        }

        let mut page_token: Option<String> = None;
        let mut page_number = 1;
        loop {
            let mut params = vec![
                ("part", "snippet"),
                ("channelId", channel_id),
                ("type", "video"),
                ("order", "date"),
                ("publishedAfter", published_after.as_str()),
                ("publishedBefore", published_before.as_str()),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }
            let url = self.api_url("search", &params, key);

            log::debug!("Listing {channel_id} videos, page {page_number}");
            let page: SearchResponse = match self.get_json(url).await {
                Ok(page) => page,
                Err(e) if page_number == 1 => return Err(e),
                Err(e) => {
                    log::warn!(
                        "Listing {channel_id} videos stopped at page {page_number}: {e}"
                    );
                    break;
                }
            };

            let mut items = page.items.into_iter().peekable();
            while let Some(item) = items.next() {
                let Some(video_id) = item.id.video_id else {
                    continue;
                };
                let published = item.snippet.as_ref().and_then(|s| s.published_at.as_deref());
                if !published_within(published, start, end) {
                    continue;
                }
                listing.ids.push(video_id);
                if listing.ids.len() >= max_videos {
                    listing.truncated = items.peek().is_some() || page.next_page_token.is_some();
                    return Ok(listing);
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
            page_number += 1;
        }
        Ok(listing)
    }

    async fn sum_video_stats(&self, ids: &[String], query: &AnnualQuery, key: &str) -> AnnualStats {
        let mut stats = AnnualStats::default();
        for (batch_number, batch) in ids.chunks(PAGE_SIZE).enumerate() {
            let joined = batch.join(",");
            let url = self.api_url("videos", &[("part", "statistics"), ("id", &joined)], key);
            let response: ListResponse<VideoItem> = match self.get_json(url).await {
                Ok(response) => response,
                Err(e) => {
                    log::warn!(
                        "Skipping statistics batch {} ({} videos): {e}",
                        batch_number + 1,
                        batch.len()
                    );
                    continue;
                }
            };

            for video in response.items {
                stats.views += video.statistics.view_count.unwrap_or(0);
                if query.include_comments {
                    stats.comments += video.statistics.comment_count.unwrap_or(0);
                }

                let api_likes = video.statistics.like_count;
                if query.verify_likes && api_likes.unwrap_or(0) == 0 {
                    let scrape = self.backfill.scrape(&video.id).await;
                    stats.likes += scrape.likes;
                    if stats.samples.len() < self.config.max_label_samples {
                        stats.samples.push(LabelSample {
                            video_id: video.id,
                            api_likes,
                            label: scrape.label,
                            parsed_likes: scrape.likes,
                        });
                    }
                } else {
                    stats.likes += api_likes.unwrap_or(0);
                }
            }
        }
        stats
    }
}

/// Whether an RFC 3339 publish time falls inside `[start, end]`.
///
/// A missing or unparsable timestamp is accepted; the listing request is
/// already bounded by the same window.
fn published_within(published: Option<&str>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    match published.and_then(|p| DateTime::parse_from_rfc3339(p).ok()) {
        Some(at) => {
            let at = at.with_timezone(&Utc);
            at >= start && at <= end
        }
        None => true,
    }
}

fn degrade_log(what: &str, input: &str, error: &StatsError) {
    if error.is_not_configured() {
        log::debug!("Skipping YouTube {what} for '{input}': {error}");
    } else {
        log::warn!("YouTube {what} for '{input}' unavailable: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpResponse, MockTransport};

    fn client(transport: MockTransport, credentials: Credentials) -> YouTubeClient {
        YouTubeClient::new(
            Arc::new(transport),
            credentials,
            ClientConfig::new().with_base_url("https://api.test"),
        )
    }

    #[test]
    fn test_year_window_bounds() {
        assert!(year_window(MIN_YEAR).is_some());
        assert!(year_window(MAX_YEAR).is_some());
        assert!(year_window(MIN_YEAR - 1).is_none());
        assert!(year_window(MAX_YEAR + 1).is_none());
    }

    #[test]
    fn test_published_within() {
        let (start, end) = year_window(2023).unwrap();
        assert!(published_within(Some("2023-06-01T12:00:00Z"), start, end));
        assert!(published_within(Some("2023-12-31T23:59:59Z"), start, end));
        assert!(!published_within(Some("2024-01-01T00:00:00Z"), start, end));
        assert!(!published_within(Some("2022-12-31T23:59:59Z"), start, end));
        assert!(published_within(None, start, end));
    }

    #[tokio::test]
    async fn test_canonical_id_skips_search() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();

        let youtube = client(transport, Credentials::default());
        assert_eq!(
            youtube.resolve("UCuHzBCaKmtaLcRAOoazhCPA").await,
            Some(PlatformIdentifier::YouTubeChannel(
                "UCuHzBCaKmtaLcRAOoazhCPA".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_missing_key_degrades_without_requests() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();

        let youtube = client(transport, Credentials::default());
        assert_eq!(youtube.resolve("@beyonce").await, None);
        assert_eq!(
            youtube.fetch_lifetime("UCuHzBCaKmtaLcRAOoazhCPA").await,
            YouTubeLifetimeStats::default()
        );
        assert!(youtube
            .try_fetch_annual("@beyonce", &AnnualQuery::new(2023))
            .await
            .unwrap_err()
            .is_not_configured());
    }

    #[tokio::test]
    async fn test_search_resolution_takes_top_result() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.url.starts_with("https://api.test/youtube/v3/search?")
                    && req.url.contains("q=%40beyonce")
                    && req.url.contains("type=channel")
                    && req.url.ends_with("key=k")
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"items":[{"id":{"kind":"youtube#channel","channelId":"UCtop"}},{"id":{"channelId":"UCsecond"}}]}"#,
                ))
            });

        let youtube = client(transport, Credentials::default().with_youtube_key("k"));
        assert_eq!(youtube.try_resolve("@beyonce").await.unwrap(), "UCtop");
    }

    #[tokio::test]
    async fn test_empty_search_is_not_found() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(HttpResponse::new(200, r#"{"items":[]}"#)));

        let youtube = client(transport, Credentials::default().with_youtube_key("k"));
        assert!(youtube.try_resolve("nobody").await.unwrap_err().is_not_found());
        assert_eq!(youtube.fetch_lifetime("nobody").await, YouTubeLifetimeStats::default());
    }

    #[tokio::test]
    async fn test_lifetime_parses_string_counts() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.url.contains("/channels?part=statistics&id=UCuHzBCaKmtaLcRAOoazhCPA"))
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"items":[{"statistics":{"viewCount":"10000000000","subscriberCount":"20000000","hiddenSubscriberCount":false,"videoCount":"300"}}]}"#,
                ))
            });

        let youtube = client(transport, Credentials::default().with_youtube_key("k"));
        let stats = youtube.fetch_lifetime("UCuHzBCaKmtaLcRAOoazhCPA").await;
        assert_eq!(
            stats,
            YouTubeLifetimeStats {
                views: 10_000_000_000,
                subscribers: 20_000_000,
                video_count: 300,
            }
        );
    }

    #[tokio::test]
    async fn test_lifetime_transport_failure_is_zero() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Err(StatsError::Http("connection reset".to_string())));

        let youtube = client(transport, Credentials::default().with_youtube_key("k"));
        assert_eq!(
            youtube.fetch_lifetime("UCuHzBCaKmtaLcRAOoazhCPA").await,
            YouTubeLifetimeStats::default()
        );
    }

    #[tokio::test]
    async fn test_out_of_range_year_makes_no_requests() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();

        let youtube = client(transport, Credentials::default().with_youtube_key("k"));
        let stats = youtube
            .fetch_annual("UCuHzBCaKmtaLcRAOoazhCPA", &AnnualQuery::new(1990))
            .await;
        assert_eq!(stats, AnnualStats::default());
    }
}
