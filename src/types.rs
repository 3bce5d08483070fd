//! Aggregate stat records.
//!
//! Every field is always present. Anything that could not be resolved is
//! zero, so ratio math downstream only ever checks for zero denominators.

use serde::{Deserialize, Deserializer, Serialize};
use std::ops::AddAssign;

/// Lifetime YouTube channel totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YouTubeLifetimeStats {
    pub views: u64,
    pub subscribers: u64,
    pub video_count: u64,
}

/// YouTube totals over videos published within one calendar year.
///
/// # Examples
///
/// ```rust
/// use artist_conversions::AnnualStats;
///
/// let mut total = AnnualStats { views: 10, likes: 2, video_count: 1, ..Default::default() };
/// total += AnnualStats { views: 5, comments: 1, video_count: 2, ..Default::default() };
/// assert_eq!(total.views, 15);
/// assert_eq!(total.video_count, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualStats {
    pub views: u64,
    pub likes: u64,
    /// Always `0` when comments were not requested
    pub comments: u64,
    /// Videos examined (after the cap)
    pub video_count: u64,
    /// Paging stopped at the cap while more videos were available
    pub truncated: bool,
    /// Raw-label verification records from like backfills
    pub samples: Vec<LabelSample>,
}

impl AddAssign for AnnualStats {
    fn add_assign(&mut self, other: Self) {
        self.views += other.views;
        self.likes += other.likes;
        self.comments += other.comments;
        self.video_count += other.video_count;
        self.truncated |= other.truncated;
        self.samples.extend(other.samples);
    }
}

/// One like-count backfill, kept for verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSample {
    pub video_id: String,
    /// Like count reported by the API, if any
    pub api_likes: Option<u64>,
    /// Label text located on the public page
    pub label: Option<String>,
    /// Count parsed from `label` (0 when nothing matched)
    pub parsed_likes: u64,
}

/// Spotify artist totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotifyStats {
    pub followers: u64,
    /// 0-100 popularity score from the Web API
    pub popularity: u64,
    /// Scraped from the public artist page; a proxy for streams
    pub monthly_listeners: u64,
}

/// Accept counts as JSON numbers, numeric strings, or null.
///
/// The YouTube API encodes counts as strings and omits them when hidden.
pub(crate) fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
