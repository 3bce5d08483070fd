//! Conversion ratios between platform counts and ticket sales.
//!
//! Pure functions over already-aggregated counts. A ratio whose denominator
//! is zero is `None`; nothing here divides by zero or panics. Each metric
//! names its own numerator, denominator and scale factor.

use crate::types::{AnnualStats, SpotifyStats, YouTubeLifetimeStats};
use serde::{Deserialize, Serialize};

/// `numerator / denominator × 100`, rounded to 6 decimals.
///
/// ```rust
/// use artist_conversions::conversions::percentage;
///
/// assert_eq!(percentage(1_200_000, 20_000_000), Some(6.0));
/// assert_eq!(percentage(5, 0), None);
/// ```
pub fn percentage(numerator: u64, denominator: u64) -> Option<f64> {
    scaled_ratio(numerator, denominator, 100.0)
}

/// `numerator / denominator × scale`, rounded to 6 decimals; `None` when
/// `denominator` is zero.
pub fn scaled_ratio(numerator: u64, denominator: u64, scale: f64) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(round6(numerator as f64 / denominator as f64 * scale))
}

/// Round to 6 decimals, half to even, on the exact binary value of `value`.
pub fn round6(value: f64) -> f64 {
    format!("{value:.6}").parse().unwrap_or(value)
}

/// Clamp a percentage into `[0, 100]`.
pub fn clip_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Ratios against lifetime channel totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LifetimeConversions {
    /// tickets / lifetime views × 100
    pub views_to_sales_pct: Option<f64>,
    /// tickets / subscribers × 100
    pub subs_to_sales_pct: Option<f64>,
    /// tickets / lifetime views × 1,000,000
    pub sales_per_1m_views: Option<f64>,
    /// tickets / subscribers × 10,000
    pub sales_per_10k_subs: Option<f64>,
}

impl LifetimeConversions {
    pub fn compute(stats: &YouTubeLifetimeStats, tickets: u64) -> Self {
        Self {
            views_to_sales_pct: percentage(tickets, stats.views),
            subs_to_sales_pct: percentage(tickets, stats.subscribers),
            sales_per_1m_views: scaled_ratio(tickets, stats.views, 1_000_000.0),
            sales_per_10k_subs: scaled_ratio(tickets, stats.subscribers, 10_000.0),
        }
    }
}

/// Ratios against one year's video totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnualConversions {
    /// likes / views × 100
    pub views_to_likes_pct: Option<f64>,
    /// tickets / likes × 100
    pub likes_to_sales_pct: Option<f64>,
    /// tickets / comments × 100
    pub comments_to_sales_pct: Option<f64>,
}

impl AnnualConversions {
    pub fn compute(stats: &AnnualStats, tickets: u64) -> Self {
        Self {
            views_to_likes_pct: percentage(stats.likes, stats.views),
            likes_to_sales_pct: percentage(tickets, stats.likes),
            comments_to_sales_pct: percentage(tickets, stats.comments),
        }
    }
}

/// Ratios built on Spotify monthly listeners.
///
/// Monthly listeners stand in for annual streams, which they are not, so the
/// percentages can exceed 100. With `clip` set every percentage here is
/// clamped into `[0, 100]`; the per-1k rate is never clipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpotifyConversions {
    /// tickets / monthly listeners × 100
    pub listeners_to_sales_pct: Option<f64>,
    /// tickets / followers × 100
    pub followers_to_sales_pct: Option<f64>,
    /// followers / monthly listeners × 100
    pub followers_to_listeners_pct: Option<f64>,
    /// tickets / monthly listeners × 1,000
    pub sales_per_1k_listeners: Option<f64>,
}

impl SpotifyConversions {
    pub fn compute(stats: &SpotifyStats, tickets: u64, clip: bool) -> Self {
        let pct = |numerator: u64, denominator: u64| {
            percentage(numerator, denominator).map(|v| if clip { clip_percent(v) } else { v })
        };
        Self {
            listeners_to_sales_pct: pct(tickets, stats.monthly_listeners),
            followers_to_sales_pct: pct(tickets, stats.followers),
            followers_to_listeners_pct: pct(stats.followers, stats.monthly_listeners),
            sales_per_1k_listeners: scaled_ratio(tickets, stats.monthly_listeners, 1_000.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_zero_guard() {
        assert_eq!(percentage(0, 0), None);
        assert_eq!(percentage(123, 0), None);
        assert_eq!(percentage(0, 10), Some(0.0));
        assert_eq!(percentage(1, 3), Some(33.333333));
    }

    #[test]
    fn test_round6_uses_exact_value() {
        // 7 / 8e6 * 100 sits just below 0.0000875 in binary
        assert_eq!(percentage(7, 8_000_000), Some(0.000087));
        assert_eq!(percentage(2, 80_000_000), Some(0.000002));
        // 1/128 is an exact tie at the sixth decimal
        assert_eq!(round6(0.0078125), 0.007812);
        assert_eq!(round6(-0.0078125), -0.007812);
        assert_eq!(round6(2.5), 2.5);
    }

    #[test]
    fn test_percentage_is_not_clamped() {
        assert_eq!(percentage(300, 100), Some(300.0));
    }

    #[test]
    fn test_lifetime_scenario() {
        let stats = YouTubeLifetimeStats {
            views: 10_000_000_000,
            subscribers: 20_000_000,
            video_count: 300,
        };
        let conv = LifetimeConversions::compute(&stats, 1_200_000);
        assert_eq!(conv.views_to_sales_pct, Some(0.012));
        assert_eq!(conv.subs_to_sales_pct, Some(6.0));
        assert_eq!(conv.sales_per_1m_views, Some(120.0));
        assert_eq!(conv.sales_per_10k_subs, Some(600.0));
    }

    #[test]
    fn test_zero_views_gives_none() {
        let stats = YouTubeLifetimeStats {
            views: 0,
            subscribers: 10,
            video_count: 0,
        };
        let conv = LifetimeConversions::compute(&stats, 1_200_000);
        assert_eq!(conv.views_to_sales_pct, None);
        assert_eq!(conv.sales_per_1m_views, None);
        assert!(conv.subs_to_sales_pct.is_some());
    }

    #[test]
    fn test_annual_conversions() {
        let stats = AnnualStats {
            views: 1_000_000,
            likes: 50_000,
            comments: 0,
            video_count: 12,
            ..Default::default()
        };
        let conv = AnnualConversions::compute(&stats, 25_000);
        assert_eq!(conv.views_to_likes_pct, Some(5.0));
        assert_eq!(conv.likes_to_sales_pct, Some(50.0));
        assert_eq!(conv.comments_to_sales_pct, None);
    }

    #[test]
    fn test_spotify_clipping() {
        let stats = SpotifyStats {
            followers: 2_000_000,
            popularity: 80,
            monthly_listeners: 1_000_000,
        };
        let clipped = SpotifyConversions::compute(&stats, 3_000_000, true);
        assert_eq!(clipped.listeners_to_sales_pct, Some(100.0));
        assert_eq!(clipped.followers_to_listeners_pct, Some(100.0));
        assert_eq!(clipped.followers_to_sales_pct, Some(100.0));
        assert_eq!(clipped.sales_per_1k_listeners, Some(3_000.0));

        let raw = SpotifyConversions::compute(&stats, 3_000_000, false);
        assert_eq!(raw.listeners_to_sales_pct, Some(300.0));
        assert_eq!(raw.followers_to_listeners_pct, Some(200.0));
        assert_eq!(raw.followers_to_sales_pct, Some(150.0));
    }

    #[test]
    fn test_spotify_missing_listeners() {
        let conv = SpotifyConversions::compute(&SpotifyStats::default(), 10, true);
        assert_eq!(conv, SpotifyConversions::default());
    }
}
