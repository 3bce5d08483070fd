//! Report assembly for the presentation layer.
//!
//! A [`Reporter`] ties the ticket cache to the platform clients and returns
//! plain records: counts, ratios and a couple of flags. Nothing here formats
//! numbers; that belongs to whoever displays the report.

use crate::conversions::{AnnualConversions, LifetimeConversions, SpotifyConversions};
use crate::spotify::SpotifyClient;
use crate::tickets::TicketCache;
use crate::transport::Transport;
use crate::types::{AnnualStats, SpotifyStats, YouTubeLifetimeStats};
use crate::youtube::{AnnualQuery, YouTubeClient};
use crate::{ClientConfig, Credentials};
use serde::Serialize;
use std::sync::Arc;

/// Ticket total plus lifetime YouTube channel stats.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightReport {
    pub artist: String,
    pub tickets: u64,
    pub youtube_configured: bool,
    pub lifetime: YouTubeLifetimeStats,
    pub conversions: LifetimeConversions,
}

/// Ticket total plus one year's summed video stats.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullReport {
    pub artist: String,
    pub tickets: u64,
    pub youtube_configured: bool,
    pub year: i32,
    pub annual: AnnualStats,
    pub conversions: AnnualConversions,
}

/// Ticket total plus Spotify followers and monthly listeners.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotifyReport {
    pub artist: String,
    pub tickets: u64,
    pub spotify_configured: bool,
    pub clipped: bool,
    pub stats: SpotifyStats,
    pub conversions: SpotifyConversions,
}

pub struct Reporter {
    tickets: Arc<TicketCache>,
    youtube: YouTubeClient,
    spotify: SpotifyClient,
}

impl Reporter {
    pub fn new(tickets: Arc<TicketCache>, youtube: YouTubeClient, spotify: SpotifyClient) -> Self {
        Self {
            tickets,
            youtube,
            spotify,
        }
    }

    /// Build both platform clients over one shared transport.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        config: ClientConfig,
        tickets: Arc<TicketCache>,
    ) -> Self {
        let youtube = YouTubeClient::new(Arc::clone(&transport), credentials.clone(), config.clone());
        let spotify = SpotifyClient::new(transport, credentials, config);
        Self::new(tickets, youtube, spotify)
    }

    pub fn tickets(&self) -> &TicketCache {
        &self.tickets
    }

    pub fn youtube(&self) -> &YouTubeClient {
        &self.youtube
    }

    pub fn spotify(&self) -> &SpotifyClient {
        &self.spotify
    }

    /// Lifetime channel totals against the artist's ticket count.
    ///
    /// An empty `channel` falls back to searching by `artist`.
    pub async fn light(&self, artist: &str, channel: &str) -> LightReport {
        let tickets = self.tickets.tickets_for(artist).await;
        let lifetime = self.youtube.fetch_lifetime(input_or(channel, artist)).await;
        LightReport {
            artist: artist.to_string(),
            tickets,
            youtube_configured: self.youtube.is_configured(),
            lifetime,
            conversions: LifetimeConversions::compute(&lifetime, tickets),
        }
    }

    /// One year of video stats, summed over a comma-separated channel list.
    pub async fn full(&self, artist: &str, channels: &str, query: &AnnualQuery) -> FullReport {
        let tickets = self.tickets.tickets_for(artist).await;
        let annual = self
            .youtube
            .fetch_annual_multi(input_or(channels, artist), query)
            .await;
        let conversions = AnnualConversions::compute(&annual, tickets);
        FullReport {
            artist: artist.to_string(),
            tickets,
            youtube_configured: self.youtube.is_configured(),
            year: query.year,
            annual,
            conversions,
        }
    }

    /// Monthly-listener ratios, optionally clipped to `[0, 100]`.
    pub async fn spotify_report(&self, artist: &str, spotify_input: &str, clip: bool) -> SpotifyReport {
        let tickets = self.tickets.tickets_for(artist).await;
        let stats = self.spotify.fetch_stats(input_or(spotify_input, artist)).await;
        SpotifyReport {
            artist: artist.to_string(),
            tickets,
            spotify_configured: self.spotify.is_configured(),
            clipped: clip,
            stats,
            conversions: SpotifyConversions::compute(&stats, tickets, clip),
        }
    }
}

fn input_or<'a>(input: &'a str, fallback: &'a str) -> &'a str {
    if input.trim().is_empty() {
        fallback
    } else {
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tickets::TicketSource;
    use crate::transport::MockTransport;
    use crate::Result;
    use async_trait::async_trait;

    struct NoSource;

    #[async_trait]
    impl TicketSource for NoSource {
        async fn fetch_document(&self) -> Result<String> {
            Ok(String::new())
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_unconfigured_reports_are_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.json");
        std::fs::write(&path, r#"{"Beyonce": 1200000}"#).unwrap();

        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let reporter = Reporter::with_transport(
            Arc::new(transport),
            Credentials::default(),
            ClientConfig::default(),
            Arc::new(TicketCache::new(&path, Arc::new(NoSource))),
        );

        let light = reporter.light("Beyoncé", "@beyonce").await;
        assert_eq!(light.tickets, 1_200_000);
        assert!(!light.youtube_configured);
        assert_eq!(light.lifetime, YouTubeLifetimeStats::default());
        assert_eq!(light.conversions, LifetimeConversions::default());

        let spotify = reporter.spotify_report("Beyoncé", "", true).await;
        assert_eq!(spotify.tickets, 1_200_000);
        assert!(!spotify.spotify_configured);
        assert_eq!(spotify.conversions.listeners_to_sales_pct, None);
    }

    #[test]
    fn test_input_fallback() {
        assert_eq!(input_or("  ", "Artist"), "Artist");
        assert_eq!(input_or("@handle", "Artist"), "@handle");
    }
}
