use crate::headers::{with_bearer, with_json_headers, with_page_headers};
use crate::identifiers::{canonical_spotify_artist, PlatformIdentifier};
use crate::labels::parse_count;
use crate::transport::{fetch_json, fetch_text, HttpRequest, Transport};
use crate::types::{lenient_count, SpotifyStats};
use crate::{ClientConfig, Credentials, Result, StatsError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Tokens are replaced this long before the provider says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

static MONTHLY_LISTENERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d[\d.,]*\s*[kmb]?)\s*monthly\s+listeners")
        .expect("valid monthly listeners pattern")
});

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    artists: ArtistPage,
}

#[derive(Debug, Default, Deserialize)]
struct ArtistPage {
    #[serde(default)]
    items: Vec<ArtistSummary>,
}

#[derive(Debug, Deserialize)]
struct ArtistSummary {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ArtistObject {
    #[serde(default)]
    followers: Followers,
    #[serde(default, deserialize_with = "lenient_count")]
    popularity: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct Followers {
    #[serde(default, deserialize_with = "lenient_count")]
    total: Option<u64>,
}

/// Spotify Web API client plus the public artist page scrape for monthly listeners.
///
/// The access token comes from a client-credentials exchange and is kept in
/// memory only, replaced shortly before it expires.
pub struct SpotifyClient {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    config: ClientConfig,
    token: Mutex<Option<AccessToken>>,
}

impl SpotifyClient {
    pub fn new(transport: Arc<dyn Transport>, credentials: Credentials, config: ClientConfig) -> Self {
        Self {
            transport,
            credentials,
            config,
            token: Mutex::new(None),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.has_spotify()
    }

    /// Return a valid bearer token, exchanging client credentials if needed.
    pub async fn try_access_token(&self) -> Result<String> {
        let (Some(client_id), Some(client_secret)) = (
            self.credentials.spotify_client_id.as_deref(),
            self.credentials.spotify_client_secret.as_deref(),
        ) else {
            return Err(StatsError::NotConfigured(
                "Spotify client credentials".to_string(),
            ));
        };

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
            log::debug!("Spotify access token expired, requesting a new one");
        }

        let basic = STANDARD.encode(format!("{client_id}:{client_secret}"));
        let request = HttpRequest::post(
            format!(
                "{}/api/token",
                self.config.spotify_accounts_base.trim_end_matches('/')
            ),
            "grant_type=client_credentials",
        )
        .with_header("Authorization", &format!("Basic {basic}"))
        .with_header("Content-Type", "application/x-www-form-urlencoded");

        let response: TokenResponse = fetch_json(self.transport.as_ref(), request).await?;
        if response.access_token.is_empty() {
            return Err(StatsError::Parse("empty Spotify access token".to_string()));
        }

        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        log::debug!("Obtained Spotify access token valid for {}s", lifetime.as_secs());
        let value = response.access_token;
        *cached = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    async fn get_api<T: serde::de::DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let token = self.try_access_token().await?;
        let url = format!(
            "{}/{path_and_query}",
            self.config.spotify_api_base.trim_end_matches('/')
        );
        let request = with_bearer(with_json_headers(HttpRequest::get(url)), &token);
        fetch_json(self.transport.as_ref(), request).await
    }

    /// Resolve an artist id, artist URL or URI, or a free-text name to an artist id.
    ///
    /// Canonical forms are returned without any request; names take the top
    /// search hit.
    pub async fn try_resolve(&self, input: &str) -> Result<String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(StatsError::NotFound("empty artist input".to_string()));
        }
        if let Some(id) = canonical_spotify_artist(input) {
            return Ok(id);
        }

        log::debug!("Searching for Spotify artist '{input}'");
        let response: SearchResponse = self
            .get_api(&format!(
                "search?q={}&type=artist&limit=1",
                urlencoding::encode(input)
            ))
            .await?;
        response
            .artists
            .items
            .into_iter()
            .next()
            .map(|artist| artist.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StatsError::NotFound(format!("no Spotify artist for '{input}'")))
    }

    pub async fn resolve(&self, input: &str) -> Option<PlatformIdentifier> {
        match self.try_resolve(input).await {
            Ok(id) => Some(PlatformIdentifier::SpotifyArtist(id)),
            Err(e) => {
                log::debug!("Spotify artist '{input}' not resolved: {e}");
                None
            }
        }
    }

    /// Followers and popularity from the Web API artist object.
    pub async fn try_fetch_artist(&self, artist_id: &str) -> Result<(u64, u64)> {
        let artist: ArtistObject = self
            .get_api(&format!("artists/{}", urlencoding::encode(artist_id)))
            .await?;
        Ok((
            artist.followers.total.unwrap_or(0),
            artist.popularity.unwrap_or(0),
        ))
    }

    /// Monthly listeners as shown on the public artist page.
    pub async fn try_monthly_listeners(&self, artist_id: &str) -> Result<u64> {
        let url = format!(
            "{}/artist/{}",
            self.config.spotify_web_base.trim_end_matches('/'),
            urlencoding::encode(artist_id)
        );
        let page = fetch_text(self.transport.as_ref(), with_page_headers(HttpRequest::get(url))).await?;
        let caps = MONTHLY_LISTENERS
            .captures(&page)
            .ok_or_else(|| StatsError::Parse(format!("no monthly listeners label for {artist_id}")))?;
        Ok(parse_count(&caps[1]))
    }

    /// Followers, popularity and monthly listeners for an artist input.
    ///
    /// Each field degrades to `0` on its own: a failed API call still leaves
    /// the scraped listener count, and vice versa. An unresolvable input
    /// gives all zeros.
    pub async fn fetch_stats(&self, input: &str) -> SpotifyStats {
        let Some(identifier) = self.resolve(input).await else {
            return SpotifyStats::default();
        };
        let artist_id = identifier.id();

        let (followers, popularity) = self.try_fetch_artist(artist_id).await.unwrap_or_else(|e| {
            degrade_log("artist stats", artist_id, &e);
            (0, 0)
        });
        let monthly_listeners = self
            .try_monthly_listeners(artist_id)
            .await
            .unwrap_or_else(|e| {
                degrade_log("monthly listeners", artist_id, &e);
                0
            });

        SpotifyStats {
            followers,
            popularity,
            monthly_listeners,
        }
    }
}

fn degrade_log(what: &str, artist_id: &str, error: &StatsError) {
    if error.is_not_configured() {
        log::debug!("Skipping Spotify {what} for {artist_id}: {error}");
    } else {
        log::warn!("Spotify {what} for {artist_id} unavailable: {error}");
    }
}
