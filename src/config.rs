//! Credentials and client configuration.
//!
//! Credentials come from the environment; everything else has defaults that
//! can be adjusted builder-style.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the YouTube Data API key.
pub const YOUTUBE_API_KEY_VAR: &str = "YOUTUBE_API_KEY";
/// Environment variable holding the Spotify client id.
pub const SPOTIFY_CLIENT_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
/// Environment variable holding the Spotify client secret.
pub const SPOTIFY_CLIENT_SECRET_VAR: &str = "SPOTIFY_CLIENT_SECRET";
/// Environment variable overriding the ticket cache location.
pub const TICKET_CACHE_VAR: &str = "ARTIST_CONVERSIONS_CACHE";

/// Provider credentials.
///
/// Every field is optional. A missing credential never fails a request
/// outright; the dependent fetches resolve to zero stats instead.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub youtube_api_key: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
}

impl Credentials {
    /// Read credentials from the process environment. Empty values count as absent.
    pub fn from_env() -> Self {
        Self {
            youtube_api_key: non_empty_var(YOUTUBE_API_KEY_VAR),
            spotify_client_id: non_empty_var(SPOTIFY_CLIENT_ID_VAR),
            spotify_client_secret: non_empty_var(SPOTIFY_CLIENT_SECRET_VAR),
        }
    }

    pub fn with_youtube_key(mut self, key: &str) -> Self {
        self.youtube_api_key = Some(key.to_string());
        self
    }

    pub fn with_spotify(mut self, client_id: &str, client_secret: &str) -> Self {
        self.spotify_client_id = Some(client_id.to_string());
        self.spotify_client_secret = Some(client_secret.to_string());
        self
    }

    pub fn has_youtube(&self) -> bool {
        self.youtube_api_key.is_some()
    }

    pub fn has_spotify(&self) -> bool {
        self.spotify_client_id.is_some() && self.spotify_client_secret.is_some()
    }
}

// Secrets stay out of debug output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("youtube_api_key", &self.youtube_api_key.as_ref().map(|_| "<set>"))
            .field("spotify_client_id", &self.spotify_client_id.as_ref().map(|_| "<set>"))
            .field(
                "spotify_client_secret",
                &self.spotify_client_secret.as_ref().map(|_| "<set>"),
            )
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Tunables shared by the platform clients.
///
/// # Examples
///
/// ```rust
/// use artist_conversions::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new()
///     .with_max_videos(50)
///     .with_scrape_pause(Duration::from_millis(0));
/// assert_eq!(config.max_videos, 50);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Fixed per-call network timeout
    pub request_timeout: Duration,
    /// Pause between successive page scrapes
    pub scrape_pause: Duration,
    /// Cap on videos examined by the annual aggregation
    pub max_videos: usize,
    /// Cap on label verification samples carried in annual stats
    pub max_label_samples: usize,
    pub youtube_api_base: String,
    pub youtube_web_base: String,
    pub spotify_api_base: String,
    pub spotify_accounts_base: String,
    pub spotify_web_base: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(20),
            scrape_pause: Duration::from_millis(500),
            max_videos: 500,
            max_label_samples: 5,
            youtube_api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            youtube_web_base: "https://www.youtube.com".to_string(),
            spotify_api_base: "https://api.spotify.com/v1".to_string(),
            spotify_accounts_base: "https://accounts.spotify.com".to_string(),
            spotify_web_base: "https://open.spotify.com".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_scrape_pause(mut self, pause: Duration) -> Self {
        self.scrape_pause = pause;
        self
    }

    pub fn with_max_videos(mut self, max_videos: usize) -> Self {
        self.max_videos = max_videos;
        self
    }

    pub fn with_max_label_samples(mut self, max_samples: usize) -> Self {
        self.max_label_samples = max_samples;
        self
    }

    /// Point every provider at one host. Used by tests with a fake transport.
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.youtube_api_base = format!("{base}/youtube/v3");
        self.youtube_web_base = format!("{base}/youtube-web");
        self.spotify_api_base = format!("{base}/spotify/v1");
        self.spotify_accounts_base = format!("{base}/spotify-accounts");
        self.spotify_web_base = format!("{base}/spotify-web");
        self
    }
}

/// Default location of the ticket cache file.
///
/// Honors `ARTIST_CONVERSIONS_CACHE`, then the platform cache directory
/// (`~/.cache/artist-conversions/touringdata_2023_tickets.json` on Linux),
/// then a `data/` directory relative to the working directory.
pub fn default_ticket_cache_path() -> PathBuf {
    if let Some(path) = non_empty_var(TICKET_CACHE_VAR) {
        return PathBuf::from(path);
    }
    dirs::cache_dir()
        .map(|dir| dir.join("artist-conversions"))
        .unwrap_or_else(|| PathBuf::from("data"))
        .join("touringdata_2023_tickets.json")
}
