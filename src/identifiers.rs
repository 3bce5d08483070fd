//! Canonical platform identifiers.
//!
//! Users type whatever they have at hand: a channel id, an `@handle`, an
//! artist page URL, or just the artist's name. The shapes recognized here
//! are returned unchanged without any network call; everything else goes
//! through the platform's search endpoint (see the platform clients).

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    YouTube,
    Spotify,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::YouTube => write!(f, "YouTube"),
            Platform::Spotify => write!(f, "Spotify"),
        }
    }
}

/// A resolved, stable identifier for a channel or artist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlatformIdentifier {
    YouTubeChannel(String),
    SpotifyArtist(String),
}

impl PlatformIdentifier {
    /// Recognize an already-canonical identifier for `platform`.
    ///
    /// Returns `None` when the input needs a search to resolve.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use artist_conversions::identifiers::{Platform, PlatformIdentifier};
    ///
    /// let id = PlatformIdentifier::parse(Platform::YouTube, "UCuHzBCaKmtaLcRAOoazhCPA");
    /// assert_eq!(id, Some(PlatformIdentifier::YouTubeChannel("UCuHzBCaKmtaLcRAOoazhCPA".into())));
    ///
    /// assert_eq!(PlatformIdentifier::parse(Platform::YouTube, "@beyonce"), None);
    /// ```
    pub fn parse(platform: Platform, input: &str) -> Option<Self> {
        match platform {
            Platform::YouTube => canonical_youtube_channel(input).map(Self::YouTubeChannel),
            Platform::Spotify => canonical_spotify_artist(input).map(Self::SpotifyArtist),
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            PlatformIdentifier::YouTubeChannel(_) => Platform::YouTube,
            PlatformIdentifier::SpotifyArtist(_) => Platform::Spotify,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            PlatformIdentifier::YouTubeChannel(id) | PlatformIdentifier::SpotifyArtist(id) => id,
        }
    }
}

impl fmt::Display for PlatformIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform(), self.id())
    }
}

static YOUTUBE_CHANNEL_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"youtube\.com/channel/(UC[A-Za-z0-9_-]{8,})").expect("valid channel URL pattern")
});

static YOUTUBE_CHANNEL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^UC[A-Za-z0-9_-]{8,}$").expect("valid channel id pattern"));

static SPOTIFY_ARTIST_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:open\.spotify\.com/(?:intl-[A-Za-z-]+/)?artist/|spotify:artist:)([A-Za-z0-9]{22})")
        .expect("valid artist URL pattern")
});

static SPOTIFY_ARTIST_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{22}$").expect("valid artist id pattern"));

/// `UC` + at least 8 id characters, or a `youtube.com/channel/<id>` URL.
pub fn canonical_youtube_channel(input: &str) -> Option<String> {
    let input = input.trim();
    if let Some(caps) = YOUTUBE_CHANNEL_URL.captures(input) {
        return Some(caps[1].to_string());
    }
    YOUTUBE_CHANNEL_ID
        .is_match(input)
        .then(|| input.to_string())
}

/// A 22-character base-62 id, an `open.spotify.com/artist/<id>` URL, or a
/// `spotify:artist:<id>` URI.
pub fn canonical_spotify_artist(input: &str) -> Option<String> {
    let input = input.trim();
    if let Some(caps) = SPOTIFY_ARTIST_REF.captures(input) {
        return Some(caps[1].to_string());
    }
    SPOTIFY_ARTIST_ID
        .is_match(input)
        .then(|| input.to_string())
}

/// Split a comma-separated list of inputs, dropping blanks.
pub fn split_inputs(inputs: &str) -> Vec<&str> {
    inputs
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
