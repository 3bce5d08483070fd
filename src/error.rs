use thiserror::Error;

/// Error types for artist signal collection.
///
/// Most public operations in this crate never surface these to the caller:
/// they degrade to a documented zero or empty value instead. The variants
/// exist so that every call site makes that decision explicitly, and so the
/// fallible `try_*` forms can be used directly when the reason matters.
///
/// # Error Handling Examples
///
/// ```rust,no_run
/// use artist_conversions::{ClientConfig, Credentials, StatsError, YouTubeClient};
/// use artist_conversions::transport::HttpClientTransport;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let config = ClientConfig::default();
/// let transport = Arc::new(HttpClientTransport::native(config.request_timeout));
/// let youtube = YouTubeClient::new(transport, Credentials::from_env(), config);
///
/// match youtube.try_fetch_lifetime("@beyonce").await {
///     Ok(stats) => println!("{} views", stats.views),
///     Err(StatsError::NotConfigured(what)) => eprintln!("missing {what}"),
///     Err(StatsError::NotFound(input)) => eprintln!("no channel for {input}"),
///     Err(e) => eprintln!("transport problem: {e}"),
/// }
/// # });
/// ```
#[derive(Error, Debug)]
pub enum StatsError {
    /// A credential needed for the request is missing.
    ///
    /// Dependent fetches degrade to zero stats rather than failing.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// The input could not be resolved to a platform identifier, or the
    /// identifier has no matching entity.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP/network related errors.
    ///
    /// This includes connection failures, timeouts and DNS errors.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider answered with a non-success status code.
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Request URL with credentials redacted
        url: String,
    },

    /// Failed to parse a provider response.
    ///
    /// Provider pages and payloads are not contractually stable, so this is
    /// expected from time to time.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// File system I/O errors from the ticket cache.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StatsError {
    /// Whether this failure came from missing configuration.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, StatsError::NotConfigured(_))
    }

    /// Whether this failure means "no such entity" rather than a transport problem.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StatsError::NotFound(_))
    }
}

impl From<serde_json::Error> for StatsError {
    fn from(e: serde_json::Error) -> Self {
        StatsError::Parse(e.to_string())
    }
}
