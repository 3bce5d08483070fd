pub mod backfill;
pub mod config;
pub mod conversions;
pub mod error;
pub mod headers;
pub mod identifiers;
pub mod labels;
pub mod report;
pub mod spotify;
pub mod tickets;
pub mod transport;
pub mod types;
pub mod youtube;

pub use config::{default_ticket_cache_path, ClientConfig, Credentials};
pub use conversions::{percentage, AnnualConversions, LifetimeConversions, SpotifyConversions};
pub use error::StatsError;
pub use identifiers::{Platform, PlatformIdentifier};
pub use labels::parse_count;
pub use report::{FullReport, LightReport, Reporter, SpotifyReport};
pub use spotify::SpotifyClient;
pub use tickets::{TicketCache, TicketTotals};
pub use transport::{HttpClientTransport, HttpRequest, HttpResponse, Transport};
pub use types::{AnnualStats, LabelSample, SpotifyStats, YouTubeLifetimeStats};
pub use youtube::{AnnualQuery, YouTubeClient};

#[cfg(any(test, feature = "mock"))]
pub use transport::MockTransport;

pub type Result<T> = std::result::Result<T, StatsError>;
