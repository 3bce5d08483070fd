pub mod output;

use artist_conversions::tickets::{lookup_tickets, TicketCache, WordPressSource};
use artist_conversions::youtube::{AnnualQuery, MAX_YEAR, MIN_YEAR};
use artist_conversions::{ClientConfig, Credentials, HttpClientTransport, Reporter, Transport};
use clap::Subcommand;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything the commands need besides their own arguments.
pub struct Context {
    pub credentials: Credentials,
    pub config: ClientConfig,
    pub cache_path: PathBuf,
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lifetime YouTube channel stats against 2023 ticket sales
    ///
    /// Usage examples:
    /// # Resolve the channel from a handle
    /// artist-conversions light "Beyoncé" --channel @beyonce
    ///
    /// # Use a channel id directly (no search request)
    /// artist-conversions light "Taylor Swift" --channel UCqECaJ8Gagnn7YCbPEzWH6g
    Light {
        /// Artist name as it appears in the ticket article
        artist: String,

        /// YouTube channel id, channel URL, @handle or name (defaults to the artist name)
        #[arg(long, default_value = "")]
        channel: String,
    },

    /// Stats summed over videos published in one year
    ///
    /// Usage examples:
    /// # Sum 2023 uploads across two channels, scraping likes the API hides
    /// artist-conversions full "Beyoncé" --channels "@beyonce,@beyoncevevo" --verify-likes
    Full {
        /// Artist name as it appears in the ticket article
        artist: String,

        /// Comma-separated YouTube channels (defaults to the artist name)
        #[arg(long, default_value = "")]
        channels: String,

        /// Calendar year to aggregate
        #[arg(
            long,
            default_value = "2023",
            value_parser = clap::value_parser!(i32).range(i64::from(MIN_YEAR)..=i64::from(MAX_YEAR))
        )]
        year: i32,

        /// Leave comment counts out of the totals
        #[arg(long)]
        no_comments: bool,

        /// Scrape the watch page for videos whose like count the API hides
        #[arg(long)]
        verify_likes: bool,

        /// Maximum number of videos to examine per channel
        #[arg(long)]
        max_videos: Option<usize>,
    },

    /// Spotify followers and monthly listeners against ticket sales
    Spotify {
        /// Artist name as it appears in the ticket article
        artist: String,

        /// Spotify artist id, URL or name (defaults to the artist name)
        #[arg(long, default_value = "")]
        spotify: String,

        /// Report percentages above 100 as-is instead of clipping them
        #[arg(long)]
        no_clip: bool,
    },

    /// Show or refresh the cached ticket totals
    ///
    /// Usage examples:
    /// # Re-scrape the article and show the top 10
    /// artist-conversions tickets --refresh --top 10
    ///
    /// # Spot-check a few names
    /// artist-conversions tickets "Beyoncé" "Coldplay"
    Tickets {
        /// Artists to look up (shows the top entries when empty)
        artists: Vec<String>,

        /// Fetch the article again and rewrite the cache
        #[arg(long)]
        refresh: bool,

        /// Number of entries to show
        #[arg(long, default_value = "20")]
        top: usize,
    },
}

pub async fn execute_command(
    command: Commands,
    context: &Context,
) -> Result<(), Box<dyn std::error::Error>> {
    let transport: Arc<dyn Transport> =
        Arc::new(HttpClientTransport::native(context.config.request_timeout));
    let cache = Arc::new(TicketCache::new(
        &context.cache_path,
        Arc::new(WordPressSource::new(Arc::clone(&transport))),
    ));
    let reporter = Reporter::with_transport(
        transport,
        context.credentials.clone(),
        context.config.clone(),
        cache,
    );

    match command {
        Commands::Light { artist, channel } => {
            log::info!("Light report for '{artist}'");
            let report = reporter.light(&artist, &channel).await;
            if context.json {
                output::print_json(&report)?;
            } else {
                output::print_light(&report);
            }
        }
        Commands::Full {
            artist,
            channels,
            year,
            no_comments,
            verify_likes,
            max_videos,
        } => {
            log::info!("Full report for '{artist}' ({year})");
            let mut query = AnnualQuery::new(year)
                .with_comments(!no_comments)
                .with_like_verification(verify_likes);
            if let Some(max_videos) = max_videos {
                query = query.with_max_videos(max_videos);
            }
            let report = reporter.full(&artist, &channels, &query).await;
            if context.json {
                output::print_json(&report)?;
            } else {
                output::print_full(&report);
            }
        }
        Commands::Spotify {
            artist,
            spotify,
            no_clip,
        } => {
            log::info!("Spotify report for '{artist}'");
            let report = reporter.spotify_report(&artist, &spotify, !no_clip).await;
            if context.json {
                output::print_json(&report)?;
            } else {
                output::print_spotify(&report);
            }
        }
        Commands::Tickets {
            artists,
            refresh,
            top,
        } => {
            let totals = if refresh {
                reporter.tickets().refresh().await?
            } else {
                reporter.tickets().get_or_load().await
            };

            if artists.is_empty() {
                if context.json {
                    output::print_json(&*totals)?;
                } else {
                    output::print_top_tickets(&totals, top, reporter.tickets().path());
                }
            } else {
                let found: Vec<(String, u64)> = artists
                    .iter()
                    .map(|artist| (artist.clone(), lookup_tickets(&totals, artist)))
                    .collect();
                if context.json {
                    output::print_json(&found)?;
                } else {
                    output::print_ticket_lookups(&found);
                }
            }
        }
    }

    Ok(())
}
