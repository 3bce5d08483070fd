mod commands;

use artist_conversions::{default_ticket_cache_path, ClientConfig, Credentials};
use clap::Parser;
use commands::{execute_command, Commands, Context};
use std::path::PathBuf;

/// Artist conversion rates: YouTube and Spotify reach against touring ticket sales
#[derive(Parser)]
#[command(
    name = "artist-conversions",
    about = "Compare an artist's YouTube and Spotify reach with their touring ticket sales",
    long_about = None
)]
struct Cli {
    /// Show detailed debug information
    #[arg(long, global = true)]
    verbose: bool,

    /// Print reports as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    /// Ticket cache file (defaults to the user cache directory)
    #[arg(long, global = true, env = "ARTIST_CONVERSIONS_CACHE")]
    cache_file: Option<PathBuf>,

    /// Per-request network timeout in seconds
    #[arg(long, global = true, default_value = "20")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    let args = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if args.verbose {
        logger.filter_module("artist_conversions", log::LevelFilter::Debug);
    }
    logger.init();

    let credentials = Credentials::from_env();
    log::debug!("Loaded credentials: {credentials:?}");

    let context = Context {
        credentials,
        config: ClientConfig::new().with_request_timeout(std::time::Duration::from_secs(args.timeout)),
        cache_path: args.cache_file.unwrap_or_else(default_ticket_cache_path),
        json: args.json,
    };

    if let Err(e) = execute_command(args.command, &context).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
