use artist_conversions::tickets::ranked;
use artist_conversions::{FullReport, LightReport, SpotifyReport, TicketTotals};
use serde::Serialize;
use std::path::Path;

const KEY_MISSING_NOTICE: &str =
    "YouTube key not loaded (set YOUTUBE_API_KEY or add it to .env); YouTube numbers will be zero.";

/// Count with thousands separators, `-` for zero.
pub fn fmt_num(value: u64) -> String {
    if value == 0 {
        return "-".to_string();
    }
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Percentage to two decimals, `-` when undefined.
pub fn fmt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}%"))
}

pub fn fmt_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn row(label: &str, value: String) {
    println!("  {label:<28} {value:>18}");
}

pub fn print_light(report: &LightReport) {
    println!("{} (lifetime YouTube stats)", report.artist);
    row("Tickets sold (2023)", fmt_num(report.tickets));
    row("YouTube views (lifetime)", fmt_num(report.lifetime.views));
    row("Subscribers", fmt_num(report.lifetime.subscribers));
    row("Videos", fmt_num(report.lifetime.video_count));
    println!();
    println!("Conversion rates");
    row("Views -> Sales", fmt_pct(report.conversions.views_to_sales_pct));
    row("Subs -> Sales", fmt_pct(report.conversions.subs_to_sales_pct));
    row("Sales per 1M views", fmt_ratio(report.conversions.sales_per_1m_views));
    row("Sales per 10k subs", fmt_ratio(report.conversions.sales_per_10k_subs));
    if !report.youtube_configured {
        println!();
        println!("{KEY_MISSING_NOTICE}");
    }
}

pub fn print_full(report: &FullReport) {
    let year = report.year;
    println!("{} ({year} uploads)", report.artist);
    row("Tickets sold (2023)", fmt_num(report.tickets));
    row(&format!("Views ({year})"), fmt_num(report.annual.views));
    row(&format!("Likes ({year})"), fmt_num(report.annual.likes));
    row(&format!("Comments ({year})"), fmt_num(report.annual.comments));
    row("Videos examined", fmt_num(report.annual.video_count));
    if report.annual.truncated {
        println!("  (video cap reached; totals cover the newest videos only)");
    }
    println!();
    println!("Conversion rates");
    row("Views -> Likes", fmt_pct(report.conversions.views_to_likes_pct));
    row("Likes -> Sales", fmt_pct(report.conversions.likes_to_sales_pct));
    row("Comments -> Sales", fmt_pct(report.conversions.comments_to_sales_pct));

    if !report.annual.samples.is_empty() {
        println!();
        println!("Like label samples");
        for sample in &report.annual.samples {
            println!(
                "  {:<14} api={:<8} parsed={:<10} {}",
                sample.video_id,
                sample
                    .api_likes
                    .map_or_else(|| "none".to_string(), |v| v.to_string()),
                sample.parsed_likes,
                sample.label.as_deref().unwrap_or("(no label found)")
            );
        }
    }
    if !report.youtube_configured {
        println!();
        println!("{KEY_MISSING_NOTICE}");
    }
}

pub fn print_spotify(report: &SpotifyReport) {
    println!("{} (Spotify)", report.artist);
    row("Tickets sold (2023)", fmt_num(report.tickets));
    row("Followers", fmt_num(report.stats.followers));
    row("Monthly listeners", fmt_num(report.stats.monthly_listeners));
    row("Popularity", report.stats.popularity.to_string());
    println!();
    println!(
        "Conversion rates{}",
        if report.clipped { " (clipped to 100%)" } else { "" }
    );
    row("Listeners -> Sales", fmt_pct(report.conversions.listeners_to_sales_pct));
    row("Followers -> Sales", fmt_pct(report.conversions.followers_to_sales_pct));
    row(
        "Followers -> Listeners",
        fmt_pct(report.conversions.followers_to_listeners_pct),
    );
    row(
        "Sales per 1k listeners",
        fmt_ratio(report.conversions.sales_per_1k_listeners),
    );
    if !report.spotify_configured {
        println!();
        println!(
            "Spotify credentials not loaded (SPOTIFY_CLIENT_ID / SPOTIFY_CLIENT_SECRET); only scraped numbers are shown."
        );
    }
}

pub fn print_top_tickets(totals: &TicketTotals, top: usize, path: &Path) {
    println!("{} artists cached in {}", totals.len(), path.display());
    for (rank, (artist, tickets)) in ranked(totals).into_iter().take(top).enumerate() {
        println!("  {:>3}. {artist:<32} {:>12}", rank + 1, fmt_num(tickets));
    }
}

pub fn print_ticket_lookups(found: &[(String, u64)]) {
    for (artist, tickets) in found {
        row(artist, fmt_num(*tickets));
    }
}
