//! Numeric label parsing.
//!
//! Public pages render counts as human-readable labels ("1.3M views",
//! "862K", "2,345 likes"). [`parse_count`] turns the first such number in a
//! string into an exact integer.

use once_cell::sync::Lazy;
use regex::Regex;

static COUNT_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*([kmb])?\b").expect("valid count label pattern")
});

/// Parse the first abbreviated or comma-grouped count in `text`.
///
/// Suffixes `K`, `M` and `B` (any case) scale by a thousand, a million and a
/// billion. Thousands separators are stripped before parsing. Anything
/// without a numeric token yields `0`; this never fails.
///
/// # Examples
///
/// ```rust
/// use artist_conversions::labels::parse_count;
///
/// assert_eq!(parse_count("1.3M views"), 1_300_000);
/// assert_eq!(parse_count("862K"), 862_000);
/// assert_eq!(parse_count("2,345"), 2345);
/// assert_eq!(parse_count("garbage"), 0);
/// ```
pub fn parse_count(text: &str) -> u64 {
    let Some(caps) = COUNT_LABEL.captures(text) else {
        return 0;
    };

    let digits = caps[1].replace(',', "");
    let Ok(mantissa) = digits.parse::<f64>() else {
        return 0;
    };

    let scale = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(suffix) if suffix == "k" => 1e3,
        Some(suffix) if suffix == "m" => 1e6,
        Some(suffix) if suffix == "b" => 1e9,
        _ => 1.0,
    };

    let value = (mantissa * scale).round();
    if value.is_finite() && value >= 0.0 {
        value as u64
    } else {
        0
    }
}
