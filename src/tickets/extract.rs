//! Free-text ticket extraction.
//!
//! The year-end touring article is prose, not a table. Each relevant
//! sentence reads roughly "<Artist> <verb> ... from <N> tickets", so the
//! extractor works sentence by sentence: find the ticket phrase, then pull
//! the artist name out of the text before it.
//!
//! This is a heuristic against an unversioned document. False negatives
//! and the occasional false positive are expected; the noise filters below
//! are the only bound on them.

use crate::tickets::TicketTotals;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::collections::BTreeMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Sentences reporting fewer tickets than this are treated as noise.
pub const DEFAULT_MIN_TICKETS: u64 = 10_000;

/// Generic words that the name heuristics sometimes pick up.
const STOP_LIST: &[&str] = &[
    "the tour",
    "tour",
    "tickets",
    "million",
    "millions",
    "list",
    "calendar-year",
    "gross",
    "from",
    "with",
    "at",
    "her",
    "his",
    "their",
    "band",
    "act",
    "surpassing her own numbers at",
    "no",
    "no.",
    "rank",
    "ranking",
];

const NOISE_PREFIXES: &[&str] = &["million", "tickets", "surpassing", "calendar-year", "list"];

static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence break pattern"));

static TICKET_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?P<prefix>.+?)\bfrom\s+(?P<num>\d{1,3}(?:,\d{3})+)\s+tickets\b")
        .expect("valid ticket phrase pattern")
});

static NAME_BEFORE_RANKED_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<name>\p{Lu}[\p{L}\p{N}&'’. ]+?)\s*(?:\(\s*No\.\s*\d+\s*\))?\s+(?i:earned|grossed|sold|generated|was|were|became|ranked|finished|placed)\b",
    )
    .expect("valid ranked name pattern")
});

static NAME_BEFORE_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<name>\p{Lu}[\p{L}\p{N}&'’. ]+?)\s+(?i:earned|grossed|sold|generated|was|were|became|ranked|finished|placed)\b",
    )
    .expect("valid name pattern")
});

static WORD_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{L}[\p{L}\p{N}&'’]*").expect("valid token pattern"));

static TRAILING_RANK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*No\.?\s*\d+\s*$").expect("valid rank suffix pattern"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Turns an article into artist → ticket totals.
///
/// Kept behind a trait so the heuristic can be tuned or replaced without
/// touching the cache that consumes it.
pub trait TicketExtractor: Send + Sync {
    /// Extract totals from an HTML (or plain text) document.
    ///
    /// An empty result is a soft failure; the caller decides whether it is fatal.
    fn extract(&self, document_html: &str) -> TicketTotals;
}

/// Sentence-level pattern extractor for year-end touring articles.
#[derive(Debug, Clone)]
pub struct SentenceExtractor {
    min_tickets: u64,
}

impl SentenceExtractor {
    pub fn new() -> Self {
        Self {
            min_tickets: DEFAULT_MIN_TICKETS,
        }
    }

    pub fn with_min_tickets(mut self, min_tickets: u64) -> Self {
        self.min_tickets = min_tickets;
        self
    }

    /// Extract a single (name, tickets) pair from one sentence.
    pub fn extract_sentence(&self, sentence: &str) -> Option<(String, u64)> {
        let caps = TICKET_PHRASE.captures(sentence)?;
        let tickets: u64 = caps["num"].replace(',', "").parse().ok()?;
        if tickets <= self.min_tickets {
            return None;
        }

        let prefix = &caps["prefix"];
        let candidate = NAME_BEFORE_RANKED_VERB
            .captures(prefix)
            .or_else(|| NAME_BEFORE_VERB.captures(prefix))
            .map(|m| m["name"].trim().to_string())
            .or_else(|| last_capitalized_run(prefix))?;

        let name = clean_candidate(&candidate)?;
        Some((name, tickets))
    }
}

impl Default for SentenceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketExtractor for SentenceExtractor {
    fn extract(&self, document_html: &str) -> TicketTotals {
        let text = normalize_dashes(&html_to_text(document_html));
        let mut by_key: BTreeMap<String, u64> = BTreeMap::new();

        for sentence in split_sentences(&text) {
            if let Some((name, tickets)) = self.extract_sentence(sentence) {
                log::debug!("Ticket mention: '{name}' -> {tickets}");
                let entry = by_key.entry(name.to_lowercase()).or_insert(0);
                *entry = (*entry).max(tickets);
            }
        }

        if by_key.is_empty() {
            log::warn!("No ticket mentions found in {} chars of text", text.len());
        } else {
            log::debug!("Extracted {} artists from ticket article", by_key.len());
        }

        by_key
            .into_iter()
            .map(|(key, tickets)| (title_case(&key), tickets))
            .collect()
    }
}

/// Strip markup, keeping text nodes separated by single spaces.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_dashes(text: &str) -> String {
    text.replace(['\u{2014}', '\u{2013}', '\u{2212}'], "-")
}

/// Split on sentence-ending punctuation followed by a capital letter or `(`.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_BREAK.find_iter(text) {
        let starts_sentence = text[m.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase() || c == '(');
        if starts_sentence {
            // keep the punctuation with the sentence it ends
            sentences.push(&text[start..m.start() + 1]);
            start = m.end();
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// The last maximal run of consecutive capitalized word tokens.
fn last_capitalized_run(prefix: &str) -> Option<String> {
    let mut runs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for token in WORD_TOKEN.find_iter(prefix).map(|m| m.as_str()) {
        if token.chars().next().is_some_and(char::is_uppercase) {
            current.push(token);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs.pop().map(|run| run.join(" "))
}

fn clean_candidate(candidate: &str) -> Option<String> {
    let without_rank = TRAILING_RANK.replace(candidate, "");
    let trimmed = without_rank.trim_matches(|c: char| matches!(c, ' ' | '-' | ':' | ','));
    let name = normalize_name(trimmed);

    if name.chars().count() < 2 {
        return None;
    }
    let lower = name.to_lowercase();
    if STOP_LIST.contains(&lower.as_str()) {
        log::debug!("Rejected stop-listed candidate '{name}'");
        return None;
    }
    if NOISE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        log::debug!("Rejected noisy candidate '{name}'");
        return None;
    }
    Some(name)
}

/// Strip diacritics and collapse whitespace.
///
/// ```rust
/// use artist_conversions::tickets::normalize_name;
///
/// assert_eq!(normalize_name("  Beyoncé   Knowles "), "Beyonce Knowles");
/// ```
pub fn normalize_name(name: &str) -> String {
    let stripped: String = name.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Display casing: first letter of each word upper, the rest lower.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = matches!(c, '\'' | '’') && in_word;
        }
    }
    out
}
