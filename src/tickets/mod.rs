//! Year-end touring ticket totals.
//!
//! Totals come from a published article ([`source`]), are pulled out of the
//! prose by an [`extract::TicketExtractor`], and are kept in a flat on-disk
//! cache ([`cache::TicketCache`]) that every artist lookup reads through.

pub mod cache;
pub mod extract;
pub mod source;

use std::collections::BTreeMap;

pub use cache::{lookup_tickets, ranked, TicketCache};
pub use extract::{normalize_name, SentenceExtractor, TicketExtractor};
pub use source::{TicketSource, WordPressSource};

/// Display-cased artist name → ticket count for the reference year.
pub type TicketTotals = BTreeMap<String, u64>;
