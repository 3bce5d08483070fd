use crate::tickets::extract::{normalize_name, SentenceExtractor, TicketExtractor};
use crate::tickets::source::TicketSource;
use crate::tickets::TicketTotals;
use crate::{Result, StatsError};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-wide ticket totals with a flat JSON file behind them.
///
/// Construct one at startup and share it by reference. The first
/// [`get_or_load`](Self::get_or_load) reads the file, or refreshes from the
/// source when the file is missing; later calls reuse the in-memory value
/// until [`refresh`](Self::refresh) is called explicitly. Loading and
/// refreshing hold the same lock, so concurrent first accesses trigger a
/// single load.
///
/// # Examples
///
/// ```rust,no_run
/// use artist_conversions::tickets::{TicketCache, WordPressSource};
/// use artist_conversions::transport::HttpClientTransport;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let transport = Arc::new(HttpClientTransport::native(Duration::from_secs(30)));
/// let cache = TicketCache::new("data/tickets.json", Arc::new(WordPressSource::new(transport)));
///
/// println!("Beyoncé: {}", cache.tickets_for("Beyoncé").await);
/// # });
/// ```
pub struct TicketCache {
    path: PathBuf,
    source: Arc<dyn TicketSource>,
    extractor: Box<dyn TicketExtractor>,
    totals: Mutex<Option<Arc<TicketTotals>>>,
}

impl TicketCache {
    pub fn new(path: impl Into<PathBuf>, source: Arc<dyn TicketSource>) -> Self {
        Self {
            path: path.into(),
            source,
            extractor: Box::new(SentenceExtractor::new()),
            totals: Mutex::new(None),
        }
    }

    /// Swap the extraction heuristic.
    pub fn with_extractor(mut self, extractor: Box<dyn TicketExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached totals, loading them on first access.
    ///
    /// Never fails: an unreadable file is treated as a miss, and a failed
    /// refresh on a miss leaves an empty mapping for the rest of the process.
    pub async fn get_or_load(&self) -> Arc<TicketTotals> {
        let mut guard = self.totals.lock().await;
        if let Some(totals) = guard.as_ref() {
            return Arc::clone(totals);
        }

        let loaded = match load_totals(&self.path) {
            Ok(Some(totals)) if !totals.is_empty() => {
                log::debug!(
                    "Loaded {} ticket totals from {}",
                    totals.len(),
                    self.path.display()
                );
                totals
            }
            Ok(_) => {
                log::info!("Ticket cache {} is empty or missing, refreshing", self.path.display());
                self.fetch_and_store().await.unwrap_or_else(|e| {
                    log::warn!("Ticket cache refresh failed: {e}");
                    TicketTotals::new()
                })
            }
            Err(e) => {
                log::warn!("Ignoring unreadable ticket cache {}: {e}", self.path.display());
                self.fetch_and_store().await.unwrap_or_else(|e| {
                    log::warn!("Ticket cache refresh failed: {e}");
                    TicketTotals::new()
                })
            }
        };

        let totals = Arc::new(loaded);
        *guard = Some(Arc::clone(&totals));
        totals
    }

    /// Re-fetch the article and replace both the file and the in-memory totals.
    ///
    /// When the article yields no pairs the previous cache is kept untouched
    /// and a [`StatsError::Parse`] is returned.
    pub async fn refresh(&self) -> Result<Arc<TicketTotals>> {
        let mut guard = self.totals.lock().await;
        let totals = Arc::new(self.fetch_and_store().await?);
        *guard = Some(Arc::clone(&totals));
        Ok(totals)
    }

    /// Ticket count for `artist`, or `0` when the artist is not cached.
    pub async fn tickets_for(&self, artist: &str) -> u64 {
        let totals = self.get_or_load().await;
        lookup_tickets(&totals, artist)
    }

    async fn fetch_and_store(&self) -> Result<TicketTotals> {
        let document = self.source.fetch_document().await?;
        let totals = self.extractor.extract(&document);
        if totals.is_empty() {
            return Err(StatsError::Parse(
                "Ticket article yielded no artist/ticket pairs".to_string(),
            ));
        }

        match save_totals(&self.path, &totals) {
            Ok(()) => log::info!(
                "Cached {} artists to {}",
                totals.len(),
                self.path.display()
            ),
            Err(e) => log::warn!(
                "Could not write ticket cache {}: {e}; keeping {} artists in memory",
                self.path.display(),
                totals.len()
            ),
        }
        Ok(totals)
    }
}

/// Read a cache file. A missing file is `Ok(None)`.
pub fn load_totals(path: &Path) -> Result<Option<TicketTotals>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path)?;
    let totals: TicketTotals = serde_json::from_str(&json)?;
    Ok(Some(totals))
}

/// Write a cache file, creating parent directories as needed.
///
/// Entries are written best seller first.
pub fn save_totals(path: &Path, totals: &TicketTotals) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(&ByTickets(ranked(totals)))?;
    fs::write(path, json)?;
    Ok(())
}

/// Entries ordered by tickets descending, ties by name.
pub fn ranked(totals: &TicketTotals) -> Vec<(&str, u64)> {
    let mut entries: Vec<(&str, u64)> = totals
        .iter()
        .map(|(name, tickets)| (name.as_str(), *tickets))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

struct ByTickets<'a>(Vec<(&'a str, u64)>);

impl Serialize for ByTickets<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, tickets) in &self.0 {
            map.serialize_entry(name, tickets)?;
        }
        map.end()
    }
}

/// Look up an artist: exact match first, then containment either way.
///
/// Both sides are compared case-insensitively after diacritic stripping, so
/// "Beyoncé" finds a "Beyonce" entry. Containment matches are tried best
/// seller first.
///
/// ```rust
/// use artist_conversions::tickets::{lookup_tickets, TicketTotals};
///
/// let mut totals = TicketTotals::new();
/// totals.insert("Beyonce".to_string(), 1_200_000);
/// assert_eq!(lookup_tickets(&totals, "Beyoncé"), 1_200_000);
/// assert_eq!(lookup_tickets(&totals, "Unknown"), 0);
/// ```
pub fn lookup_tickets(totals: &TicketTotals, artist: &str) -> u64 {
    let query = normalize_name(artist).to_lowercase();
    if query.is_empty() {
        return 0;
    }

    let keyed: Vec<(String, u64)> = ranked(totals)
        .into_iter()
        .map(|(name, tickets)| (normalize_name(name).to_lowercase(), tickets))
        .collect();

    if let Some((_, tickets)) = keyed.iter().find(|(key, _)| *key == query) {
        return *tickets;
    }

    keyed
        .iter()
        .find(|(key, _)| !key.is_empty() && (key.contains(&query) || query.contains(key.as_str())))
        .map(|(_, tickets)| *tickets)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StaticSource {
        document: String,
        calls: AtomicU32,
    }

    #[async_trait]
    impl TicketSource for StaticSource {
        async fn fetch_document(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.document.clone())
        }
    }

    fn source(document: &str) -> Arc<StaticSource> {
        Arc::new(StaticSource {
            document: document.to_string(),
            calls: AtomicU32::new(0),
        })
    }

    #[tokio::test]
    async fn test_missing_file_triggers_single_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tickets.json");
        let src = source("Coldplay earned $1 million from 2,620,000 tickets.");
        let cache = TicketCache::new(&path, src.clone());

        assert_eq!(cache.tickets_for("coldplay").await, 2_620_000);
        assert_eq!(cache.tickets_for("Coldplay").await, 2_620_000);
        assert_eq!(src.calls.load(Ordering::SeqCst), 1);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_existing_file_is_read_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.json");
        fs::write(&path, r#"{"Beyonce": 1200000}"#).unwrap();

        let src = source("");
        let cache = TicketCache::new(&path, src.clone());
        assert_eq!(cache.tickets_for("Beyoncé").await, 1_200_000);
        assert_eq!(src.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_refresh_keeps_previous_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.json");
        fs::write(&path, r#"{"U2": 900000}"#).unwrap();

        let cache = TicketCache::new(&path, source("<p>Nothing useful here.</p>"));
        assert_eq!(cache.tickets_for("U2").await, 900_000);

        assert!(matches!(cache.refresh().await, Err(StatsError::Parse(_))));
        assert_eq!(cache.tickets_for("U2").await, 900_000);
        assert_eq!(load_totals(&path).unwrap().unwrap().get("U2"), Some(&900_000));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_cache_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.json");
        fs::write(&path, "not json").unwrap();

        let cache = TicketCache::new(&path, source("Pink grossed $5 million from 30,000 tickets."));
        assert_eq!(cache.tickets_for("Pink").await, 30_000);
    }

    #[tokio::test]
    async fn test_concurrent_first_access_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let src = source("Metallica earned $2 million from 45,000 tickets.");
        let cache = Arc::new(TicketCache::new(dir.path().join("t.json"), src.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.tickets_for("Metallica").await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 45_000);
        }
        assert_eq!(src.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lookup_prefers_exact_over_fuzzy() {
        let mut totals = TicketTotals::new();
        totals.insert("Taylor Swift".to_string(), 4_350_000);
        totals.insert("Swift".to_string(), 10);

        assert_eq!(lookup_tickets(&totals, "swift"), 10);
        assert_eq!(lookup_tickets(&totals, "Taylor"), 4_350_000);
        assert_eq!(lookup_tickets(&totals, ""), 0);
    }

    #[test]
    fn test_fuzzy_lookup_prefers_best_seller() {
        let mut totals = TicketTotals::new();
        totals.insert("Taylor Swift".to_string(), 4_350_000);
        totals.insert("James Taylor".to_string(), 200_000);

        assert_eq!(lookup_tickets(&totals, "Taylor"), 4_350_000);
    }

    #[test]
    fn test_fuzzy_lookup_query_contains_key() {
        let mut totals = TicketTotals::new();
        totals.insert("Beyonce".to_string(), 2_780_000);

        assert_eq!(lookup_tickets(&totals, "Beyoncé Knowles"), 2_780_000);
        assert_eq!(lookup_tickets(&totals, "Solange"), 0);
    }

    #[test]
    fn test_saved_file_is_ordered_by_tickets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.json");
        let mut totals = TicketTotals::new();
        totals.insert("Adele".to_string(), 500_000);
        totals.insert("Coldplay".to_string(), 2_620_000);
        totals.insert("Beyonce".to_string(), 2_780_000);
        totals.insert("Blur".to_string(), 500_000);

        save_totals(&path, &totals).unwrap();
        let json = fs::read_to_string(&path).unwrap();
        let positions: Vec<usize> = ["Beyonce", "Coldplay", "Adele", "Blur"]
            .iter()
            .map(|name| json.find(&format!("\"{name}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
        assert_eq!(load_totals(&path).unwrap().unwrap(), totals);
    }

    #[tokio::test]
    async fn test_unwritable_cache_keeps_extracted_totals() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let path = blocker.join("tickets.json");

        let src = source("Coldplay grossed $343 million from 2,620,000 tickets.");
        let cache = TicketCache::new(&path, src.clone());

        assert_eq!(cache.tickets_for("Coldplay").await, 2_620_000);
        assert_eq!(cache.tickets_for("Coldplay").await, 2_620_000);
        assert_eq!(src.calls.load(Ordering::SeqCst), 1);
        assert!(!path.exists());
        assert!(cache.refresh().await.is_ok());
    }
}
