//! Simple file-based cache for catalog searches.
//!
//! Results are stored as JSON keyed by a hash of the search kind and query.
//! The cache lives in `~/.cache/blue/search.cache` as a plain text file with
//! one entry per line:  `<hex-hash> <unix-seconds> <json>`
//!
//! Later lines win, so refreshing an entry is just another append.  A cache
//! that cannot be read or written never fails a search.

use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::catalog::{ArtistRecord, CatalogRecord, CatalogSearch};

/// Return the path to the cache file (`~/.cache/blue/search.cache`).
pub fn default_cache_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache").join("blue").join("search.cache"))
}

/// 64-bit FNV-1a, hex encoded.
fn hash_bytes(data: &[u8]) -> String {
    let mut h: u64 = 0xcbf29ce484222325;
    for &b in data {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    format!("{:016x}", h)
}

fn cache_key(kind: &str, query: &str) -> String {
    hash_bytes(format!("{}\n{}", kind, query.trim().to_lowercase()).as_bytes())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[derive(Debug, Clone)]
struct Entry {
    stored_at: u64,
    json: String,
}

/// Load the full cache file; unreadable files and broken lines are skipped.
fn load_entries(path: &Path) -> HashMap<String, Entry> {
    let mut map = HashMap::new();
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return map,
    };
    for line in BufReader::new(file).lines().map_while(Result::ok) {
        let mut parts = line.splitn(3, ' ');
        let (Some(key), Some(ts), Some(json)) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };
        let Ok(stored_at) = ts.parse() else {
            continue;
        };
        map.insert(
            key.to_string(),
            Entry {
                stored_at,
                json: json.to_string(),
            },
        );
    }
    map
}

fn append_entry(path: &Path, key: &str, stored_at: u64, json: &str) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(mut f) => {
            // serde_json output has no raw newlines, keep it that way
            let one_line = json.replace('\n', " ").replace('\r', "");
            if let Err(e) = writeln!(f, "{} {} {}", key, stored_at, one_line) {
                debug!("cannot write search cache {}: {}", path.display(), e);
            }
        }
        Err(e) => debug!("cannot open search cache {}: {}", path.display(), e),
    }
}

/// [`CatalogSearch`] wrapper that memoizes non-empty results on disk.
pub struct CachedCatalog<C> {
    inner: C,
    path: Option<PathBuf>,
    ttl: Duration,
    entries: RefCell<HashMap<String, Entry>>,
}

impl<C: CatalogSearch> CachedCatalog<C> {
    /// Cache in the default location.
    pub fn new(inner: C, ttl: Duration) -> Self {
        Self::with_path(inner, default_cache_path(), ttl)
    }

    /// Cache in `path`; `None` keeps the cache in memory only.
    pub fn with_path(inner: C, path: Option<PathBuf>, ttl: Duration) -> Self {
        let entries = path.as_deref().map(load_entries).unwrap_or_default();
        debug!("search cache: {} entries loaded", entries.len());
        CachedCatalog {
            inner,
            path,
            ttl,
            entries: RefCell::new(entries),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn lookup<T: DeserializeOwned>(&self, key: &str, now: u64) -> Option<Vec<T>> {
        let entries = self.entries.borrow();
        let entry = entries.get(key)?;
        if now.saturating_sub(entry.stored_at) > self.ttl.as_secs() {
            return None;
        }
        serde_json::from_str(&entry.json).ok()
    }

    fn store<T: Serialize>(&self, key: String, items: &[T], now: u64) {
        let json = match serde_json::to_string(items) {
            Ok(json) => json,
            Err(e) => {
                debug!("cannot serialize search results: {}", e);
                return;
            }
        };
        if let Some(path) = &self.path {
            append_entry(path, &key, now, &json);
        }
        self.entries.borrow_mut().insert(key, Entry { stored_at: now, json });
    }

    fn cached<T, F>(&self, kind: &str, query: &str, fetch: F) -> Result<Vec<T>, Box<dyn Error>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<Vec<T>, Box<dyn Error>>,
    {
        let key = cache_key(kind, query);
        let now = now_secs();

        if let Some(items) = self.lookup(&key, now) {
            debug!("search cache hit: {} {:?}", kind, query);
            return Ok(items);
        }

        debug!("search cache miss: {} {:?}", kind, query);
        let items = fetch()?;
        if !items.is_empty() {
            self.store(key, &items, now);
        }
        Ok(items)
    }
}

impl<C: CatalogSearch> CatalogSearch for CachedCatalog<C> {
    fn search_albums(&self, query: &str) -> Result<Vec<CatalogRecord>, Box<dyn Error>> {
        self.cached("albums", query, || self.inner.search_albums(query))
    }

    fn search_artists(&self, query: &str) -> Result<Vec<ArtistRecord>, Box<dyn Error>> {
        self.cached("artists", query, || self.inner.search_artists(query))
    }

    fn artist_albums(&self, artist_id: &str) -> Result<Vec<CatalogRecord>, Box<dyn Error>> {
        self.cached("artist_albums", artist_id, || self.inner.artist_albums(artist_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingCatalog {
        calls: Cell<u32>,
        albums: Vec<CatalogRecord>,
    }

    impl CountingCatalog {
        fn new(albums: Vec<CatalogRecord>) -> Self {
            CountingCatalog {
                calls: Cell::new(0),
                albums,
            }
        }
    }

    impl CatalogSearch for CountingCatalog {
        fn search_albums(&self, _query: &str) -> Result<Vec<CatalogRecord>, Box<dyn Error>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.albums.clone())
        }

        fn search_artists(&self, _query: &str) -> Result<Vec<ArtistRecord>, Box<dyn Error>> {
            self.calls.set(self.calls.get() + 1);
            Err("catalog unavailable".into())
        }
    }

    fn ride() -> Vec<CatalogRecord> {
        vec![CatalogRecord::new("42", "Ride", "Nowhere", "1990-10-15", "8")]
    }

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn test_second_search_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blue").join("search.cache");
        let cache = CachedCatalog::with_path(CountingCatalog::new(ride()), Some(path.clone()), DAY);

        assert_eq!(cache.search_albums("Ride Nowhere").unwrap(), ride());
        assert_eq!(cache.search_albums("  ride nowhere ").unwrap(), ride());
        assert_eq!(cache.inner().calls.get(), 1);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("\"Nowhere\""));
    }

    #[test]
    fn test_cache_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.cache");

        let first = CachedCatalog::with_path(CountingCatalog::new(ride()), Some(path.clone()), DAY);
        first.search_albums("Ride Nowhere").unwrap();

        let second = CachedCatalog::with_path(CountingCatalog::new(vec![]), Some(path), DAY);
        assert_eq!(second.search_albums("Ride Nowhere").unwrap(), ride());
        assert_eq!(second.inner().calls.get(), 0);
    }

    #[test]
    fn test_expired_entries_are_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.cache");
        let key = cache_key("albums", "Ride Nowhere");
        let stale = now_secs() - 2 * DAY.as_secs();
        fs::write(&path, format!("{} {} []\n", key, stale)).unwrap();

        let cache = CachedCatalog::with_path(CountingCatalog::new(ride()), Some(path), DAY);
        assert_eq!(cache.search_albums("Ride Nowhere").unwrap(), ride());
        assert_eq!(cache.inner().calls.get(), 1);
    }

    #[test]
    fn test_empty_results_and_errors_are_not_cached() {
        let cache = CachedCatalog::with_path(CountingCatalog::new(vec![]), None, DAY);

        assert!(cache.search_albums("Nothing").unwrap().is_empty());
        assert!(cache.search_albums("Nothing").unwrap().is_empty());
        assert!(cache.search_artists("Ride").is_err());
        assert!(cache.search_artists("Ride").is_err());
        assert_eq!(cache.inner().calls.get(), 4);
    }

    #[test]
    fn test_broken_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.cache");
        let key = cache_key("albums", "Ride Nowhere");
        fs::write(&path, format!("garbage\n{} notanumber []\n{} {} {{broken\n", key, key, now_secs())).unwrap();

        let cache = CachedCatalog::with_path(CountingCatalog::new(ride()), Some(path), DAY);
        assert_eq!(cache.search_albums("Ride Nowhere").unwrap(), ride());
        assert_eq!(cache.inner().calls.get(), 1);
    }

    #[test]
    fn test_kinds_do_not_collide() {
        assert_ne!(cache_key("albums", "Ride"), cache_key("artists", "Ride"));
        assert_eq!(cache_key("albums", "Ride"), cache_key("albums", " RIDE "));
    }
}
