//! Candidate identity and the per-collection identity cache.
//!
//! An identity is the pair (normalized name, verbatim contact). The cache
//! is built lazily from one read of the collection and shared as
//! `Arc<Mutex<…>>` so callers can mutate the sets directly to reserve an
//! identity before the physical write lands. That optimistic reservation is
//! intentional: it stops two rows in the same run from racing, while the
//! gatekeeper's authoritative re-read (see `gatekeeper`) backstops races
//! with other processes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::CANDIDATE_HEADERS;
use crate::errors::AppError;
use crate::store::TabularStore;

/// Trim + lowercase; the contact half of an identity stays verbatim.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Default)]
pub struct CollectionIdentities {
    /// (normalized name, contact) pairs present in the collection.
    pub identities: HashSet<(String, String)>,
    /// Source keys present in the collection.
    pub sources: HashSet<String>,
    /// Normalized name → raw observed-date string.
    pub dates: HashMap<String, String>,
}

impl CollectionIdentities {
    /// Builds the working sets from raw collection rows (header skipped).
    /// Columns: source, date, name, contact.
    pub fn from_rows(rows: &[Vec<String>]) -> Self {
        let mut out = Self::default();
        for row in rows.iter().skip(1) {
            if let Some(source) = row.first() {
                let source = source.trim();
                if !source.is_empty() {
                    out.sources.insert(source.to_string());
                }
            }
            let date = row.get(1).map(|d| d.trim().to_string()).unwrap_or_default();
            let name = row.get(2).map(|n| normalize_name(n)).unwrap_or_default();
            let contact = row.get(3).map(|c| c.trim().to_string()).unwrap_or_default();
            if !name.is_empty() {
                if !date.is_empty() {
                    out.dates.insert(name.clone(), date);
                }
                out.identities.insert((name, contact));
            }
        }
        out
    }

    pub fn contains_identity(&self, name: &str, contact: &str) -> bool {
        self.identities
            .contains(&(normalize_name(name), contact.trim().to_string()))
    }

    /// Optimistically reserves an identity for a row that has passed the
    /// in-memory check but not yet reached the store.
    pub fn reserve(&mut self, name: &str, contact: &str) {
        self.identities
            .insert((normalize_name(name), contact.trim().to_string()));
    }

    /// First contact recorded for a normalized name; used to hydrate
    /// analysis rows that predate the contact column.
    pub fn contact_for(&self, normalized_name: &str) -> Option<&str> {
        self.identities
            .iter()
            .find(|(n, _)| n == normalized_name)
            .map(|(_, c)| c.as_str())
    }
}

type SharedIdentities = Arc<Mutex<CollectionIdentities>>;

/// Process-wide identity cache, one entry per candidate collection.
/// Not safe against parallel processes; cross-process correctness relies
/// on the gatekeeper's re-read before write.
#[derive(Default)]
pub struct IdentityCache {
    inner: Mutex<HashMap<String, SharedIdentities>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached identity sets for a collection, reading the store
    /// only on first access. Ensures the collection exists with candidate
    /// headers as a side effect.
    pub async fn load(
        &self,
        store: &dyn TabularStore,
        collection: &str,
    ) -> Result<SharedIdentities, AppError> {
        let mut map = self.inner.lock().await;
        if let Some(shared) = map.get(collection) {
            return Ok(shared.clone());
        }

        store
            .ensure_collection(collection, Some(&CANDIDATE_HEADERS))
            .await?;
        let rows = store.read(&format!("{collection}!A:D")).await?;
        let built = CollectionIdentities::from_rows(&rows);
        debug!(
            collection,
            identities = built.identities.len(),
            sources = built.sources.len(),
            "identity cache built"
        );

        let shared = Arc::new(Mutex::new(built));
        map.insert(collection.to_string(), shared.clone());
        Ok(shared)
    }

    /// Folds freshly committed source keys into the cached entry, if any.
    pub async fn record_sources(&self, collection: &str, sources: &[String]) {
        let map = self.inner.lock().await;
        if let Some(shared) = map.get(collection) {
            let mut identities = shared.lock().await;
            for s in sources {
                identities.sources.insert(s.clone());
            }
        }
    }

    pub async fn invalidate(&self, collection: &str) {
        self.inner.lock().await.remove(collection);
    }

    pub async fn invalidate_all(&self) {
        self.inner.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn raw_rows() -> Vec<Vec<String>> {
        vec![
            vec!["Source".into(), "Date".into(), "Name".into(), "Contact".into()],
            vec![
                "Drive: a.pdf".into(),
                "2024-06-01".into(),
                " Alice Smith ".into(),
                "alice@example.com".into(),
            ],
            vec!["Drive: b.pdf".into(), "".into(), "Bob".into()],
        ]
    }

    #[test]
    fn test_from_rows_normalizes_names_and_skips_header() {
        let ids = CollectionIdentities::from_rows(&raw_rows());
        assert!(ids.contains_identity("ALICE SMITH", "alice@example.com"));
        assert!(ids.contains_identity("alice smith", "alice@example.com"));
        assert!(!ids.contains_identity("alice smith", "other@example.com"));
        assert!(ids.sources.contains("Drive: a.pdf"));
        assert!(!ids.sources.contains("Source"));
        assert_eq!(ids.dates.get("alice smith").unwrap(), "2024-06-01");
        assert!(ids.dates.get("bob").is_none());
    }

    #[test]
    fn test_reserve_blocks_subsequent_check() {
        let mut ids = CollectionIdentities::default();
        assert!(!ids.contains_identity("Carol", "c@x.com"));
        ids.reserve("Carol", "c@x.com");
        assert!(ids.contains_identity("carol", "c@x.com"));
    }

    #[tokio::test]
    async fn test_load_reads_store_once() {
        let store = MemoryStore::with_collection("SRE", raw_rows());
        let cache = IdentityCache::new();
        cache.load(&store, "SRE").await.unwrap();
        cache.load(&store, "SRE").await.unwrap();
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_rebuild() {
        let store = MemoryStore::with_collection("SRE", raw_rows());
        let cache = IdentityCache::new();
        cache.load(&store, "SRE").await.unwrap();
        cache.invalidate("SRE").await;
        cache.load(&store, "SRE").await.unwrap();
        assert_eq!(store.read_count(), 2);
    }

    #[tokio::test]
    async fn test_reservation_visible_through_shared_handle() {
        let store = MemoryStore::with_collection("SRE", raw_rows());
        let cache = IdentityCache::new();
        let first = cache.load(&store, "SRE").await.unwrap();
        first.lock().await.reserve("Dave", "d@x.com");

        let second = cache.load(&store, "SRE").await.unwrap();
        assert!(second.lock().await.contains_identity("dave", "d@x.com"));
    }
}
