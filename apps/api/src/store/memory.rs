//! In-memory [`TabularStore`] used by unit tests. Rows are stored whole;
//! column addressing in ranges is ignored, which is fine because callers
//! index into rows defensively anyway.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{StoreError, TabularStore};

/// Extracts the collection name from an A1-style range ("Candidates!A:D").
fn collection_of(range: &str) -> &str {
    range.split('!').next().unwrap_or(range).trim_matches('\'')
}

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, Vec<Vec<String>>>>,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(name: &str, rows: Vec<Vec<String>>) -> Self {
        let store = Self::new();
        store
            .collections
            .lock()
            .unwrap()
            .insert(name.to_string(), rows);
        store
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn rows(&self, name: &str) -> Vec<Vec<String>> {
        self.collections
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn insert_rows(&self, name: &str, mut rows: Vec<Vec<String>>) {
        self.collections
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .append(&mut rows);
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn read(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows(collection_of(range)))
    }

    async fn append(&self, range: &str, mut rows: Vec<Vec<String>>) -> Result<(), StoreError> {
        self.collections
            .lock()
            .unwrap()
            .entry(collection_of(range).to_string())
            .or_default()
            .append(&mut rows);
        Ok(())
    }

    async fn write(&self, range: &str, rows: Vec<Vec<String>>) -> Result<(), StoreError> {
        // Anchored writes are only used for header rows; overwrite from row 0.
        let mut collections = self.collections.lock().unwrap();
        let entry = collections
            .entry(collection_of(range).to_string())
            .or_default();
        for (i, row) in rows.into_iter().enumerate() {
            if i < entry.len() {
                entry[i] = row;
            } else {
                entry.push(row);
            }
        }
        Ok(())
    }

    async fn ensure_collection(
        &self,
        name: &str,
        headers: Option<&[&str]>,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.lock().unwrap();
        let entry = collections.entry(name.to_string()).or_default();
        if let Some(headers) = headers {
            let row: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
            if entry.is_empty() {
                entry.push(row);
            } else {
                entry[0] = row;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_of() {
        assert_eq!(collection_of("Candidates!A:D"), "Candidates");
        assert_eq!(collection_of("'Analysis - SRE'!A:K"), "Analysis - SRE");
        assert_eq!(collection_of("HRQuestions"), "HRQuestions");
    }
}
