//! The gatekeeper: sole write path into a candidate collection.
//!
//! Every commit re-reads the collection's identity columns immediately
//! before appending, so rows written by other runs since the cache was
//! built still count as duplicates. Within one commit the working sets
//! grow as rows are accepted, so a batch can never introduce two rows
//! with the same source key or normalized name.

use tracing::info;

use super::identity::{normalize_name, IdentityCache};
use super::{CandidateRow, CANDIDATE_HEADERS};
use crate::errors::AppError;
use crate::store::TabularStore;

#[derive(Debug, Default)]
pub struct CommitOutcome {
    pub written: usize,
    pub skipped: usize,
}

/// Filters `rows` against the authoritative state of `collection` and
/// appends the survivors. A row is skipped when its source key or its
/// normalized name already exists, in the store or earlier in the batch.
pub async fn commit(
    store: &dyn TabularStore,
    cache: &IdentityCache,
    collection: &str,
    rows: Vec<CandidateRow>,
) -> Result<CommitOutcome, AppError> {
    if rows.is_empty() {
        return Ok(CommitOutcome::default());
    }

    store
        .ensure_collection(collection, Some(&CANDIDATE_HEADERS))
        .await?;

    // Authoritative re-read: source, date, name columns.
    let existing = store.read(&format!("{collection}!A:C")).await?;
    let mut existing_sources: std::collections::HashSet<String> = existing
        .iter()
        .skip(1)
        .filter_map(|r| r.first())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let mut existing_names: std::collections::HashSet<String> = existing
        .iter()
        .skip(1)
        .filter_map(|r| r.get(2))
        .map(|n| normalize_name(n))
        .filter(|n| !n.is_empty())
        .collect();

    let mut outcome = CommitOutcome::default();
    let mut cells = Vec::new();
    let mut committed_sources = Vec::new();

    for row in rows {
        if existing_sources.contains(row.source_key.trim()) {
            info!(source = %row.source_key, "skipping duplicate source");
            outcome.skipped += 1;
            continue;
        }
        let norm = normalize_name(&row.name);
        if !norm.is_empty() && existing_names.contains(&norm) {
            info!(name = %row.name, "skipping duplicate candidate name");
            outcome.skipped += 1;
            continue;
        }

        existing_sources.insert(row.source_key.trim().to_string());
        if !norm.is_empty() {
            existing_names.insert(norm);
        }
        committed_sources.push(row.source_key.clone());
        cells.push(row.to_cells());
        outcome.written += 1;
    }

    if !cells.is_empty() {
        store.append(&format!("{collection}!A:K"), cells).await?;
        cache.record_sources(collection, &committed_sources).await;
    }

    info!(
        collection,
        written = outcome.written,
        skipped = outcome.skipped,
        "gatekeeper commit complete"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::strip_formula_prefix;

    fn row(source: &str, name: &str, contact: &str) -> CandidateRow {
        CandidateRow {
            source_key: source.to_string(),
            observed_date: "2024-06-01".to_string(),
            name: name.to_string(),
            contact: contact.to_string(),
            job: "SRE".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_commit_writes_new_rows() {
        let store = MemoryStore::new();
        let cache = IdentityCache::new();
        let out = commit(
            &store,
            &cache,
            "Candidates",
            vec![row("Drive: a.pdf", "Alice", "a@x.com")],
        )
        .await
        .unwrap();
        assert_eq!(out.written, 1);
        assert_eq!(out.skipped, 0);

        let rows = store.rows("Candidates");
        // header + one data row
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "Drive: a.pdf");
        assert_eq!(rows[1][2], "Alice");
    }

    #[tokio::test]
    async fn test_no_duplicates_across_back_to_back_batches() {
        let store = MemoryStore::new();
        let cache = IdentityCache::new();

        commit(
            &store,
            &cache,
            "Candidates",
            vec![row("Drive: a.pdf", "Alice", "a@x.com")],
        )
        .await
        .unwrap();

        // same source, and same name under a different source
        let out = commit(
            &store,
            &cache,
            "Candidates",
            vec![
                row("Drive: a.pdf", "Alice", "a@x.com"),
                row("Drive: a2.pdf", " ALICE ", "a2@x.com"),
                row("Drive: b.pdf", "Bob", "b@x.com"),
            ],
        )
        .await
        .unwrap();
        assert_eq!(out.written, 1);
        assert_eq!(out.skipped, 2);

        let rows = store.rows("Candidates");
        assert_eq!(rows.len(), 3);

        let mut sources = std::collections::HashSet::new();
        let mut names = std::collections::HashSet::new();
        for r in rows.iter().skip(1) {
            assert!(sources.insert(r[0].clone()), "duplicate source committed");
            assert!(
                names.insert(normalize_name(&r[2])),
                "duplicate name committed"
            );
        }
    }

    #[tokio::test]
    async fn test_identical_reimport_writes_nothing() {
        let store = MemoryStore::new();
        let cache = IdentityCache::new();
        let batch = vec![
            row("Drive: a.pdf", "Alice", "a@x.com"),
            row("Drive: b.pdf", "Bob", "b@x.com"),
        ];

        let first = commit(&store, &cache, "Candidates", batch.clone())
            .await
            .unwrap();
        assert_eq!(first.written, 2);

        let second = commit(&store, &cache, "Candidates", batch).await.unwrap();
        assert_eq!(second.written, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(store.rows("Candidates").len(), 3);
    }

    #[tokio::test]
    async fn test_within_batch_duplicate_name_skipped() {
        let store = MemoryStore::new();
        let cache = IdentityCache::new();
        let out = commit(
            &store,
            &cache,
            "Candidates",
            vec![
                row("Drive: a.pdf", "Alice", "a@x.com"),
                row("Drive: dup.pdf", "alice", "other@x.com"),
            ],
        )
        .await
        .unwrap();
        assert_eq!(out.written, 1);
        assert_eq!(out.skipped, 1);
    }

    #[tokio::test]
    async fn test_contact_persisted_defused() {
        let store = MemoryStore::new();
        let cache = IdentityCache::new();
        commit(
            &store,
            &cache,
            "Candidates",
            vec![row("Drive: a.pdf", "Alice", "+91-9999999999")],
        )
        .await
        .unwrap();

        let rows = store.rows("Candidates");
        assert_eq!(rows[1][3], "'+91-9999999999");
        assert_eq!(strip_formula_prefix(&rows[1][3]), "+91-9999999999");
    }

    #[tokio::test]
    async fn test_commit_records_sources_in_cache() {
        let store = MemoryStore::new();
        let cache = IdentityCache::new();
        let shared = cache.load(&store, "Candidates").await.unwrap();

        commit(
            &store,
            &cache,
            "Candidates",
            vec![row("Drive: a.pdf", "Alice", "a@x.com")],
        )
        .await
        .unwrap();

        assert!(shared.lock().await.sources.contains("Drive: a.pdf"));
    }
}
