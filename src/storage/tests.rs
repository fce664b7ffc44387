//! Storage Module Tests
//!
//! Validates the in-process document store and the index bootstrap.
//!
//! ## Test Scopes
//! - **MemoryStore**: batch inserts, OR-finds with and without indexes, sorting, capacity.
//! - **IndexProvisioner**: idempotence, per-field failure isolation, bounded concurrency.

#[cfg(test)]
mod tests {
    use crate::snapshot::types::{Field, IndexKey, Snapshot, Temporal, TemporalClass};
    use crate::storage::memory::{MAX_INDEXES, MemoryStore};
    use crate::storage::provisioner::{DEFAULT_INDEXED_FIELDS, IndexProvisioner, IndexStatus};
    use crate::storage::store::{SharedStore, SnapshotStore};
    use crate::storage::types::*;

    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn snapshot(domain: &str, query_time: Option<&str>) -> Snapshot {
        let (word, tld) = domain.split_once('.').unwrap_or((domain, ""));
        Snapshot {
            domain_name: Field::Set(domain.to_string()),
            domain_word: Field::Set(word.to_string()),
            domain_tld: Field::Set(tld.to_string()),
            query_time: match query_time {
                Some(t) => Field::Set(Temporal::parse(t, TemporalClass::Time)),
                None => Field::Null,
            },
            ..Default::default()
        }
    }

    // ============================================================
    // MEMORY STORE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_insert_many_assigns_increasing_ids() {
        let store = MemoryStore::new();

        let ids = store
            .insert_many(vec![snapshot("a.com", None), snapshot("b.com", None)])
            .await
            .unwrap();

        assert_eq!(ids, vec![DocumentId(0), DocumentId(1)]);
        assert_eq!(store.document_count(), 2);
    }

    #[tokio::test]
    async fn test_find_or_predicate_returns_each_document_once() {
        let store = MemoryStore::new();
        store
            .insert_many(vec![
                snapshot("foo.com", None),
                snapshot("foo.net", None),
                snapshot("bar.com", None),
            ])
            .await
            .unwrap();

        // foo.com matches both predicates
        let query = FindQuery::any_of(vec![
            FieldMatch::new("domain_name", "foo.com"),
            FieldMatch::new("domain_word", "foo"),
        ]);
        let found = store.find(&query).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, DocumentId(0));
        assert_eq!(found[1].id, DocumentId(1));
    }

    #[tokio::test]
    async fn test_find_uses_same_results_with_and_without_index() {
        let store = MemoryStore::new();
        for i in 0..20 {
            store
                .insert_many(vec![snapshot(&format!("site{}.org", i % 4), None)])
                .await
                .unwrap();
        }
        let query = FindQuery::any_of(vec![FieldMatch::new("domain_word", "site1")]);

        let scanned = store.find(&query).await.unwrap();
        store.create_index("domain_word").await.unwrap();
        let indexed = store.find(&query).await.unwrap();

        let scanned_ids: Vec<DocumentId> = scanned.iter().map(|d| d.id).collect();
        let indexed_ids: Vec<DocumentId> = indexed.iter().map(|d| d.id).collect();
        assert_eq!(scanned_ids.len(), 5);
        assert_eq!(scanned_ids, indexed_ids);
    }

    #[tokio::test]
    async fn test_index_picks_up_later_inserts() {
        let store = MemoryStore::new();
        store.create_index("domain_name").await.unwrap();

        store
            .insert_many(vec![snapshot("late.io", None)])
            .await
            .unwrap();

        let found = store
            .find(&FindQuery::any_of(vec![FieldMatch::new("domain_name", "late.io")]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(store.index_cardinality("domain_name"), Some(1));
    }

    #[tokio::test]
    async fn test_find_sorts_ascending_with_nulls_first() {
        let store = MemoryStore::new();
        store
            .insert_many(vec![
                snapshot("a.io", Some("2021-06-01 00:00:00")),
                snapshot("a.io", None),
                snapshot("a.io", Some("2021-01-01 00:00:00")),
            ])
            .await
            .unwrap();

        let query = FindQuery::any_of(vec![FieldMatch::new("domain_name", "a.io")])
            .sorted_by(SortSpec::ascending("query_time"));
        let found = store.find(&query).await.unwrap();

        let ids: Vec<u64> = found.iter().map(|d| d.id.0).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert_eq!(found[0].snapshot.index_key("query_time"), IndexKey::Null);
    }

    #[tokio::test]
    async fn test_capacity_limit_rejects_whole_batch() {
        let store = MemoryStore::with_capacity_limit(3);
        store
            .insert_many(vec![snapshot("a.com", None), snapshot("b.com", None)])
            .await
            .unwrap();

        let result = store
            .insert_many(vec![snapshot("c.com", None), snapshot("d.com", None)])
            .await;

        assert!(matches!(
            result,
            Err(StorageError::CapacityExceeded { stored: 2, batch: 2, limit: 3 })
        ));
        // Nothing from the rejected batch was written
        assert_eq!(store.document_count(), 2);
        assert!(!result.unwrap_err().is_fatal());
    }

    #[tokio::test]
    async fn test_create_index_twice_is_noop() {
        let store = MemoryStore::new();

        assert_eq!(
            store.create_index("query_time").await.unwrap(),
            IndexCreation::Created
        );
        assert_eq!(
            store.create_index("query_time").await.unwrap(),
            IndexCreation::AlreadyExists
        );
        assert_eq!(store.list_indexes().await.unwrap(), vec!["query_time"]);
    }

    #[tokio::test]
    async fn test_create_index_rejects_blank_field() {
        let store = MemoryStore::new();
        let result = store.create_index(" ").await;
        assert!(matches!(result, Err(StorageError::InvalidField(_))));
    }

    #[tokio::test]
    async fn test_insert_many_rejects_empty_batch() {
        let store = MemoryStore::new();

        let result = store.insert_many(Vec::new()).await;

        assert!(matches!(result, Err(StorageError::WriteRejected(_))));
        assert!(!result.unwrap_err().is_fatal());
    }

    #[tokio::test]
    async fn test_create_index_fails_past_index_limit() {
        let store = MemoryStore::new();
        for i in 0..MAX_INDEXES {
            store.create_index(&format!("field_{}", i)).await.unwrap();
        }

        let result = store.create_index("one_too_many").await;

        assert!(matches!(
            result,
            Err(StorageError::IndexFailed { ref field, .. }) if field == "one_too_many"
        ));
        // Existing indexes are still reported as present
        assert_eq!(
            store.create_index("field_0").await.unwrap(),
            IndexCreation::AlreadyExists
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_batches_all_land() {
        let store = Arc::new(MemoryStore::new());
        store.create_index("domain_name").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let batch = (0..500)
                    .map(|j| snapshot(&format!("w{}-{}.com", i, j), None))
                    .collect();
                store.insert_many(batch).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 500);
        }

        assert_eq!(store.document_count(), 4000);
        assert_eq!(store.index_cardinality("domain_name"), Some(4000));
    }

    // ============================================================
    // INDEX PROVISIONER TESTS
    // ============================================================

    /// Delegates to a `MemoryStore`, failing index creation for one field and
    /// tracking how many index builds overlap.
    struct InstrumentedStore {
        inner: MemoryStore,
        failing_field: Option<&'static str>,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl InstrumentedStore {
        fn new(failing_field: Option<&'static str>) -> Self {
            Self {
                inner: MemoryStore::new(),
                failing_field,
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SnapshotStore for InstrumentedStore {
        async fn ping(&self) -> Result<(), StorageError> {
            self.inner.ping().await
        }

        async fn insert_many(
            &self,
            batch: Vec<Snapshot>,
        ) -> Result<Vec<DocumentId>, StorageError> {
            self.inner.insert_many(batch).await
        }

        async fn find(&self, query: &FindQuery) -> Result<Vec<StoredSnapshot>, StorageError> {
            self.inner.find(query).await
        }

        async fn create_index(&self, field: &str) -> Result<IndexCreation, StorageError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            if self.failing_field == Some(field) {
                return Err(StorageError::IndexFailed {
                    field: field.to_string(),
                    reason: "disk full".to_string(),
                });
            }
            self.inner.create_index(field).await
        }

        async fn list_indexes(&self) -> Result<Vec<String>, StorageError> {
            self.inner.list_indexes().await
        }
    }

    #[tokio::test]
    async fn test_ensure_indexes_creates_every_default_field() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let provisioner = IndexProvisioner::new(store.clone(), 4);

        let report = provisioner.ensure_indexes(&DEFAULT_INDEXED_FIELDS).await;

        assert!(report.is_complete());
        assert_eq!(report.outcomes.len(), 6);
        for field in DEFAULT_INDEXED_FIELDS {
            assert_eq!(report.status_of(field), Some(&IndexStatus::Created));
        }
        assert_eq!(store.list_indexes().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_ensure_indexes_is_idempotent() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let provisioner = IndexProvisioner::new(store.clone(), 2);

        provisioner.ensure_indexes(&DEFAULT_INDEXED_FIELDS).await;
        let second = provisioner.ensure_indexes(&DEFAULT_INDEXED_FIELDS).await;

        assert!(second.is_complete());
        assert!(
            second
                .outcomes
                .iter()
                .all(|o| o.status == IndexStatus::AlreadyExists)
        );
        // No duplicate indexes
        assert_eq!(store.list_indexes().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_ensure_indexes_isolates_field_failure() {
        let store = Arc::new(InstrumentedStore::new(Some("update_date")));
        let provisioner = IndexProvisioner::new(store.clone(), 3);

        let report = provisioner.ensure_indexes(&DEFAULT_INDEXED_FIELDS).await;

        assert!(!report.is_complete());
        let failed: Vec<&str> = report.failed().map(|o| o.field.as_str()).collect();
        assert_eq!(failed, vec!["update_date"]);
        assert_eq!(report.status_of("expiry_date"), Some(&IndexStatus::Created));
        assert_eq!(store.list_indexes().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_ensure_indexes_runs_fields_concurrently_within_bound() {
        let store = Arc::new(InstrumentedStore::new(None));
        let provisioner = IndexProvisioner::new(store.clone(), 3);

        provisioner.ensure_indexes(&DEFAULT_INDEXED_FIELDS).await;

        let peak = store.peak.load(Ordering::SeqCst);
        assert!(peak > 1, "index builds should overlap, peak was {}", peak);
        assert!(peak <= 3, "peak {} exceeded worker bound", peak);
    }

    #[tokio::test]
    async fn test_ensure_indexes_deduplicates_requested_fields() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let provisioner = IndexProvisioner::new(store, 0);

        let report = provisioner
            .ensure_indexes(&["domain_name", "domain_name"])
            .await;

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.status_of("domain_name"), Some(&IndexStatus::Created));
    }

    #[test]
    fn test_index_status_serialization() {
        let failed = serde_json::to_value(IndexStatus::Failed("boom".to_string())).unwrap();
        let created = serde_json::to_value(IndexStatus::Created).unwrap();

        assert_eq!(failed, serde_json::json!({"status": "failed", "error": "boom"}));
        assert_eq!(created, serde_json::json!({"status": "created"}));
    }
}
