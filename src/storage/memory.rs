use super::store::SnapshotStore;
use super::types::*;
use crate::snapshot::types::{IndexKey, Snapshot};

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Most secondary indexes a store will hold, matching common document stores.
pub const MAX_INDEXES: usize = 64;

/// In-process document store with single-field secondary indexes.
///
/// Reads are lock-free over the `DashMap`s. Batch inserts and index builds
/// take the writer lock so a batch lands completely or not at all and an
/// index never misses a concurrent insert. The lock is async, so a caller
/// waiting behind a large batch yields its worker thread instead of blocking it.
pub struct MemoryStore {
    documents: DashMap<DocumentId, Arc<Snapshot>>,
    indexes: DashMap<String, DashMap<IndexKey, BTreeSet<DocumentId>>>,
    next_id: AtomicU64,
    capacity: Option<usize>,
    writer: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            indexes: DashMap::new(),
            next_id: AtomicU64::new(0),
            capacity: None,
            writer: Mutex::new(()),
        }
    }

    /// A store that rejects any batch which would take it past `limit` documents.
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            capacity: Some(limit),
            ..Self::new()
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Number of distinct keys held by the index on `field`, if it exists.
    pub fn index_cardinality(&self, field: &str) -> Option<usize> {
        self.indexes.get(field).map(|index| index.len())
    }

    fn store_local(&self, snapshot: Snapshot) -> DocumentId {
        let id = DocumentId(self.next_id.fetch_add(1, Ordering::SeqCst));

        for index in self.indexes.iter() {
            index
                .value()
                .entry(snapshot.index_key(index.key()))
                .or_default()
                .insert(id);
        }
        self.documents.insert(id, Arc::new(snapshot));

        id
    }

    fn matching_ids(&self, matcher: &FieldMatch) -> Vec<DocumentId> {
        let key = IndexKey::Text(matcher.value.clone());

        if let Some(index) = self.indexes.get(&matcher.field) {
            tracing::debug!("FIND: index lookup on '{}'", matcher.field);
            return index
                .get(&key)
                .map(|ids| ids.iter().copied().collect())
                .unwrap_or_default();
        }

        tracing::debug!("FIND: no index on '{}', scanning", matcher.field);
        self.documents
            .iter()
            .filter(|entry| entry.value().index_key(&matcher.field) == key)
            .map(|entry| *entry.key())
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn insert_many(&self, batch: Vec<Snapshot>) -> Result<Vec<DocumentId>, StorageError> {
        if batch.is_empty() {
            return Err(StorageError::WriteRejected(
                "batch must contain at least one document".to_string(),
            ));
        }

        let _writer = self.writer.lock().await;

        if let Some(limit) = self.capacity {
            let stored = self.documents.len();
            if stored + batch.len() > limit {
                return Err(StorageError::CapacityExceeded {
                    stored,
                    batch: batch.len(),
                    limit,
                });
            }
        }

        let ids = batch
            .into_iter()
            .map(|snapshot| self.store_local(snapshot))
            .collect();

        Ok(ids)
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<StoredSnapshot>, StorageError> {
        let ids: BTreeSet<DocumentId> = query
            .any_of
            .iter()
            .flat_map(|matcher| self.matching_ids(matcher))
            .collect();

        let mut results: Vec<StoredSnapshot> = ids
            .into_iter()
            .filter_map(|id| {
                self.documents.get(&id).map(|doc| StoredSnapshot {
                    id,
                    snapshot: doc.value().clone(),
                })
            })
            .collect();

        if let Some(sort) = &query.sort {
            results.sort_by_cached_key(|doc| doc.snapshot.index_key(&sort.field));
        }

        Ok(results)
    }

    async fn create_index(&self, field: &str) -> Result<IndexCreation, StorageError> {
        if field.trim().is_empty() {
            return Err(StorageError::InvalidField(field.to_string()));
        }

        let _writer = self.writer.lock().await;

        if self.indexes.contains_key(field) {
            return Ok(IndexCreation::AlreadyExists);
        }
        if self.indexes.len() >= MAX_INDEXES {
            return Err(StorageError::IndexFailed {
                field: field.to_string(),
                reason: format!("index limit of {} reached", MAX_INDEXES),
            });
        }

        let index: DashMap<IndexKey, BTreeSet<DocumentId>> = DashMap::new();
        for doc in self.documents.iter() {
            index
                .entry(doc.value().index_key(field))
                .or_default()
                .insert(*doc.key());
        }
        self.indexes.insert(field.to_string(), index);

        Ok(IndexCreation::Created)
    }

    async fn list_indexes(&self) -> Result<Vec<String>, StorageError> {
        let mut fields: Vec<String> = self.indexes.iter().map(|e| e.key().clone()).collect();
        fields.sort();
        Ok(fields)
    }
}
