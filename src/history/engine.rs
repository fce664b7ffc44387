use super::format::format_entry;
use super::types::{DomainHistory, HistoryError};
use crate::snapshot::types::{DOMAIN_NAME, DOMAIN_WORD, IndexKey, QUERY_TIME, Snapshot, UPDATE_DATE};
use crate::storage::store::SharedStore;
use crate::storage::types::{FieldMatch, FindQuery, SortSpec, StoredSnapshot};

use std::collections::HashSet;

/// Identity of one observation. Snapshots sharing it are repeated imports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub domain_name: IndexKey,
    pub query_time: IndexKey,
    pub update_date: IndexKey,
}

impl HistoryKey {
    pub fn of(snapshot: &Snapshot) -> Self {
        Self {
            domain_name: snapshot.index_key(DOMAIN_NAME),
            query_time: snapshot.index_key(QUERY_TIME),
            update_date: snapshot.index_key(UPDATE_DATE),
        }
    }
}

pub struct HistoryEngine {
    store: SharedStore,
}

impl HistoryEngine {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// History of every domain whose `domain_name` or `domain_word` equals `token`.
    ///
    /// An empty or blank token is rejected before the store is touched; a
    /// token that matches nothing yields an empty map.
    pub async fn get_history(&self, token: &str) -> Result<DomainHistory, HistoryError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(HistoryError::EmptyToken);
        }

        let query = FindQuery::any_of(vec![
            FieldMatch::new(DOMAIN_NAME, token),
            FieldMatch::new(DOMAIN_WORD, token),
        ])
        .sorted_by(SortSpec::ascending(QUERY_TIME));

        let mut documents = self.store.find(&query).await?;
        tracing::debug!("History for '{}': {} stored snapshots", token, documents.len());

        order_history(&mut documents);
        Ok(group_history(dedup_history(documents)))
    }
}

/// Ascending `query_time` (absent first), ties broken by insertion order, so
/// the result never depends on how the store happened to return documents.
pub fn order_history(documents: &mut [StoredSnapshot]) {
    documents.sort_by_cached_key(|doc| (doc.snapshot.index_key(QUERY_TIME), doc.id));
}

/// Keeps the first snapshot of each `HistoryKey`, preserving order.
pub fn dedup_history(documents: Vec<StoredSnapshot>) -> Vec<StoredSnapshot> {
    let mut seen = HashSet::new();
    documents
        .into_iter()
        .filter(|doc| seen.insert(HistoryKey::of(&doc.snapshot)))
        .collect()
}

pub fn group_history(documents: Vec<StoredSnapshot>) -> DomainHistory {
    let mut history = DomainHistory::new();

    for doc in documents {
        let Some(domain_name) = doc.snapshot.domain_name.as_set() else {
            continue;
        };
        history
            .entry(domain_name.clone())
            .or_default()
            .push(format_entry(&doc.snapshot));
    }

    history
}
