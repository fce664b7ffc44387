//! Storage Types
//!
//! The query, index and error vocabulary shared by every `SnapshotStore`
//! backend and its callers.

use crate::snapshot::types::Snapshot;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Internal storage identifier. Assigned in insertion order and never
/// exposed in query output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

/// A snapshot as held by the store, paired with its identifier.
#[derive(Debug, Clone)]
pub struct StoredSnapshot {
    pub id: DocumentId,
    pub snapshot: Arc<Snapshot>,
}

/// Equality predicate on one field's text value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub field: String,
    pub value: String,
}

impl FieldMatch {
    pub fn new(field: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Ascending sort on one field, in `IndexKey` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
}

impl SortSpec {
    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.to_string(),
        }
    }
}

/// A single find: documents matching ANY of the predicates, optionally sorted.
///
/// A document matching several predicates is returned once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindQuery {
    pub any_of: Vec<FieldMatch>,
    pub sort: Option<SortSpec>,
}

impl FindQuery {
    pub fn any_of(matches: Vec<FieldMatch>) -> Self {
        Self {
            any_of: matches,
            sort: None,
        }
    }

    pub fn sorted_by(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// Result of asking the store for an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexCreation {
    Created,
    AlreadyExists,
}

#[derive(Debug, Error)]
pub enum StorageError {
    /// The store cannot be reached at all.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("write rejected: {0}")]
    WriteRejected(String),
    #[error("capacity exceeded: {stored} stored + {batch} in batch > limit {limit}")]
    CapacityExceeded {
        stored: usize,
        batch: usize,
        limit: usize,
    },
    #[error("index creation failed for '{field}': {reason}")]
    IndexFailed { field: String, reason: String },
    #[error("invalid field name '{0}'")]
    InvalidField(String),
}

impl StorageError {
    /// Connection-level failures abort the caller; everything else is
    /// recoverable at batch or field granularity.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}
