use crate::snapshot::types::Field;
use crate::storage::types::StorageError;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One snapshot as returned to callers: temporal fields rendered for
/// display, storage identifiers removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub domain_name: Field<String>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub domain_word: Field<String>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub domain_tld: Field<String>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub query_time: Field<String>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub create_date: Field<String>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub update_date: Field<String>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub expiry_date: Field<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Option<String>>,
}

/// History grouped by `domain_name`, each group ordered by `query_time`.
pub type DomainHistory = BTreeMap<String, Vec<HistoryEntry>>;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryRequest {
    pub domain: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum HistoryError {
    /// Caller error: nothing to search for.
    #[error("Domain query not provided")]
    EmptyToken,
    #[error(transparent)]
    Storage(#[from] StorageError),
}
