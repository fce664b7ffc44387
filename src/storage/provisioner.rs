//! Index Provisioner
//!
//! Ensures the secondary indexes the history engine relies on. Each field is
//! provisioned on its own task; a semaphore sized to the worker count bounds
//! how many index builds run at once.

use super::store::SharedStore;
use super::types::IndexCreation;
use crate::snapshot::types::{
    CREATE_DATE, DOMAIN_NAME, DOMAIN_WORD, EXPIRY_DATE, QUERY_TIME, UPDATE_DATE,
};

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Fields indexed by the operator bootstrap.
pub const DEFAULT_INDEXED_FIELDS: [&str; 6] = [
    DOMAIN_NAME,
    DOMAIN_WORD,
    QUERY_TIME,
    CREATE_DATE,
    UPDATE_DATE,
    EXPIRY_DATE,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "error")]
pub enum IndexStatus {
    Created,
    AlreadyExists,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexOutcome {
    pub field: String,
    pub status: IndexStatus,
}

/// Per-field results, in the order the fields were requested.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexReport {
    pub outcomes: Vec<IndexOutcome>,
}

impl IndexReport {
    /// True when every requested field ended with an index in place.
    pub fn is_complete(&self) -> bool {
        self.failed().next().is_none()
    }

    pub fn failed(&self) -> impl Iterator<Item = &IndexOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, IndexStatus::Failed(_)))
    }

    pub fn status_of(&self, field: &str) -> Option<&IndexStatus> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.field == field)
            .map(|outcome| &outcome.status)
    }
}

pub struct IndexProvisioner {
    store: SharedStore,
    workers: usize,
}

impl IndexProvisioner {
    pub fn new(store: SharedStore, workers: usize) -> Self {
        Self {
            store,
            workers: workers.max(1),
        }
    }

    /// Sizes the worker pool to the machine's available parallelism.
    pub fn with_available_parallelism(store: SharedStore) -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(store, workers)
    }

    /// Idempotently ensures an ascending index on every field.
    ///
    /// Fields are independent: one failure is recorded in the report and the
    /// remaining fields are still provisioned. Duplicate names are provisioned once.
    pub async fn ensure_indexes(&self, fields: &[&str]) -> IndexReport {
        let mut requested: Vec<String> = Vec::new();
        for field in fields {
            if !requested.iter().any(|f| f == field) {
                requested.push(field.to_string());
            }
        }

        tracing::info!(
            "Provisioning {} indexes with {} workers",
            requested.len(),
            self.workers
        );

        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for (position, field) in requested.iter().enumerate() {
            let store = self.store.clone();
            let permits = permits.clone();
            let field = field.clone();

            tasks.spawn(async move {
                let status = match permits.acquire_owned().await {
                    Ok(_permit) => match store.create_index(&field).await {
                        Ok(IndexCreation::Created) => {
                            tracing::info!("Create index {} completed", field);
                            IndexStatus::Created
                        }
                        Ok(IndexCreation::AlreadyExists) => {
                            tracing::info!("Index {} already exists", field);
                            IndexStatus::AlreadyExists
                        }
                        Err(e) => {
                            tracing::error!("Failed to create index {}: {}", field, e);
                            IndexStatus::Failed(e.to_string())
                        }
                    },
                    Err(e) => IndexStatus::Failed(e.to_string()),
                };
                (position, status)
            });
        }

        let mut statuses: Vec<Option<IndexStatus>> = vec![None; requested.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, status)) => statuses[position] = Some(status),
                Err(e) => tracing::error!("Index task aborted: {}", e),
            }
        }

        let outcomes = requested
            .into_iter()
            .zip(statuses)
            .map(|(field, status)| IndexOutcome {
                field,
                status: status.unwrap_or_else(|| IndexStatus::Failed("index task aborted".into())),
            })
            .collect();

        IndexReport { outcomes }
    }
}
