//! Ingestion Data Types
//!
//! Rows, warnings, options and the summary produced by one ingest run.

use crate::snapshot::types::Snapshot;
use crate::storage::types::StorageError;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_BATCH_SIZE: usize = 10_000;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 2;

/// One input row keyed by header name. Columns the row did not reach are absent.
pub type RawRow = BTreeMap<String, String>;

/// A recoverable, row-level problem. The row is still ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RowWarning {
    /// `domain_name` has no `.` to split on.
    MalformedDomain { domain_name: String },
    /// No usable `domain_name` column in the row.
    MissingDomain,
    /// Column count differs from the header.
    MalformedRow { expected: usize, found: usize },
    /// Temporal value kept as raw text.
    UnparsedTemporal { field: String, value: String },
}

/// Output of the normalizer for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub snapshot: Snapshot,
    pub warnings: Vec<RowWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Rows buffered before a bulk write.
    pub batch_size: usize,
    /// Stop after this many data rows (header excluded).
    pub max_rows: Option<u64>,
    /// Bulk writes allowed to run while the next batch is buffered.
    pub max_in_flight: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_rows: None,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// A batch whose bulk write failed. Rows are 1-based data-row numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub first_row: u64,
    pub last_row: u64,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub run_id: Uuid,
    pub rows_read: u64,
    pub rows_normalized: u64,
    pub rows_stored: u64,
    pub malformed_domains: u64,
    pub malformed_rows: u64,
    pub unparsed_temporals: u64,
    pub batches_flushed: u64,
    pub batches_failed: u64,
    pub failures: Vec<BatchFailure>,
}

impl IngestSummary {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            rows_read: 0,
            rows_normalized: 0,
            rows_stored: 0,
            malformed_domains: 0,
            malformed_rows: 0,
            unparsed_temporals: 0,
            batches_flushed: 0,
            batches_failed: 0,
            failures: Vec::new(),
        }
    }

    pub fn record_warning(&mut self, warning: &RowWarning) {
        match warning {
            RowWarning::MalformedDomain { .. } | RowWarning::MissingDomain => {
                self.malformed_domains += 1
            }
            RowWarning::MalformedRow { .. } => self.malformed_rows += 1,
            RowWarning::UnparsedTemporal { .. } => self.unparsed_temporals += 1,
        }
    }

    pub fn warning_count(&self) -> u64 {
        self.malformed_domains + self.malformed_rows + self.unparsed_temporals
    }
}

/// Live count of rows consumed by the current run, readable from other tasks.
#[derive(Debug, Clone, Default)]
pub struct IngestProgress {
    rows: Arc<AtomicU64>,
}

impl IngestProgress {
    pub fn rows_processed(&self) -> u64 {
        self.rows.load(Ordering::Relaxed)
    }

    pub(crate) fn set(&self, rows: u64) {
        self.rows.store(rows, Ordering::Relaxed);
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid ingest options: {0}")]
    InvalidOptions(String),
    #[error("failed to read input: {0}")]
    Source(#[from] csv::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
