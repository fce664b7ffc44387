//! Batch Ingestor
//!
//! Drives the normalizer over a delimited source and writes the resulting
//! snapshots to the store in bounded batches.
//!
//! ## Responsibilities
//! - **Positional mapping**: the header row names the columns; every later row
//!   is matched to it by position, with length mismatches reported.
//! - **Batching**: snapshots are buffered and flushed every `batch_size` rows
//!   and once more at end of input.
//! - **Failure isolation**: bulk writes run on spawned tasks while the next
//!   batch is buffered. A failed write is recorded with its row range and
//!   ingestion carries on; only an unreachable store aborts the run.

use super::normalizer::normalize;
use super::types::*;
use crate::snapshot::types::Snapshot;
use crate::storage::store::SharedStore;
use crate::storage::types::{DocumentId, StorageError};

use std::collections::VecDeque;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub struct Ingestor {
    store: SharedStore,
    options: IngestOptions,
    progress: IngestProgress,
}

impl Ingestor {
    pub fn new(store: SharedStore, options: IngestOptions) -> Result<Self, IngestError> {
        if options.batch_size == 0 {
            return Err(IngestError::InvalidOptions(
                "batch size must be at least 1".to_string(),
            ));
        }
        if options.max_in_flight == 0 {
            return Err(IngestError::InvalidOptions(
                "at least one flush must be allowed in flight".to_string(),
            ));
        }

        Ok(Self {
            store,
            options,
            progress: IngestProgress::default(),
        })
    }

    /// Handle for observing rows processed while `ingest` runs.
    pub fn progress(&self) -> IngestProgress {
        self.progress.clone()
    }

    /// Ingests one source: a header row followed by data rows.
    ///
    /// Returns a summary even when batches failed. Errors are reserved for
    /// unreadable input and an unreachable store.
    pub async fn ingest<I>(&self, source: I) -> Result<IngestSummary, IngestError>
    where
        I: IntoIterator<Item = Result<Vec<String>, csv::Error>>,
    {
        let run_id = Uuid::new_v4();
        let mut summary = IngestSummary::new(run_id);
        self.progress.set(0);

        self.store.ping().await?;

        let mut rows = source.into_iter();
        let headers = match rows.next() {
            Some(header) => normalize_headers(header?),
            None => {
                tracing::warn!("[{}] Input has no header row, nothing to ingest", run_id);
                return Ok(summary);
            }
        };

        tracing::info!(
            "[{}] Importing {} rows with {} columns",
            run_id,
            self.options
                .max_rows
                .map_or_else(|| "all".to_string(), |max| max.to_string()),
            headers.len()
        );

        let mut flushes = FlushQueue::new(self.store.clone(), self.options.max_in_flight, run_id);
        let mut buffer: Vec<Snapshot> = Vec::new();
        let mut first_row = 1u64;

        for row in rows {
            if let Some(max_rows) = self.options.max_rows
                && summary.rows_read >= max_rows
            {
                tracing::info!("[{}] Max rows imported - stopping", run_id);
                break;
            }

            let values = row?;
            summary.rows_read += 1;
            let row_number = summary.rows_read;
            self.progress.set(row_number);

            let raw = match_to_headers(&headers, values, row_number, &mut summary);
            let normalized = normalize(&raw);
            for warning in &normalized.warnings {
                summary.record_warning(warning);
            }
            buffer.push(normalized.snapshot);
            summary.rows_normalized += 1;

            if buffer.len() >= self.options.batch_size {
                let batch = std::mem::take(&mut buffer);
                flushes
                    .submit(first_row, row_number, batch, &mut summary)
                    .await?;
                first_row = row_number + 1;
            }
        }

        if !buffer.is_empty() {
            tracing::info!("[{}] Reached end of input - flushing last batch", run_id);
            flushes
                .submit(first_row, summary.rows_read, buffer, &mut summary)
                .await?;
        }
        flushes.drain(&mut summary).await?;

        tracing::info!(
            "[{}] Done: {} rows read, {} stored, {} warnings, {} batches failed",
            run_id,
            summary.rows_read,
            summary.rows_stored,
            summary.warning_count(),
            summary.batches_failed
        );

        Ok(summary)
    }
}

fn normalize_headers(mut headers: Vec<String>) -> Vec<String> {
    if let Some(first) = headers.first_mut()
        && let Some(stripped) = first.strip_prefix('\u{feff}')
    {
        *first = stripped.to_string();
    }
    headers
}

/// Pairs row values with header names by position.
///
/// Short rows leave the trailing columns absent; long rows drop the extra
/// values. Both count as malformed rows.
fn match_to_headers(
    headers: &[String],
    values: Vec<String>,
    row_number: u64,
    summary: &mut IngestSummary,
) -> RawRow {
    if values.len() != headers.len() {
        tracing::warn!(
            "Malformed row {}: expected {} columns, found {}",
            row_number,
            headers.len(),
            values.len()
        );
        summary.record_warning(&RowWarning::MalformedRow {
            expected: headers.len(),
            found: values.len(),
        });
    }

    headers.iter().cloned().zip(values).collect()
}

struct InFlight {
    first_row: u64,
    last_row: u64,
    handle: JoinHandle<Result<Vec<DocumentId>, StorageError>>,
}

/// Outstanding bulk writes, awaited oldest first so every result is
/// attributed to the rows it carried.
struct FlushQueue {
    store: SharedStore,
    limit: usize,
    run_id: Uuid,
    pending: VecDeque<InFlight>,
}

impl FlushQueue {
    fn new(store: SharedStore, limit: usize, run_id: Uuid) -> Self {
        Self {
            store,
            limit,
            run_id,
            pending: VecDeque::new(),
        }
    }

    async fn submit(
        &mut self,
        first_row: u64,
        last_row: u64,
        batch: Vec<Snapshot>,
        summary: &mut IngestSummary,
    ) -> Result<(), IngestError> {
        while self.pending.len() >= self.limit {
            self.complete_oldest(summary).await?;
        }

        let store = self.store.clone();
        let handle = tokio::spawn(async move { store.insert_many(batch).await });
        self.pending.push_back(InFlight {
            first_row,
            last_row,
            handle,
        });

        Ok(())
    }

    async fn drain(&mut self, summary: &mut IngestSummary) -> Result<(), IngestError> {
        while !self.pending.is_empty() {
            self.complete_oldest(summary).await?;
        }
        Ok(())
    }

    async fn complete_oldest(&mut self, summary: &mut IngestSummary) -> Result<(), IngestError> {
        let Some(flush) = self.pending.pop_front() else {
            return Ok(());
        };

        let error = match flush.handle.await {
            Ok(Ok(ids)) => {
                summary.batches_flushed += 1;
                summary.rows_stored += ids.len() as u64;
                tracing::info!(
                    "[{}] Flushed rows {}-{} ({} documents)",
                    self.run_id,
                    flush.first_row,
                    flush.last_row,
                    ids.len()
                );
                return Ok(());
            }
            Ok(Err(e)) if e.is_fatal() => {
                tracing::error!("[{}] Storage unreachable, aborting ingest: {}", self.run_id, e);
                return Err(IngestError::Storage(e));
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("flush task failed: {}", e),
        };

        tracing::error!(
            "[{}] Batch for rows {}-{} failed: {}",
            self.run_id,
            flush.first_row,
            flush.last_row,
            error
        );
        summary.batches_failed += 1;
        summary.failures.push(BatchFailure {
            first_row: flush.first_row,
            last_row: flush.last_row,
            error,
        });

        Ok(())
    }
}

impl Drop for FlushQueue {
    fn drop(&mut self) {
        for flush in &self.pending {
            flush.handle.abort();
        }
    }
}
