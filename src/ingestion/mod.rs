//! Ingestion Service Module
//!
//! Turns delimited WHOIS exports into stored snapshot documents.
//!
//! ## Workflow
//! 1. **Read**: `DelimitedSource` yields the header row, then raw data rows.
//! 2. **Normalize**: each row becomes a typed `Snapshot` (domain split,
//!    temporal parsing, blank-to-null), with row-level warnings.
//! 3. **Batch**: `Ingestor` buffers snapshots and bulk-writes them to the
//!    store, isolating failures per batch.
//! 4. **Report**: the run ends with an `IngestSummary` of counts and failed
//!    row ranges.

pub mod handlers;
pub mod ingestor;
pub mod normalizer;
pub mod source;
pub mod types;
