//! Snapshot Storage Module
//!
//! The document store the rest of the system talks to, plus the operator-side
//! index bootstrap.
//!
//! ## Core Concepts
//! - **SnapshotStore**: the storage collaborator trait (bulk insert, OR-find
//!   with sort, index creation). Components receive an explicit `SharedStore`
//!   handle; none of them own a connection.
//! - **MemoryStore**: the in-process backend. Documents live in a `DashMap`
//!   keyed by insertion sequence, with one secondary index per indexed field.
//! - **IndexProvisioner**: idempotently ensures the indexes history lookups
//!   depend on, one concurrent task per field.

pub mod handlers;
pub mod memory;
pub mod provisioner;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;
