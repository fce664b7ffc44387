//! WHOIS History Library
//!
//! This library crate holds the snapshot store's core. The binary (`main.rs`)
//! wires it to a storage handle, the command line and HTTP.
//!
//! ## Architecture Modules
//! The system is composed of four subsystems, leaves first:
//!
//! - **`snapshot`**: The typed WHOIS snapshot record and its field, temporal
//!   and index-key types.
//! - **`ingestion`**: The delimited-file pipeline. Normalizes rows into
//!   snapshots and writes them to storage in isolated batches.
//! - **`storage`**: The document store interface, its in-process backend and
//!   the index provisioner.
//! - **`history`**: The query engine. Retrieves, orders, deduplicates, groups
//!   and formats a domain's snapshot history.

pub mod config;
pub mod history;
pub mod ingestion;
pub mod snapshot;
pub mod storage;
