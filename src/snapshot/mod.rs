//! Snapshot Data Model
//!
//! The typed record every other subsystem passes around: one observed WHOIS
//! state of a domain.
//!
//! ## Core Concepts
//! - **Field**: a tri-state slot separating "column never observed" from
//!   "column present but blank".
//! - **Temporal**: lifecycle timestamps either parsed or kept as the raw text
//!   that failed to parse.
//! - **IndexKey**: the orderable projection of a field used by storage
//!   indexes, lookups and history ordering.

pub mod types;
