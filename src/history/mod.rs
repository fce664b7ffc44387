//! History Query Module
//!
//! Answers "what did WHOIS say about this domain over time".
//!
//! ## Pipeline
//! 1. **Retrieve**: one OR-find on `domain_name` / `domain_word`, sorted by `query_time`.
//! 2. **Order**: re-sorted locally with insertion order as tie-break.
//! 3. **Deduplicate**: repeated imports of an observation collapse to the first one.
//! 4. **Group & format**: snapshots grouped per `domain_name`, timestamps
//!    rendered for display.

pub mod engine;
pub mod format;
pub mod handlers;
pub mod types;
