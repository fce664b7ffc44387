use super::types::HistoryEntry;
use crate::snapshot::types::{Snapshot, Temporal};

/// Renders a stored snapshot for output. Parsed timestamps use
/// `YYYY-MM-DD HH:MM:SS`; values that never parsed pass through as stored.
pub fn format_entry(snapshot: &Snapshot) -> HistoryEntry {
    HistoryEntry {
        domain_name: snapshot.domain_name.clone(),
        domain_word: snapshot.domain_word.clone(),
        domain_tld: snapshot.domain_tld.clone(),
        query_time: snapshot.query_time.map(Temporal::display),
        create_date: snapshot.create_date.map(Temporal::display),
        update_date: snapshot.update_date.map(Temporal::display),
        expiry_date: snapshot.expiry_date.map(Temporal::display),
        extra: snapshot.extra.clone(),
    }
}
