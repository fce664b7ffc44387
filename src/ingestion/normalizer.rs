//! Record Normalizer
//!
//! Turns one header-keyed input row into a typed [`Snapshot`]. Pure apart
//! from logging: every problem becomes a [`RowWarning`] and the row is kept.

use super::types::{Normalized, RawRow, RowWarning};
use crate::snapshot::types::{
    DOMAIN_NAME, DOMAIN_TLD, DOMAIN_WORD, Field, Snapshot, Temporal, split_domain,
    temporal_class,
};

pub fn normalize(row: &RawRow) -> Normalized {
    let mut snapshot = Snapshot::default();
    let mut warnings = Vec::new();

    for (column, value) in row {
        match column.as_str() {
            DOMAIN_NAME => snapshot.domain_name = Field::from_raw(value),
            // Always derived from domain_name
            DOMAIN_WORD | DOMAIN_TLD => {
                tracing::debug!("Ignoring input column '{}'", column);
            }
            other => match temporal_class(other) {
                Some(class) => {
                    let field = if value.is_empty() {
                        Field::Null
                    } else {
                        let parsed = Temporal::parse(value, class);
                        if !parsed.is_parsed() {
                            tracing::debug!("Unparsable {} value '{}' kept raw", other, value);
                            warnings.push(RowWarning::UnparsedTemporal {
                                field: other.to_string(),
                                value: value.clone(),
                            });
                        }
                        Field::Set(parsed)
                    };
                    if let Some(slot) = snapshot.temporal_mut(other) {
                        *slot = field;
                    }
                }
                None => {
                    let value = (!value.is_empty()).then(|| value.clone());
                    snapshot.extra.insert(other.to_string(), value);
                }
            },
        }
    }

    match snapshot.domain_name.as_set() {
        Some(domain_name) => match split_domain(domain_name) {
            Some((word, tld)) => {
                snapshot.domain_word = Field::Set(word.to_string());
                snapshot.domain_tld = Field::Set(tld.to_string());
            }
            None => {
                tracing::warn!("Invalid domain {}", domain_name);
                warnings.push(RowWarning::MalformedDomain {
                    domain_name: domain_name.clone(),
                });
            }
        },
        None => {
            tracing::warn!("Row without domain_name");
            warnings.push(RowWarning::MissingDomain);
        }
    }

    Normalized { snapshot, warnings }
}
