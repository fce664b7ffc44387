use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

// --- Field names ---

pub const DOMAIN_NAME: &str = "domain_name";
pub const DOMAIN_WORD: &str = "domain_word";
pub const DOMAIN_TLD: &str = "domain_tld";
pub const QUERY_TIME: &str = "query_time";
pub const CREATE_DATE: &str = "create_date";
pub const UPDATE_DATE: &str = "update_date";
pub const EXPIRY_DATE: &str = "expiry_date";

/// Columns parsed with [`TIME_FORMAT`].
pub const TIME_FIELDS: [&str; 1] = [QUERY_TIME];
/// Columns parsed with [`DATE_FORMAT`].
pub const DATE_FIELDS: [&str; 3] = [CREATE_DATE, UPDATE_DATE, EXPIRY_DATE];

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// How a temporal column is parsed on ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalClass {
    Time,
    Date,
}

pub fn temporal_class(field: &str) -> Option<TemporalClass> {
    if TIME_FIELDS.contains(&field) {
        Some(TemporalClass::Time)
    } else if DATE_FIELDS.contains(&field) {
        Some(TemporalClass::Date)
    } else {
        None
    }
}

/// Splits a domain on its first `.` into `(word, tld)`.
pub fn split_domain(domain_name: &str) -> Option<(&str, &str)> {
    domain_name.split_once('.')
}

/// A value slot that remembers whether a column was observed at all.
///
/// `Unset` means the column never appeared for this row, `Null` means it was
/// present but blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field<T> {
    Unset,
    Null,
    Set(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Unset
    }
}

impl<T> Field<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Field::Unset)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Field::Set(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> Field<U> {
        match self {
            Field::Unset => Field::Unset,
            Field::Null => Field::Null,
            Field::Set(value) => Field::Set(f(value)),
        }
    }
}

impl Field<String> {
    /// Blank input becomes `Null`, never an empty string.
    pub fn from_raw(value: &str) -> Self {
        if value.is_empty() {
            Field::Null
        } else {
            Field::Set(value.to_string())
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Set(value) => value.serialize(serializer),
            Field::Unset | Field::Null => serializer.serialize_none(),
        }
    }
}

/// A temporal column after ingestion: either parsed, or kept as the original
/// text when it did not match the column's format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Temporal {
    Parsed(NaiveDateTime),
    Raw(String),
}

impl Temporal {
    pub fn parse(value: &str, class: TemporalClass) -> Self {
        let parsed = match class {
            TemporalClass::Time => NaiveDateTime::parse_from_str(value, TIME_FORMAT).ok(),
            TemporalClass::Date => NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN)),
        };

        match parsed {
            Some(time) => Temporal::Parsed(time),
            None => Temporal::Raw(value.to_string()),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Temporal::Parsed(_))
    }

    /// Display form: parsed values as `YYYY-MM-DD HH:MM:SS`, raw values untouched.
    pub fn display(&self) -> String {
        match self {
            Temporal::Parsed(time) => time.format(TIME_FORMAT).to_string(),
            Temporal::Raw(raw) => raw.clone(),
        }
    }
}

/// Orderable key used for index entries, equality lookups and sorting.
///
/// Variant order gives `Null < Text < Time`, so snapshots without a value
/// sort first and unparsed text sorts ahead of real timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKey {
    Null,
    Text(String),
    Time(NaiveDateTime),
}

impl From<&Field<String>> for IndexKey {
    fn from(field: &Field<String>) -> Self {
        match field {
            Field::Set(value) => IndexKey::Text(value.clone()),
            Field::Unset | Field::Null => IndexKey::Null,
        }
    }
}

impl From<&Field<Temporal>> for IndexKey {
    fn from(field: &Field<Temporal>) -> Self {
        match field {
            Field::Set(Temporal::Parsed(time)) => IndexKey::Time(*time),
            Field::Set(Temporal::Raw(raw)) => IndexKey::Text(raw.clone()),
            Field::Unset | Field::Null => IndexKey::Null,
        }
    }
}

/// One observed state of a domain at one point in time.
///
/// Snapshots are immutable once stored; a domain's history is the set of
/// snapshots sharing its `domain_name`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub domain_name: Field<String>,
    pub domain_word: Field<String>,
    pub domain_tld: Field<String>,
    pub query_time: Field<Temporal>,
    pub create_date: Field<Temporal>,
    pub update_date: Field<Temporal>,
    pub expiry_date: Field<Temporal>,
    /// Columns outside the known set, carried through as-is (`None` = blank).
    pub extra: BTreeMap<String, Option<String>>,
}

impl Snapshot {
    pub fn temporal(&self, field: &str) -> Option<&Field<Temporal>> {
        match field {
            QUERY_TIME => Some(&self.query_time),
            CREATE_DATE => Some(&self.create_date),
            UPDATE_DATE => Some(&self.update_date),
            EXPIRY_DATE => Some(&self.expiry_date),
            _ => None,
        }
    }

    pub fn temporal_mut(&mut self, field: &str) -> Option<&mut Field<Temporal>> {
        match field {
            QUERY_TIME => Some(&mut self.query_time),
            CREATE_DATE => Some(&mut self.create_date),
            UPDATE_DATE => Some(&mut self.update_date),
            EXPIRY_DATE => Some(&mut self.expiry_date),
            _ => None,
        }
    }

    /// Key of `field` as seen by indexes and sorts. Missing fields index as `Null`.
    pub fn index_key(&self, field: &str) -> IndexKey {
        match field {
            DOMAIN_NAME => IndexKey::from(&self.domain_name),
            DOMAIN_WORD => IndexKey::from(&self.domain_word),
            DOMAIN_TLD => IndexKey::from(&self.domain_tld),
            other => match self.temporal(other) {
                Some(temporal) => IndexKey::from(temporal),
                None => match self.extra.get(other) {
                    Some(Some(value)) => IndexKey::Text(value.clone()),
                    _ => IndexKey::Null,
                },
            },
        }
    }
}
