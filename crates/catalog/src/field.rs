use serde::{Serialize, Serializer};
use serde_json::Value;

/// A record field that may hold one value, a comma-joined list, or an array.
///
/// Every facet comparison on such a field goes through [`MultiValue::matches`];
/// option lists are built from [`MultiValue::atoms`]. Both use the same
/// decomposition rule, so an Ancestry or Class option always matches the
/// record it was extracted from. `category` is not a `MultiValue`: Type
/// options are split on commas but Type matching compares the whole
/// category (see `Record::category_is`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MultiValue {
    /// Field missing or `null`
    #[default]
    Absent,
    /// A single string, possibly comma-joined
    Text(String),
    /// An array of strings
    List(Vec<String>),
    /// Any other JSON shape; never matches anything
    Malformed(Value),
}

impl MultiValue {
    /// Build a single-string value
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Build an array value
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    /// Whether this field holds `wanted` as one of its atomic values.
    ///
    /// `wanted` is trimmed first; an empty `wanted` never matches.
    #[must_use]
    pub fn matches(&self, wanted: &str) -> bool {
        let wanted = wanted.trim();
        if wanted.is_empty() {
            return false;
        }
        match self {
            Self::Absent | Self::Malformed(_) => false,
            Self::List(items) => items.iter().any(|item| item.trim() == wanted),
            Self::Text(text) => text_matches(text, wanted),
        }
    }

    /// Normalized atomic values, in field order, empties skipped.
    #[must_use]
    pub fn atoms(&self) -> Vec<&str> {
        match self {
            Self::Absent | Self::Malformed(_) => Vec::new(),
            Self::List(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .collect(),
            Self::Text(text) => text_atoms(text),
        }
    }
}

impl From<Value> for MultiValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::String(text) => Self::Text(text),
            Value::Array(items) if items.iter().all(Value::is_string) => Self::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(text) => Some(text),
                        _ => None,
                    })
                    .collect(),
            ),
            other => Self::Malformed(other),
        }
    }
}

impl From<&str> for MultiValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl Serialize for MultiValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent => serializer.serialize_none(),
            Self::Text(text) => serializer.serialize_str(text),
            Self::List(items) => items.serialize(serializer),
            Self::Malformed(value) => value.serialize(serializer),
        }
    }
}

/// Match rule for plain string fields: comma-split when a comma is present,
/// otherwise compare the trimmed whole string.
#[must_use]
pub fn text_matches(text: &str, wanted: &str) -> bool {
    let wanted = wanted.trim();
    if wanted.is_empty() || text.trim().is_empty() {
        return false;
    }
    if text.contains(',') {
        text.split(',').any(|segment| segment.trim() == wanted)
    } else {
        text.trim() == wanted
    }
}

/// Atomic values of a plain string field using the same rule as [`text_matches`].
#[must_use]
pub fn text_atoms(text: &str) -> Vec<&str> {
    if text.contains(',') {
        text.split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect()
    } else {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed]
        }
    }
}
