use crate::error::{CatalogError, Result};
use crate::record::{Record, RecordId};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Immutable set of records, loaded once per session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<Record>,
    by_id: HashMap<RecordId, usize>,
}

impl Catalog {
    /// Build a catalog, keeping the first record for any repeated id.
    pub fn new(records: Vec<Record>) -> Self {
        let mut kept = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());
        for record in records {
            if by_id.contains_key(&record.id) {
                log::warn!("duplicate record id {}; keeping the first occurrence", record.id);
                continue;
            }
            by_id.insert(record.id.clone(), kept.len());
            kept.push(record);
        }
        Self {
            records: kept,
            by_id,
        }
    }

    /// Decode a catalog from a JSON value. The value must be an array;
    /// elements that cannot be decoded are skipped with a warning.
    pub fn from_json_value(value: Value) -> Result<Self> {
        let items = match value {
            Value::Array(items) => items,
            other => return Err(CatalogError::NotAnArray(json_kind(&other).to_string())),
        };

        let total = items.len();
        let mut records = Vec::with_capacity(total);
        for (index, item) in items.into_iter().enumerate() {
            match Record::from_value(index, item) {
                Ok(record) => records.push(record),
                Err(err) => log::warn!("skipping catalog entry: {err}"),
            }
        }

        let catalog = Self::new(records);
        log::debug!("catalog decoded: {} of {total} entries kept", catalog.len());
        Ok(catalog)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_json_value(value)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_json_slice(text.as_bytes())
    }

    /// Read and decode a catalog file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading catalog from {}", path.display());
        let bytes = tokio::fs::read(path).await?;
        Self::from_json_slice(&bytes)
    }

    /// Records in catalog order
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.by_id.get(id).map(|&idx| &self.records[idx])
    }

    /// Catalog position of a record, used to restore catalog order
    #[must_use]
    pub fn position(&self, id: &RecordId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
