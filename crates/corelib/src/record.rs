//! Records and per-node partitions.

use crate::error::{Error, Result};
use crate::partitioner;
use serde_json::Value;
use std::collections::BTreeMap;

/// One keyed record: immutable after creation, owned by exactly one node's
/// partition at any stable point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub attributes: BTreeMap<String, String>,
}

impl Record {
    pub fn new(key: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        Self {
            key: key.into(),
            attributes,
        }
    }

    /// Parses one record from a JSON-lines source row.
    ///
    /// Every field of the object is stringified into the attributes. The
    /// field named `key_field` supplies the key; when it is absent the key
    /// falls back to a deterministic hash of the raw line, so an unkeyed
    /// row is still routable rather than a fatal error.
    pub fn from_json_line(line: &str, key_field: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line).map_err(Error::Decode)?;
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(Error::InvalidRecord(format!(
                    "expected a JSON object, got {other}"
                )))
            }
        };

        let mut attributes = BTreeMap::new();
        for (name, value) in &object {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            attributes.insert(name.clone(), text);
        }

        let key = match attributes.get(key_field) {
            Some(key) if !key.is_empty() => key.clone(),
            _ => format!("{:016x}", partitioner::hash_bytes(line.trim().as_bytes())),
        };
        Ok(Self { key, attributes })
    }
}

/// The subset of records a single node stores: key → record.
///
/// Keys are unique within a partition and, immediately after a distribution
/// pass, disjoint across nodes.
#[derive(Debug, Default)]
pub struct Partition {
    entries: BTreeMap<String, Record>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, overwriting any entry under the same key.
    pub fn insert(&mut self, record: Record) {
        self.entries.insert(record.key.clone(), record);
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
