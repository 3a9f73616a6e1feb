//! Final column-type schema handed to storage and persisted between runs.
//!
//! A [`SqlSchema`] maps each column name to a [`StorageType`]. It serializes
//! as a flat JSON object (`{"Count": "Integer", ...}`) with no nesting and no
//! version marker. Key order carries no meaning.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::StorageType;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqlSchema {
    columns: BTreeMap<String, StorageType>,
}

impl SqlSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, storage_type: StorageType) {
        self.columns.insert(name.into(), storage_type);
    }

    pub fn get(&self, name: &str) -> Option<StorageType> {
        self.columns.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> BTreeSet<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, StorageType)> {
        self.columns.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Returns true when this schema covers exactly the given columns.
    pub fn covers_exactly<'a, I>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let other: BTreeSet<&str> = names.into_iter().collect();
        self.column_names() == other
    }
}

impl FromIterator<(String, StorageType)> for SqlSchema {
    fn from_iter<T: IntoIterator<Item = (String, StorageType)>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[(&str, StorageType); N]> for SqlSchema {
    fn from(entries: [(&str, StorageType); N]) -> Self {
        entries
            .into_iter()
            .map(|(name, ty)| (name.to_string(), ty))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_serializes_as_flat_object() {
        let schema = SqlSchema::from([
            ("Count", StorageType::Integer),
            ("Active", StorageType::Boolean),
        ]);
        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(json, r#"{"Active":"Boolean","Count":"Integer"}"#);
    }

    #[test]
    fn schema_rejects_nested_or_unknown_values() {
        assert!(serde_json::from_str::<SqlSchema>(r#"{"Count": {"type": "Integer"}}"#).is_err());
        assert!(serde_json::from_str::<SqlSchema>(r#"{"Count": "BigInt"}"#).is_err());
    }

    #[test]
    fn covers_exactly_ignores_order() {
        let schema = SqlSchema::from([("a", StorageType::String), ("b", StorageType::Float)]);
        assert!(schema.covers_exactly(["b", "a"]));
        assert!(!schema.covers_exactly(["a"]));
        assert!(!schema.covers_exactly(["a", "b", "c"]));
    }
}
