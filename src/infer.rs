//! Default storage-type inference from observed column types.

use std::collections::HashSet;

use log::debug;
use serde::Serialize;

use crate::{
    error::SchemaError,
    schema::SqlSchema,
    types::{RawType, StorageType},
};

/// What the decoding layer saw for one column of a loaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnObservation {
    pub name: String,
    pub raw_type: RawType,
    pub sample: Option<String>,
}

impl ColumnObservation {
    pub fn new(name: impl Into<String>, raw_type: RawType, sample: Option<&str>) -> Self {
        Self {
            name: name.into(),
            raw_type,
            sample: sample.map(str::to_string),
        }
    }

    /// Builds an observation from a textual raw tag, rejecting tags outside the closed set.
    pub fn from_tag(name: &str, tag: &str, sample: Option<&str>) -> Result<Self, SchemaError> {
        let raw_type = RawType::parse_for_column(name, tag)?;
        Ok(Self::new(name, raw_type, sample))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferredColumn {
    pub name: String,
    pub storage_type: StorageType,
    pub sample: Option<String>,
}

/// Candidate schema that still carries a sample value for every column.
///
/// Columns keep the order of the dataset so that the numbered listing shown to
/// an operator stays stable between prompts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InferredSchema {
    pub columns: Vec<InferredColumn>,
}

impl InferredSchema {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&InferredColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn set_storage_type(&mut self, index: usize, storage_type: StorageType) {
        if let Some(column) = self.columns.get_mut(index) {
            column.storage_type = storage_type;
        }
    }

    /// Drops the sample values, keeping only the type decisions.
    pub fn to_sql_schema(&self) -> SqlSchema {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.storage_type))
            .collect()
    }
}

/// Applies the default raw-type table to every observation.
pub fn infer(observations: &[ColumnObservation]) -> Result<InferredSchema, SchemaError> {
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(observations.len());
    for observation in observations {
        if !seen.insert(observation.name.as_str()) {
            return Err(SchemaError::DuplicateColumn {
                column: observation.name.clone(),
            });
        }
        columns.push(InferredColumn {
            name: observation.name.clone(),
            storage_type: observation.raw_type.default_storage_type(),
            sample: observation.sample.clone(),
        });
    }
    debug!(
        "Inferred default storage types for {} column(s): {:?}",
        columns.len(),
        columns
            .iter()
            .map(|c| (c.name.as_str(), c.storage_type.as_str()))
            .collect::<Vec<_>>()
    );
    Ok(InferredSchema { columns })
}
