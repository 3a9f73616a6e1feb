//! Error types for schema inference, persistence, and interactive resolution.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures raised by the inference, store, and reconciliation layers.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The decoding layer reported a raw type outside the supported set.
    #[error("Column '{column}' has unsupported raw type '{tag}'")]
    UnsupportedRawType { column: String, tag: String },

    #[error("Unknown storage type '{tag}'")]
    UnknownStorageType { tag: String },

    #[error("Column '{column}' was observed more than once")]
    DuplicateColumn { column: String },

    /// A dataset without columns cannot be given a schema.
    #[error("Table '{table}' has no columns to type")]
    EmptyDataset { table: String },

    #[error("Reading schema file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parsing schema file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Writing schema file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures that end an interactive resolution session.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Operator input closed before the session finished")]
    InputClosed,

    #[error("Terminal I/O error: {0}")]
    Io(#[from] io::Error),
}
