//! Reconciliation of freshly inferred types against the stored decision.
//!
//! The engine only reads the [`SchemaStore`]; persisting the final schema is
//! left to the caller once any operator input has been applied.

use std::collections::BTreeSet;

use log::{debug, info};

use crate::{
    error::SchemaError,
    infer::InferredSchema,
    schema::SqlSchema,
    store::SchemaStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// The stored schema covers exactly the dataset's columns.
    Ready(SqlSchema),
    /// Operator input is needed; stored types have been merged where known.
    NeedsResolution(InferredSchema),
}

impl ReconciliationOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReconciliationOutcome::Ready(_))
    }
}

#[derive(Debug, Clone)]
pub struct Reconciler<'a> {
    store: &'a SchemaStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a SchemaStore) -> Self {
        Self { store }
    }

    pub fn reconcile(
        &self,
        inferred: &InferredSchema,
        table: &str,
    ) -> Result<ReconciliationOutcome, SchemaError> {
        if inferred.is_empty() {
            return Err(SchemaError::EmptyDataset {
                table: table.to_string(),
            });
        }
        let persisted = self.store.load(table)?.unwrap_or_default();
        let outcome = reconcile_with(inferred, &persisted);
        info!(
            "Table '{table}': {}",
            if outcome.is_ready() {
                "stored schema matches, ready to write"
            } else {
                "stored schema incomplete, operator resolution required"
            }
        );
        Ok(outcome)
    }
}

/// Classifies `inferred` against an already loaded `persisted` schema.
///
/// An absent schema file is represented by an empty `persisted`.
pub fn reconcile_with(inferred: &InferredSchema, persisted: &SqlSchema) -> ReconciliationOutcome {
    let inferred_cols: BTreeSet<&str> = inferred.column_names().collect();
    let persisted_cols = persisted.column_names();
    let common: BTreeSet<&str> = inferred_cols.intersection(&persisted_cols).copied().collect();
    debug!(
        "Columns inferred={} persisted={} common={}",
        inferred_cols.len(),
        persisted_cols.len(),
        common.len()
    );

    if !persisted.is_empty() && inferred_cols == persisted_cols {
        return ReconciliationOutcome::Ready(persisted.clone());
    }

    let mut candidate = inferred.clone();
    for column in candidate.columns.iter_mut() {
        if let Some(stored) = persisted.get(&column.name) {
            column.storage_type = stored;
        }
    }
    if !common.is_empty() {
        debug!("Applied stored types to common columns {common:?}");
    }
    ReconciliationOutcome::NeedsResolution(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        infer::{ColumnObservation, infer},
        types::{RawType, StorageType},
    };
    use tempfile::tempdir;

    fn count_active() -> InferredSchema {
        infer(&[
            ColumnObservation::new("Count", RawType::Integer, Some("12")),
            ColumnObservation::new("Active", RawType::Boolean, Some("0")),
        ])
        .expect("inferred")
    }

    #[test]
    fn no_stored_schema_needs_resolution_unchanged() {
        let dir = tempdir().expect("temp dir");
        let store = SchemaStore::new(dir.path());
        let inferred = count_active();
        let outcome = Reconciler::new(&store).reconcile(&inferred, "one").unwrap();
        assert_eq!(outcome, ReconciliationOutcome::NeedsResolution(inferred));
    }

    #[test]
    fn full_match_uses_stored_types_over_inferred() {
        let inferred = count_active();
        let persisted = SqlSchema::from([
            ("Count", StorageType::Numeric),
            ("Active", StorageType::String),
        ]);
        let outcome = reconcile_with(&inferred, &persisted);
        assert_eq!(outcome, ReconciliationOutcome::Ready(persisted));
    }

    #[test]
    fn partial_match_takes_stored_type_and_keeps_sample() {
        let inferred = count_active();
        let persisted = SqlSchema::from([("Count", StorageType::Float), ("Gone", StorageType::String)]);
        let ReconciliationOutcome::NeedsResolution(candidate) = reconcile_with(&inferred, &persisted)
        else {
            panic!("expected resolution");
        };
        let count = candidate.get("Count").unwrap();
        assert_eq!(count.storage_type, StorageType::Float);
        assert_eq!(count.sample.as_deref(), Some("12"));
        let active = candidate.get("Active").unwrap();
        assert_eq!(active.storage_type, StorageType::Boolean);
        assert!(candidate.get("Gone").is_none());
    }

    #[test]
    fn disjoint_columns_return_inferred_unchanged() {
        let inferred = count_active();
        let persisted = SqlSchema::from([("Other", StorageType::Integer)]);
        assert_eq!(
            reconcile_with(&inferred, &persisted),
            ReconciliationOutcome::NeedsResolution(inferred)
        );
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let dir = tempdir().expect("temp dir");
        let store = SchemaStore::new(dir.path());
        store.save("empty", &SqlSchema::new()).unwrap();
        let err = Reconciler::new(&store)
            .reconcile(&InferredSchema::default(), "empty")
            .unwrap_err();
        assert!(matches!(err, SchemaError::EmptyDataset { table } if table == "empty"));
    }

    #[test]
    fn unreadable_store_propagates() {
        let dir = tempdir().expect("temp dir");
        let store = SchemaStore::new(dir.path());
        std::fs::write(store.path_for("one"), "not json").unwrap();
        let err = Reconciler::new(&store)
            .reconcile(&count_active(), "one")
            .unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }
}
