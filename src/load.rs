//! The `load` run loop: discover, observe, infer, reconcile, resolve, persist, write.
//!
//! Each table is processed independently. A failure in any stage is logged
//! with the table name and stage, and the loop moves on to the next file.

use std::{
    fmt,
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::{Result, anyhow};
use itertools::Itertools;
use log::{error, info, warn};

use crate::{
    cli::LoadArgs,
    config::Settings,
    discover, infer, io_utils, observe,
    reconcile::{ReconciliationOutcome, Reconciler},
    resolve::Resolver,
    sink::{DirectorySink, TableSink},
    store::SchemaStore,
};

const READABLE_EXTENSIONS: &[&str] = &["csv", "tsv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Observe,
    Infer,
    Reconcile,
    Resolve,
    Persist,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Observe => "observe",
            Stage::Infer => "infer",
            Stage::Reconcile => "reconcile",
            Stage::Resolve => "resolve",
            Stage::Persist => "persist",
            Stage::Write => "write",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
pub struct TableFailure {
    pub table: String,
    pub path: PathBuf,
    pub stage: Stage,
    pub error: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<TableFailure>,
}

pub fn execute(args: &LoadArgs) -> Result<()> {
    let settings = Settings::from_args(args)?;
    let store = SchemaStore::new(&settings.schema_dir);
    let mut sink = DirectorySink::new(&settings.output_dir);
    let mut resolver = Resolver::stdio();
    let report = run(&settings, &store, &mut sink, &mut resolver)?;

    info!(
        "Loaded {} table(s), skipped {} file(s), {} failure(s)",
        report.loaded.len(),
        report.skipped.len(),
        report.failed.len()
    );
    if report.failed.is_empty() {
        return Ok(());
    }
    Err(anyhow!(
        "{} table(s) failed: {}",
        report.failed.len(),
        report
            .failed
            .iter()
            .map(|f| format!("{} ({})", f.table, f.stage))
            .join(", ")
    ))
}

pub fn run<S, R, W>(
    settings: &Settings,
    store: &SchemaStore,
    sink: &mut S,
    resolver: &mut Resolver<R, W>,
) -> Result<LoadReport>
where
    S: TableSink,
    R: BufRead,
    W: Write,
{
    let files = discover::discover_data_files(&settings.data_dir, &settings.extensions)?;
    let mut report = LoadReport::default();
    for path in files {
        let Some(table) = discover::table_name_for(&path) else {
            warn!("Cannot derive a table name from {path:?}; skipping");
            report.skipped.push(path);
            continue;
        };
        if !is_readable(&path) {
            warn!(
                "File extension of {:?} not yet implemented. Continuing with other files",
                path
            );
            report.skipped.push(path);
            continue;
        }
        info!("Processing {path:?} as table '{table}'");
        match process_table(settings, store, sink, resolver, &path, &table) {
            Ok(()) => report.loaded.push(table),
            Err((stage, err)) => {
                error!("Table '{table}' from {path:?} failed during {stage}: {err:#}");
                report.failed.push(TableFailure {
                    table,
                    path,
                    stage,
                    error: err,
                });
            }
        }
    }
    Ok(report)
}

fn is_readable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| READABLE_EXTENSIONS.iter().any(|r| ext.eq_ignore_ascii_case(r)))
}

fn process_table<S, R, W>(
    settings: &Settings,
    store: &SchemaStore,
    sink: &mut S,
    resolver: &mut Resolver<R, W>,
    path: &Path,
    table: &str,
) -> Result<(), (Stage, anyhow::Error)>
where
    S: TableSink,
    R: BufRead,
    W: Write,
{
    let at = |stage: Stage| move |err: anyhow::Error| (stage, err);

    let delimiter = io_utils::resolve_input_delimiter(path, settings.delimiter);
    let (dataset, observations) =
        observe::read_dataset(path, delimiter, settings.encoding, &settings.id_column)
            .map_err(at(Stage::Observe))?;
    let inferred = infer::infer(&observations)
        .map_err(anyhow::Error::from)
        .map_err(at(Stage::Infer))?;
    let outcome = Reconciler::new(store)
        .reconcile(&inferred, table)
        .map_err(anyhow::Error::from)
        .map_err(at(Stage::Reconcile))?;

    let schema = match outcome {
        ReconciliationOutcome::Ready(schema) => schema,
        ReconciliationOutcome::NeedsResolution(candidate) => {
            info!("Sending table '{table}' to interactive resolution");
            let resolved = resolver
                .resolve_table(table, candidate)
                .map_err(anyhow::Error::from)
                .map_err(at(Stage::Resolve))?;
            store
                .save(table, &resolved)
                .map_err(anyhow::Error::from)
                .map_err(at(Stage::Persist))?;
            resolved
        }
    };

    sink.write_table(table, &dataset, &schema)
        .map_err(at(Stage::Write))?;
    info!("Wrote table '{table}'");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{observe::Dataset, schema::SqlSchema, types::StorageType};
    use encoding_rs::UTF_8;
    use std::{fs, io::Cursor};
    use tempfile::{TempDir, tempdir};

    #[derive(Default)]
    struct RecordingSink {
        written: Vec<(String, SqlSchema)>,
        fail_on: Option<String>,
    }

    impl TableSink for RecordingSink {
        fn write_table(&mut self, table: &str, _dataset: &Dataset, schema: &SqlSchema) -> Result<()> {
            if self.fail_on.as_deref() == Some(table) {
                return Err(anyhow!("storage rejected '{table}'"));
            }
            self.written.push((table.to_string(), schema.clone()));
            Ok(())
        }
    }

    fn settings(dir: &TempDir) -> Settings {
        Settings {
            data_dir: dir.path().join("data"),
            extensions: vec!["csv".to_string(), "xls".to_string()],
            schema_dir: dir.path().join("schemas"),
            output_dir: dir.path().join("tables"),
            id_column: "Id".to_string(),
            delimiter: None,
            encoding: UTF_8,
        }
    }

    fn write_data(dir: &TempDir, name: &str, contents: &str) {
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join(name), contents).unwrap();
    }

    #[test]
    fn ready_tables_skip_the_resolver() {
        let dir = tempdir().expect("temp dir");
        let settings = settings(&dir);
        write_data(&dir, "one.csv", "Id,Count,Active\na,12,0\n");
        let store = SchemaStore::new(&settings.schema_dir);
        store
            .save(
                "one",
                &SqlSchema::from([("Count", StorageType::Integer), ("Active", StorageType::Boolean)]),
            )
            .unwrap();

        let mut sink = RecordingSink::default();
        let mut resolver = Resolver::new(Cursor::new(String::new()), Vec::new());
        let report = run(&settings, &store, &mut sink, &mut resolver).unwrap();
        assert_eq!(report.loaded, vec!["one"]);
        assert_eq!(sink.written[0].1.get("Active"), Some(StorageType::Boolean));
        assert!(resolver.into_output().is_empty());
    }

    #[test]
    fn resolved_schema_is_persisted_before_writing() {
        let dir = tempdir().expect("temp dir");
        let settings = settings(&dir);
        write_data(&dir, "One.csv", "Id,Count,Active\na,12,0\n");
        let store = SchemaStore::new(&settings.schema_dir);

        let mut sink = RecordingSink::default();
        let mut resolver = Resolver::new(Cursor::new("2\n7\n\n".to_string()), Vec::new());
        let report = run(&settings, &store, &mut sink, &mut resolver).unwrap();
        assert_eq!(report.loaded, vec!["one"]);
        let stored = store.load("one").unwrap().expect("persisted");
        assert_eq!(stored.get("Active"), Some(StorageType::Boolean));
        assert_eq!(stored.get("Count"), Some(StorageType::Integer));
        assert_eq!(sink.written[0].1, stored);
    }

    #[test]
    fn failing_table_is_reported_and_loop_continues() {
        let dir = tempdir().expect("temp dir");
        let settings = settings(&dir);
        write_data(&dir, "bad.csv", "Count\n1\n");
        write_data(&dir, "good.csv", "Id,Name\na,x\n");
        write_data(&dir, "sheet.xls", "binary");
        let store = SchemaStore::new(&settings.schema_dir);
        store
            .save("good", &SqlSchema::from([("Name", StorageType::String)]))
            .unwrap();

        let mut sink = RecordingSink::default();
        let mut resolver = Resolver::new(Cursor::new(String::new()), Vec::new());
        let report = run(&settings, &store, &mut sink, &mut resolver).unwrap();
        assert_eq!(report.loaded, vec!["good"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].table, "bad");
        assert_eq!(report.failed[0].stage, Stage::Observe);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn storage_errors_are_attributed_to_write_stage() {
        let dir = tempdir().expect("temp dir");
        let settings = settings(&dir);
        write_data(&dir, "one.csv", "Id,Name\na,x\n");
        let store = SchemaStore::new(&settings.schema_dir);
        store
            .save("one", &SqlSchema::from([("Name", StorageType::String)]))
            .unwrap();

        let mut sink = RecordingSink {
            fail_on: Some("one".to_string()),
            ..Default::default()
        };
        let mut resolver = Resolver::new(Cursor::new(String::new()), Vec::new());
        let report = run(&settings, &store, &mut sink, &mut resolver).unwrap();
        assert_eq!(report.failed[0].stage, Stage::Write);
        assert!(report.failed[0].error.to_string().contains("storage rejected"));
    }

    #[test]
    fn closed_input_fails_only_tables_needing_resolution() {
        let dir = tempdir().expect("temp dir");
        let settings = settings(&dir);
        write_data(&dir, "fresh.csv", "Id,Name\na,x\n");
        let store = SchemaStore::new(&settings.schema_dir);

        let mut sink = RecordingSink::default();
        let mut resolver = Resolver::new(Cursor::new(String::new()), Vec::new());
        let report = run(&settings, &store, &mut sink, &mut resolver).unwrap();
        assert_eq!(report.failed[0].stage, Stage::Resolve);
        assert!(store.load("fresh").unwrap().is_none());
    }
}
