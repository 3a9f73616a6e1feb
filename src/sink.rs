//! Storage targets that receive a dataset together with its final schema.
//!
//! [`DirectorySink`] materializes each table as a `CREATE TABLE` script plus a
//! typed CSV data file, replacing whatever a previous run left behind.

use std::{
    collections::HashSet,
    fmt::Write as _,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info};
use tempfile::NamedTempFile;

use crate::{data, io_utils, observe::Dataset, schema::SqlSchema};

pub trait TableSink {
    /// Replaces `table` with the dataset's rows typed by `schema`.
    fn write_table(&mut self, table: &str, dataset: &Dataset, schema: &SqlSchema) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn ddl_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.sql"))
    }

    pub fn data_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }
}

impl TableSink for DirectorySink {
    fn write_table(&mut self, table: &str, dataset: &Dataset, schema: &SqlSchema) -> Result<()> {
        check_columns(table, dataset, schema)?;
        check_primary_key(table, dataset)?;
        check_values(table, dataset, schema)?;

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Creating output directory {:?}", self.dir))?;
        let ddl = create_table_sql(table, dataset, schema)?;
        replace_file(&self.dir, &self.ddl_path(table), |file| {
            file.write_all(ddl.as_bytes())?;
            Ok(())
        })?;
        replace_file(&self.dir, &self.data_path(table), |file| {
            let mut writer = io_utils::open_csv_writer(file, b',');
            let mut header = vec![dataset.id_column.as_str()];
            header.extend(dataset.columns.iter().map(String::as_str));
            writer.write_record(&header)?;
            for (id, row) in dataset.ids.iter().zip(&dataset.rows) {
                writer.write_field(id)?;
                for value in row {
                    writer.write_field(value)?;
                }
                writer.write_record(None::<&[u8]>)?;
            }
            writer.flush()?;
            Ok(())
        })?;
        info!(
            "Replaced table '{table}' with {} row(s) in {:?}",
            dataset.row_count(),
            self.dir
        );
        Ok(())
    }
}

fn check_columns(table: &str, dataset: &Dataset, schema: &SqlSchema) -> Result<()> {
    if schema.covers_exactly(dataset.columns.iter().map(String::as_str)) {
        return Ok(());
    }
    Err(anyhow!(
        "Table '{table}': schema declares {} column(s) but the dataset has {} ({})",
        schema.len(),
        dataset.columns.len(),
        dataset.columns.join(", ")
    ))
}

fn check_primary_key(table: &str, dataset: &Dataset) -> Result<()> {
    let mut seen = HashSet::with_capacity(dataset.ids.len());
    for (idx, id) in dataset.ids.iter().enumerate() {
        if id.trim().is_empty() {
            bail!(
                "Table '{table}': primary key '{}' is empty at row {}",
                dataset.id_column,
                idx + 2
            );
        }
        if !seen.insert(id.as_str()) {
            bail!(
                "Table '{table}': duplicate primary key '{id}' in column '{}'",
                dataset.id_column
            );
        }
    }
    Ok(())
}

fn check_values(table: &str, dataset: &Dataset, schema: &SqlSchema) -> Result<()> {
    for (row_idx, row) in dataset.rows.iter().enumerate() {
        for (name, value) in dataset.columns.iter().zip(row) {
            if data::is_null_token(value) {
                continue;
            }
            let Some(ty) = schema.get(name) else {
                continue;
            };
            data::check_storable(value, ty).with_context(|| {
                format!(
                    "Table '{table}' row {} column '{name}' declared {ty}",
                    row_idx + 2
                )
            })?;
        }
    }
    Ok(())
}

pub fn create_table_sql(table: &str, dataset: &Dataset, schema: &SqlSchema) -> Result<String> {
    let mut sql = String::new();
    writeln!(sql, "DROP TABLE IF EXISTS \"{table}\";")?;
    writeln!(sql, "CREATE TABLE \"{table}\" (")?;
    writeln!(sql, "    \"{}\" VARCHAR NOT NULL,", dataset.id_column)?;
    for name in &dataset.columns {
        let ty = schema
            .get(name)
            .ok_or_else(|| anyhow!("Table '{table}': no type for column '{name}'"))?;
        writeln!(sql, "    \"{name}\" {},", ty.sql_type())?;
    }
    writeln!(sql, "    PRIMARY KEY (\"{}\")", dataset.id_column)?;
    writeln!(sql, ");")?;
    debug!("DDL for '{table}':\n{sql}");
    Ok(sql)
}

fn replace_file<F>(dir: &Path, target: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut NamedTempFile) -> Result<()>,
{
    let mut temp =
        NamedTempFile::new_in(dir).with_context(|| format!("Creating temp file in {dir:?}"))?;
    fill(&mut temp).with_context(|| format!("Writing {target:?}"))?;
    temp.persist(target)
        .map_err(|err| err.error)
        .with_context(|| format!("Replacing {target:?}"))?;
    Ok(())
}
