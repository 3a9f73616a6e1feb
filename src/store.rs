//! Per-table schema files that carry type decisions between runs.
//!
//! Each table owns `<schema_dir>/<table>_sqltype.json`. A missing file is the
//! normal first-run state and loads as `Ok(None)`. Saves go through a
//! temporary file in the same directory that is atomically persisted over the
//! target, so a crash mid-write leaves the previous file intact.

use std::{
    fs::{self, File},
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::{error::SchemaError, schema::SqlSchema};

pub const SCHEMA_FILE_SUFFIX: &str = "_sqltype.json";

#[derive(Debug, Clone)]
pub struct SchemaStore {
    dir: PathBuf,
}

impl SchemaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}{SCHEMA_FILE_SUFFIX}"))
    }

    pub fn load(&self, table: &str) -> Result<Option<SqlSchema>, SchemaError> {
        let path = self.path_for(table);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No schema file at {path:?} for table '{table}'");
                return Ok(None);
            }
            Err(source) => return Err(SchemaError::Read { path, source }),
        };
        let schema: SqlSchema = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| SchemaError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!(
            "Loaded {} column type(s) for table '{table}' from {path:?}",
            schema.len()
        );
        Ok(Some(schema))
    }

    /// Replaces the table's schema file with `schema` in one atomic step.
    pub fn save(&self, table: &str, schema: &SqlSchema) -> Result<PathBuf, SchemaError> {
        let path = self.path_for(table);
        let write_err = |source: io::Error| SchemaError::Write {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(write_err)?;
        let mut temp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        let json = serde_json::to_string_pretty(schema).map_err(io::Error::other).map_err(write_err)?;
        temp.write_all(json.as_bytes()).map_err(write_err)?;
        temp.write_all(b"\n").map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&path).map_err(|err| write_err(err.error))?;
        info!(
            "Saved {} column type(s) for table '{table}' to {path:?}",
            schema.len()
        );
        Ok(path)
    }
}
