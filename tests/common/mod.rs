#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch layout with `data/`, `schemas/`, and `tables/` under one temp dir.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.path().join("data")
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.path().join("schemas")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path().join("tables")
    }

    /// Writes `contents` to `data/<relative>` and returns the path.
    pub fn write_data(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.data_dir().join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("create data dir");
        fs::write(&path, contents).expect("write data file");
        path
    }

    pub fn write_schema(&self, table: &str, json: &str) -> PathBuf {
        fs::create_dir_all(self.schema_dir()).expect("create schema dir");
        let path = self.schema_dir().join(format!("{table}_sqltype.json"));
        fs::write(&path, json).expect("write schema file");
        path
    }

    pub fn read_schema(&self, table: &str) -> serde_json::Value {
        let path = self.schema_dir().join(format!("{table}_sqltype.json"));
        let contents = fs::read_to_string(path).expect("read schema file");
        serde_json::from_str(&contents).expect("parse schema json")
    }

    pub fn load_args(&self) -> Vec<String> {
        vec![
            "load".to_string(),
            "--data-dir".to_string(),
            self.data_dir().display().to_string(),
            "--schema-dir".to_string(),
            self.schema_dir().display().to_string(),
            "--output-dir".to_string(),
            self.output_dir().display().to_string(),
        ]
    }
}

pub const ONE_CSV: &str = "Id,Count,Subject,IsActive,Dollars,CreateDate\n\
0032A00002OVVEGQA5,12,Shipments,0,123.45,2018-05-09 18:10:39\n";
