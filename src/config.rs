//! Immutable run settings shared by the load pipeline's components.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use log::info;

use crate::{cli::LoadArgs, io_utils};

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub extensions: Vec<String>,
    pub schema_dir: PathBuf,
    pub output_dir: PathBuf,
    pub id_column: String,
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Settings {
    pub fn from_args(args: &LoadArgs) -> Result<Self> {
        let settings = Self {
            data_dir: args.data_dir.clone(),
            extensions: normalize_extensions(&args.extensions)?,
            schema_dir: args.schema_dir.clone(),
            output_dir: args.output_dir.clone(),
            id_column: args.id_column.clone(),
            delimiter: args.delimiter,
            encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
        };
        if settings.extensions.is_empty() {
            bail!("No data file extensions configured (got {:?})", args.extensions);
        }
        settings.log_summary();
        Ok(settings)
    }

    fn log_summary(&self) {
        info!("Data files under {:?}", self.data_dir);
        info!("Accepted extensions: {:?}", self.extensions);
        info!("Schema files in {:?}", self.schema_dir);
        info!("Table output in {:?}", self.output_dir);
        info!(
            "Identifier column '{}', input encoding {}",
            self.id_column,
            self.encoding.name()
        );
    }
}

/// Normalizes `--ext` values. Each value is either a JSON array of strings
/// or a comma separated list; leading dots and duplicates are dropped.
pub fn normalize_extensions(raw: &[String]) -> Result<Vec<String>> {
    let mut extensions: Vec<String> = Vec::new();
    for entry in raw {
        let entry = entry.trim();
        let tokens: Vec<String> = if entry.starts_with('[') {
            serde_json::from_str(entry)
                .with_context(|| format!("Parsing extension list {entry:?} as a JSON array"))?
        } else {
            entry.split(',').map(str::to_string).collect()
        };
        for token in &tokens {
            let token = token.trim().trim_start_matches('.');
            if !token.is_empty() && !extensions.iter().any(|e| e == token) {
                extensions.push(token.to_string());
            }
        }
    }
    Ok(extensions)
}
