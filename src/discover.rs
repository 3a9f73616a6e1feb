//! Recursive data file discovery.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{Result, anyhow};
use itertools::Itertools;
use log::{debug, info};
use walkdir::WalkDir;

/// Lists files under `root` whose extension is one of `extensions`.
///
/// Table names derived from the files must be unique across the whole tree;
/// two files mapping to the same table abort discovery.
pub fn discover_data_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    info!(
        "Searching {:?} for files with extension(s) {}",
        root,
        extensions.iter().join(", ")
    );
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| anyhow!("Walking data directory {root:?}: {err}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if has_accepted_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }
    debug!("Matched {} data file(s)", files.len());
    ensure_unique_table_names(root, &files)?;
    Ok(files)
}

fn has_accepted_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|accepted| accepted == ext))
}

fn ensure_unique_table_names(root: &Path, files: &[PathBuf]) -> Result<()> {
    let mut by_table: BTreeMap<String, Vec<&PathBuf>> = BTreeMap::new();
    for file in files {
        if let Some(table) = table_name_for(file) {
            by_table.entry(table).or_default().push(file);
        }
    }
    let duplicates = by_table
        .iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(table, paths)| {
            let names = paths
                .iter()
                .map(|path| path.strip_prefix(root).unwrap_or(path.as_path()).display())
                .join(", ");
            format!("table '{table}' from {names}")
        })
        .collect::<Vec<_>>();
    if duplicates.is_empty() {
        return Ok(());
    }
    Err(anyhow!(
        "Duplicate data file names under {:?}: {}. Rename them so every file maps to its own table",
        root,
        duplicates.join("; ")
    ))
}

/// Derives the table name: the lowercased file name up to its first dot.
pub fn table_name_for(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.split('.').next()?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_lowercase())
}
