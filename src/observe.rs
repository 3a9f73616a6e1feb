//! Decoding of a CSV file into rows and per-column observations.
//!
//! The identifier column is treated as the row index: it is kept on the
//! [`Dataset`] for the primary key but excluded from the observed columns.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use log::debug;

use crate::{
    data::{is_boolean_literal, is_null_token, parse_timestamp},
    infer::ColumnObservation,
    io_utils,
    types::RawType,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub id_column: String,
    pub ids: Vec<String>,
    pub columns: Vec<String>,
    /// Values for `columns`, one vector per row.
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone)]
struct RawTypeCandidate {
    present: usize,
    missing: usize,
    possible_boolean: bool,
    possible_integer: bool,
    possible_float: bool,
    possible_datetime: bool,
}

impl RawTypeCandidate {
    fn new() -> Self {
        Self {
            present: 0,
            missing: 0,
            possible_boolean: true,
            possible_integer: true,
            possible_float: true,
            possible_datetime: true,
        }
    }

    fn update(&mut self, value: &str) {
        if is_null_token(value) {
            self.missing += 1;
            return;
        }
        let trimmed = value.trim();
        self.present += 1;
        if self.possible_boolean && !is_boolean_literal(trimmed) {
            self.possible_boolean = false;
        }
        if self.possible_integer && trimmed.parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_float && trimmed.parse::<f64>().is_err() {
            self.possible_float = false;
        }
        if self.possible_datetime && parse_timestamp(trimmed).is_err() {
            self.possible_datetime = false;
        }
    }

    fn decide(&self) -> RawType {
        if self.present == 0 {
            RawType::Object
        } else if self.possible_boolean {
            RawType::Boolean
        } else if self.possible_integer && self.missing == 0 {
            RawType::Integer
        } else if self.possible_float {
            RawType::Float
        } else if self.possible_datetime {
            RawType::DateTime
        } else {
            RawType::Object
        }
    }
}

/// Reads the whole file at `path`, returning its rows and one observation per non-id column.
pub fn read_dataset(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    id_column: &str,
) -> Result<(Dataset, Vec<ColumnObservation>)> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;
    let id_index = headers
        .iter()
        .position(|h| h == id_column)
        .ok_or_else(|| anyhow!("{path:?} has no identifier column '{id_column}'"))?;
    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != id_index)
        .map(|(_, h)| h.clone())
        .collect();

    let mut candidates = vec![RawTypeCandidate::new(); columns.len()];
    let mut samples: Vec<Option<String>> = vec![None; columns.len()];
    let mut ids = Vec::new();
    let mut rows = Vec::new();

    for (row_idx, record) in reader.byte_records().enumerate() {
        let record =
            record.with_context(|| format!("Reading row {} in {:?}", row_idx + 2, path))?;
        let mut decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {} in {:?}", row_idx + 2, path))?;
        ids.push(decoded.remove(id_index));
        for (idx, value) in decoded.iter().enumerate() {
            candidates[idx].update(value);
            if samples[idx].is_none() && !is_null_token(value) {
                samples[idx] = Some(value.trim().to_string());
            }
        }
        rows.push(decoded);
    }
    debug!(
        "Read {} row(s) with {} typed column(s) from {:?}",
        rows.len(),
        columns.len(),
        path
    );

    let observations = columns
        .iter()
        .zip(candidates.iter().zip(samples))
        .map(|(name, (candidate, sample))| ColumnObservation {
            name: name.clone(),
            raw_type: candidate.decide(),
            sample,
        })
        .collect();

    let dataset = Dataset {
        id_column: id_column.to_string(),
        ids,
        columns,
        rows,
    };
    Ok((dataset, observations))
}
