//! Operator-driven type resolution over a line-oriented terminal.
//!
//! The resolver reads from any [`BufRead`] and writes to any [`Write`], so the
//! binary wires it to stdin/stdout while tests feed it scripted input.

use std::{
    collections::BTreeSet,
    io::{self, BufRead, StdinLock, Stdout, Write},
};

use log::{debug, info};
use thiserror::Error;

use crate::{
    error::ResolveError,
    infer::InferredSchema,
    schema::SqlSchema,
    types::StorageType,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("'{token}' is not a column number between 1 and {max}")]
    OutOfRange { token: String, max: usize },
}

/// Parses a space-separated list of 1-based column numbers.
///
/// Returns `Ok(None)` for an empty submission and zero-based indices
/// otherwise. A single bad token rejects the whole submission.
pub fn parse_selection(
    input: &str,
    column_count: usize,
) -> Result<Option<BTreeSet<usize>>, SelectionError> {
    let mut selected = BTreeSet::new();
    for token in input.split_whitespace() {
        match token.parse::<usize>() {
            Ok(number) if (1..=column_count).contains(&number) => {
                selected.insert(number - 1);
            }
            _ => {
                return Err(SelectionError::OutOfRange {
                    token: token.to_string(),
                    max: column_count,
                });
            }
        }
    }
    Ok(if selected.is_empty() {
        None
    } else {
        Some(selected)
    })
}

/// Parses a single 1-based index into [`StorageType::ALL`].
pub fn parse_type_choice(input: &str) -> Option<StorageType> {
    let number = input.trim().parse::<usize>().ok()?;
    number
        .checked_sub(1)
        .and_then(|idx| StorageType::ALL.get(idx).copied())
}

pub struct Resolver<R, W> {
    input: R,
    output: W,
}

impl Resolver<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Resolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Announces `table` and resolves its candidate schema.
    pub fn resolve_table(
        &mut self,
        table: &str,
        candidate: InferredSchema,
    ) -> Result<SqlSchema, ResolveError> {
        writeln!(self.output, "\n\n** Processing Data for Table: \"{table}\"")?;
        self.resolve(candidate)
    }

    /// Runs the selection loop until the operator submits an empty line.
    pub fn resolve(&mut self, mut candidate: InferredSchema) -> Result<SqlSchema, ResolveError> {
        let count = candidate.len();
        loop {
            self.render(&candidate)?;
            let line = self.prompt(&format!(
                "Input 1 to {count} separated by spaces or \"Enter\" for no changes: "
            ))?;
            match parse_selection(&line, count) {
                Ok(None) => {
                    writeln!(
                        self.output,
                        "No further updates. Proceeding with the final type schema."
                    )?;
                    break;
                }
                Ok(Some(selected)) => {
                    let chosen = self.select_type()?;
                    for idx in &selected {
                        candidate.set_storage_type(*idx, chosen);
                    }
                    let names: Vec<&str> = selected
                        .iter()
                        .filter_map(|idx| candidate.columns.get(*idx))
                        .map(|c| c.name.as_str())
                        .collect();
                    info!("Set {names:?} to {chosen}");
                }
                Err(err) => {
                    debug!("Rejected selection {line:?}: {err}");
                    writeln!(self.output, "Invalid selection ({err}). Please try again.")?;
                }
            }
        }
        Ok(candidate.to_sql_schema())
    }

    fn render(&mut self, candidate: &InferredSchema) -> io::Result<()> {
        writeln!(self.output, "\nCurrent column types:\n")?;
        for (idx, column) in candidate.columns.iter().enumerate() {
            writeln!(
                self.output,
                "{}. Column: \"{}\" | Type: \"{}\" | Typical Value: \"{}\"",
                idx + 1,
                column.name,
                column.storage_type,
                column.sample.as_deref().unwrap_or("None")
            )?;
        }
        writeln!(
            self.output,
            "\nSelect column numbers, separated by spaces, to update with a single type."
        )
    }

    fn select_type(&mut self) -> Result<StorageType, ResolveError> {
        writeln!(self.output, "\nStorage types:")?;
        for (idx, ty) in StorageType::ALL.iter().enumerate() {
            writeln!(self.output, "{}. {}", idx + 1, ty)?;
        }
        let prompt = format!("Input 1 to {}: ", StorageType::ALL.len());
        loop {
            let line = self.prompt(&prompt)?;
            if let Some(chosen) = parse_type_choice(&line) {
                return Ok(chosen);
            }
            debug!("Rejected type choice {line:?}");
            writeln!(self.output, "Invalid selection. Please try again.")?;
        }
    }

    fn prompt(&mut self, message: &str) -> Result<String, ResolveError> {
        write!(self.output, "{message}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ResolveError::InputClosed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
