use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, builder::FalseyValueParser};

#[derive(Debug, Parser)]
#[command(author, version, about = "Infer and reconcile SQL column types for CSV data files", long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG; DEBUG=0 disables)
    #[arg(
        long,
        global = true,
        env = "DEBUG",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub debug: bool,
    /// Append log records to this file instead of stderr
    #[arg(long = "log-file", global = true, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Type every data file under a directory and write it as a table
    Load(LoadArgs),
    /// Show the default storage types inferred for a single CSV file
    Infer(InferArgs),
    /// Show the stored column types for a table
    Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Root directory searched recursively for data files
    #[arg(short = 'd', long = "data-dir", env = "DATA_FILES")]
    pub data_dir: PathBuf,
    /// Accepted file extensions: comma list or JSON array (leading '.' optional)
    #[arg(short = 'e', long = "ext", env = "DATAFILE_EXTS", default_value = "csv")]
    pub extensions: Vec<String>,
    /// Directory holding `<table>_sqltype.json` files
    #[arg(short = 's', long = "schema-dir", env = "TYPE_JSON_PATH", default_value = "schemas")]
    pub schema_dir: PathBuf,
    /// Directory receiving the typed table output
    #[arg(short = 'o', long = "output-dir", env = "OUTPUT_DIR", default_value = "tables")]
    pub output_dir: PathBuf,
    /// Identifier column used as each table's primary key
    #[arg(long = "id-column", env = "ID_COLUMN", default_value = "Id")]
    pub id_column: String,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct InferArgs {
    /// Input CSV file to inspect ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Identifier column excluded from typing
    #[arg(long = "id-column", env = "ID_COLUMN", default_value = "Id")]
    pub id_column: String,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Table name (lowercased file name without extension)
    #[arg(short = 't', long = "table")]
    pub table: String,
    /// Directory holding `<table>_sqltype.json` files
    #[arg(short = 's', long = "schema-dir", env = "TYPE_JSON_PATH", default_value = "schemas")]
    pub schema_dir: PathBuf,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_delimiter_accepts_names() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("pipe"), Ok(b'|'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
    }
}
