pub mod cli;
pub mod config;
pub mod data;
pub mod discover;
pub mod error;
pub mod infer;
pub mod io_utils;
pub mod load;
pub mod observe;
pub mod reconcile;
pub mod resolve;
pub mod schema;
pub mod sink;
pub mod store;
pub mod table;
pub mod types;

use std::{
    env,
    fs::{self, OpenOptions},
    path::Path,
    sync::OnceLock,
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let target = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Creating log directory {parent:?}"))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Opening log file {path:?}"))?;
            Some(env_logger::Target::Pipe(Box::new(file)))
        }
        None => None,
    };
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            let level = if debug {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            };
            builder.filter_module("csv_sqltypes", level);
        }
        if let Some(target) = target {
            builder.target(target).write_style(env_logger::WriteStyle::Never);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.log_file.as_deref())?;
    match cli.command {
        Commands::Load(args) => load::execute(&args),
        Commands::Infer(args) => handle_infer(&args),
        Commands::Show(args) => handle_show(&args),
    }
}

fn handle_infer(args: &cli::InferArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Inferring column types for '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(delimiter)
    );
    let (dataset, observations) =
        observe::read_dataset(&args.input, delimiter, encoding, &args.id_column)
            .with_context(|| format!("Reading {:?}", args.input))?;
    let inferred = infer::infer(&observations)?;
    if args.json {
        let json = serde_json::to_string_pretty(&inferred).context("Serializing inferred schema")?;
        println!("{json}");
    } else {
        let headers = ["#", "column", "raw", "type", "sample"].map(String::from);
        let rows = inferred
            .columns
            .iter()
            .zip(&observations)
            .enumerate()
            .map(|(idx, (column, observed))| {
                vec![
                    (idx + 1).to_string(),
                    column.name.clone(),
                    observed.raw_type.to_string(),
                    column.storage_type.to_string(),
                    column.sample.clone().unwrap_or_else(|| "None".to_string()),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);
    }
    info!(
        "Inferred {} column(s) over {} row(s)",
        inferred.len(),
        dataset.row_count()
    );
    Ok(())
}

fn handle_show(args: &cli::ShowArgs) -> Result<()> {
    let store = store::SchemaStore::new(&args.schema_dir);
    let schema = store.load(&args.table)?.ok_or_else(|| {
        anyhow!(
            "No stored schema for table '{}' at {:?}",
            args.table,
            store.path_for(&args.table)
        )
    })?;
    let headers = ["column", "type"].map(String::from);
    let rows = schema
        .iter()
        .map(|(name, ty)| vec![name.to_string(), ty.to_string()])
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
