pub mod chart;
pub mod classify;
pub mod cli;
pub mod config;
pub mod correlation;
pub mod data;
pub mod dataset;
pub mod frequency;
pub mod io_utils;
pub mod overview;
pub mod session;
pub mod stats;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, info};
use serde::Serialize;

use crate::{
    classify::ColumnRole,
    cli::{Cli, Commands},
    dataset::ColumnKind,
    session::Session,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("listings_explorer", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Overview(args) => overview::execute(&args),
        Commands::Classify(args) => handle_classify(&args),
        Commands::Numeric(args) => stats::execute(&args),
        Commands::Categorical(args) => frequency::execute(&args),
        Commands::Correlation(args) => correlation::execute(&args),
    }
}

#[derive(Debug, Serialize)]
struct ClassifiedColumn<'a> {
    name: &'a str,
    kind: ColumnKind,
    role: ColumnRole,
}

#[derive(Debug, Serialize)]
struct ClassifyReport<'a> {
    numerical: &'a [String],
    categorical: &'a [String],
    identifiers: &'a [String],
    dropped: &'a [String],
    columns: Vec<ClassifiedColumn<'a>>,
}

fn handle_classify(args: &cli::ClassifyArgs) -> Result<()> {
    let (session, _config) = Session::open(&args.input)?;
    let classification = session.classification();
    info!(
        "{} numerical and {} categorical column(s) in {:?}",
        classification.numerical().len(),
        classification.categorical().len(),
        args.input.input
    );
    let groups = [
        (ColumnRole::Numerical, classification.numerical()),
        (ColumnRole::Categorical, classification.categorical()),
        (ColumnRole::Identifier, classification.identifiers()),
        (ColumnRole::Dropped, classification.dropped()),
    ];
    // Dropped columns are gone from the cleaned dataset; they were all missing.
    let dataset = session.dataset();
    let columns = groups
        .iter()
        .flat_map(|(role, names)| {
            names.iter().map(move |name| ClassifiedColumn {
                name,
                kind: dataset
                    .column(name)
                    .map_or(ColumnKind::Empty, |column| column.kind()),
                role: *role,
            })
        })
        .collect::<Vec<_>>();
    if args.input.json {
        return io_utils::print_json(&ClassifyReport {
            numerical: classification.numerical(),
            categorical: classification.categorical(),
            identifiers: classification.identifiers(),
            dropped: classification.dropped(),
            columns,
        });
    }
    let rows = columns
        .iter()
        .map(|column| {
            vec![
                column.name.to_string(),
                column.kind.to_string(),
                column.role.as_str().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    let headers = vec!["column".to_string(), "kind".to_string(), "role".to_string()];
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
