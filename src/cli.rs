use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Explore short-term-rental listings: missing values, distributions, categories, correlations",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarise missing values, preview rows, and count column roles
    Overview(OverviewArgs),
    /// List every column with its inferred kind and role
    Classify(ClassifyArgs),
    /// Describe numerical columns and their range-filtered distributions
    Numeric(NumericArgs),
    /// Show the most frequent values of a categorical column
    Categorical(CategoricalArgs),
    /// Compute a correlation matrix for numerical columns
    Correlation(CorrelationArgs),
}

/// Options shared by every command for locating and reading the dataset.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Listings file to analyse (.csv, .tsv, optionally .gz compressed; '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file overriding missing-value tokens, identifier rules, and display limits
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Emit the report as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct OverviewArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Number of rows to preview
    #[arg(long)]
    pub rows: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct NumericArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Numerical columns to plot (defaults to the first few)
    #[arg(short = 'C', long = "columns", action = clap::ArgAction::Append)]
    pub columns: Vec<String>,
    /// Range selection of the form `column=low:high`; clamped to the column's bounds
    #[arg(long = "range", action = clap::ArgAction::Append)]
    pub ranges: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CategoricalArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Categorical column to count (defaults to the first one)
    #[arg(short = 'c', long = "column")]
    pub column: Option<String>,
    /// Maximum categories to display
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(Debug, Args)]
pub struct CorrelationArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Numerical features for the matrix (defaults to the first eight)
    #[arg(short = 'C', long = "columns", action = clap::ArgAction::Append)]
    pub columns: Vec<String>,
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
    fn parse_delimiter_accepts_names_and_single_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn numeric_args_collect_repeated_columns_and_ranges() {
        let cli = Cli::try_parse_from([
            "listings-explorer",
            "numeric",
            "-i",
            "listings.csv",
            "-C",
            "price,beds",
            "-C",
            "accommodates",
            "--range",
            "price=0:500",
        ])
        .expect("parse");
        match cli.command {
            Commands::Numeric(args) => {
                assert_eq!(args.columns, vec!["price,beds", "accommodates"]);
                assert_eq!(args.ranges, vec!["price=0:500"]);
                assert!(!args.input.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
