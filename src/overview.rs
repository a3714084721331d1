use anyhow::Result;
use log::info;
use serde::Serialize;

use crate::{
    classify::ColumnRole, cli::OverviewArgs, dataset::Dataset, io_utils, session::Session, table,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingEntry {
    pub column: String,
    pub missing: usize,
    pub percent: f64,
}

/// Columns with at least one missing value, most-missing first. Equal counts
/// keep column order. Percentages are of the row count, rounded to 2 places.
pub fn missing_report(dataset: &Dataset) -> Vec<MissingEntry> {
    let rows = dataset.row_count();
    let mut entries = dataset
        .columns()
        .iter()
        .filter_map(|column| {
            let missing = column.missing_count();
            (missing > 0).then(|| MissingEntry {
                column: column.name().to_string(),
                missing,
                percent: round2(missing as f64 / rows as f64 * 100.0),
            })
        })
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| b.missing.cmp(&a.missing));
    entries
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: String,
    pub role: ColumnRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub rows: usize,
    pub features: usize,
    pub numerical: usize,
    pub categorical: usize,
    pub dropped: Vec<String>,
    pub missing: Vec<MissingEntry>,
    pub columns: Vec<ColumnSummary>,
    pub preview_headers: Vec<String>,
    pub preview: Vec<Vec<String>>,
}

pub fn build_overview(session: &Session, preview_rows: usize) -> Overview {
    let dataset = session.dataset();
    let classification = session.classification();
    let columns = dataset
        .columns()
        .iter()
        .map(|column| ColumnSummary {
            name: column.name().to_string(),
            kind: column.kind().to_string(),
            role: classification
                .role(column.name())
                .unwrap_or(ColumnRole::Categorical),
        })
        .collect();
    Overview {
        rows: dataset.row_count(),
        features: dataset.column_count(),
        numerical: session.numerical().len(),
        categorical: session.categorical().len(),
        dropped: session.dropped().to_vec(),
        missing: missing_report(dataset),
        columns,
        preview_headers: dataset.column_names(),
        preview: dataset.head(preview_rows),
    }
}

pub fn execute(args: &OverviewArgs) -> Result<()> {
    let (session, config) = Session::open(&args.input)?;
    let overview = build_overview(&session, args.rows.unwrap_or(config.preview_rows));
    info!(
        "Found {} column(s) with partial missing data",
        overview.missing.len()
    );
    if args.input.json {
        return io_utils::print_json(&overview);
    }
    render_overview(&overview);
    Ok(())
}

fn render_overview(overview: &Overview) {
    println!("Missing value summary");
    if overview.missing.is_empty() {
        println!("No partial missing values found in the remaining columns.");
    } else {
        println!(
            "Found {} columns with partial missing data in the processed dataset:",
            overview.missing.len()
        );
        let headers = vec![
            "column".to_string(),
            "missing_count".to_string(),
            "missing_percent".to_string(),
        ];
        let rows = overview
            .missing
            .iter()
            .map(|entry| {
                vec![
                    entry.column.clone(),
                    entry.missing.to_string(),
                    format!("{:.2}", entry.percent),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);
    }
    if !overview.dropped.is_empty() {
        println!(
            "Dropped {} empty column(s): {}",
            overview.dropped.len(),
            overview.dropped.join(", ")
        );
    }

    println!();
    println!("Processed data preview");
    table::print_table(&overview.preview_headers, &overview.preview);

    println!();
    println!("Total rows: {}", table::group_thousands(overview.rows));
    println!("Total features: {}", overview.features);
    println!(
        "Numerical variables: {} | Categorical variables: {}",
        overview.numerical, overview.categorical
    );

    println!();
    let headers = vec!["column".to_string(), "kind".to_string(), "role".to_string()];
    let rows = overview
        .columns
        .iter()
        .map(|column| {
            vec![
                column.name.clone(),
                column.kind.clone(),
                column.role.as_str().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
}
