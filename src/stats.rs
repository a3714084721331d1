use anyhow::Result;
use log::{info, warn};
use serde::Serialize;

use crate::{
    chart::{self, RangeParams, RangeRequest, RangeSelection},
    cli::NumericArgs,
    data::format_number,
    io_utils,
    session::Session,
    table,
};

const WHISKER_IQR_FACTOR: f64 = 1.5;

/// Count, mean, sample standard deviation, and quartiles of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub iqr: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: usize,
}

fn sorted_present(values: &[Option<f64>]) -> Vec<f64> {
    let mut present: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| !v.is_nan())
        .collect();
    present.sort_by(f64::total_cmp);
    present
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

pub fn describe(values: &[Option<f64>]) -> Describe {
    let sorted = sorted_present(values);
    let count = sorted.len();
    if count == 0 {
        return Describe {
            count,
            mean: None,
            std: None,
            min: None,
            q25: None,
            median: None,
            q75: None,
            max: None,
        };
    }
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let squares = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        (squares / (count as f64 - 1.0)).sqrt()
    });
    Describe {
        count,
        mean: Some(mean),
        std,
        min: sorted.first().copied(),
        q25: Some(quantile(&sorted, 0.25)),
        median: Some(quantile(&sorted, 0.5)),
        q75: Some(quantile(&sorted, 0.75)),
        max: sorted.last().copied(),
    }
}

/// Box-plot summary with whiskers at the furthest points within 1.5 IQR.
pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    let sorted = sorted_present(&wrapped);
    let (&min, &max) = (sorted.first()?, sorted.last()?);
    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let low_fence = q1 - WHISKER_IQR_FACTOR * iqr;
    let high_fence = q3 + WHISKER_IQR_FACTOR * iqr;
    let inside = sorted
        .iter()
        .copied()
        .filter(|v| *v >= low_fence && *v <= high_fence);
    let lower_whisker = inside.clone().next().unwrap_or(q1);
    let upper_whisker = inside.last().unwrap_or(q3);
    let outliers = sorted
        .iter()
        .filter(|v| **v < low_fence || **v > high_fence)
        .count();
    Some(BoxSummary {
        count: sorted.len(),
        min,
        q1,
        median: quantile(&sorted, 0.5),
        q3,
        max,
        iqr,
        lower_whisker,
        upper_whisker,
        outliers,
    })
}

#[derive(Debug, Serialize)]
struct DescribeRow<'a> {
    column: &'a str,
    #[serde(flatten)]
    stats: Describe,
}

#[derive(Debug, Serialize)]
struct Distribution<'a> {
    column: &'a str,
    range: RangeParams,
    selection: RangeSelection,
    in_range: usize,
    summary: Option<BoxSummary>,
}

#[derive(Debug, Serialize)]
struct NumericReport<'a> {
    summary: Vec<DescribeRow<'a>>,
    distributions: Vec<Distribution<'a>>,
    truncated: bool,
}

pub fn execute(args: &NumericArgs) -> Result<()> {
    let (session, config) = Session::open(&args.input)?;
    let requests = args
        .ranges
        .iter()
        .map(|raw| RangeRequest::parse(raw))
        .collect::<Result<Vec<_>>>()?;

    let summary = session
        .numerical()
        .iter()
        .filter_map(|name| session.dataset().column(name))
        .map(|column| DescribeRow {
            column: column.name(),
            stats: describe(&column.numeric_values()),
        })
        .collect::<Vec<_>>();

    let mut selected = session.select_numerical(&args.columns, config.numeric_default_columns)?;
    let truncated = selected.len() > config.numeric_max_columns;
    if truncated {
        warn!(
            "{} variables selected; displaying the first {}",
            selected.len(),
            config.numeric_max_columns
        );
        selected.truncate(config.numeric_max_columns);
    }

    let mut distributions = Vec::with_capacity(selected.len());
    for name in &selected {
        let column = session.numeric_column(name)?;
        let values = column.numeric_values();
        let range = chart::range_params_with_cap(&values, config.range_cap);
        let selection = match requests.iter().rev().find(|r| r.column == column.name()) {
            Some(request) => range.select(request.low, request.high),
            None => range.full_selection(),
        };
        let filtered = chart::filter_range(&values, &selection);
        distributions.push(Distribution {
            column: column.name(),
            range,
            selection,
            in_range: filtered.len(),
            summary: box_summary(&filtered),
        });
    }
    info!(
        "Summarised {} numerical column(s), {} distribution(s)",
        summary.len(),
        distributions.len()
    );

    let report = NumericReport {
        summary,
        distributions,
        truncated,
    };
    if args.input.json {
        return io_utils::print_json(&report);
    }
    render_report(&report, config.numeric_max_columns);
    Ok(())
}

fn metric(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

fn render_report(report: &NumericReport<'_>, max_columns: usize) {
    println!("Summary statistics of numerical variables");
    let headers = ["column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"]
        .map(String::from)
        .to_vec();
    let rows = report
        .summary
        .iter()
        .map(|row| {
            vec![
                row.column.to_string(),
                row.stats.count.to_string(),
                metric(row.stats.mean),
                metric(row.stats.std),
                metric(row.stats.min),
                metric(row.stats.q25),
                metric(row.stats.median),
                metric(row.stats.q75),
                metric(row.stats.max),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);

    if report.distributions.is_empty() {
        println!();
        println!("Select at least one numerical variable to display distributions.");
        return;
    }
    if report.truncated {
        println!();
        println!("Displaying the first {max_columns} selected variables.");
    }
    println!();
    println!("Distributions of selected numerical variables");
    let headers = [
        "column",
        "range_min",
        "range_max",
        "step",
        "low",
        "high",
        "in_range",
        "whisker_low",
        "q1",
        "median",
        "q3",
        "whisker_high",
        "outliers",
    ]
    .map(String::from)
    .to_vec();
    let mut empty = Vec::new();
    let rows = report
        .distributions
        .iter()
        .map(|dist| {
            let mut row = vec![
                dist.column.to_string(),
                format_number(dist.range.min),
                format_number(dist.range.max),
                format_number(dist.range.step),
                format_number(dist.selection.low),
                format_number(dist.selection.high),
                dist.in_range.to_string(),
            ];
            match &dist.summary {
                Some(summary) => row.extend([
                    format_number(summary.lower_whisker),
                    format_number(summary.q1),
                    format_number(summary.median),
                    format_number(summary.q3),
                    format_number(summary.upper_whisker),
                    summary.outliers.to_string(),
                ]),
                None => empty.push(dist.column),
            }
            row
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    for column in empty {
        println!("No data points fall within the selected range for '{column}'.");
    }
}
