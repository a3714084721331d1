use anyhow::Result;
use log::info;
use serde::Serialize;

use crate::{
    chart,
    cli::CorrelationArgs,
    io_utils,
    session::{SelectionError, Session},
    table,
};

pub const MIN_FEATURES: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub features: Vec<String>,
    /// Row-major coefficients; `None` where fewer than two complete pairs
    /// exist or either side has no variance.
    pub values: Vec<Vec<Option<f64>>>,
    pub display_size: f64,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let row = self.features.iter().position(|name| name == row)?;
        let column = self.features.iter().position(|name| name == column)?;
        self.values[row][column]
    }
}

/// Pearson correlation over rows where both sides are present.
pub fn pearson(left: &[Option<f64>], right: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = left
        .iter()
        .zip(right)
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if !a.is_nan() && !b.is_nan() => Some((*a, *b)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let (da, db) = (a - mean_a, b - mean_b);
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some((cov / (var_a * var_b).sqrt()).clamp(-1.0, 1.0))
}

/// Builds the matrix for `features`, which must be numerical columns of `session`.
pub fn correlation_matrix(
    session: &Session,
    features: &[String],
) -> Result<CorrelationMatrix, SelectionError> {
    if features.len() < MIN_FEATURES {
        return Err(SelectionError::TooFewFeatures {
            required: MIN_FEATURES,
            found: features.len(),
        });
    }
    let series = features
        .iter()
        .map(|name| {
            session
                .numeric_column(name)
                .map(|column| column.numeric_values())
        })
        .collect::<Result<Vec<_>, _>>()?;
    let values = series
        .iter()
        .map(|row| series.iter().map(|column| pearson(row, column)).collect())
        .collect();
    Ok(CorrelationMatrix {
        features: features.to_vec(),
        values,
        display_size: chart::matrix_display_size(features.len()),
    })
}

pub fn execute(args: &CorrelationArgs) -> Result<()> {
    let (session, config) = Session::open(&args.input)?;
    let features = session.select_numerical(&args.columns, config.correlation_default_columns)?;
    let matrix = correlation_matrix(&session, &features)?;
    info!(
        "Computed correlation matrix for {} feature(s)",
        matrix.features.len()
    );

    if args.input.json {
        return io_utils::print_json(&matrix);
    }

    println!(
        "Correlation matrix for {} selected features",
        matrix.features.len()
    );
    let mut headers = vec![String::new()];
    headers.extend(matrix.features.iter().cloned());
    let rows = matrix
        .features
        .iter()
        .zip(&matrix.values)
        .map(|(name, row)| {
            let mut cells = vec![name.clone()];
            cells.extend(
                row.iter()
                    .map(|value| value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "NaN".into())),
            );
            cells
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    println!("Heatmap size: {0:.1} x {0:.1}", matrix.display_size);
    println!(
        "Correlation values range from -1 (perfect negative correlation) to +1 (perfect positive correlation)."
    );
    Ok(())
}
