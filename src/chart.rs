//! Parameters for range filters and heatmap sizing.
//!
//! These are pure functions of the current column and selection. Callers
//! recompute them whenever the selection changes; nothing is cached.

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

/// Upper bound offered by a range filter, whatever the column's true maximum.
pub const DEFAULT_RANGE_CAP: f64 = 10_000.0;

const MIN_MATRIX_SIZE: f64 = 8.0;
const MATRIX_SIZE_PER_FEATURE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeParams {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl RangeParams {
    /// The initial selection spans the full bounds.
    pub fn full_selection(&self) -> RangeSelection {
        RangeSelection {
            low: self.min,
            high: self.max,
        }
    }

    /// Clamps a requested `(low, high)` into the bounds, swapping reversed ends.
    pub fn select(&self, low: f64, high: f64) -> RangeSelection {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        RangeSelection {
            low: low.clamp(self.min, self.max),
            high: high.clamp(self.min, self.max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeSelection {
    pub low: f64,
    pub high: f64,
}

impl RangeSelection {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// A requested selection for one column, written `column=low:high`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeRequest {
    pub column: String,
    pub low: f64,
    pub high: f64,
}

impl RangeRequest {
    pub fn parse(spec: &str) -> Result<Self> {
        let (column, bounds) = spec
            .split_once('=')
            .ok_or_else(|| anyhow!("Range '{spec}' must look like column=low:high"))?;
        let column = column.trim();
        if column.is_empty() {
            return Err(anyhow!("Range '{spec}' is missing a column name"));
        }
        let (low, high) = bounds
            .split_once(':')
            .ok_or_else(|| anyhow!("Range '{spec}' must separate bounds with ':'"))?;
        let parse_bound = |raw: &str| -> Result<f64> {
            let value: f64 = raw
                .trim()
                .parse()
                .with_context(|| format!("Parsing range bound '{raw}' in '{spec}'"))?;
            if value.is_nan() {
                return Err(anyhow!("Range bound in '{spec}' cannot be NaN"));
            }
            Ok(value)
        };
        Ok(Self {
            column: column.to_string(),
            low: parse_bound(low)?,
            high: parse_bound(high)?,
        })
    }
}

pub fn range_params(values: &[Option<f64>]) -> RangeParams {
    range_params_with_cap(values, DEFAULT_RANGE_CAP)
}

/// Bounds and step for a two-handle range filter over `values`.
///
/// Missing and NaN entries are ignored. An empty column yields `0..cap`. The
/// upper bound is at least `min + 1` before the cap applies, and the cap never
/// pulls it below `min`.
pub fn range_params_with_cap(values: &[Option<f64>], cap: f64) -> RangeParams {
    let mut observed = values.iter().flatten().copied().filter(|v| !v.is_nan());
    let (min, max) = match observed.next() {
        Some(first) => {
            let (lo, hi) = observed.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
            let basis = hi.max(lo + 1.0);
            let max = if basis > cap { cap.max(lo) } else { basis };
            (lo, max)
        }
        None => (0.0, cap.max(0.0)),
    };
    let step = if max > min {
        ((max - min) / 100.0).max(1.0)
    } else {
        1.0
    };
    RangeParams { min, max, step }
}

/// Values inside the inclusive selection, in their original order.
pub fn filter_range(values: &[Option<f64>], selection: &RangeSelection) -> Vec<f64> {
    values
        .iter()
        .flatten()
        .copied()
        .filter(|value| selection.contains(*value))
        .collect()
}

/// Edge length of a square correlation heatmap for `feature_count` features.
pub fn matrix_display_size(feature_count: usize) -> f64 {
    (feature_count as f64 * MATRIX_SIZE_PER_FEATURE).max(MIN_MATRIX_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn range_params_caps_large_maxima() {
        let params = range_params(&some(&[0.0, 5000.0, 20000.0]));
        assert_eq!(
            params,
            RangeParams {
                min: 0.0,
                max: 10_000.0,
                step: 100.0
            }
        );
    }

    #[test]
    fn range_params_widens_single_value() {
        let params = range_params(&[Some(42.0), None, Some(42.0)]);
        assert_eq!(params.min, 42.0);
        assert_eq!(params.max, 43.0);
        assert_eq!(params.step, 1.0);
    }

    #[test]
    fn range_params_defaults_for_all_missing() {
        let params = range_params(&[None, None]);
        assert_eq!(params.min, 0.0);
        assert_eq!(params.max, 10_000.0);
        assert_eq!(params.step, 100.0);
        assert_eq!(range_params(&[]), params);
    }

    #[test]
    fn range_params_small_spans_keep_unit_step() {
        let params = range_params(&some(&[1.0, 2.5, 3.0]));
        assert_eq!(params.max, 3.0);
        assert_eq!(params.step, 1.0);
    }

    #[test]
    fn range_params_never_caps_below_min() {
        let params = range_params(&some(&[25_000.0, 40_000.0]));
        assert_eq!(params.min, 25_000.0);
        assert_eq!(params.max, 25_000.0);
        assert_eq!(params.step, 1.0);
    }

    #[test]
    fn range_params_ignores_nan() {
        let params = range_params(&[Some(f64::NAN), Some(10.0), Some(310.0)]);
        assert_eq!(params.min, 10.0);
        assert_eq!(params.max, 310.0);
        assert_eq!(params.step, 3.0);
    }

    #[test]
    fn select_clamps_and_orders_bounds() {
        let params = range_params(&some(&[0.0, 100.0]));
        assert_eq!(
            params.select(150.0, -5.0),
            RangeSelection {
                low: 0.0,
                high: 100.0
            }
        );
        assert_eq!(params.full_selection(), params.select(0.0, 100.0));
    }

    #[test]
    fn filter_range_is_inclusive_and_skips_missing() {
        let values = [Some(1.0), None, Some(5.0), Some(10.0), Some(11.0)];
        let selection = RangeSelection {
            low: 5.0,
            high: 10.0,
        };
        assert_eq!(filter_range(&values, &selection), vec![5.0, 10.0]);
    }

    #[test]
    fn range_request_parses_column_and_bounds() {
        let request = RangeRequest::parse("price = 50:500.5").expect("parse");
        assert_eq!(request.column, "price");
        assert_eq!(request.low, 50.0);
        assert_eq!(request.high, 500.5);
        assert!(RangeRequest::parse("price").is_err());
        assert!(RangeRequest::parse("=1:2").is_err());
        assert!(RangeRequest::parse("price=1-2").is_err());
        assert!(RangeRequest::parse("price=a:2").is_err());
    }

    #[test]
    fn matrix_display_size_has_floor_of_eight() {
        assert_eq!(matrix_display_size(0), 8.0);
        assert_eq!(matrix_display_size(2), 8.0);
        assert_eq!(matrix_display_size(10), 8.0);
        assert_eq!(matrix_display_size(20), 16.0);
    }
}
