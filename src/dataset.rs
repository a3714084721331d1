//! In-memory tabular dataset with per-column type inference.
//!
//! A [`Dataset`] is an ordered list of named [`Column`]s of equal length. Each
//! cell is an `Option<Value>` where `None` marks a missing value. Columns built
//! from raw text go through a two-pass inference: every non-missing cell is
//! observed to decide a [`ColumnKind`], then the cells are parsed as that kind.
//! A column whose cells disagree (numbers mixed with words) is kept as text,
//! so a single stray token never turns a numeric column into partial data.

use std::{collections::HashSet, fmt, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::{
    data::{
        MissingTokens, Value, parse_boolean, parse_float, parse_integer, parse_naive_date,
        parse_naive_datetime,
    },
    io_utils,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("Column '{0}' appears more than once")]
    DuplicateColumn(String),
    #[error("Column '{column}' has {found} value(s) but the dataset has {expected} row(s)")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("Row {row} has {found} field(s) but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Empty,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Text,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnKind::Empty => "empty",
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Date => "date",
            ColumnKind::DateTime => "datetime",
            ColumnKind::Text => "text",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
struct KindCandidate {
    non_missing: usize,
    integer_matches: usize,
    float_matches: usize,
    boolean_matches: usize,
    date_matches: usize,
    datetime_matches: usize,
}

impl KindCandidate {
    fn observe(&mut self, raw: &str) {
        self.non_missing += 1;
        if parse_integer(raw).is_some() {
            self.integer_matches += 1;
            self.float_matches += 1;
            return;
        }
        if parse_float(raw).is_some() {
            self.float_matches += 1;
            return;
        }
        if parse_boolean(raw).is_some() {
            self.boolean_matches += 1;
        } else if parse_naive_datetime(raw).is_some() {
            self.datetime_matches += 1;
        } else if parse_naive_date(raw).is_some() {
            self.date_matches += 1;
        }
    }

    fn decide(&self) -> ColumnKind {
        let all = self.non_missing;
        if all == 0 {
            ColumnKind::Empty
        } else if self.integer_matches == all {
            ColumnKind::Integer
        } else if self.float_matches == all {
            ColumnKind::Float
        } else if self.boolean_matches == all {
            ColumnKind::Boolean
        } else if self.datetime_matches == all {
            ColumnKind::DateTime
        } else if self.date_matches == all {
            ColumnKind::Date
        } else {
            ColumnKind::Text
        }
    }
}

fn parse_as(raw: &str, kind: ColumnKind) -> Option<Value> {
    let parsed = match kind {
        ColumnKind::Empty => None,
        ColumnKind::Integer => parse_integer(raw).map(Value::Integer),
        ColumnKind::Float => parse_float(raw).map(Value::Float),
        ColumnKind::Boolean => parse_boolean(raw).map(Value::Boolean),
        ColumnKind::Date => parse_naive_date(raw).map(Value::Date),
        ColumnKind::DateTime => parse_naive_datetime(raw).map(Value::DateTime),
        ColumnKind::Text => None,
    };
    parsed.or_else(|| Some(Value::Text(raw.to_string())))
}

fn kind_of_values(values: &[Option<Value>]) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for value in values.iter().flatten() {
        let observed = match value {
            Value::Integer(_) => ColumnKind::Integer,
            Value::Float(_) => ColumnKind::Float,
            Value::Boolean(_) => ColumnKind::Boolean,
            Value::Date(_) => ColumnKind::Date,
            Value::DateTime(_) => ColumnKind::DateTime,
            Value::Text(_) => ColumnKind::Text,
        };
        kind = Some(match (kind, observed) {
            (None, next) => next,
            (Some(current), next) if current == next => current,
            (Some(ColumnKind::Integer), ColumnKind::Float)
            | (Some(ColumnKind::Float), ColumnKind::Integer) => ColumnKind::Float,
            _ => return ColumnKind::Text,
        });
    }
    kind.unwrap_or(ColumnKind::Empty)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    values: Vec<Option<Value>>,
}

impl Column {
    /// Builds a column from already typed cells; the kind follows the variants present.
    pub fn new(name: impl Into<String>, values: Vec<Option<Value>>) -> Self {
        let kind = kind_of_values(&values);
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    /// Builds a column from raw text cells, inferring the kind first.
    pub fn from_raw(name: impl Into<String>, raw: Vec<Option<String>>) -> Self {
        let mut candidate = KindCandidate::default();
        for cell in raw.iter().flatten() {
            candidate.observe(cell);
        }
        let kind = candidate.decide();
        let values = raw
            .into_iter()
            .map(|cell| cell.and_then(|text| parse_as(&text, kind)))
            .collect();
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_none()).count()
    }

    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Cells as floats; text and other non-numeric cells read as missing.
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.values
            .iter()
            .map(|value| value.as_ref().and_then(Value::as_f64))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(DatasetError::DuplicateColumn(column.name().to_string()));
            }
            if column.len() != row_count {
                return Err(DatasetError::LengthMismatch {
                    column: column.name().to_string(),
                    expected: row_count,
                    found: column.len(),
                });
            }
        }
        Ok(Self { columns, row_count })
    }

    /// Builds a dataset from raw rows. `rows` are data rows only (no header);
    /// `None` cells are missing.
    pub fn from_raw_rows(
        headers: &[String],
        rows: Vec<Vec<Option<String>>>,
    ) -> Result<Self, DatasetError> {
        let width = headers.len();
        let row_count = rows.len();
        let mut cells: Vec<Vec<Option<String>>> =
            (0..width).map(|_| Vec::with_capacity(row_count)).collect();
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(DatasetError::RaggedRow {
                    row: row_idx + 1,
                    expected: width,
                    found: row.len(),
                });
            }
            for (column, cell) in cells.iter_mut().zip(row) {
                column.push(cell);
            }
        }
        let columns = dedupe_headers(headers)
            .into_iter()
            .zip(cells)
            .map(|(name, raw)| Column::from_raw(name, raw))
            .collect();
        let mut dataset = Self::new(columns)?;
        dataset.row_count = row_count;
        Ok(dataset)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name() == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| column.name().to_string())
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Keeps the columns accepted by `keep`; the row count is unchanged even
    /// when every column is removed.
    pub fn retain_columns<F>(mut self, mut keep: F) -> Self
    where
        F: FnMut(&Column) -> bool,
    {
        self.columns.retain(|column| keep(column));
        self
    }

    /// Display strings for the first `limit` rows; missing cells render empty.
    pub fn head(&self, limit: usize) -> Vec<Vec<String>> {
        (0..self.row_count.min(limit))
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| {
                        column.values()[row]
                            .as_ref()
                            .map(Value::as_display)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }
}

/// Renames repeated headers with numeric suffixes: `name`, `name.1`, `name.2`.
pub fn dedupe_headers(headers: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(headers.len());
    for header in headers {
        let mut candidate = header.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{header}.{suffix}");
            suffix += 1;
        }
        seen.insert(candidate.clone());
        names.push(candidate);
    }
    names
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

/// Reads a whole delimited file into memory. Rows must all have the header's width.
///
/// Cells are stored as written. Numbers, booleans, and dates parse with
/// surrounding whitespace ignored; text columns keep it.
pub fn read_dataset(path: &Path, options: &LoadOptions, missing: &MissingTokens) -> Result<Dataset> {
    let mut reader = io_utils::open_csv_reader_from_path(path, options.delimiter, true)?;
    let headers = io_utils::reader_headers(&mut reader, options.encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;
    let mut rows = Vec::new();
    let mut record = csv::ByteRecord::new();
    let mut row_idx = 0usize;
    while reader
        .read_byte_record(&mut record)
        .with_context(|| format!("Reading row {}", row_idx + 2))?
    {
        let decoded = io_utils::decode_record(&record, options.encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        rows.push(
            decoded
                .into_iter()
                .map(|cell| (!missing.is_missing(&cell)).then_some(cell))
                .collect(),
        );
        row_idx += 1;
    }
    debug!(
        "Read {} row(s) across {} column(s) from {:?}",
        rows.len(),
        headers.len(),
        path
    );
    let dataset = Dataset::from_raw_rows(&headers, rows)
        .with_context(|| format!("Building dataset from {path:?}"))?;
    Ok(dataset)
}
