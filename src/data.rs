use std::{collections::HashSet, fmt};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

/// Spellings treated as missing when reading a delimited file. Matching is
/// exact after trimming, so `Nan` or `missing` stay as text.
pub const DEFAULT_MISSING_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_number(*f),
            Value::Boolean(b) => b.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            other => serializer.serialize_str(&other.as_display()),
        }
    }
}

/// Set of raw cell spellings that count as a missing value.
#[derive(Debug, Clone)]
pub struct MissingTokens {
    tokens: HashSet<String>,
}

impl MissingTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Blank cells are always missing regardless of the configured tokens.
    pub fn is_missing(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        trimmed.is_empty() || self.tokens.contains(trimmed)
    }
}

impl Default for MissingTokens {
    fn default() -> Self {
        Self::new(DEFAULT_MISSING_TOKENS.iter().copied())
    }
}

pub fn parse_integer(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

pub fn parse_float(value: &str) -> Option<f64> {
    value.trim().parse().ok()
}

pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim() {
        "True" | "TRUE" | "true" => Some(true),
        "False" | "FALSE" | "false" => Some(false),
        _ => None,
    }
}

pub fn parse_naive_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

pub fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return String::from("NaN");
    }
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tokens_match_default_spellings_exactly() {
        let tokens = MissingTokens::default();
        assert!(tokens.is_missing(""));
        assert!(tokens.is_missing("   "));
        assert!(tokens.is_missing("NaN"));
        assert!(tokens.is_missing(" NULL "));
        assert!(tokens.is_missing("<NA>"));
        assert!(!tokens.is_missing("Nan"));
        assert!(!tokens.is_missing("missing"));
        assert!(!tokens.is_missing("0"));
    }

    #[test]
    fn parse_boolean_accepts_only_listed_spellings() {
        assert_eq!(parse_boolean("True"), Some(true));
        assert_eq!(parse_boolean("FALSE"), Some(false));
        assert_eq!(parse_boolean("t"), None);
        assert_eq!(parse_boolean("yes"), None);
    }

    #[test]
    fn parse_naive_date_supports_multiple_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 6, 27).unwrap();
        assert_eq!(parse_naive_date("2025-06-27"), Some(expected));
        assert_eq!(parse_naive_date("27/06/2025"), Some(expected));
        assert_eq!(parse_naive_date("2025/06/27"), Some(expected));
        assert_eq!(parse_naive_date("June 27"), None);
    }

    #[test]
    fn parse_naive_datetime_rejects_plain_dates() {
        assert!(parse_naive_datetime("2025-06-27T08:30:00").is_some());
        assert!(parse_naive_datetime("2025-06-27 08:30").is_some());
        assert!(parse_naive_datetime("2025-06-27").is_none());
    }

    #[test]
    fn format_number_trims_whole_values() {
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(2.5), "2.5000");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn value_serializes_numbers_natively_and_dates_as_text() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
        assert_eq!(serde_json::to_string(&Value::Integer(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&Value::Boolean(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2024-05-06\"");
    }

    #[test]
    fn as_f64_only_converts_numeric_variants() {
        assert_eq!(Value::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::from("3").as_f64(), None);
        assert_eq!(Value::Boolean(true).as_f64(), None);
    }
}
