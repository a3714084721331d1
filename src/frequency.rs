use std::collections::HashMap;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use serde::Serialize;

use crate::{cli::CategoricalArgs, data::Value, io_utils, session::Session, table};

pub const DEFAULT_TOP_CATEGORIES: usize = 8;
pub const MISSING_LABEL: &str = "Missing (NaN)";

/// A frequency bucket: a cell value, or the bucket of missing cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Category {
    Value(Value),
    Missing,
}

impl Category {
    pub fn label(&self) -> String {
        match self {
            Category::Value(value) => value.as_display(),
            Category::Missing => MISSING_LABEL.to_string(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Category::Missing)
    }
}

impl From<Option<&Value>> for Category {
    fn from(value: Option<&Value>) -> Self {
        match value {
            Some(value) => Category::Value(value.clone()),
            None => Category::Missing,
        }
    }
}

/// Exact identity of a category. Floats compare by bit pattern so values that
/// render alike still count separately; `-0.0` folds into `0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CategoryKey {
    Integer(i64),
    Float(u64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
    Missing,
}

impl From<Option<&Value>> for CategoryKey {
    fn from(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Integer(i)) => CategoryKey::Integer(*i),
            Some(Value::Float(f)) => {
                let f = if *f == 0.0 { 0.0 } else { *f };
                CategoryKey::Float(f.to_bits())
            }
            Some(Value::Boolean(b)) => CategoryKey::Boolean(*b),
            Some(Value::Date(d)) => CategoryKey::Date(*d),
            Some(Value::DateTime(dt)) => CategoryKey::DateTime(*dt),
            Some(Value::Text(s)) => CategoryKey::Text(s.clone()),
            None => CategoryKey::Missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCategories {
    pub entries: Vec<CategoryCount>,
    /// Distinct categories before truncation, the missing bucket included.
    pub distinct: usize,
    pub total: usize,
}

impl TopCategories {
    pub fn displayed(&self) -> usize {
        self.entries.len()
    }

    pub fn count_of(&self, category: &Category) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| &entry.category == category)
            .map(|entry| entry.count)
    }

    fn render_rows(&self) -> Vec<Vec<String>> {
        self.entries
            .iter()
            .map(|entry| {
                let percent = if self.total > 0 {
                    entry.count as f64 / self.total as f64 * 100.0
                } else {
                    0.0
                };
                vec![
                    entry.category.label(),
                    entry.count.to_string(),
                    format!("{percent:.2}%"),
                ]
            })
            .collect()
    }
}

/// Counts every distinct value (missing included) and keeps the `limit` most
/// frequent. Equal counts keep the order in which values were first seen.
pub fn top_categories(values: &[Option<Value>], limit: usize) -> TopCategories {
    let mut positions: HashMap<CategoryKey, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();
    for value in values {
        let next = counts.len();
        let idx = *positions
            .entry(CategoryKey::from(value.as_ref()))
            .or_insert(next);
        if idx == next {
            counts.push(CategoryCount {
                category: Category::from(value.as_ref()),
                count: 0,
            });
        }
        counts[idx].count += 1;
    }
    let distinct = counts.len();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    TopCategories {
        entries: counts,
        distinct,
        total: values.len(),
    }
}

#[derive(Debug, Serialize)]
struct CategoricalReport<'a> {
    column: &'a str,
    limit: usize,
    #[serde(flatten)]
    top: TopCategories,
}

pub fn execute(args: &CategoricalArgs) -> Result<()> {
    let (session, config) = Session::open(&args.input)?;
    let limit = args.top.unwrap_or(config.top_categories);
    let column = session.categorical_column(args.column.as_deref())?;
    let top = top_categories(column.values(), limit);
    info!(
        "Counted {} distinct value(s) in '{}'",
        top.distinct,
        column.name()
    );

    if args.input.json {
        return io_utils::print_json(&CategoricalReport {
            column: column.name(),
            limit,
            top,
        });
    }

    println!("Frequency distribution: {}", column.name());
    println!("Top {limit} categories (including missing)");
    let headers = vec![
        "value".to_string(),
        "count".to_string(),
        "percent".to_string(),
    ];
    table::print_table(&headers, &top.render_rows());
    println!(
        "Total unique categories (including missing): {}",
        top.distinct
    );
    println!("Displaying {} of the top categories.", top.displayed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_categories_counts_missing_as_its_own_bucket() {
        let values = vec![
            Some(Value::Integer(1)),
            Some(Value::Integer(2)),
            Some(Value::Integer(2)),
            None,
            None,
            None,
        ];
        let top = top_categories(&values, DEFAULT_TOP_CATEGORIES);
        let ordered: Vec<(String, usize)> = top
            .entries
            .iter()
            .map(|entry| (entry.category.label(), entry.count))
            .collect();
        assert_eq!(
            ordered,
            vec![
                (MISSING_LABEL.to_string(), 3),
                ("2".to_string(), 2),
                ("1".to_string(), 1)
            ]
        );
        assert_eq!(top.distinct, 3);
        assert_eq!(top.total, 6);
    }

    #[test]
    fn top_categories_truncates_but_reports_full_distinct_count() {
        let values: Vec<Option<Value>> = (0..12)
            .map(|i| Some(Value::Text(format!("hood_{i}"))))
            .collect();
        let top = top_categories(&values, 8);
        assert_eq!(top.displayed(), 8);
        assert_eq!(top.distinct, 12);
        assert_eq!(top.entries[0].category, Category::Value("hood_0".into()));
        assert_eq!(top.entries[7].category, Category::Value("hood_7".into()));
    }

    #[test]
    fn top_categories_breaks_ties_by_first_encounter() {
        let values = ["b", "a", "a", "b", "c"]
            .into_iter()
            .map(|s| Some(Value::from(s)))
            .collect::<Vec<_>>();
        let top = top_categories(&values, 8);
        let labels: Vec<String> = top.entries.iter().map(|e| e.category.label()).collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
        assert_eq!(top.count_of(&Category::Value("c".into())), Some(1));
        assert_eq!(top.count_of(&Category::Missing), None);
    }

    #[test]
    fn top_categories_keeps_floats_that_render_alike_apart() {
        let values = [1.00001, 1.00002, 1.00003, 1.00002]
            .into_iter()
            .map(|v| Some(Value::Float(v)))
            .collect::<Vec<_>>();
        let top = top_categories(&values, 8);
        assert_eq!(top.distinct, 3);
        assert_eq!(top.entries[0].category, Category::Value(Value::Float(1.00002)));
        assert_eq!(top.entries[0].count, 2);
        assert_eq!(top.entries[0].category.label(), "1.0000");
    }

    #[test]
    fn top_categories_separates_numbers_from_numeric_text() {
        let values = vec![
            Some(Value::Integer(1)),
            Some(Value::from("1")),
            Some(Value::Integer(1)),
            Some(Value::Float(0.0)),
            Some(Value::Float(-0.0)),
        ];
        let top = top_categories(&values, 8);
        assert_eq!(top.distinct, 3);
        assert_eq!(top.count_of(&Category::Value(Value::Integer(1))), Some(2));
        assert_eq!(top.count_of(&Category::Value(Value::from("1"))), Some(1));
        assert_eq!(top.count_of(&Category::Value(Value::Float(0.0))), Some(2));
    }

    #[test]
    fn top_categories_with_zero_limit_returns_nothing() {
        let top = top_categories(&[Some(Value::from("x"))], 0);
        assert!(top.entries.is_empty());
        assert_eq!(top.distinct, 1);
    }

    #[test]
    fn render_rows_include_percentages() {
        let top = top_categories(&[Some(Value::from("Entire home")), None], 8);
        let rows = top.render_rows();
        assert_eq!(rows[0], vec!["Entire home", "1", "50.00%"]);
        assert_eq!(rows[1], vec![MISSING_LABEL, "1", "50.00%"]);
    }

    #[test]
    fn category_serializes_missing_as_null() {
        let json = serde_json::to_string(&CategoryCount {
            category: Category::Missing,
            count: 3,
        })
        .unwrap();
        assert_eq!(json, r#"{"category":null,"count":3}"#);
    }
}
