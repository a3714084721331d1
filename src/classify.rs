//! Column cleaning and classification.
//!
//! [`classify`] removes columns with no values at all and sorts the remaining
//! columns into numerical and categorical sets. Numeric columns whose name
//! looks like an identifier (`host_id`, `id`, `scrape_id`) are kept in the
//! cleaned dataset but appear in neither set, so summaries and correlations
//! are not polluted by surrogate keys.
//!
//! The identifier test sits behind [`IdentifierRule`]. The default
//! [`SubstringRule`] matches `"id"` anywhere in the lowercased name, which also
//! catches names such as `paid_amount`; [`PatternRule`] swaps that for explicit
//! regex deny/allow lists without touching the classifier.

use anyhow::{Context, Result};
use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::dataset::{Column, Dataset};

pub trait IdentifierRule {
    fn is_identifier(&self, name: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct SubstringRule {
    needle: String,
}

impl SubstringRule {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.to_lowercase(),
        }
    }
}

impl Default for SubstringRule {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdentifierRule for SubstringRule {
    fn is_identifier(&self, name: &str) -> bool {
        name.to_lowercase().contains(&self.needle)
    }
}

/// A name is an identifier when it matches any `deny` pattern and no `allow` pattern.
#[derive(Debug, Clone)]
pub struct PatternRule {
    deny: Vec<Regex>,
    allow: Vec<Regex>,
}

impl PatternRule {
    pub fn new(deny: &[String], allow: &[String]) -> Result<Self> {
        Ok(Self {
            deny: compile_patterns(deny)?,
            allow: compile_patterns(allow)?,
        })
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).with_context(|| format!("Compiling identifier pattern '{pattern}'"))
        })
        .collect()
}

impl IdentifierRule for PatternRule {
    fn is_identifier(&self, name: &str) -> bool {
        self.deny.iter().any(|re| re.is_match(name))
            && !self.allow.iter().any(|re| re.is_match(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Numerical,
    Categorical,
    Identifier,
    Dropped,
}

impl ColumnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnRole::Numerical => "numerical",
            ColumnRole::Categorical => "categorical",
            ColumnRole::Identifier => "identifier",
            ColumnRole::Dropped => "dropped",
        }
    }
}

fn role_of(column: &Column, rule: &dyn IdentifierRule) -> ColumnRole {
    if column.is_all_missing() {
        ColumnRole::Dropped
    } else if column.kind().is_numeric() {
        if rule.is_identifier(column.name()) {
            ColumnRole::Identifier
        } else {
            ColumnRole::Numerical
        }
    } else {
        ColumnRole::Categorical
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    dataset: Dataset,
    numerical: Vec<String>,
    categorical: Vec<String>,
    identifiers: Vec<String>,
    dropped: Vec<String>,
}

impl Classification {
    /// The input with every all-missing column removed.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn numerical(&self) -> &[String] {
        &self.numerical
    }

    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    /// Role of any column of the raw input; `None` for names never seen.
    pub fn role(&self, name: &str) -> Option<ColumnRole> {
        let contains = |list: &[String]| list.iter().any(|candidate| candidate == name);
        if contains(&self.numerical) {
            Some(ColumnRole::Numerical)
        } else if contains(&self.categorical) {
            Some(ColumnRole::Categorical)
        } else if contains(&self.identifiers) {
            Some(ColumnRole::Identifier)
        } else if contains(&self.dropped) {
            Some(ColumnRole::Dropped)
        } else {
            None
        }
    }
}

pub fn classify(raw: Dataset) -> Classification {
    classify_with(raw, &SubstringRule::default())
}

pub fn classify_with(raw: Dataset, rule: &dyn IdentifierRule) -> Classification {
    let mut numerical = Vec::new();
    let mut categorical = Vec::new();
    let mut identifiers = Vec::new();
    let mut dropped = Vec::new();

    for column in raw.columns() {
        let name = column.name().to_string();
        match role_of(column, rule) {
            ColumnRole::Numerical => numerical.push(name),
            ColumnRole::Categorical => categorical.push(name),
            ColumnRole::Identifier => identifiers.push(name),
            ColumnRole::Dropped => dropped.push(name),
        }
    }
    debug!(
        "Classified columns: {} numerical, {} categorical, {} identifier, {} dropped",
        numerical.len(),
        categorical.len(),
        identifiers.len(),
        dropped.len()
    );

    let dataset = raw.retain_columns(|column| !column.is_all_missing());
    Classification {
        dataset,
        numerical,
        categorical,
        identifiers,
        dropped,
    }
}
