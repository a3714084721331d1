//! A loaded, classified dataset shared by every view.
//!
//! A [`Session`] is built once per command and never mutated afterwards. Views
//! receive `&Session` plus their current selection and derive everything else
//! on the fly.

use std::path::Path;

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, info};
use thiserror::Error;

use crate::{
    classify::{self, Classification, ColumnRole, IdentifierRule},
    cli::InputArgs,
    config::Config,
    dataset::{self, Column, Dataset, LoadOptions},
    io_utils,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Column '{0}' not found in dataset")]
    UnknownColumn(String),
    #[error("Column '{column}' is {actual}, expected a {expected} column")]
    WrongRole {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Dataset has no {0} columns")]
    NoColumns(&'static str),
    #[error("Select at least {required} features to calculate correlation (got {found})")]
    TooFewFeatures { required: usize, found: usize },
}

#[derive(Debug, Clone)]
pub struct Session {
    classification: Classification,
}

impl Session {
    pub fn from_dataset(raw: Dataset, rule: &dyn IdentifierRule) -> Self {
        Self {
            classification: classify::classify_with(raw, rule),
        }
    }

    pub fn load(path: &Path, options: &LoadOptions, config: &Config) -> Result<Self> {
        let rule = config.identifier_rule()?;
        let raw = dataset::read_dataset(path, options, &config.missing_tokens())
            .with_context(|| format!("Loading dataset from {path:?}"))?;
        let session = Self::from_dataset(raw, rule.as_ref());
        info!(
            "Loaded {} row(s) and {} column(s) from {:?} ({} dropped as empty)",
            session.dataset().row_count(),
            session.dataset().column_count(),
            path,
            session.dropped().len()
        );
        Ok(session)
    }

    /// Resolves config, delimiter, and encoding from command arguments, then loads.
    pub fn open(input: &InputArgs) -> Result<(Self, Config)> {
        let config = Config::load_or_default(input.config.as_deref())?;
        let options = LoadOptions {
            delimiter: io_utils::resolve_input_delimiter(&input.input, input.delimiter),
            encoding: io_utils::resolve_encoding(input.input_encoding.as_deref())?,
        };
        debug!(
            "Opening {:?} with delimiter '{}' and encoding {}",
            input.input,
            crate::printable_delimiter(options.delimiter),
            options.encoding.name()
        );
        let session = Self::load(&input.input, &options, &config)?;
        Ok((session, config))
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn dataset(&self) -> &Dataset {
        self.classification.dataset()
    }

    pub fn numerical(&self) -> &[String] {
        self.classification.numerical()
    }

    pub fn categorical(&self) -> &[String] {
        self.classification.categorical()
    }

    pub fn identifiers(&self) -> &[String] {
        self.classification.identifiers()
    }

    pub fn dropped(&self) -> &[String] {
        self.classification.dropped()
    }

    fn column_with_role(&self, name: &str, expected: ColumnRole) -> Result<&Column, SelectionError> {
        let role = self
            .classification
            .role(name)
            .ok_or_else(|| SelectionError::UnknownColumn(name.to_string()))?;
        if role != expected {
            return Err(SelectionError::WrongRole {
                column: name.to_string(),
                expected: expected.as_str(),
                actual: role.as_str(),
            });
        }
        self.dataset()
            .column(name)
            .ok_or_else(|| SelectionError::UnknownColumn(name.to_string()))
    }

    pub fn numeric_column(&self, name: &str) -> Result<&Column, SelectionError> {
        self.column_with_role(name, ColumnRole::Numerical)
    }

    /// The named categorical column, or the first one when no name is given.
    pub fn categorical_column(&self, name: Option<&str>) -> Result<&Column, SelectionError> {
        match name {
            Some(name) => self.column_with_role(name, ColumnRole::Categorical),
            None => {
                let first = self
                    .categorical()
                    .first()
                    .ok_or(SelectionError::NoColumns("categorical"))?;
                self.column_with_role(first, ColumnRole::Categorical)
            }
        }
    }

    /// Validates an explicit numerical selection, or falls back to the first
    /// `default_count` numerical columns. Comma-separated entries are split.
    pub fn select_numerical(
        &self,
        requested: &[String],
        default_count: usize,
    ) -> Result<Vec<String>, SelectionError> {
        let names = requested
            .iter()
            .flat_map(|entry| entry.split(','))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unique()
            .collect_vec();
        if names.is_empty() {
            return Ok(self
                .numerical()
                .iter()
                .take(default_count)
                .cloned()
                .collect());
        }
        names
            .into_iter()
            .map(|name| self.numeric_column(name).map(|column| column.name().to_string()))
            .collect()
    }
}
