//! Optional YAML configuration shared by every command.
//!
//! ```yaml
//! missing_tokens: ["", "NA", "N/A", "null"]
//! identifier:
//!   mode: patterns
//!   deny: ["(?i)(^|_)id$"]
//!   allow: ["^paid_id$"]
//! range_cap: 10000
//! top_categories: 8
//! ```
//!
//! Every key is optional; omitted keys keep the defaults below.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::{
    chart::DEFAULT_RANGE_CAP,
    classify::{IdentifierRule, PatternRule, SubstringRule},
    data::{DEFAULT_MISSING_TOKENS, MissingTokens},
    frequency::DEFAULT_TOP_CATEGORIES,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub missing_tokens: Vec<String>,
    pub identifier: IdentifierConfig,
    pub range_cap: f64,
    pub top_categories: usize,
    pub preview_rows: usize,
    pub numeric_default_columns: usize,
    pub numeric_max_columns: usize,
    pub correlation_default_columns: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            missing_tokens: DEFAULT_MISSING_TOKENS
                .iter()
                .map(|token| token.to_string())
                .collect(),
            identifier: IdentifierConfig::default(),
            range_cap: DEFAULT_RANGE_CAP,
            top_categories: DEFAULT_TOP_CATEGORIES,
            preview_rows: 5,
            numeric_default_columns: 5,
            numeric_max_columns: 15,
            correlation_default_columns: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IdentifierConfig {
    Substring {
        #[serde(default = "default_needle")]
        needle: String,
    },
    Patterns {
        deny: Vec<String>,
        #[serde(default)]
        allow: Vec<String>,
    },
}

fn default_needle() -> String {
    String::from("id")
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        IdentifierConfig::Substring {
            needle: default_needle(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let config: Config = serde_yaml::from_reader(reader)
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        config
            .validate()
            .with_context(|| format!("Validating config {path:?}"))?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.range_cap.is_finite() || self.range_cap <= 0.0 {
            bail!("range_cap must be a positive number, got {}", self.range_cap);
        }
        if self.numeric_max_columns == 0 {
            bail!("numeric_max_columns must be at least 1");
        }
        if let IdentifierConfig::Substring { needle } = &self.identifier
            && needle.is_empty()
        {
            bail!("identifier needle cannot be empty");
        }
        Ok(())
    }

    pub fn missing_tokens(&self) -> MissingTokens {
        MissingTokens::new(self.missing_tokens.iter().cloned())
    }

    pub fn identifier_rule(&self) -> Result<Box<dyn IdentifierRule>> {
        Ok(match &self.identifier {
            IdentifierConfig::Substring { needle } => Box::new(SubstringRule::new(needle)),
            IdentifierConfig::Patterns { deny, allow } => Box::new(PatternRule::new(deny, allow)?),
        })
    }
}
