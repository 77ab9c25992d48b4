//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound for `max_result_rows`. A config may lower the result cap,
/// never raise it.
pub const RESULT_ROWS_LIMIT: usize = 1000;

/// Limits applied by the query engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard cap on the rows of a result table, applied after LIMIT.
    #[serde(default = "default_max_result_rows")]
    pub max_result_rows: usize,

    /// Cap on the rows a single join may produce.
    #[serde(default = "default_max_join_rows")]
    pub max_join_rows: usize,

    /// Number of queries a session remembers.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

fn default_max_result_rows() -> usize {
    RESULT_ROWS_LIMIT
}

fn default_max_join_rows() -> usize {
    100_000
}

fn default_history_size() -> usize {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_result_rows: default_max_result_rows(),
            max_join_rows: default_max_join_rows(),
            history_size: default_history_size(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from a TOML document and validates it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_result_rows == 0 {
            return Err(Error::Config("max_result_rows must be positive".into()));
        }
        if self.max_result_rows > RESULT_ROWS_LIMIT {
            return Err(Error::Config(format!(
                "max_result_rows ({}) must not exceed {}",
                self.max_result_rows, RESULT_ROWS_LIMIT
            )));
        }
        if self.max_join_rows < self.max_result_rows {
            return Err(Error::Config(format!(
                "max_join_rows ({}) must not be below max_result_rows ({})",
                self.max_join_rows, self.max_result_rows
            )));
        }
        Ok(())
    }

    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for engine configuration.
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn max_result_rows(mut self, rows: usize) -> Self {
        self.config.max_result_rows = rows;
        self
    }

    pub fn max_join_rows(mut self, rows: usize) -> Self {
        self.config.max_join_rows = rows;
        self
    }

    pub fn history_size(mut self, size: usize) -> Self {
        self.config.history_size = size;
        self
    }

    pub fn build(self) -> Result<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
