use std::path::Path;

use error_stack::{Report, ResultExt};
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_FORWARDED_ERRORS;
use crate::errors::ErrorCode;

pub type ConfigResult<T> = Result<T, Report<ConfigError>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {0}")]
    Read(String),

    #[error("failed to parse configuration")]
    Parse,

    #[error("invalid value for '{field}': {value}")]
    InvalidValue { field: String, value: String },
}

/// Settings for [`crate::populate::populate_transaction`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulateConfig {
    /// Gas estimation failures with one of these codes are returned to the
    /// caller unchanged instead of being reported as `GasEstimationFailed`.
    pub forwarded_errors: Vec<ErrorCode>,
}

impl Default for PopulateConfig {
    fn default() -> Self {
        Self { forwarded_errors: DEFAULT_FORWARDED_ERRORS.to_vec() }
    }
}

impl PopulateConfig {
    pub fn with_forwarded_errors(mut self, codes: impl IntoIterator<Item = ErrorCode>) -> Self {
        self.forwarded_errors = codes.into_iter().collect();
        self
    }

    pub fn forwards(&self, code: ErrorCode) -> bool {
        self.forwarded_errors.contains(&code)
    }

    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        parse_toml(input)
    }
}

/// Parses any TOML backed configuration section.
pub fn parse_toml<T: serde::de::DeserializeOwned>(input: &str) -> ConfigResult<T> {
    toml::from_str(input)
        .map_err(|e| Report::new(ConfigError::Parse).attach_printable(e.to_string()))
}

/// Reads a TOML configuration file from disk.
pub fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Report::new(ConfigError::Read(path.display().to_string())).attach_printable(e.to_string())
    })?;
    parse_toml(&contents).attach_printable(format!("Loading {}", path.display()))
}
