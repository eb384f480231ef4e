//! Accessor configuration, loadable from TOML.

use crate::db::dialect::DialectKind;
use serde::Deserialize;
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid accessor config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("max_rows_ceiling must be greater than zero")]
    InvalidCeiling,

    #[error("{key} must not be empty")]
    Empty { key: &'static str },
}

///
/// AccessorConfig
///
/// ```toml
/// max_rows_ceiling = 500
/// dialect = "limit"
/// upper_function = "UPPER"
/// current_timestamp = "CURRENT_TIMESTAMP"
/// ```
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AccessorConfig {
    /// Hard upper bound on rows a filter may return.
    pub max_rows_ceiling: u32,
    /// Limiting-clause flavour.
    pub dialect: DialectKind,
    /// Function used to fold text for case-insensitive comparison.
    pub upper_function: String,
    /// Literal written for created/modified timestamp columns.
    pub current_timestamp: String,
}

impl AccessorConfig {
    pub const DEFAULT_MAX_ROWS: u32 = 1000;

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rows_ceiling == 0 {
            return Err(ConfigError::InvalidCeiling);
        }
        if self.upper_function.trim().is_empty() {
            return Err(ConfigError::Empty {
                key: "upper_function",
            });
        }
        if self.current_timestamp.trim().is_empty() {
            return Err(ConfigError::Empty {
                key: "current_timestamp",
            });
        }

        Ok(())
    }
}

impl Default for AccessorConfig {
    fn default() -> Self {
        Self {
            max_rows_ceiling: Self::DEFAULT_MAX_ROWS,
            dialect: DialectKind::default(),
            upper_function: "UPPER".to_string(),
            current_timestamp: "CURRENT_TIMESTAMP".to_string(),
        }
    }
}
