use crate::config::AccessorConfig;
use serde::Deserialize;

///
/// Dialect
///
/// Store-specific SQL fragments the compiler cannot write portably:
/// the row-limiting clause, the text-folding call and the write-time
/// timestamp literal.
///

pub trait Dialect: Send + Sync {
    /// Clause appended to a filter, including its leading space.
    fn limit_clause(&self, max_rows: u32) -> String;

    fn upper(&self, expr: &str) -> String {
        format!("UPPER({expr})")
    }

    fn current_timestamp(&self) -> &str {
        "CURRENT_TIMESTAMP"
    }
}

///
/// DialectKind
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    /// ` FETCH FIRST n ROWS ONLY`
    #[default]
    FetchFirst,
    /// ` LIMIT n`
    Limit,
}

impl Dialect for DialectKind {
    fn limit_clause(&self, max_rows: u32) -> String {
        match self {
            Self::FetchFirst => format!(" FETCH FIRST {max_rows} ROWS ONLY"),
            Self::Limit => format!(" LIMIT {max_rows}"),
        }
    }
}

///
/// SqlDialect
/// A `DialectKind` with the function names taken from configuration.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SqlDialect {
    kind: DialectKind,
    upper_function: String,
    current_timestamp: String,
}

impl SqlDialect {
    #[must_use]
    pub fn from_config(config: &AccessorConfig) -> Self {
        Self {
            kind: config.dialect,
            upper_function: config.upper_function.clone(),
            current_timestamp: config.current_timestamp.clone(),
        }
    }
}

impl Dialect for SqlDialect {
    fn limit_clause(&self, max_rows: u32) -> String {
        self.kind.limit_clause(max_rows)
    }

    fn upper(&self, expr: &str) -> String {
        format!("{}({expr})", self.upper_function)
    }

    fn current_timestamp(&self) -> &str {
        &self.current_timestamp
    }
}
