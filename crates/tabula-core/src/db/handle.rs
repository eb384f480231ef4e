use crate::value::{Value, ValueType};
use std::error::Error as StdError;
use thiserror::Error as ThisError;

///
/// HandleError
/// Failure reported by the execution layer; always a system fault.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct HandleError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl HandleError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

///
/// Handle
///
/// Executes parameterized SQL on behalf of an accessor. Placeholders are
/// positional `?`, bound in order from `params`; `param_types` and
/// `output_types` run parallel to the values they describe.
///

pub trait Handle {
    /// Runs a single-row read. `None` when no row matched.
    fn execute_read(
        &mut self,
        sql: &str,
        params: &[Value],
        param_types: &[ValueType],
        output_types: &[ValueType],
    ) -> Result<Option<Vec<Value>>, HandleError>;

    /// Runs a multi-row read, returning each row's output values in order.
    fn execute_read_many(
        &mut self,
        sql: &str,
        params: &[Value],
        param_types: &[ValueType],
        output_types: &[ValueType],
    ) -> Result<Vec<Vec<Value>>, HandleError>;

    /// Runs a write and returns the number of affected rows.
    fn execute_write(
        &mut self,
        sql: &str,
        params: &[Value],
        param_types: &[ValueType],
    ) -> Result<u64, HandleError>;

    /// Runs an insert and returns the affected count plus the value the
    /// store generated for `generated_column`.
    fn execute_write_returning_generated_key(
        &mut self,
        sql: &str,
        params: &[Value],
        param_types: &[ValueType],
        generated_column: &str,
    ) -> Result<(u64, Option<Value>), HandleError>;

    /// Runs the same statement once per parameter row; returns the total
    /// affected count.
    fn execute_write_many(
        &mut self,
        sql: &str,
        params_per_row: &[Vec<Value>],
        param_types: &[ValueType],
    ) -> Result<u64, HandleError>;
}

impl<H: Handle + ?Sized> Handle for &mut H {
    fn execute_read(
        &mut self,
        sql: &str,
        params: &[Value],
        param_types: &[ValueType],
        output_types: &[ValueType],
    ) -> Result<Option<Vec<Value>>, HandleError> {
        (**self).execute_read(sql, params, param_types, output_types)
    }

    fn execute_read_many(
        &mut self,
        sql: &str,
        params: &[Value],
        param_types: &[ValueType],
        output_types: &[ValueType],
    ) -> Result<Vec<Vec<Value>>, HandleError> {
        (**self).execute_read_many(sql, params, param_types, output_types)
    }

    fn execute_write(
        &mut self,
        sql: &str,
        params: &[Value],
        param_types: &[ValueType],
    ) -> Result<u64, HandleError> {
        (**self).execute_write(sql, params, param_types)
    }

    fn execute_write_returning_generated_key(
        &mut self,
        sql: &str,
        params: &[Value],
        param_types: &[ValueType],
        generated_column: &str,
    ) -> Result<(u64, Option<Value>), HandleError> {
        (**self).execute_write_returning_generated_key(sql, params, param_types, generated_column)
    }

    fn execute_write_many(
        &mut self,
        sql: &str,
        params_per_row: &[Vec<Value>],
        param_types: &[ValueType],
    ) -> Result<u64, HandleError> {
        (**self).execute_write_many(sql, params_per_row, param_types)
    }
}
