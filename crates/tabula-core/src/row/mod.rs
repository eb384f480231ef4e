//! Module: row
//! Responsibility: positional values paired with shared metadata, parsing from
//! generic input, and ordered batches of rows.
//! Does not own: persistence (see `db::accessor`).
//! Boundary: a `Row` always holds exactly `metadata.len()` values.

mod batch;
mod input;


pub(crate) use batch::same_entity;
pub use batch::{RowBatch, RowRef};
pub use input::InputSource;

use crate::{
    error::ShapeError,
    model::{FieldError, FieldSource, RowMetadata},
    validate::{NoValueLists, ValueLists},
    value::{Value, ValueType},
};
use serde::{Serialize, Serializer, ser::SerializeMap};
use std::sync::Arc;
use thiserror::Error as ThisError;

static NO_LISTS: NoValueLists = NoValueLists;

///
/// RowError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RowError {
    #[error("index {index} is out of range for {len} fields")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unknown field '{name}'")]
    UnknownField { name: String },

    #[error("field '{field}' holds {expected} values, got {actual}")]
    TypeMismatch {
        field: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("row of entity '{actual}' cannot join a batch of '{expected}'")]
    ForeignMetadata { expected: String, actual: String },

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

///
/// ParseContext
///
/// Collaborators and location used while parsing input into rows.
///

#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub lists: &'a dyn ValueLists,
    pub table: Option<&'a str>,
    pub row: Option<usize>,
}

impl<'a> ParseContext<'a> {
    #[must_use]
    pub const fn new(lists: &'a dyn ValueLists) -> Self {
        Self {
            lists,
            table: None,
            row: None,
        }
    }

    /// Tag errors with a table name and 1-based row number.
    #[must_use]
    pub const fn at(mut self, table: Option<&'a str>, row: usize) -> Self {
        self.table = table;
        self.row = Some(row);
        self
    }
}

impl Default for ParseContext<'_> {
    fn default() -> Self {
        Self::new(&NO_LISTS)
    }
}

///
/// Row
///

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    metadata: Arc<RowMetadata>,
    values: Vec<Value>,
}

impl Row {
    /// Row with every slot set to its field default.
    #[must_use]
    pub fn new(metadata: Arc<RowMetadata>) -> Self {
        let values = metadata.default_values();

        Self { metadata, values }
    }

    /// Row over an explicit values array of exactly `metadata.len()` slots.
    pub fn with_values(metadata: Arc<RowMetadata>, values: Vec<Value>) -> Result<Self, ShapeError> {
        check_shape(&metadata, values.len())?;

        Ok(Self { metadata, values })
    }

    #[must_use]
    pub const fn metadata(&self) -> &Arc<RowMetadata> {
        &self.metadata
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [Value] {
        &mut self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.metadata.index_of(name).and_then(|idx| self.get(idx))
    }

    /// Replace one slot; the value must be `Null` or match the field type.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<(), RowError> {
        let value = value.into();
        let len = self.values.len();
        let field = self
            .metadata
            .field(index)
            .ok_or(RowError::IndexOutOfRange { index, len })?;

        if let Some(actual) = value.value_type()
            && !field.value_type().accepts(&value)
        {
            return Err(RowError::TypeMismatch {
                field: field.name().to_string(),
                expected: field.value_type(),
                actual,
            });
        }

        self.values[index] = value;

        Ok(())
    }

    pub fn set_by_name(&mut self, name: &str, value: impl Into<Value>) -> Result<(), RowError> {
        let index = self
            .metadata
            .index_of(name)
            .ok_or_else(|| RowError::UnknownField {
                name: name.to_string(),
            })?;

        self.set(index, value)
    }

    /// Populate the row from generic input.
    ///
    /// Every field is attempted even after a failure; failed slots are set to
    /// `Null`. Cross-field rules run only when every field parsed cleanly.
    pub fn parse(
        &mut self,
        input: &dyn InputSource,
        for_insert: bool,
        ctx: &ParseContext<'_>,
    ) -> Result<(), Vec<FieldError>> {
        let metadata = Arc::clone(&self.metadata);
        let mut errors = Vec::new();

        for field in metadata.fields() {
            let required = match field.source() {
                FieldSource::Server => continue,
                FieldSource::GeneratedKey if for_insert => continue,
                FieldSource::GeneratedKey => true,
                FieldSource::Client => field.is_required(),
            };

            let text = input.text(field.name());
            match field.parse_text(text.as_deref(), required, ctx.lists) {
                Ok(value) => self.values[field.index()] = value,
                Err(kind) => {
                    self.values[field.index()] = Value::Null;
                    errors.push(FieldError::new(field.name(), kind).in_table(ctx.table, ctx.row));
                }
            }
        }

        if errors.is_empty() {
            errors.extend(
                metadata
                    .rules()
                    .iter()
                    .filter_map(|rule| rule.check(&metadata, &self.values))
                    .map(|err| err.in_table(ctx.table, ctx.row)),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Copy slots whose field matches by name and value type; returns the count copied.
    pub fn copy_matching_fields_from(&mut self, other: &Self) -> usize {
        let mut copied = 0;

        for field in other.metadata.fields() {
            let Some(target) = self.metadata.field_by_name(field.name()) else {
                continue;
            };
            if target.value_type() != field.value_type() {
                continue;
            }

            self.values[target.index()] = other.values[field.index()].clone();
            copied += 1;
        }

        copied
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.metadata.fields().iter().zip(&self.values) {
            map.serialize_entry(field.name(), value)?;
        }

        map.end()
    }
}

pub(crate) fn check_shape(metadata: &RowMetadata, actual: usize) -> Result<(), ShapeError> {
    if actual == metadata.len() {
        Ok(())
    } else {
        Err(ShapeError {
            entity: metadata.name().to_string(),
            expected: metadata.len(),
            actual,
        })
    }
}
