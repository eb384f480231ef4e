use crate::value::ValueType;
use std::fmt;
use thiserror::Error as ThisError;

///
/// DescriptorError
///
/// Entity-definition invariants violated at construction time.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum DescriptorError {
    #[error("entity name must not be empty")]
    EmptyEntityName,

    #[error("entity '{entity}' has no table name")]
    EmptyTableName { entity: String },

    #[error("field '{field}' is defined more than once")]
    DuplicateField { field: String },

    #[error("field '{field}' is {field_type} but its schema '{schema}' is {schema_type}")]
    SchemaTypeMismatch {
        field: String,
        field_type: ValueType,
        schema: String,
        schema_type: ValueType,
    },

    #[error("default for field '{field}' is not a {expected} value")]
    DefaultTypeMismatch { field: String, expected: ValueType },

    #[error("multi-valued field '{field}' must be text")]
    MultiValuedNotText { field: String },

    #[error("cross-field rule references unknown field '{field}'")]
    RuleUnknownField { field: String },

    #[error("override references unknown field '{field}'")]
    OverrideUnknownField { field: String },

    #[error("entity '{entity}' declares more than one generated key")]
    MultipleGeneratedKeys { entity: String },

    #[error("entity '{entity}' declares more than one tenant key")]
    MultipleTenantKeys { entity: String },

    #[error("entity '{entity}' mixes a generated key with plain key '{field}'")]
    KeyWithGeneratedKey { entity: String, field: String },

    #[error("field '{field}' of category {category} must be persisted")]
    UnpersistedColumn { field: String, category: String },
}

///
/// FieldErrorKind
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldErrorKind {
    Required,
    InvalidValue { text: String, expected: ValueType },
    TooShort { min: usize },
    TooLong { max: usize },
    OutOfRange { value: String },
    TooManyFractionDigits { max: u32 },
    NotInList { list: String, value: String },
    CrossField { message: String },
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("a value is required"),
            Self::InvalidValue { text, expected } => {
                write!(f, "'{text}' is not a valid {expected} value")
            }
            Self::TooShort { min } => write!(f, "must be at least {min} characters"),
            Self::TooLong { max } => write!(f, "must be at most {max} characters"),
            Self::OutOfRange { value } => write!(f, "{value} is out of range"),
            Self::TooManyFractionDigits { max } => {
                write!(f, "must have at most {max} fraction digits")
            }
            Self::NotInList { list, value } => write!(f, "'{value}' is not a valid {list}"),
            Self::CrossField { message } => f.write_str(message),
        }
    }
}

///
/// FieldError
///
/// One field failed to parse or validate. Always names the field; carries
/// the table name and 1-based row number when raised in a tabular context.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
    pub table: Option<String>,
    pub row: Option<usize>,
}

impl FieldError {
    #[must_use]
    pub fn new(field: impl Into<String>, kind: FieldErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
            table: None,
            row: None,
        }
    }

    #[must_use]
    pub fn in_table(mut self, table: Option<&str>, row: Option<usize>) -> Self {
        self.table = table.map(str::to_string);
        self.row = row;
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.table, self.row) {
            (Some(table), Some(row)) => write!(f, "{table}[{row}].{}: {}", self.field, self.kind),
            (None, Some(row)) => write!(f, "[{row}].{}: {}", self.field, self.kind),
            (Some(table), None) => write!(f, "{table}.{}: {}", self.field, self.kind),
            (None, None) => write!(f, "{}: {}", self.field, self.kind),
        }
    }
}

impl std::error::Error for FieldError {}
