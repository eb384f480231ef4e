//! Module: db::filter
//! Responsibility: the declarative filter request and its compilation
//! into a parameterized `QueryArtifact`.
//! Does not own: execution (see `Accessor::filter`).

mod compile;


pub(crate) use compile::FilterCompiler;
pub use compile::{effective_max_rows, escape_like};

use crate::value::ValueType;
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

///
/// Comparator
///
/// Accepts both the upper-case names and the short symbols on input.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparator {
    #[default]
    #[serde(alias = "=")]
    Equal,
    #[serde(alias = "!=", alias = "<>")]
    NotEqual,
    #[serde(alias = "<")]
    LessThan,
    #[serde(alias = "<=")]
    LessOrEqual,
    #[serde(alias = ">")]
    GreaterThan,
    #[serde(alias = ">=")]
    GreaterOrEqual,
    #[serde(alias = "~")]
    Contains,
    #[serde(alias = "^")]
    StartsWith,
    #[serde(alias = "@")]
    OneOf,
    #[serde(alias = "><")]
    Between,
    #[serde(alias = "#")]
    HasValue,
    #[serde(alias = "!#")]
    HasNoValue,
}

impl Comparator {
    pub const ALL: [Self; 12] = [
        Self::Equal,
        Self::NotEqual,
        Self::LessThan,
        Self::LessOrEqual,
        Self::GreaterThan,
        Self::GreaterOrEqual,
        Self::Contains,
        Self::StartsWith,
        Self::OneOf,
        Self::Between,
        Self::HasValue,
        Self::HasNoValue,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "EQUAL",
            Self::NotEqual => "NOT_EQUAL",
            Self::LessThan => "LESS_THAN",
            Self::LessOrEqual => "LESS_OR_EQUAL",
            Self::GreaterThan => "GREATER_THAN",
            Self::GreaterOrEqual => "GREATER_OR_EQUAL",
            Self::Contains => "CONTAINS",
            Self::StartsWith => "STARTS_WITH",
            Self::OneOf => "ONE_OF",
            Self::Between => "BETWEEN",
            Self::HasValue => "HAS_VALUE",
            Self::HasNoValue => "HAS_NO_VALUE",
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::Contains => "~",
            Self::StartsWith => "^",
            Self::OneOf => "@",
            Self::Between => "><",
            Self::HasValue => "#",
            Self::HasNoValue => "!#",
        }
    }

    /// Comparators that need the field type to be ordered.
    #[must_use]
    pub const fn requires_ordering(self) -> bool {
        matches!(
            self,
            Self::LessThan
                | Self::LessOrEqual
                | Self::GreaterThan
                | Self::GreaterOrEqual
                | Self::Between
        )
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// UnknownComparator
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("unknown comparator '{0}'")]
pub struct UnknownComparator(pub String);

impl FromStr for Comparator {
    type Err = UnknownComparator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "<>" {
            return Ok(Self::NotEqual);
        }

        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s) || c.symbol() == s)
            .ok_or_else(|| UnknownComparator(s.to_string()))
    }
}

///
/// FilterCondition
///
/// `value` holds the raw operand text; `to_value` is only read by BETWEEN.
/// Either operand of BETWEEN may be a field reference written `${name}`.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    pub field: String,
    #[serde(default)]
    pub comparator: Comparator,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_value: Option<String>,
}

impl FilterCondition {
    #[must_use]
    pub fn new(field: impl Into<String>, comparator: Comparator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            comparator,
            value: value.into(),
            to_value: None,
        }
    }

    #[must_use]
    pub fn between(
        field: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            to_value: Some(to.into()),
            ..Self::new(field, Comparator::Between, from)
        }
    }

    #[must_use]
    pub fn has_value(field: impl Into<String>) -> Self {
        Self::new(field, Comparator::HasValue, "")
    }

    #[must_use]
    pub fn has_no_value(field: impl Into<String>) -> Self {
        Self::new(field, Comparator::HasNoValue, "")
    }
}

///
/// SortSpec
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

impl SortSpec {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

///
/// FilterRequest
///
/// Projection, conditions, sort order and a row-count hint. An empty
/// projection selects every persisted column.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterRequest {
    pub fields: Vec<String>,
    pub filters: Vec<FilterCondition>,
    pub sorts: Vec<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<i64>,
}

impl FilterRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, condition: FilterCondition) -> Self {
        self.filters.push(condition);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sorts.push(sort);
        self
    }

    #[must_use]
    pub const fn max_rows(mut self, max_rows: i64) -> Self {
        self.max_rows = Some(max_rows);
        self
    }
}

///
/// CompileError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CompileError {
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("field '{field}' has no column")]
    NotPersisted { field: String },

    #[error("'{text}' is not a valid {expected} value for field '{field}'")]
    InvalidLiteral {
        field: String,
        text: String,
        expected: ValueType,
    },

    #[error("{comparator} on field '{field}' requires a value")]
    MissingValue {
        field: String,
        comparator: Comparator,
    },

    #[error("{comparator} is not supported on {value_type} field '{field}'")]
    UnsupportedOperator {
        field: String,
        comparator: Comparator,
        value_type: ValueType,
    },

    #[error("field '{field}' is {expected} but referenced field '{reference}' is {actual}")]
    ReferenceTypeMismatch {
        field: String,
        reference: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("a tenant id is required to query '{entity}'")]
    MissingTenant { entity: String },

    #[error("tenant id for '{entity}' is not a valid {expected} value")]
    InvalidTenant { entity: String, expected: ValueType },

    #[error("projection of '{entity}' selects no persisted column")]
    EmptyProjection { entity: String },
}

impl CompileError {
    /// Field the error is about, where there is one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::UnknownField { field }
            | Self::NotPersisted { field }
            | Self::InvalidLiteral { field, .. }
            | Self::MissingValue { field, .. }
            | Self::UnsupportedOperator { field, .. }
            | Self::ReferenceTypeMismatch { field, .. } => Some(field),
            Self::MissingTenant { .. }
            | Self::InvalidTenant { .. }
            | Self::EmptyProjection { .. } => None,
        }
    }
}

///
/// CompileErrors
/// Every problem found in one request; never empty.
///

#[derive(Clone, Debug, Deref, Eq, PartialEq, ThisError)]
#[error("query compilation failed: {}", join_errors(.0))]
pub struct CompileErrors(pub Vec<CompileError>);

impl CompileErrors {
    #[must_use]
    pub fn mentions(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field() == Some(field))
    }
}

fn join_errors(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
