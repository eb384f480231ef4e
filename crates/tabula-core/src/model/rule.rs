use crate::{
    model::{FieldError, FieldErrorKind, RowMetadata},
    value::Value,
};
use std::cmp::Ordering;

///
/// CrossFieldRule
///
/// Constraint spanning more than one field of a row. Evaluated only once
/// every field has parsed cleanly.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CrossFieldRule {
    /// `from` must not be after `to` (nor equal, unless allowed).
    FromTo {
        from: String,
        to: String,
        allow_equal: bool,
    },
    /// At least one of the fields must have a value.
    EitherOr { fields: Vec<String> },
    /// The two fields must not both have a value.
    MutuallyExclusive { first: String, second: String },
    /// When `field` has a value, `companion` must have one too.
    RequiredWith { field: String, companion: String },
}

impl CrossFieldRule {
    pub(crate) fn field_names(&self) -> Vec<&str> {
        match self {
            Self::FromTo { from, to, .. } => vec![from.as_str(), to.as_str()],
            Self::EitherOr { fields } => fields.iter().map(String::as_str).collect(),
            Self::MutuallyExclusive { first, second } => vec![first.as_str(), second.as_str()],
            Self::RequiredWith { field, companion } => vec![field.as_str(), companion.as_str()],
        }
    }

    /// Evaluate against a full values array of `metadata`.
    #[must_use]
    pub fn check(&self, metadata: &RowMetadata, values: &[Value]) -> Option<FieldError> {
        let has = |name: &String| present(metadata, values, name).is_some();

        match self {
            Self::FromTo {
                from,
                to,
                allow_equal,
            } => {
                let low = present(metadata, values, from)?;
                let high = present(metadata, values, to)?;
                let violated = match low.compare(high)? {
                    Ordering::Greater => true,
                    Ordering::Equal => !allow_equal,
                    Ordering::Less => false,
                };

                violated.then(|| cross_field(from, format!("'{from}' must be before '{to}'")))
            }
            Self::EitherOr { fields } => {
                let first = fields.first()?;

                (!fields.iter().any(has)).then(|| {
                    cross_field(first, format!("one of {} is required", fields.join(", ")))
                })
            }
            Self::MutuallyExclusive { first, second } => (has(first) && has(second)).then(|| {
                cross_field(
                    first,
                    format!("'{first}' and '{second}' cannot both have a value"),
                )
            }),
            Self::RequiredWith { field, companion } => (has(field) && !has(companion)).then(|| {
                cross_field(
                    companion,
                    format!("'{companion}' is required when '{field}' has a value"),
                )
            }),
        }
    }
}

fn present<'a>(metadata: &RowMetadata, values: &'a [Value], name: &str) -> Option<&'a Value> {
    metadata
        .index_of(name)
        .and_then(|idx| values.get(idx))
        .filter(|v| !v.is_null())
}

fn cross_field(field: &str, message: String) -> FieldError {
    FieldError::new(field, FieldErrorKind::CrossField { message })
}
