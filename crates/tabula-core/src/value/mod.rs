//! Module: value
//! Responsibility: the runtime value carried in row slots and bound as query parameters.
//! Does not own: schema validation (see `model::schema`) or SQL rendering.
//! Boundary: `ValueType::parse` is the only text-to-value coercion path.


use crate::types::{Date, Decimal, Timestamp};
use serde::{Deserialize, Serialize, Serializer};
use std::{cmp::Ordering, fmt};

///
/// ValueType
///
/// Closed set of scalar types a field may hold.
/// Also used as the positional parameter/output type handed to a `Handle`.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Date,
    Decimal,
    Integer,
    Text,
    Timestamp,
}

impl ValueType {
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }

    /// Whether `<`, `>`, `BETWEEN` and friends are meaningful for this type.
    #[must_use]
    pub const fn supports_ordering(self) -> bool {
        !matches!(self, Self::Bool)
    }

    /// Coerce trimmed text into a value of this type.
    ///
    /// Returns `None` when the text is not a valid literal; empty text is
    /// the caller's concern (missing vs. required).
    #[must_use]
    pub fn parse(self, text: &str) -> Option<Value> {
        let text = text.trim();

        match self {
            Self::Bool => parse_bool(text).map(Value::Bool),
            Self::Date => Date::parse(text).map(Value::Date),
            Self::Decimal => text.parse::<Decimal>().ok().map(Value::Decimal),
            Self::Integer => text.parse::<i64>().ok().map(Value::Integer),
            Self::Text => Some(Value::Text(text.to_string())),
            Self::Timestamp => Timestamp::parse_flexible(text).ok().map(Value::Timestamp),
        }
    }

    /// Whether `value` may be stored in a slot of this type (`Null` always may).
    #[must_use]
    pub const fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (Self::Bool, Value::Bool(_))
                | (Self::Date, Value::Date(_))
                | (Self::Decimal, Value::Decimal(_))
                | (Self::Integer, Value::Integer(_))
                | (Self::Text, Value::Text(_))
                | (Self::Timestamp, Value::Timestamp(_))
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::Text => "text",
            Self::Timestamp => "timestamp",
        };

        f.write_str(label)
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") || text == "1" {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") || text == "0" {
        Some(false)
    } else {
        None
    }
}

///
/// Value
///
/// Opaque slot content of a row and the unit of parameter binding.
/// Null → the slot has no value (SQL NULL).
///

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Date(Date),
    Decimal(Decimal),
    Integer(i64),
    Text(String),
    Timestamp(Timestamp),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Value type of a non-null value.
    #[must_use]
    pub const fn value_type(&self) -> Option<ValueType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ValueType::Bool),
            Self::Date(_) => Some(ValueType::Date),
            Self::Decimal(_) => Some(ValueType::Decimal),
            Self::Integer(_) => Some(ValueType::Integer),
            Self::Text(_) => Some(ValueType::Text),
            Self::Timestamp(_) => Some(ValueType::Timestamp),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Ordering between two non-null values of the same type.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Uppercase text in place; every other variant is returned unchanged.
    #[must_use]
    pub fn to_uppercase(self) -> Self {
        match self {
            Self::Text(s) => Self::Text(s.to_uppercase()),
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Timestamp(v) => write!(f, "{v}"),
        }
    }
}

// Serialized as the bare scalar so rows render naturally on the transport wire.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Date(v) => v.serialize(serializer),
            Self::Decimal(v) => v.serialize(serializer),
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::Timestamp(v) => v.serialize(serializer),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Date> for Value {
    fn from(v: Date) -> Self {
        Self::Date(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
