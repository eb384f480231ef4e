use crate::{
    model::FieldErrorKind,
    types::Decimal,
    value::{Value, ValueType},
};
use serde::{Deserialize, Serialize};

///
/// ValidationSchema
///
/// Named, reusable value constraints. A field with a schema is coerced
/// through the schema's value type and then checked against its bounds.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ValidationSchema {
    pub name: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub min_value: Option<Decimal>,
    #[serde(default)]
    pub max_value: Option<Decimal>,
    #[serde(default)]
    pub max_fraction_digits: Option<u32>,
}

impl ValidationSchema {
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            min_length: None,
            max_length: None,
            min_value: None,
            max_value: None,
            max_fraction_digits: None,
        }
    }

    #[must_use]
    pub const fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    #[must_use]
    pub const fn range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    #[must_use]
    pub const fn max_fraction_digits(mut self, max: u32) -> Self {
        self.max_fraction_digits = Some(max);
        self
    }

    /// Check an already-coerced value against the bounds.
    pub fn validate(&self, value: &Value) -> Result<(), FieldErrorKind> {
        match value {
            Value::Text(text) => self.validate_length(text),
            Value::Integer(n) => self.validate_range(Decimal::from_i64(*n), value),
            Value::Decimal(d) => {
                if let Some(max) = self.max_fraction_digits
                    && d.fraction_digits() > max
                {
                    return Err(FieldErrorKind::TooManyFractionDigits { max });
                }

                self.validate_range(*d, value)
            }
            _ => Ok(()),
        }
    }

    fn validate_length(&self, text: &str) -> Result<(), FieldErrorKind> {
        let len = text.chars().count();

        if let Some(min) = self.min_length
            && len < min
        {
            return Err(FieldErrorKind::TooShort { min });
        }
        if let Some(max) = self.max_length
            && len > max
        {
            return Err(FieldErrorKind::TooLong { max });
        }

        Ok(())
    }

    fn validate_range(&self, number: Decimal, value: &Value) -> Result<(), FieldErrorKind> {
        let below = self.min_value.is_some_and(|min| number < min);
        let above = self.max_value.is_some_and(|max| number > max);

        if below || above {
            return Err(FieldErrorKind::OutOfRange {
                value: value.to_string(),
            });
        }

        Ok(())
    }
}
