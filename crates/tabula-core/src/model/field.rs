use crate::{
    model::{FieldErrorKind, ValidationSchema},
    validate::ValueLists,
    value::{Value, ValueType},
};

///
/// FieldSource
///
/// Where a slot's value comes from when a row is parsed from client input.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FieldSource {
    /// Read from client input.
    #[default]
    Client,
    /// Assigned by the store on insert; read from input for every other intent.
    GeneratedKey,
    /// Assigned by the server (tenant, audit columns); never read from input.
    Server,
}

///
/// Field
///
/// One named, typed slot of a row. `index` equals the slot position in
/// every row built from the owning metadata.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    name: String,
    index: usize,
    value_type: ValueType,
    schema: Option<ValidationSchema>,
    required: bool,
    default: Option<Value>,
    enumeration: Option<String>,
    multi_valued: bool,
    source: FieldSource,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            index: 0,
            value_type,
            schema: None,
            required: false,
            default: None,
            enumeration: None,
            multi_valued: false,
            source: FieldSource::Client,
        }
    }

    // ------------------------------------------------------------------
    // Builders
    // ------------------------------------------------------------------

    #[must_use]
    pub fn schema(mut self, schema: ValidationSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn enumeration(mut self, list: impl Into<String>) -> Self {
        self.enumeration = Some(list.into());
        self
    }

    #[must_use]
    pub const fn multi_valued(mut self) -> Self {
        self.multi_valued = true;
        self
    }

    pub(crate) const fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub(crate) const fn with_source(mut self, source: FieldSource) -> Self {
        self.source = source;
        self
    }

    pub(crate) fn set_schema(&mut self, schema: ValidationSchema) {
        self.schema = Some(schema);
    }

    pub(crate) fn set_default(&mut self, value: Value) {
        self.default = Some(value);
    }

    pub(crate) const fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    pub(crate) fn set_enumeration(&mut self, list: String) {
        self.enumeration = Some(list);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[must_use]
    pub const fn validation_schema(&self) -> Option<&ValidationSchema> {
        self.schema.as_ref()
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub const fn default_ref(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    #[must_use]
    pub fn enumeration_ref(&self) -> Option<&str> {
        self.enumeration.as_deref()
    }

    #[must_use]
    pub const fn is_multi_valued(&self) -> bool {
        self.multi_valued
    }

    #[must_use]
    pub const fn source(&self) -> FieldSource {
        self.source
    }

    /// Value a fresh row starts with.
    #[must_use]
    pub fn initial_value(&self) -> Value {
        self.default.clone().unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------

    /// Coerce raw input text into this field's value.
    ///
    /// Missing or blank text yields the default (or `Null`) unless the
    /// field is required.
    pub fn parse_text(
        &self,
        text: Option<&str>,
        required: bool,
        lists: &dyn ValueLists,
    ) -> Result<Value, FieldErrorKind> {
        let text = text.map(str::trim).unwrap_or_default();
        if text.is_empty() {
            if required {
                return Err(FieldErrorKind::Required);
            }

            return Ok(self.initial_value());
        }

        if !self.multi_valued {
            return self.parse_one(text, lists);
        }

        let mut canonical = Vec::new();
        for element in text.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            canonical.push(self.parse_one(element, lists)?.to_string());
        }
        if canonical.is_empty() {
            return if required {
                Err(FieldErrorKind::Required)
            } else {
                Ok(self.initial_value())
            };
        }

        Ok(Value::Text(canonical.join(",")))
    }

    fn parse_one(&self, text: &str, lists: &dyn ValueLists) -> Result<Value, FieldErrorKind> {
        let value_type = self
            .schema
            .as_ref()
            .map_or(self.value_type, |schema| schema.value_type);

        let value = value_type
            .parse(text)
            .ok_or_else(|| FieldErrorKind::InvalidValue {
                text: text.to_string(),
                expected: value_type,
            })?;

        if let Some(schema) = &self.schema {
            schema.validate(&value)?;
        }

        if let Some(list) = &self.enumeration
            && !lists.is_valid(list, &value)
        {
            return Err(FieldErrorKind::NotInList {
                list: list.clone(),
                value: value.to_string(),
            });
        }

        Ok(value)
    }
}
