use crate::{
    model::{CrossFieldRule, DescriptorError, Field, ValidationSchema},
    value::Value,
};
use std::collections::BTreeMap;

///
/// FieldOverride
///
/// Administrator-supplied replacement of one field's constraints, used to
/// customise an entity per tenant. Unset members keep the original.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldOverride {
    pub field: String,
    pub schema: Option<ValidationSchema>,
    pub default: Option<Value>,
    pub required: Option<bool>,
    pub enumeration: Option<String>,
}

impl FieldOverride {
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }
}

///
/// RowMetadata
///
/// Ordered field list of one entity plus its cross-field rules.
/// Shared read-only by every row of the entity.
///

#[derive(Clone, Debug, PartialEq)]
pub struct RowMetadata {
    name: String,
    fields: Vec<Field>,
    by_name: BTreeMap<String, usize>,
    rules: Vec<CrossFieldRule>,
}

impl RowMetadata {
    /// Build metadata, assigning each field its position as index.
    pub fn new(
        name: impl Into<String>,
        fields: Vec<Field>,
        rules: Vec<CrossFieldRule>,
    ) -> Result<Self, DescriptorError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DescriptorError::EmptyEntityName);
        }

        let fields: Vec<Field> = fields
            .into_iter()
            .enumerate()
            .map(|(idx, field)| field.with_index(idx))
            .collect();

        let mut by_name = BTreeMap::new();
        for field in &fields {
            if by_name.insert(field.name().to_string(), field.index()).is_some() {
                return Err(DescriptorError::DuplicateField {
                    field: field.name().to_string(),
                });
            }
            check_field(field)?;
        }

        for rule in &rules {
            for field in rule.field_names() {
                if !by_name.contains_key(field) {
                    return Err(DescriptorError::RuleUnknownField {
                        field: field.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            name,
            fields,
            by_name,
            rules,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.index_of(name).and_then(|idx| self.fields.get(idx))
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn rules(&self) -> &[CrossFieldRule] {
        &self.rules
    }

    /// Values array of a freshly created row.
    #[must_use]
    pub fn default_values(&self) -> Vec<Value> {
        self.fields.iter().map(Field::initial_value).collect()
    }

    /// Copy of this metadata with administrator overrides applied.
    pub fn with_overrides(&self, overrides: &[FieldOverride]) -> Result<Self, DescriptorError> {
        let mut out = self.clone();

        for ov in overrides {
            let idx = out
                .index_of(&ov.field)
                .ok_or_else(|| DescriptorError::OverrideUnknownField {
                    field: ov.field.clone(),
                })?;
            let field = &mut out.fields[idx];

            if let Some(schema) = &ov.schema {
                field.set_schema(schema.clone());
            }
            if let Some(default) = &ov.default {
                field.set_default(default.clone());
            }
            if let Some(required) = ov.required {
                field.set_required(required);
            }
            if let Some(list) = &ov.enumeration {
                field.set_enumeration(list.clone());
            }

            check_field(field)?;
        }

        Ok(out)
    }
}

fn check_field(field: &Field) -> Result<(), DescriptorError> {
    if let Some(schema) = field.validation_schema()
        && schema.value_type != field.value_type()
    {
        return Err(DescriptorError::SchemaTypeMismatch {
            field: field.name().to_string(),
            field_type: field.value_type(),
            schema: schema.name.clone(),
            schema_type: schema.value_type,
        });
    }

    if let Some(default) = field.default_ref()
        && !field.value_type().accepts(default)
    {
        return Err(DescriptorError::DefaultTypeMismatch {
            field: field.name().to_string(),
            expected: field.value_type(),
        });
    }

    if field.is_multi_valued() && !field.value_type().is_text() {
        return Err(DescriptorError::MultiValuedNotText {
            field: field.name().to_string(),
        });
    }

    Ok(())
}
