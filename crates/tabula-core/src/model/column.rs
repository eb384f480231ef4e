use crate::model::{Field, FieldSource};
use std::fmt;

///
/// ColumnCategory
///
/// Structural role of a persisted slot. Template synthesis is a pure
/// function of this tag.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ColumnCategory {
    #[default]
    Ordinary,
    RequiredOrdinary,
    PrimaryKey,
    GeneratedPrimaryKey,
    TenantKey,
    CreatedAt,
    CreatedBy,
    ModifiedAt,
    ModifiedBy,
}

impl ColumnCategory {
    #[must_use]
    pub const fn is_key(self) -> bool {
        matches!(self, Self::PrimaryKey | Self::GeneratedPrimaryKey)
    }

    /// Written as a store-side timestamp literal instead of a parameter.
    #[must_use]
    pub const fn is_write_timestamp(self) -> bool {
        matches!(self, Self::CreatedAt | Self::ModifiedAt)
    }

    /// Bound as a parameter in the INSERT template.
    #[must_use]
    pub const fn is_insert_parameter(self) -> bool {
        !matches!(self, Self::GeneratedPrimaryKey) && !self.is_write_timestamp()
    }

    /// Bound as a parameter in the UPDATE SET list.
    #[must_use]
    pub const fn is_update_parameter(self) -> bool {
        matches!(
            self,
            Self::Ordinary | Self::RequiredOrdinary | Self::ModifiedBy
        )
    }

    #[must_use]
    pub const fn implies_required(self) -> bool {
        matches!(self, Self::RequiredOrdinary | Self::PrimaryKey)
    }

    #[must_use]
    pub const fn source(self) -> FieldSource {
        match self {
            Self::GeneratedPrimaryKey => FieldSource::GeneratedKey,
            Self::TenantKey
            | Self::CreatedAt
            | Self::CreatedBy
            | Self::ModifiedAt
            | Self::ModifiedBy => FieldSource::Server,
            Self::Ordinary | Self::RequiredOrdinary | Self::PrimaryKey => FieldSource::Client,
        }
    }
}

impl fmt::Display for ColumnCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

///
/// ColumnDescriptor
///
/// A field annotated with its persisted column name and category.
/// `column_name == None` marks a transient (computed) field.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDescriptor {
    pub field: Field,
    pub column_name: Option<String>,
    pub category: ColumnCategory,
}

impl ColumnDescriptor {
    #[must_use]
    pub fn new(field: Field, column_name: impl Into<String>, category: ColumnCategory) -> Self {
        Self {
            field,
            column_name: Some(column_name.into()),
            category,
        }
    }

    /// Persisted ordinary column named after the field.
    #[must_use]
    pub fn ordinary(field: Field) -> Self {
        let column = field.name().to_string();
        let category = if field.is_required() {
            ColumnCategory::RequiredOrdinary
        } else {
            ColumnCategory::Ordinary
        };

        Self::new(field, column, category)
    }

    /// Field that lives only in memory.
    #[must_use]
    pub const fn transient(field: Field) -> Self {
        Self {
            field,
            column_name: None,
            category: ColumnCategory::Ordinary,
        }
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.column_name.is_some()
    }
}
