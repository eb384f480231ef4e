use crate::{
    db::dialect::Dialect,
    model::{ColumnCategory, ColumnDescriptor},
    value::{Value, ValueType},
};

///
/// Template
///
/// One precompiled statement: SQL text plus the field index and value
/// type behind each `?`, in placeholder order. Binding is a positional
/// copy out of a row's values.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Template {
    sql: String,
    params: Vec<usize>,
    types: Vec<ValueType>,
}

impl Template {
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn param_indexes(&self) -> &[usize] {
        &self.params
    }

    #[must_use]
    pub fn param_types(&self) -> &[ValueType] {
        &self.types
    }

    pub(crate) fn bind(&self, values: &[Value]) -> Vec<Value> {
        self.params
            .iter()
            .map(|&index| values.get(index).cloned().unwrap_or_default())
            .collect()
    }
}

///
/// Clause
/// Fragments under construction; `?` fragments carry a parameter.
///

#[derive(Default)]
struct Clause {
    parts: Vec<String>,
    params: Vec<usize>,
    types: Vec<ValueType>,
}

impl Clause {
    fn param(&mut self, part: String, index: usize, value_type: ValueType) {
        self.parts.push(part);
        self.params.push(index);
        self.types.push(value_type);
    }

    fn literal(&mut self, part: String) {
        self.parts.push(part);
    }

    const fn has_params(&self) -> bool {
        !self.params.is_empty()
    }
}

///
/// Templates
///
/// CRUD statements for one entity. Key-based statements are absent when
/// the entity has no primary key; UPDATE is also absent when no column
/// is updatable.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Templates {
    select: Option<Template>,
    outputs: Vec<usize>,
    output_types: Vec<ValueType>,
    insert: Template,
    update: Option<Template>,
    delete: Option<Template>,
}

impl Templates {
    pub(crate) fn build(table: &str, columns: &[ColumnDescriptor], dialect: &dyn Dialect) -> Self {
        let persisted: Vec<(usize, &str, ColumnCategory, ValueType)> = columns
            .iter()
            .enumerate()
            .filter_map(|(index, c)| {
                c.column_name
                    .as_deref()
                    .map(|name| (index, name, c.category, c.field.value_type()))
            })
            .collect();

        // where-list: keys in field order, then the tenant column
        let mut filter = Clause::default();
        for &(index, name, category, value_type) in &persisted {
            if category.is_key() {
                filter.param(format!("{name} = ?"), index, value_type);
            }
        }
        let keyed = filter.has_params();
        for &(index, name, category, value_type) in &persisted {
            if category == ColumnCategory::TenantKey {
                filter.param(format!("{name} = ?"), index, value_type);
            }
        }
        let where_sql = filter.parts.join(" AND ");

        let select = keyed.then(|| {
            let list = persisted
                .iter()
                .map(|&(_, name, ..)| name)
                .collect::<Vec<_>>()
                .join(", ");

            Template {
                sql: format!("SELECT {list} FROM {table} WHERE {where_sql}"),
                params: filter.params.clone(),
                types: filter.types.clone(),
            }
        });

        let insert = Self::build_insert(table, &persisted, dialect);

        let mut set = Clause::default();
        for &(index, name, category, value_type) in &persisted {
            if category.is_update_parameter() {
                set.param(format!("{name} = ?"), index, value_type);
            } else if category == ColumnCategory::ModifiedAt {
                set.literal(format!("{name} = {}", dialect.current_timestamp()));
            }
        }
        let update = (keyed && set.has_params()).then(|| Template {
            sql: format!("UPDATE {table} SET {} WHERE {where_sql}", set.parts.join(", ")),
            params: [set.params.as_slice(), filter.params.as_slice()].concat(),
            types: [set.types.as_slice(), filter.types.as_slice()].concat(),
        });

        let delete = keyed.then(|| Template {
            sql: format!("DELETE FROM {table} WHERE {where_sql}"),
            params: filter.params.clone(),
            types: filter.types.clone(),
        });

        Self {
            select,
            outputs: persisted.iter().map(|&(index, ..)| index).collect(),
            output_types: persisted.iter().map(|&(.., value_type)| value_type).collect(),
            insert,
            update,
            delete,
        }
    }

    fn build_insert(
        table: &str,
        persisted: &[(usize, &str, ColumnCategory, ValueType)],
        dialect: &dyn Dialect,
    ) -> Template {
        let mut names = Vec::new();
        let mut values = Clause::default();

        for &(index, name, category, value_type) in persisted {
            if category.is_insert_parameter() {
                names.push(name);
                values.param("?".to_string(), index, value_type);
            } else if category.is_write_timestamp() {
                names.push(name);
                values.literal(dialect.current_timestamp().to_string());
            }
        }

        let sql = if names.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                names.join(", "),
                values.parts.join(", ")
            )
        };

        Template {
            sql,
            params: values.params,
            types: values.types,
        }
    }

    #[must_use]
    pub const fn select(&self) -> Option<&Template> {
        self.select.as_ref()
    }

    /// Field indexes the select list writes back into, in column order.
    #[must_use]
    pub fn output_indexes(&self) -> &[usize] {
        &self.outputs
    }

    #[must_use]
    pub fn output_types(&self) -> &[ValueType] {
        &self.output_types
    }

    #[must_use]
    pub const fn insert(&self) -> &Template {
        &self.insert
    }

    #[must_use]
    pub const fn update(&self) -> Option<&Template> {
        self.update.as_ref()
    }

    #[must_use]
    pub const fn delete(&self) -> Option<&Template> {
        self.delete.as_ref()
    }
}
