use super::{Comparator, CompileError, CompileErrors, FilterCondition, FilterRequest, SortSpec};
use crate::{
    db::{artifact::QueryArtifact, dialect::Dialect},
    model::ColumnDescriptor,
    value::{Value, ValueType},
};

/// Requested row count, or the ceiling when absent, non-positive or too large.
#[must_use]
pub fn effective_max_rows(requested: Option<i64>, ceiling: u32) -> u32 {
    match requested {
        Some(n) if n > 0 && n <= i64::from(ceiling) => u32::try_from(n).unwrap_or(ceiling),
        _ => ceiling,
    }
}

/// Escape `\`, `%` and `_` for a LIKE pattern using `\` as the escape character.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }

    out
}

// `${name}` operand
fn field_reference(text: &str) -> Option<&str> {
    text.trim()
        .strip_prefix("${")?
        .strip_suffix('}')
        .map(str::trim)
}

fn non_empty(text: &str) -> Option<&str> {
    let text = text.trim();

    (!text.is_empty()).then_some(text)
}

///
/// Predicate
/// WHERE terms and the parameters they bind, in placeholder order.
///

#[derive(Debug, Default)]
struct Predicate {
    terms: Vec<String>,
    params: Vec<Value>,
    types: Vec<ValueType>,
}

impl Predicate {
    fn bind(&mut self, value: Value, value_type: ValueType) {
        self.params.push(value);
        self.types.push(value_type);
    }

    fn render(&self) -> String {
        if self.terms.is_empty() {
            return String::new();
        }

        let joined = self
            .terms
            .iter()
            .map(|t| format!("({t})"))
            .collect::<Vec<_>>()
            .join(" AND ");

        format!(" WHERE {joined}")
    }
}

///
/// FilterCompiler
///
/// Pure compiler over one entity's column map. Errors accumulate across
/// projection, predicate and sort; any error suppresses the SQL.
///

pub(crate) struct FilterCompiler<'a> {
    pub(crate) entity: &'a str,
    pub(crate) table: &'a str,
    pub(crate) columns: &'a [ColumnDescriptor],
    pub(crate) tenant: Option<usize>,
    pub(crate) dialect: &'a dyn Dialect,
}

impl FilterCompiler<'_> {
    pub(crate) fn compile_filter(
        &self,
        request: &FilterRequest,
        max_rows_ceiling: u32,
        tenant: Option<&Value>,
    ) -> Result<QueryArtifact, CompileErrors> {
        let mut errors = Vec::new();

        let outputs = self.projection(&request.fields, &mut errors);
        let predicate = self.predicate(&request.filters, tenant, &mut errors);
        let order_by = self.order_by(&request.sorts, &mut errors);

        if !errors.is_empty() {
            return Err(CompileErrors(errors));
        }

        let select_list = outputs
            .iter()
            .filter_map(|c| c.column_name.as_deref())
            .collect::<Vec<_>>()
            .join(", ");
        let max_rows = effective_max_rows(request.max_rows, max_rows_ceiling.max(1));

        let mut sql = format!("SELECT {select_list} FROM {}", self.table);
        sql.push_str(&predicate.render());
        sql.push_str(&order_by);
        sql.push_str(&self.dialect.limit_clause(max_rows));

        Ok(QueryArtifact {
            sql,
            param_values: predicate.params,
            param_types: predicate.types,
            output_names: Some(outputs.iter().map(|c| c.field.name().to_string()).collect()),
            output_types: Some(outputs.iter().map(|c| c.field.value_type()).collect()),
            output_indexes: outputs.iter().map(|c| c.field.index()).collect(),
        })
    }

    pub(crate) fn compile_count(
        &self,
        request: &FilterRequest,
        tenant: Option<&Value>,
    ) -> Result<QueryArtifact, CompileErrors> {
        let mut errors = Vec::new();
        let predicate = self.predicate(&request.filters, tenant, &mut errors);

        if !errors.is_empty() {
            return Err(CompileErrors(errors));
        }

        let mut sql = format!("SELECT count(*) FROM {}", self.table);
        sql.push_str(&predicate.render());

        Ok(QueryArtifact {
            sql,
            param_values: predicate.params,
            param_types: predicate.types,
            output_names: Some(vec!["count".to_string()]),
            output_types: Some(vec![ValueType::Integer]),
            output_indexes: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.field.name() == name)
    }

    fn persisted_column(
        &self,
        name: &str,
        errors: &mut Vec<CompileError>,
    ) -> Option<(&ColumnDescriptor, &str)> {
        let Some(descriptor) = self.column(name) else {
            errors.push(CompileError::UnknownField {
                field: name.to_string(),
            });
            return None;
        };
        let Some(column) = descriptor.column_name.as_deref() else {
            errors.push(CompileError::NotPersisted {
                field: name.to_string(),
            });
            return None;
        };

        Some((descriptor, column))
    }

    // Column expression, folded when the field is text.
    fn operand_column(&self, column: &str, value_type: ValueType) -> String {
        if value_type.is_text() {
            self.dialect.upper(column)
        } else {
            column.to_string()
        }
    }

    fn placeholder(&self, value_type: ValueType) -> String {
        self.operand_column("?", value_type)
    }

    fn literal(
        descriptor: &ColumnDescriptor,
        text: &str,
        errors: &mut Vec<CompileError>,
    ) -> Option<Value> {
        let value_type = descriptor.field.value_type();
        match value_type.parse(text) {
            Some(value) if value_type.is_text() => Some(value.to_uppercase()),
            Some(value) => Some(value),
            None => {
                errors.push(CompileError::InvalidLiteral {
                    field: descriptor.field.name().to_string(),
                    text: text.to_string(),
                    expected: value_type,
                });
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Clauses
    // ------------------------------------------------------------------

    fn projection(
        &self,
        names: &[String],
        errors: &mut Vec<CompileError>,
    ) -> Vec<&ColumnDescriptor> {
        let outputs: Vec<&ColumnDescriptor> = if names.is_empty() {
            self.columns.iter().filter(|c| c.is_persisted()).collect()
        } else {
            let mut outputs: Vec<&ColumnDescriptor> = Vec::new();
            for name in names {
                match self.column(name) {
                    None => errors.push(CompileError::UnknownField {
                        field: name.clone(),
                    }),
                    Some(c)
                        if c.is_persisted()
                            && !outputs.iter().any(|o| o.field.name() == name) =>
                    {
                        outputs.push(c);
                    }
                    Some(_) => {}
                }
            }
            outputs
        };

        if outputs.is_empty() && errors.is_empty() {
            errors.push(CompileError::EmptyProjection {
                entity: self.entity.to_string(),
            });
        }

        outputs
    }

    fn predicate(
        &self,
        conditions: &[FilterCondition],
        tenant: Option<&Value>,
        errors: &mut Vec<CompileError>,
    ) -> Predicate {
        let mut predicate = Predicate::default();

        if let Some(index) = self.tenant {
            self.tenant_term(index, tenant, &mut predicate, errors);
        }
        for condition in conditions {
            self.condition(condition, &mut predicate, errors);
        }

        predicate
    }

    fn tenant_term(
        &self,
        index: usize,
        tenant: Option<&Value>,
        predicate: &mut Predicate,
        errors: &mut Vec<CompileError>,
    ) {
        let Some(descriptor) = self.columns.get(index) else {
            return;
        };
        let Some(column) = descriptor.column_name.as_deref() else {
            return;
        };
        let value_type = descriptor.field.value_type();

        match tenant {
            None | Some(Value::Null) => errors.push(CompileError::MissingTenant {
                entity: self.entity.to_string(),
            }),
            Some(value) if !value_type.accepts(value) => {
                errors.push(CompileError::InvalidTenant {
                    entity: self.entity.to_string(),
                    expected: value_type,
                });
            }
            Some(value) => {
                predicate.terms.push(format!("{column} = ?"));
                predicate.bind(value.clone(), value_type);
            }
        }
    }

    fn condition(
        &self,
        condition: &FilterCondition,
        predicate: &mut Predicate,
        errors: &mut Vec<CompileError>,
    ) {
        let Some((descriptor, column)) = self.persisted_column(&condition.field, errors) else {
            return;
        };
        let value_type = descriptor.field.value_type();
        let comparator = condition.comparator;
        let lhs = self.operand_column(column, value_type);

        let unsupported = (comparator.requires_ordering() && !value_type.supports_ordering())
            || (matches!(comparator, Comparator::Contains | Comparator::StartsWith)
                && !value_type.is_text());
        if unsupported {
            errors.push(CompileError::UnsupportedOperator {
                field: condition.field.clone(),
                comparator,
                value_type,
            });
            return;
        }

        let missing = || CompileError::MissingValue {
            field: condition.field.clone(),
            comparator,
        };

        match comparator {
            Comparator::HasValue => predicate.terms.push(format!("{column} IS NOT NULL")),
            Comparator::HasNoValue => predicate.terms.push(format!("{column} IS NULL")),

            Comparator::Contains | Comparator::StartsWith => {
                let Some(text) = non_empty(&condition.value) else {
                    errors.push(missing());
                    return;
                };
                let escaped = escape_like(&text.to_uppercase());
                let pattern = if comparator == Comparator::Contains {
                    format!("%{escaped}%")
                } else {
                    format!("{escaped}%")
                };

                predicate.terms.push(format!(
                    "{lhs} LIKE {} ESCAPE '\\'",
                    self.placeholder(value_type)
                ));
                predicate.bind(Value::Text(pattern), ValueType::Text);
            }

            Comparator::OneOf => {
                let items: Vec<&str> = condition
                    .value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                if items.is_empty() {
                    errors.push(missing());
                    return;
                }

                let before = errors.len();
                let values: Vec<Value> = items
                    .iter()
                    .filter_map(|item| Self::literal(descriptor, item, errors))
                    .collect();
                if errors.len() > before {
                    return;
                }

                let placeholders = vec![self.placeholder(value_type); values.len()].join(", ");
                predicate.terms.push(format!("{lhs} IN ({placeholders})"));
                for value in values {
                    predicate.bind(value, value_type);
                }
            }

            Comparator::Between => {
                let from = self.between_operand(descriptor, &condition.value, predicate, errors);
                let to = self.between_operand(
                    descriptor,
                    condition.to_value.as_deref().unwrap_or_default(),
                    predicate,
                    errors,
                );
                if let (Some(from), Some(to)) = (from, to) {
                    predicate.terms.push(format!("{lhs} BETWEEN {from} AND {to}"));
                }
            }

            Comparator::Equal
            | Comparator::NotEqual
            | Comparator::LessThan
            | Comparator::LessOrEqual
            | Comparator::GreaterThan
            | Comparator::GreaterOrEqual => {
                let Some(text) = non_empty(&condition.value) else {
                    errors.push(missing());
                    return;
                };
                let Some(value) = Self::literal(descriptor, text, errors) else {
                    return;
                };

                let op = if comparator == Comparator::NotEqual {
                    "<>"
                } else {
                    comparator.symbol()
                };
                predicate
                    .terms
                    .push(format!("{lhs} {op} {}", self.placeholder(value_type)));
                predicate.bind(value, value_type);
            }
        }
    }

    // Literal bound as a parameter, or a `${field}` rendered as its column.
    // A bound literal is pushed immediately so placeholder order holds.
    fn between_operand(
        &self,
        descriptor: &ColumnDescriptor,
        text: &str,
        predicate: &mut Predicate,
        errors: &mut Vec<CompileError>,
    ) -> Option<String> {
        let value_type = descriptor.field.value_type();

        if let Some(reference) = field_reference(text) {
            let (other, column) = self.persisted_column(reference, errors)?;
            let actual = other.field.value_type();
            if actual != value_type {
                errors.push(CompileError::ReferenceTypeMismatch {
                    field: descriptor.field.name().to_string(),
                    reference: reference.to_string(),
                    expected: value_type,
                    actual,
                });
                return None;
            }

            return Some(self.operand_column(column, value_type));
        }

        let Some(text) = non_empty(text) else {
            errors.push(CompileError::MissingValue {
                field: descriptor.field.name().to_string(),
                comparator: Comparator::Between,
            });
            return None;
        };
        let value = Self::literal(descriptor, text, errors)?;
        predicate.bind(value, value_type);

        Some(self.placeholder(value_type))
    }

    fn order_by(&self, sorts: &[SortSpec], errors: &mut Vec<CompileError>) -> String {
        let items: Vec<String> = sorts
            .iter()
            .filter_map(|sort| {
                let (descriptor, column) = self.persisted_column(&sort.field, errors)?;
                let expr = self.operand_column(column, descriptor.field.value_type());

                Some(if sort.descending {
                    format!("{expr} DESC")
                } else {
                    expr
                })
            })
            .collect();

        if items.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {}", items.join(", "))
        }
    }
}
