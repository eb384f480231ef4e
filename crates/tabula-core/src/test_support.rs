//! Test fixtures: two entities, a capturing event sink, and an
//! in-memory `Handle` that executes the accessor's own CRUD templates.
//!
//! `MemoryHandle` understands exactly the statement shapes `Templates`
//! produce, plus `SELECT count(*)`. Filter reads return staged rows.

use crate::{
    config::AccessorConfig,
    db::{
        accessor::{Accessor, EntityDescriptor},
        handle::{Handle, HandleError},
    },
    model::{ColumnCategory, ColumnDescriptor, Field},
    obs::{AccessEvent, EventSink},
    types::Timestamp,
    value::{Value, ValueType},
};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

// ----------------------------------------------------------------------
// Entities
// ----------------------------------------------------------------------

/// `contacts`: generated key, tenant column, audit columns and one
/// transient field (`display_name`, index 11).
pub(crate) fn contacts_descriptor() -> EntityDescriptor {
    EntityDescriptor::new("contact", "contacts")
        .column(ColumnDescriptor::new(
            Field::new("id", ValueType::Integer),
            "id",
            ColumnCategory::GeneratedPrimaryKey,
        ))
        .column(ColumnDescriptor::new(
            Field::new("tenant", ValueType::Text),
            "tenant_id",
            ColumnCategory::TenantKey,
        ))
        .column(ColumnDescriptor::ordinary(
            Field::new("name", ValueType::Text).required(),
        ))
        .column(ColumnDescriptor::ordinary(Field::new("age", ValueType::Integer)))
        .column(ColumnDescriptor::ordinary(Field::new(
            "retire_age",
            ValueType::Integer,
        )))
        .column(ColumnDescriptor::ordinary(Field::new("birthday", ValueType::Date)))
        .column(ColumnDescriptor::ordinary(Field::new("active", ValueType::Bool)))
        .column(ColumnDescriptor::ordinary(Field::new("balance", ValueType::Decimal)))
        .column(ColumnDescriptor::new(
            Field::new("created_at", ValueType::Timestamp),
            "created_at",
            ColumnCategory::CreatedAt,
        ))
        .column(ColumnDescriptor::new(
            Field::new("modified_at", ValueType::Timestamp),
            "modified_at",
            ColumnCategory::ModifiedAt,
        ))
        .column(ColumnDescriptor::new(
            Field::new("modified_by", ValueType::Text),
            "modified_by",
            ColumnCategory::ModifiedBy,
        ))
        .column(ColumnDescriptor::transient(Field::new(
            "display_name",
            ValueType::Text,
        )))
}

pub(crate) fn contacts() -> Accessor {
    Accessor::new(contacts_descriptor(), &AccessorConfig::default()).expect("contacts accessor")
}

/// `codes`: plain text key, no tenant.
pub(crate) fn codes_descriptor() -> EntityDescriptor {
    EntityDescriptor::new("code", "codes")
        .column(ColumnDescriptor::new(
            Field::new("code", ValueType::Text),
            "code",
            ColumnCategory::PrimaryKey,
        ))
        .column(ColumnDescriptor::ordinary(Field::new("label", ValueType::Text)))
        .column(ColumnDescriptor::ordinary(Field::new("rank", ValueType::Integer)))
}

pub(crate) fn codes() -> Accessor {
    Accessor::new(codes_descriptor(), &AccessorConfig::default()).expect("codes accessor")
}

// ----------------------------------------------------------------------
// CapturingSink
// ----------------------------------------------------------------------

#[derive(Debug, Default)]
pub(crate) struct CapturingSink {
    events: Mutex<Vec<String>>,
}

impl CapturingSink {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().expect("sink lock").clone()
    }
}

impl EventSink for CapturingSink {
    fn record(&self, event: &AccessEvent<'_>) {
        self.events
            .lock()
            .expect("sink lock")
            .push(format!("{event:?}"));
    }
}

type Record = BTreeMap<String, Value>;

// ----------------------------------------------------------------------
// MemoryHandle
// ----------------------------------------------------------------------

#[derive(Debug, Default)]
pub(crate) struct MemoryHandle {
    tables: BTreeMap<String, Vec<Record>>,
    unique: Vec<(String, String)>,
    next_key: i64,
    clock: i64,
    fail_on: Option<String>,
    staged: Vec<Vec<Value>>,
    pub(crate) statements: Vec<String>,
    pub(crate) params: Vec<Vec<Value>>,
}

impl MemoryHandle {
    pub(crate) fn new() -> Self {
        Self {
            next_key: 1,
            clock: 1_700_000_000,
            ..Self::default()
        }
    }

    /// Inserts that would duplicate `column` affect no rows.
    pub(crate) fn with_unique(mut self, table: &str, column: &str) -> Self {
        self.unique.push((table.to_string(), column.to_string()));
        self
    }

    /// Any statement containing `fragment` fails.
    pub(crate) fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on = Some(fragment.to_string());
        self
    }

    /// Rows returned by the next `execute_read_many`.
    pub(crate) fn stage(&mut self, rows: Vec<Vec<Value>>) {
        self.staged = rows;
    }

    pub(crate) fn rows(&self, table: &str) -> &[Record] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn last_sql(&self) -> &str {
        self.statements.last().map_or("", String::as_str)
    }

    // ------------------------------------------------------------------
    // Interpretation
    // ------------------------------------------------------------------

    fn log(&mut self, sql: &str, params: &[Value]) -> Result<(), HandleError> {
        self.statements.push(sql.to_string());
        self.params.push(params.to_vec());

        match &self.fail_on {
            Some(fragment) if sql.contains(fragment.as_str()) => {
                Err(HandleError::new(format!("constraint violated: {fragment}")))
            }
            _ => Ok(()),
        }
    }

    fn tick(&mut self) -> Value {
        self.clock += 1;
        Value::Timestamp(Timestamp::from_seconds(self.clock))
    }

    fn select(&self, sql: &str, params: &[Value]) -> Result<Option<Vec<Value>>, HandleError> {
        let body = sql
            .strip_prefix("SELECT ")
            .ok_or_else(|| unsupported(sql))?;
        let (columns, rest) = body.split_once(" FROM ").ok_or_else(|| unsupported(sql))?;
        let (table, conditions) = rest.split_once(" WHERE ").unwrap_or((rest, ""));

        if columns == "count(*)" {
            let count = i64::try_from(self.rows(table).len()).unwrap_or(i64::MAX);
            return Ok(Some(vec![Value::Integer(count)]));
        }

        let mut params = params.iter();
        let conditions = bind_conditions(conditions, &mut params);
        let found = self
            .rows(table)
            .iter()
            .find(|record| matches(record, &conditions))
            .map(|record| {
                columns
                    .split(", ")
                    .map(|c| record.get(c).cloned().unwrap_or_default())
                    .collect()
            });

        Ok(found)
    }

    fn insert(
        &mut self,
        sql: &str,
        params: &[Value],
        generated: Option<&str>,
    ) -> Result<(u64, Option<Value>), HandleError> {
        let body = sql
            .strip_prefix("INSERT INTO ")
            .ok_or_else(|| unsupported(sql))?;

        let mut record = Record::new();
        let table = if let Some(table) = body.strip_suffix(" DEFAULT VALUES") {
            table
        } else {
            let (table, rest) = body.split_once(" (").ok_or_else(|| unsupported(sql))?;
            let (columns, values) = rest
                .strip_suffix(')')
                .and_then(|r| r.split_once(") VALUES ("))
                .ok_or_else(|| unsupported(sql))?;

            let mut params = params.iter();
            for (column, value) in columns.split(", ").zip(values.split(", ")) {
                let value = if value == "?" {
                    params.next().cloned().unwrap_or_default()
                } else {
                    self.tick()
                };
                record.insert(column.to_string(), value);
            }
            table
        };

        let duplicate = self.unique.iter().any(|(t, column)| {
            t == table
                && record.get(column).is_some_and(|v| {
                    !v.is_null() && self.rows(table).iter().any(|r| r.get(column) == Some(v))
                })
        });
        if duplicate {
            return Ok((0, None));
        }

        let key = generated.map(|column| {
            let key = Value::Integer(self.next_key);
            self.next_key += 1;
            record.insert(column.to_string(), key.clone());
            key
        });
        self.tables.entry(table.to_string()).or_default().push(record);

        Ok((1, key))
    }

    fn update(&mut self, sql: &str, params: &[Value]) -> Result<u64, HandleError> {
        let body = sql.strip_prefix("UPDATE ").ok_or_else(|| unsupported(sql))?;
        let (table, rest) = body.split_once(" SET ").ok_or_else(|| unsupported(sql))?;
        let (sets, conditions) = rest.split_once(" WHERE ").ok_or_else(|| unsupported(sql))?;

        let mut params = params.iter();
        let mut assignments = Vec::new();
        for set in sets.split(", ") {
            let (column, value) = set.split_once(" = ").ok_or_else(|| unsupported(sql))?;
            let value = if value == "?" {
                params.next().cloned().unwrap_or_default()
            } else {
                self.tick()
            };
            assignments.push((column.to_string(), value));
        }
        let conditions = bind_conditions(conditions, &mut params);

        let mut affected = 0;
        for record in self.tables.entry(table.to_string()).or_default() {
            if matches(record, &conditions) {
                for (column, value) in &assignments {
                    record.insert(column.clone(), value.clone());
                }
                affected += 1;
            }
        }

        Ok(affected)
    }

    fn delete(&mut self, sql: &str, params: &[Value]) -> Result<u64, HandleError> {
        let body = sql
            .strip_prefix("DELETE FROM ")
            .ok_or_else(|| unsupported(sql))?;
        let (table, conditions) = body.split_once(" WHERE ").ok_or_else(|| unsupported(sql))?;

        let conditions = bind_conditions(conditions, &mut params.iter());
        let records = self.tables.entry(table.to_string()).or_default();
        let before = records.len();
        records.retain(|record| !matches(record, &conditions));

        Ok(u64::try_from(before - records.len()).unwrap_or(u64::MAX))
    }

    fn write(&mut self, sql: &str, params: &[Value]) -> Result<u64, HandleError> {
        if sql.starts_with("INSERT") {
            self.insert(sql, params, None).map(|(n, _)| n)
        } else if sql.starts_with("UPDATE") {
            self.update(sql, params)
        } else {
            self.delete(sql, params)
        }
    }
}

fn unsupported(sql: &str) -> HandleError {
    HandleError::new(format!("unsupported statement: {sql}"))
}

fn bind_conditions<'a>(
    conditions: &str,
    params: &mut impl Iterator<Item = &'a Value>,
) -> Vec<(String, Value)> {
    conditions
        .split(" AND ")
        .filter(|c| !c.is_empty())
        .filter_map(|c| c.strip_suffix(" = ?"))
        .map(|column| (column.to_string(), params.next().cloned().unwrap_or_default()))
        .collect()
}

// SQL equality: NULL never matches.
fn matches(record: &Record, conditions: &[(String, Value)]) -> bool {
    conditions
        .iter()
        .all(|(column, value)| !value.is_null() && record.get(column) == Some(value))
}

impl Handle for MemoryHandle {
    fn execute_read(
        &mut self,
        sql: &str,
        params: &[Value],
        _: &[ValueType],
        _: &[ValueType],
    ) -> Result<Option<Vec<Value>>, HandleError> {
        self.log(sql, params)?;
        self.select(sql, params)
    }

    fn execute_read_many(
        &mut self,
        sql: &str,
        params: &[Value],
        _: &[ValueType],
        _: &[ValueType],
    ) -> Result<Vec<Vec<Value>>, HandleError> {
        self.log(sql, params)?;
        Ok(std::mem::take(&mut self.staged))
    }

    fn execute_write(
        &mut self,
        sql: &str,
        params: &[Value],
        _: &[ValueType],
    ) -> Result<u64, HandleError> {
        self.log(sql, params)?;
        self.write(sql, params)
    }

    fn execute_write_returning_generated_key(
        &mut self,
        sql: &str,
        params: &[Value],
        _: &[ValueType],
        generated_column: &str,
    ) -> Result<(u64, Option<Value>), HandleError> {
        self.log(sql, params)?;
        self.insert(sql, params, Some(generated_column))
    }

    fn execute_write_many(
        &mut self,
        sql: &str,
        params_per_row: &[Vec<Value>],
        _: &[ValueType],
    ) -> Result<u64, HandleError> {
        let mut total = 0;
        for params in params_per_row {
            self.log(sql, params)?;
            total += self.write(sql, params)?;
        }

        Ok(total)
    }
}
