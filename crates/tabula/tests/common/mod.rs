#![allow(dead_code)]

use std::collections::VecDeque;
use tabula::{
    AccessorConfig, Handle, HandleError,
    prelude::*,
};

///
/// RecordingHandle
///
/// Records every statement and answers from queued responses.
///

#[derive(Debug, Default)]
pub struct RecordingHandle {
    pub statements: Vec<(String, Vec<Value>)>,
    pub reads: VecDeque<Option<Vec<Value>>>,
    pub read_many: VecDeque<Vec<Vec<Value>>>,
    pub writes: VecDeque<u64>,
    pub next_key: i64,
}

impl RecordingHandle {
    pub fn new() -> Self {
        Self {
            next_key: 100,
            ..Self::default()
        }
    }

    pub fn sql(&self, index: usize) -> &str {
        &self.statements[index].0
    }

    fn record(&mut self, sql: &str, params: &[Value]) {
        self.statements.push((sql.to_string(), params.to_vec()));
    }
}

impl Handle for RecordingHandle {
    fn execute_read(
        &mut self,
        sql: &str,
        params: &[Value],
        _: &[ValueType],
        _: &[ValueType],
    ) -> Result<Option<Vec<Value>>, HandleError> {
        self.record(sql, params);
        Ok(self.reads.pop_front().flatten())
    }

    fn execute_read_many(
        &mut self,
        sql: &str,
        params: &[Value],
        _: &[ValueType],
        _: &[ValueType],
    ) -> Result<Vec<Vec<Value>>, HandleError> {
        self.record(sql, params);
        Ok(self.read_many.pop_front().unwrap_or_default())
    }

    fn execute_write(
        &mut self,
        sql: &str,
        params: &[Value],
        _: &[ValueType],
    ) -> Result<u64, HandleError> {
        self.record(sql, params);
        Ok(self.writes.pop_front().unwrap_or(1))
    }

    fn execute_write_returning_generated_key(
        &mut self,
        sql: &str,
        params: &[Value],
        _: &[ValueType],
        _: &str,
    ) -> Result<(u64, Option<Value>), HandleError> {
        self.record(sql, params);
        let affected = self.writes.pop_front().unwrap_or(1);
        if affected == 0 {
            return Ok((0, None));
        }

        self.next_key += 1;
        Ok((affected, Some(Value::Text(self.next_key.to_string()))))
    }

    fn execute_write_many(
        &mut self,
        sql: &str,
        params_per_row: &[Vec<Value>],
        _: &[ValueType],
    ) -> Result<u64, HandleError> {
        let mut total = 0;
        for params in params_per_row {
            self.record(sql, params);
            total += self.writes.pop_front().unwrap_or(1);
        }

        Ok(total)
    }
}

/// `orders`: generated key, tenant, created-by audit column.
pub fn orders() -> Accessor {
    let descriptor = EntityDescriptor::new("order", "orders")
        .column(ColumnDescriptor::new(
            Field::new("id", ValueType::Integer),
            "order_id",
            ColumnCategory::GeneratedPrimaryKey,
        ))
        .column(ColumnDescriptor::new(
            Field::new("shop", ValueType::Text),
            "shop_id",
            ColumnCategory::TenantKey,
        ))
        .column(ColumnDescriptor::ordinary(
            Field::new("reference", ValueType::Text).required(),
        ))
        .column(ColumnDescriptor::ordinary(Field::new("total", ValueType::Decimal)))
        .column(ColumnDescriptor::ordinary(Field::new("placed_on", ValueType::Date)))
        .column(ColumnDescriptor::ordinary(Field::new("due_on", ValueType::Date)))
        .column(ColumnDescriptor::new(
            Field::new("created_by", ValueType::Text),
            "created_by",
            ColumnCategory::CreatedBy,
        ))
        .rule(CrossFieldRule::FromTo {
            from: "placed_on".to_string(),
            to: "due_on".to_string(),
            allow_equal: true,
        });

    Accessor::new(descriptor, &AccessorConfig::default()).expect("orders accessor")
}
